pub mod notification_sender;

pub use notification_sender::{NotificationError, NotificationSender};
