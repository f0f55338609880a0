pub mod mailgun_sender;

pub use mailgun_sender::MailgunSender;
