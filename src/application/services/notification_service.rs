use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::domain::entities::regimen::ReminderDetails;
use crate::domain::services::{NotificationError, NotificationSender};

const REMINDER_SUBJECT: &str = "Have you taken your meds?";

#[derive(Clone)]
pub struct NotificationService {
    sender: Arc<dyn NotificationSender>,
    timezone: Tz,
}

impl NotificationService {
    pub fn new(sender: Arc<dyn NotificationSender>, timezone: Tz) -> Self {
        Self { sender, timezone }
    }

    /// Sends the dose reminder for one due instant to the patient
    pub async fn send_reminder(
        &self,
        details: &ReminderDetails,
        due_at: DateTime<Utc>,
    ) -> Result<(), NotificationError> {
        let body = self.reminder_body(details, due_at);

        self.sender
            .send(&details.patient_email, REMINDER_SUBJECT, &body)
            .await
    }

    /// HTML body of the reminder e-mail
    fn reminder_body(&self, details: &ReminderDetails, due_at: DateTime<Utc>) -> String {
        let local_time = due_at.with_timezone(&self.timezone);
        let formatted = local_time.format("%A, %d %B %Y at %H:%M").to_string();

        let greeting = if details.patient_name.trim().is_empty() {
            "Hello".to_string()
        } else {
            format!("Hello {}", escape_html(&details.patient_name))
        };

        let mut body = String::new();
        body.push_str("<html><body>");
        body.push_str(&format!("<p>{},</p>", greeting));
        body.push_str(&format!(
            "<p>It is time for your dose of <strong>{}</strong> ({}).</p>",
            escape_html(&details.medicine_name),
            escape_html(&details.dosage_quantity),
        ));
        body.push_str(&format!("<p>Scheduled for {}.</p>", formatted));

        if !details.treatment.trim().is_empty() {
            body.push_str(&format!("<p>Treatment: {}</p>", escape_html(&details.treatment)));
        }
        if !details.comment.trim().is_empty() {
            body.push_str(&format!("<p>Note: {}</p>", escape_html(&details.comment)));
        }

        body.push_str("<p>MedBuddy</p></body></html>");
        body
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
