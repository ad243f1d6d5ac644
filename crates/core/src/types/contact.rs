//! Contact messages sent through the public contact form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::{ContactMessageId, Identified};
use super::status::ProgressStatus;
use super::validation::{ValidationError, require};
use super::wire::{flag, timestamp};

/// Subject used when the visitor leaves the subject blank.
pub const DEFAULT_SUBJECT: &str = "General Inquiry";

/// A contact message as listed in the admin panel.
///
/// `status` and `replied` are independent: a message can be `completed`
/// without having been replied to, and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    /// Backend id.
    pub id: ContactMessageId,
    /// Sender name.
    pub name: String,
    /// Sender email.
    pub email: String,
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Message body.
    pub message: String,
    /// Follow-up status.
    #[serde(default)]
    pub status: ProgressStatus,
    /// Whether the admin has replied.
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub replied: bool,
    /// When the message was received.
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identified for ContactMessage {
    type Id = ContactMessageId;

    fn id(&self) -> ContactMessageId {
        self.id
    }
}

/// Body of `PATCH /api/admin/contact-messages/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessageUpdate {
    /// New follow-up status.
    pub status: ProgressStatus,
    /// New replied flag.
    #[serde(deserialize_with = "flag::deserialize")]
    pub replied: bool,
}

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    /// Sender name.
    pub name: String,
    /// Sender email.
    pub email: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Message body.
    pub message: String,
}

impl ContactSubmission {
    /// Trim the fields, default a blank subject and validate, producing the
    /// payload to send.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found: blank name, email or
    /// message, or a malformed email.
    pub fn prepared(&self) -> Result<Self, ValidationError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("message", &self.message)?;
        let email = Email::parse(&self.email)?;

        let subject = match self.subject.trim() {
            "" => DEFAULT_SUBJECT.to_owned(),
            subject => subject.to_owned(),
        };

        Ok(Self {
            name: self.name.trim().to_owned(),
            email: email.into_inner(),
            subject,
            message: self.message.trim().to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_backend_row() {
        let message: ContactMessage = serde_json::from_value(json!({
            "id": 12,
            "name": "Visitor",
            "email": "visitor@example.com",
            "subject": "Hello",
            "message": "Can we talk?",
            "status": "unread",
            "created_at": "2024-10-01 09:15:00"
        }))
        .unwrap();

        assert_eq!(message.status, ProgressStatus::New);
        assert!(!message.replied);
        assert!(message.created_at.is_some());
    }

    #[test]
    fn test_integer_replied_flag() {
        let message: ContactMessage = serde_json::from_value(json!({
            "id": 1, "name": "n", "email": "e@example.com", "message": "m",
            "status": "completed", "replied": 1
        }))
        .unwrap();
        assert!(message.replied);
        assert_eq!(message.status, ProgressStatus::Completed);
    }

    #[test]
    fn test_update_body() {
        let update = ContactMessageUpdate {
            status: ProgressStatus::InProgress,
            replied: false,
        };
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({"status": "in-progress", "replied": false})
        );
    }

    #[test]
    fn test_submission_defaults_subject() {
        let submission = ContactSubmission {
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            subject: "  ".to_owned(),
            message: "Hi".to_owned(),
        };
        assert_eq!(submission.prepared().unwrap().subject, DEFAULT_SUBJECT);

        let blank_name = ContactSubmission {
            name: String::new(),
            ..submission
        };
        assert_eq!(blank_name.prepared(), Err(ValidationError::MissingField("name")));
    }
}
