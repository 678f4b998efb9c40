//! Message Envelope
//!
//! Plain-text RFC 5322 message with the minimal header set.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::SendError;

/// One outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Reject messages whose headers would be malformed.
    pub fn validate(&self) -> Result<(), SendError> {
        for (name, value) in [("From", &self.from), ("To", &self.to)] {
            if value.trim().is_empty() {
                return Err(SendError::InvalidMessage {
                    message: format!("{} address is empty", name),
                });
            }
        }

        for (name, value) in [
            ("From", &self.from),
            ("To", &self.to),
            ("Subject", &self.subject),
        ] {
            if value.contains(['\r', '\n']) {
                return Err(SendError::InvalidMessage {
                    message: format!("{} header contains a line break", name),
                });
            }
        }

        Ok(())
    }

    /// Domain of the sender address, used for the Message-ID.
    pub fn sender_domain(&self) -> Option<&str> {
        let (_, domain) = self.from.rsplit_once('@')?;
        let domain = domain.trim().trim_end_matches('>').trim();
        (!domain.is_empty()).then_some(domain)
    }

    /// Fresh `<uuid@domain>` Message-ID.
    pub fn generate_message_id(&self) -> String {
        format!(
            "<{}@{}>",
            Uuid::new_v4(),
            self.sender_domain().unwrap_or("localhost")
        )
    }

    /// Render the message with the given Date and Message-ID.
    pub fn to_rfc5322(&self, date: DateTime<Utc>, message_id: &str) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nMessage-ID: {}\r\n\r\n{}",
            self.from,
            self.to,
            self.subject,
            date.to_rfc2822(),
            message_id,
            self.body
        )
    }

    /// Validate and render with the current time and a new Message-ID.
    pub fn render(&self) -> Result<String, SendError> {
        self.validate()?;
        Ok(self.to_rfc5322(Utc::now(), &self.generate_message_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message() -> MailMessage {
        MailMessage::new("Alice <alice@example.com>", "bob@example.org", "Hi", "Hello Bob.\r\nBye.")
    }

    #[test]
    fn test_rfc5322_layout() {
        let date = Utc.with_ymd_and_hms(2024, 3, 14, 9, 30, 0).unwrap();
        let raw = message().to_rfc5322(date, "<id-1@example.com>");

        assert_eq!(
            raw,
            "From: Alice <alice@example.com>\r\n\
             To: bob@example.org\r\n\
             Subject: Hi\r\n\
             Date: Thu, 14 Mar 2024 09:30:00 +0000\r\n\
             Message-ID: <id-1@example.com>\r\n\
             \r\n\
             Hello Bob.\r\nBye."
        );
    }

    #[test]
    fn test_message_id_uses_sender_domain() {
        let msg = message();
        assert_eq!(msg.sender_domain(), Some("example.com"));

        let id = msg.generate_message_id();
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
        assert_ne!(id, msg.generate_message_id());

        let bare = MailMessage::new("nobody", "x@y.z", "", "");
        assert!(bare.generate_message_id().ends_with("@localhost>"));
    }

    #[test]
    fn test_empty_subject_and_body_render() {
        let msg = MailMessage::new("a@b.c", "d@e.f", "", "");
        let raw = msg.render().unwrap();
        assert!(raw.contains("Subject: \r\n"));
        assert!(raw.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_header_injection_is_rejected() {
        let msg = MailMessage::new("a@b.c", "d@e.f", "Hi\r\nBcc: evil@x.y", "");
        assert!(matches!(msg.render(), Err(SendError::InvalidMessage { .. })));

        let msg = MailMessage::new("a@b.c", "  ", "Hi", "");
        assert!(msg.validate().is_err());
    }
}
