//! Submission validation.
//!
//! Rules run in a fixed order and stop at the first failure:
//! - honeypot filled → spam
//! - name / email / message blank → missing field
//! - email not shaped like `local@domain.tld` → invalid email
//! - topic / budget outside the known options → unknown option

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::model::{Budget, ContactForm, Lead, Topic};
use crate::error::ValidationError;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles"));

/// Whether `email` has the `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// Collapse line breaks so the message fits on one CSV line.
pub fn flatten_message(message: &str) -> String {
    message.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Check a raw submission and turn it into a [`Lead`].
///
/// Pure: `now` and `session_id` are supplied by the caller.
pub fn validate(
    form: &ContactForm,
    session_id: Option<String>,
    now: DateTime<Utc>,
) -> Result<Lead, ValidationError> {
    if !form.website.is_empty() {
        return Err(ValidationError::Spam);
    }

    for (field, value) in [
        ("name", &form.name),
        ("email", &form.email),
        ("message", &form.message),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField { field });
        }
    }

    if !is_valid_email(&form.email) {
        return Err(ValidationError::InvalidEmail {
            email: form.email.clone(),
        });
    }

    let topic: Topic = form
        .topic
        .parse()
        .map_err(|_| ValidationError::UnknownOption {
            field: "topic",
            value: form.topic.clone(),
        })?;
    let budget: Budget = form
        .budget
        .parse()
        .map_err(|_| ValidationError::UnknownOption {
            field: "budget",
            value: form.budget.clone(),
        })?;

    Ok(Lead {
        timestamp: now,
        session_id: session_id.filter(|s| !s.trim().is_empty()),
        name: form.name.clone(),
        email: form.email.clone(),
        company: form.company.clone(),
        topic,
        budget,
        message: flatten_message(&form.message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_valid_submission_gets_defaults() {
        let now = Utc::now();
        let lead = validate(&form("A", "a@b.com", "hi"), Some("sid-1".into()), now).unwrap();
        assert_eq!(lead.name, "A");
        assert_eq!(lead.email, "a@b.com");
        assert_eq!(lead.message, "hi");
        assert_eq!(lead.topic, Topic::Other);
        assert_eq!(lead.budget, Budget::NotSure);
        assert_eq!(lead.session_id.as_deref(), Some("sid-1"));
        assert_eq!(lead.timestamp, now);
    }

    #[test]
    fn honeypot_wins_over_everything() {
        let mut f = form("", "not-an-email", "");
        f.website = "spam".into();
        assert_eq!(validate(&f, None, Utc::now()), Err(ValidationError::Spam));

        let mut f = form("A", "a@b.com", "hi");
        f.website = "http://buy.example".into();
        assert_eq!(validate(&f, None, Utc::now()), Err(ValidationError::Spam));
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let cases = [
            (form("", "a@b.com", "hi"), "name"),
            (form("   ", "a@b.com", "hi"), "name"),
            (form("A", "", "hi"), "email"),
            (form("A", "a@b.com", ""), "message"),
            (form("A", "a@b.com", "\n\t "), "message"),
        ];
        for (f, expected) in cases {
            assert_eq!(
                validate(&f, None, Utc::now()),
                Err(ValidationError::MissingField { field: expected })
            );
        }
    }

    #[test]
    fn missing_field_checked_before_email_shape() {
        let err = validate(&form("", "broken", "hi"), None, Utc::now()).unwrap_err();
        assert_eq!(err.code(), "missing_required_field");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in [
            "plain",
            "a@b",
            "@b.com",
            "a@.com",
            "a@b.",
            "a b@c.com",
            "a@b@c.com",
            "a@b .com",
        ] {
            let err = validate(&form("A", email, "hi"), None, Utc::now()).unwrap_err();
            assert_eq!(err.code(), "invalid_email", "{email:?} should be rejected");
        }
    }

    #[test]
    fn reasonable_emails_are_accepted() {
        for email in ["a@b.com", "first.last+tag@sub.example.co.uk", "x@y.z"] {
            assert!(is_valid_email(email), "{email:?} should be accepted");
        }
    }

    #[test]
    fn unknown_topic_is_rejected() {
        let mut f = form("A", "a@b.com", "hi");
        f.topic = "Crypto".into();
        assert_eq!(
            validate(&f, None, Utc::now()),
            Err(ValidationError::UnknownOption {
                field: "topic",
                value: "Crypto".into()
            })
        );
    }

    #[test]
    fn known_options_are_kept() {
        let mut f = form("A", "a@b.com", "hi");
        f.topic = "Measurement & QA".into();
        f.budget = "> €100k".into();
        let lead = validate(&f, None, Utc::now()).unwrap();
        assert_eq!(lead.topic, Topic::MeasurementQa);
        assert_eq!(lead.budget, Budget::Over100k);
    }

    #[test]
    fn message_newlines_become_spaces() {
        let lead = validate(&form("A", "a@b.com", "line one\nline two\r\nthree\rfour"), None, Utc::now())
            .unwrap();
        assert_eq!(lead.message, "line one line two three four");
    }

    #[test]
    fn values_are_not_trimmed() {
        let lead = validate(&form(" Ann ", "a@b.com", " hi "), None, Utc::now()).unwrap();
        assert_eq!(lead.name, " Ann ");
        assert_eq!(lead.message, " hi ");
    }

    #[test]
    fn blank_session_id_is_dropped() {
        let lead = validate(&form("A", "a@b.com", "hi"), Some("  ".into()), Utc::now()).unwrap();
        assert_eq!(lead.session_id, None);
    }

    #[test]
    fn spam_notice_is_generic() {
        assert_eq!(
            ValidationError::Spam.user_message(),
            "Submission flagged as spam."
        );
    }
}
