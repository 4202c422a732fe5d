//! Lead data model: the raw form, the validated lead, and the stored row.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Column order of the lead file.
pub const HEADER: [&str; 8] = [
    "timestamp",
    "session_id",
    "name",
    "email",
    "company",
    "topic",
    "budget",
    "message",
];

/// Column order of files written before the session column existed.
pub const LEGACY_HEADER: [&str; 7] = [
    "timestamp",
    "name",
    "email",
    "company",
    "topic",
    "budget",
    "message",
];

/// Whether a record is a header row in either layout.
pub fn is_header(fields: &[&str]) -> bool {
    fields == HEADER || fields == LEGACY_HEADER
}

// ── Enumerations ────────────────────────────────────────────────────

/// What the enquiry is about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Topic {
    SelfTuningSpeaker,
    AcousticSimulation,
    AudioDspMl,
    MeasurementQa,
    #[default]
    Other,
}

impl Topic {
    pub const ALL: [Topic; 5] = [
        Topic::SelfTuningSpeaker,
        Topic::AcousticSimulation,
        Topic::AudioDspMl,
        Topic::MeasurementQa,
        Topic::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Topic::SelfTuningSpeaker => "Self-tuning TWS speaker",
            Topic::AcousticSimulation => "Acoustic simulation",
            Topic::AudioDspMl => "Audio DSP / ML",
            Topic::MeasurementQa => "Measurement & QA",
            Topic::Other => "Other",
        }
    }
}

/// Rough project budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Budget {
    Under5k,
    From5kTo20k,
    From20kTo100k,
    Over100k,
    #[default]
    NotSure,
}

impl Budget {
    pub const ALL: [Budget; 5] = [
        Budget::Under5k,
        Budget::From5kTo20k,
        Budget::From20kTo100k,
        Budget::Over100k,
        Budget::NotSure,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Budget::Under5k => "< €5k",
            Budget::From5kTo20k => "€5–20k",
            Budget::From20kTo100k => "€20–100k",
            Budget::Over100k => "> €100k",
            Budget::NotSure => "Not sure",
        }
    }
}

/// A label that matches none of the known options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown option: {}", self.0)
    }
}

macro_rules! labelled_enum {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownLabel;

            /// Exact label match; blank input means the default option.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Self::default());
                }
                Self::ALL
                    .into_iter()
                    .find(|v| v.label() == s)
                    .ok_or_else(|| UnknownLabel(s.to_string()))
            }
        }

        impl TryFrom<String> for $ty {
            type Error = UnknownLabel;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$ty> for String {
            fn from(v: $ty) -> String {
                v.label().to_string()
            }
        }
    };
}

labelled_enum!(Topic);
labelled_enum!(Budget);

// ── Raw submission ──────────────────────────────────────────────────

/// Untrusted contact-form submission, exactly as posted.
///
/// Every field defaults to empty so that a partially filled form still
/// reaches the validator instead of failing extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub company: String,
    pub topic: String,
    pub budget: String,
    pub message: String,
    /// Honeypot. Hidden from humans; must stay empty.
    pub website: String,
    /// Session id issued when the form was rendered.
    pub sid: String,
}

// ── Lead ────────────────────────────────────────────────────────────

/// One accepted contact-form submission. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lead {
    pub timestamp: DateTime<Utc>,
    pub session_id: Option<String>,
    pub name: String,
    pub email: String,
    pub company: String,
    pub topic: Topic,
    pub budget: Budget,
    pub message: String,
}

impl Lead {
    /// ISO-8601 UTC timestamp as written to the store.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Fields in [`HEADER`] order.
    pub fn to_record(&self) -> [String; 8] {
        [
            self.timestamp_iso(),
            self.session_id.clone().unwrap_or_default(),
            self.name.clone(),
            self.email.clone(),
            self.company.clone(),
            self.topic.label().to_string(),
            self.budget.label().to_string(),
            self.message.clone(),
        ]
    }
}

// ── Stored row ──────────────────────────────────────────────────────

/// A lead as read back from the file, kept as text so that hand-edited or
/// older rows are still shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadRow {
    pub timestamp: String,
    pub session_id: String,
    pub name: String,
    pub email: String,
    pub company: String,
    pub topic: String,
    pub budget: String,
    pub message: String,
}

impl LeadRow {
    /// Map a record positionally.
    ///
    /// Seven fields is the older layout without a session column; anything
    /// shorter is padded with empty strings and anything longer is truncated.
    pub fn from_fields(fields: &[&str]) -> Self {
        let get = |i: usize| fields.get(i).map(|s| s.to_string()).unwrap_or_default();
        if fields.len() == HEADER.len() - 1 {
            return Self {
                timestamp: get(0),
                session_id: String::new(),
                name: get(1),
                email: get(2),
                company: get(3),
                topic: get(4),
                budget: get(5),
                message: get(6),
            };
        }
        Self {
            timestamp: get(0),
            session_id: get(1),
            name: get(2),
            email: get(3),
            company: get(4),
            topic: get(5),
            budget: get(6),
            message: get(7),
        }
    }

    /// Fields in [`HEADER`] order.
    pub fn fields(&self) -> [&str; 8] {
        [
            &self.timestamp,
            &self.session_id,
            &self.name,
            &self.email,
            &self.company,
            &self.topic,
            &self.budget,
            &self.message,
        ]
    }
}

impl From<&Lead> for LeadRow {
    fn from(lead: &Lead) -> Self {
        let [timestamp, session_id, name, email, company, topic, budget, message] =
            lead.to_record();
        Self {
            timestamp,
            session_id,
            name,
            email,
            company,
            topic,
            budget,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn blank_labels_take_the_default() {
        assert_eq!("".parse::<Topic>().unwrap(), Topic::Other);
        assert_eq!("  ".parse::<Budget>().unwrap(), Budget::NotSure);
    }

    #[test]
    fn labels_parse_exactly() {
        for topic in Topic::ALL {
            assert_eq!(topic.label().parse::<Topic>().unwrap(), topic);
        }
        assert_eq!("€5–20k".parse::<Budget>().unwrap(), Budget::From5kTo20k);
        assert_eq!(
            "other".parse::<Topic>().unwrap_err(),
            UnknownLabel("other".into())
        );
    }

    #[test]
    fn timestamp_is_utc_iso8601() {
        let lead = Lead {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
            session_id: None,
            name: "A".into(),
            email: "a@b.com".into(),
            company: String::new(),
            topic: Topic::Other,
            budget: Budget::NotSure,
            message: "hi".into(),
        };
        assert_eq!(lead.timestamp_iso(), "2025-03-01T09:30:00.000000Z");
        assert_eq!(lead.to_record()[1], "");
    }

    #[test]
    fn legacy_rows_without_session_column() {
        let row = LeadRow::from_fields(&["t", "Ann", "a@b.com", "", "Other", "Not sure", "hi"]);
        assert_eq!(row.session_id, "");
        assert_eq!(row.name, "Ann");
        assert_eq!(row.message, "hi");
    }

    #[test]
    fn both_header_layouts_are_recognised() {
        assert!(is_header(&HEADER));
        assert!(is_header(&LEGACY_HEADER));
        assert!(!is_header(&["t", "Ann", "a@b.com", "", "Other", "Not sure", "hi"]));
    }

    #[test]
    fn short_rows_are_padded() {
        let row = LeadRow::from_fields(&["t", "sid"]);
        assert_eq!(row.session_id, "sid");
        assert_eq!(row.message, "");
    }
}
