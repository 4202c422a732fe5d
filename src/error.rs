//! Error types for Dockyard Leads.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Why a submission was turned away before it reached the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("honeypot field was filled in")]
    Spam,

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid email: {email}")]
    InvalidEmail { email: String },

    #[error("unknown {field} option: {value}")]
    UnknownOption { field: &'static str, value: String },
}

impl ValidationError {
    /// Text shown to the submitter.
    ///
    /// Spam gets a generic notice so bots learn nothing about which check fired.
    pub fn user_message(&self) -> String {
        match self {
            Self::Spam => "Submission flagged as spam.".to_string(),
            Self::MissingField { .. } => {
                "Please fill the required fields (Name, Email, Message).".to_string()
            }
            Self::InvalidEmail { .. } => "Please enter a valid email address.".to_string(),
            Self::UnknownOption { field, .. } => format!("Please choose a {field} from the list."),
        }
    }

    /// Short machine-readable reason used in logs and the JSON API.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::MissingField { .. } => "missing_required_field",
            Self::InvalidEmail { .. } => "invalid_email",
            Self::UnknownOption { .. } => "unknown_option",
        }
    }
}

/// Lead store errors. Any of these means the lead was NOT recorded.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Store task failed: {0}")]
    Task(String),
}

/// Outbound email errors. Never surfaced to the submitter.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid {role} address: {reason}")]
    Address { role: &'static str, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Transport(String),

    #[error("SMTP send timed out after {0:?}")]
    Timeout(Duration),

    #[error("Send task failed: {0}")]
    Task(String),
}
