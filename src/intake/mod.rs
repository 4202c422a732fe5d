//! Lead intake: validate → store → notify.
//!
//! Storage always happens before notification. A notification failure is
//! reported but never undoes or hides a successful store; a storage failure
//! means the lead was not recorded and nothing is sent.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::{StorageError, ValidationError};
use crate::leads::{ContactForm, Lead, LeadStore, validate};
use crate::notify::Notifier;

/// Where a submission is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStage {
    Received,
    Validated,
    Stored,
    Notified,
    NotificationSkipped,
    Rejected,
    Failed,
}

impl fmt::Display for IntakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Stored => "stored",
            Self::Notified => "notified",
            Self::NotificationSkipped => "notification_skipped",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Terminal result of one submission.
#[derive(Debug)]
pub enum IntakeOutcome {
    /// Turned away by validation. Nothing stored.
    Rejected(ValidationError),
    /// The store append failed. Nothing stored, nothing sent.
    Failed(StorageError),
    /// Stored; the notifier did not deliver.
    NotificationSkipped { lead: Lead, reason: String },
    /// Stored and relayed.
    Notified { lead: Lead, info: String },
}

impl IntakeOutcome {
    pub fn stage(&self) -> IntakeStage {
        match self {
            Self::Rejected(_) => IntakeStage::Rejected,
            Self::Failed(_) => IntakeStage::Failed,
            Self::NotificationSkipped { .. } => IntakeStage::NotificationSkipped,
            Self::Notified { .. } => IntakeStage::Notified,
        }
    }

    /// Whether the lead is durably in the store.
    pub fn is_recorded(&self) -> bool {
        matches!(
            self,
            Self::NotificationSkipped { .. } | Self::Notified { .. }
        )
    }

    pub fn lead(&self) -> Option<&Lead> {
        match self {
            Self::NotificationSkipped { lead, .. } | Self::Notified { lead, .. } => Some(lead),
            Self::Rejected(_) | Self::Failed(_) => None,
        }
    }

    /// Text shown to the submitter.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(e) => e.user_message(),
            Self::Failed(_) => {
                "Sorry, your message could not be recorded. Please try again or email us directly."
                    .to_string()
            }
            Self::NotificationSkipped { .. } | Self::Notified { .. } => {
                "Thanks! Your message has been recorded.".to_string()
            }
        }
    }
}

/// Orchestrates one submission at a time.
pub struct IntakePipeline {
    store: LeadStore,
    notifier: Arc<dyn Notifier>,
}

impl IntakePipeline {
    pub fn new(store: LeadStore, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &LeadStore {
        &self.store
    }

    /// Run a submission to a terminal outcome. Never panics on notifier or
    /// storage failure.
    pub async fn submit(&self, form: &ContactForm, session_id: Option<String>) -> IntakeOutcome {
        let sid = session_id.clone().unwrap_or_default();
        debug!(session_id = %sid, stage = %IntakeStage::Received, "Lead submission received");

        let lead = match validate(form, session_id, Utc::now()) {
            Ok(lead) => lead,
            Err(e) => {
                info!(
                    session_id = %sid,
                    stage = %IntakeStage::Rejected,
                    reason = e.code(),
                    "Lead submission rejected"
                );
                return IntakeOutcome::Rejected(e);
            }
        };
        debug!(session_id = %sid, stage = %IntakeStage::Validated, "Lead submission validated");

        let store = self.store.clone();
        let row = lead.clone();
        let stored = tokio::task::spawn_blocking(move || store.append(&row))
            .await
            .unwrap_or_else(|e| Err(StorageError::Task(e.to_string())));
        if let Err(e) = stored {
            error!(
                session_id = %sid,
                stage = %IntakeStage::Failed,
                path = %self.store.path().display(),
                error = %e,
                "Lead NOT recorded"
            );
            return IntakeOutcome::Failed(e);
        }
        info!(session_id = %sid, stage = %IntakeStage::Stored, "Lead recorded");

        let report = self.notifier.send(&lead).await;
        if report.delivered {
            info!(
                session_id = %sid,
                stage = %IntakeStage::Notified,
                notifier = self.notifier.name(),
                "Lead notification delivered"
            );
            IntakeOutcome::Notified {
                lead,
                info: report.info,
            }
        } else {
            warn!(
                session_id = %sid,
                stage = %IntakeStage::NotificationSkipped,
                notifier = self.notifier.name(),
                reason = %report.info,
                "Lead stored but not relayed"
            );
            IntakeOutcome::NotificationSkipped {
                lead,
                reason: report.info,
            }
        }
    }
}
