//! Best-effort lead notifications.
//!
//! A notifier never fails the intake: whatever goes wrong is folded into a
//! [`NotifyReport`] with `delivered = false` and a diagnostic string.

pub mod smtp;

use async_trait::async_trait;

use crate::leads::Lead;

pub use smtp::{SmtpConfig, SmtpNotifier};

/// Result of one notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: bool,
    pub info: String,
}

impl NotifyReport {
    pub fn delivered(info: impl Into<String>) -> Self {
        Self {
            delivered: true,
            info: info.into(),
        }
    }

    pub fn skipped(info: impl Into<String>) -> Self {
        Self {
            delivered: false,
            info: info.into(),
        }
    }
}

/// Outbound relay for accepted leads.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Relay one lead. Must not panic and must return in bounded time.
    async fn send(&self, lead: &Lead) -> NotifyReport;
}

/// Notifier that never sends anything.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn send(&self, _lead: &Lead) -> NotifyReport {
        NotifyReport::skipped("not configured")
    }
}

/// Subject line for a lead notification.
///
/// Control characters are flattened so a crafted name cannot inject headers.
pub fn render_subject(lead: &Lead) -> String {
    let name: String = lead
        .name
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    format!("New lead: {}", name.trim())
}

/// Plain-text body. Field order is fixed.
pub fn render_body(lead: &Lead) -> String {
    let lines = [
        format!("Time: {}", lead.timestamp_iso()),
        format!("Name: {}", lead.name),
        format!("Email: {}", lead.email),
        format!("Company: {}", lead.company),
        format!("Topic: {}", lead.topic),
        format!("Budget: {}", lead.budget),
        String::new(),
        lead.message.clone(),
        String::new(),
    ];
    let mut body = lines.join("\n");
    body.push('\n');
    body
}
