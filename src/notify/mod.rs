//! Admin notification channels.
//!
//! Two independent capabilities, email and SMS, each optional per portal: a
//! channel is attempted only when the portal carries a non-empty address for
//! it. Channel failures are collected and joined into one error without
//! blocking the other channel. The wire transports themselves are external
//! collaborators; the in-tree implementations log the send (email) or do
//! nothing (SMS, disabled until a carrier contract exists).

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::error::join_error_strings;
use crate::models::portal;

/// Errors raised by a notification channel or their per-portal aggregate.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{channel} notification to '{to}' failed: {reason}")]
    Channel {
        channel: &'static str,
        to: String,
        reason: String,
    },
    #[error("{0}")]
    Aggregate(String),
}

/// Email channel capability.
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send(&self, to_addr: &str, msg: &str) -> Result<(), NotifyError>;
}

/// SMS channel capability.
#[async_trait]
pub trait SmsNotifier: Send + Sync {
    async fn send(&self, to_addr: &str, msg: &str) -> Result<(), NotifyError>;
}

/// Email client that records the send in the structured log. Stands in for
/// the real mail transport, which is outside this service.
#[derive(Debug, Clone)]
pub struct LoggingEmailNotifier {
    pub sender: String,
}

#[async_trait]
impl EmailNotifier for LoggingEmailNotifier {
    async fn send(&self, to_addr: &str, msg: &str) -> Result<(), NotifyError> {
        info!(from = %self.sender, to = %to_addr, message = %msg, "email notification");
        Ok(())
    }
}

/// SMS client placeholder. The carrier integration is disabled until a price
/// model is agreed, matching the deployment this service replaces.
#[derive(Debug, Clone, Default)]
pub struct NoopSmsNotifier;

#[async_trait]
impl SmsNotifier for NoopSmsNotifier {
    async fn send(&self, _to_addr: &str, _msg: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Message sent to a portal's admins when no `ads.txt` was found.
pub fn missing_ads_txt_message(portal_name: &str) -> String {
    format!(
        "Dear admins of portal '{portal_name}', please be informed that your portal \
         has no publicly available 'ads.txt' file!"
    )
}

/// Fan a "no ads.txt" notification out to every channel the portal has an
/// address for. Each channel is attempted independently; failures are joined
/// into a single aggregate error.
pub async fn notify_portal_admins(
    email: &dyn EmailNotifier,
    sms: &dyn SmsNotifier,
    portal: &portal::Model,
) -> Result<(), NotifyError> {
    let msg = missing_ads_txt_message(&portal.canonical_name);
    let mut errors = Vec::new();

    if !portal.email.is_empty()
        && let Err(err) = email.send(&portal.email, &msg).await
    {
        errors.push(err.to_string());
    }
    if !portal.phone.is_empty()
        && let Err(err) = sms.send(&portal.phone, &msg).await
    {
        errors.push(err.to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(NotifyError::Aggregate(join_error_strings(errors)))
    }
}
