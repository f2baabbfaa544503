//! Outbound message delivery.
//!
//! The worker needs synchronous delivery: `send` returns only once the
//! message is handed off, so a job can guarantee delivery before it
//! finalizes. Transport mechanics live behind the trait; this crate ships a
//! tracing-only implementation and an in-memory recorder for tests.

use std::sync::Mutex;

use tracing::info;

use crate::error::TaskError;

/// A file attached to an outbound message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// An outbound message with optional HTML body and attachments.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub subject: String,
    pub recipients: Vec<String>,
    pub body: String,
    pub html: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    /// Create a message with a subject and recipient list.
    pub fn new(subject: impl Into<String>, recipients: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            recipients,
            body: String::new(),
            html: None,
            attachments: Vec::new(),
        }
    }

    /// Set the plain-text body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the HTML body.
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Add an attachment.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Delivery surface for outbound messages.
pub trait Mailer: Send + Sync {
    /// Deliver a message, blocking until it is handed off.
    fn send(&self, message: &OutboundMessage) -> Result<(), TaskError>;
}

/// Mailer that only logs deliveries.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &OutboundMessage) -> Result<(), TaskError> {
        info!(
            subject = %message.subject,
            recipients = ?message.recipients,
            attachments = message.attachments.len(),
            "Outbound message delivered"
        );
        Ok(())
    }
}

/// Mailer that records every message, for tests.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl MemoryMailer {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message sent so far.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, message: &OutboundMessage) -> Result<(), TaskError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }
}
