use serde::{Deserialize, Serialize};

use crate::email::Email;

/// Phases of a single send, reported in this exact order.
///
/// A send that completes reports every phase once, ending with `Done`.
/// A send that fails stops reporting at the phase that raised the error;
/// there is no terminal failure status, the returned `Err` carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SendStatus {
    /// Composing the MIME document, including reading attachment files.
    Building,
    /// Opening the connection, upgrading with STARTTLS if configured,
    /// and authenticating.
    Connecting,
    /// Transmitting the message.
    Sending,
    /// Closing the session with the server.
    Closing,
    /// Delivery handed off; no further callbacks for this message.
    Done,
}

/// Position of the in-flight message within a batch, paired with the
/// phase it just entered. Built fresh for every callback invocation.
#[derive(Debug, Clone, Copy)]
pub struct SendProgress<'a> {
    /// 1-based position of the message in the batch.
    pub current: usize,
    /// Number of messages in the batch.
    pub total: usize,
    /// The message being sent.
    pub email: &'a Email,
    pub status: SendStatus,
}
