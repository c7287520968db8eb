//! Platform collaborators
//!
//! The simulation never draws or talks to the network. The host supplies:
//! - a sink for transient on-screen messages
//! - a payment gateway for upgrade purchases

/// How long a message stays up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDuration {
    /// Auto-hide after the given milliseconds
    Timed(u32),
    /// Stays until dismissed
    Sticky,
}

/// Transient on-screen message display
pub trait MessageSink {
    fn show(&mut self, text: &str, duration: MessageDuration);
}

/// Sink that forwards messages to the log (headless runs)
#[derive(Debug, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn show(&mut self, text: &str, _duration: MessageDuration) {
        log::info!("[message] {text}");
    }
}

/// Sink that keeps every message (tests, replays)
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub messages: Vec<(String, MessageDuration)>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(|(text, _)| text.as_str())
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|(text, _)| text.contains(needle))
    }
}

impl MessageSink for RecordingSink {
    fn show(&mut self, text: &str, duration: MessageDuration) {
        self.messages.push((text.to_string(), duration));
    }
}

/// Upgrade payment flow
///
/// Called with an amount in sats and a label; returns whether payment went
/// through. The core never retries.
pub trait PaymentGateway {
    fn pay(&mut self, amount: u64, label: &str) -> bool;
}
