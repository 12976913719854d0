//! Text message notifications
//!
//! The monitor only needs one capability from the outside world: deliver a short
//! text to a phone number. [`SmsSender`] is that capability, [`sipgate::SipgateSms`]
//! is the implementation talking to sipgate's XML-RPC API.

pub mod error;
pub mod sipgate;

use async_trait::async_trait;

use crate::CheckResult;

pub use error::{SmsError, SmsResult};
pub use sipgate::SipgateSms;

/// Maximum number of characters in a single text message.
pub const MAX_MESSAGE_LEN: usize = 160;

/// Capability to deliver a text message.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Send `message` (at most [`MAX_MESSAGE_LEN`] characters) to `destination`.
    async fn send(&self, destination: &str, message: &str) -> SmsResult<()>;
}

/// Summarize the failed checks of a cycle.
///
/// `total` is the number of configured services; when fewer results exist the
/// remaining checks were skipped and that is mentioned at the end.
pub fn build_message(results: &[CheckResult], total: usize) -> String {
    let failed = results
        .iter()
        .filter(|r| r.failed())
        .map(|r| r.service.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut message = format!("Service(s) failed: {failed}");
    if results.len() < total {
        message.push_str(&format!(" ({} checks not run)", total - results.len()));
    }
    message
}

/// Split `message` into chunks of at most `max` characters.
///
/// Counts characters, not bytes, so multi-byte characters are never torn apart.
pub fn chunk_message(message: &str, max: usize) -> Vec<String> {
    if max == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = message.chars().collect();
    chars.chunks(max).map(|chunk| chunk.iter().collect()).collect()
}
