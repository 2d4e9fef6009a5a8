//! # Protocol Configuration & Constants
//!
//! Every magic number the transaction core depends on lives here. Most of
//! them are not ours to choose: padding widths, the domain tag and the
//! error code are dictated by the chain, and changing any of them produces
//! transactions that encode fine and verify never.
//!
//! The timing values at the bottom *are* ours. They shape how aggressively
//! the submission coordinator polls and how long it backs off after a
//! sequence conflict.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Domain Separation
// ---------------------------------------------------------------------------

/// ASCII tag that prefixes every signed transaction message.
pub const TRANSACTION_DOMAIN_TAG: &str = "FLOW-V0.0-transaction";

/// The tag is right-padded with zero bytes to this width before use.
pub const DOMAIN_TAG_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Fixed-Width Fields
// ---------------------------------------------------------------------------

/// Account addresses are 8 bytes on the wire, left-padded with zeros.
pub const ADDRESS_LENGTH: usize = 8;

/// Block and transaction identifiers are 32-byte digests.
pub const IDENTIFIER_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Raw ECDSA signature length: 32-byte r followed by 32-byte s.
/// No DER framing, no recovery id.
pub const SIGNATURE_LENGTH: usize = 64;

/// Width of each signature component after left-padding.
pub const SIGNATURE_COMPONENT_LENGTH: usize = 32;

/// Private scalar length for both supported curves.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Raw public key length: uncompressed X || Y without the SEC1 0x04 prefix.
pub const PUBLIC_KEY_LENGTH: usize = 64;

/// Both supported hash algorithms produce 32-byte digests.
pub const HASH_OUTPUT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Execution Errors
// ---------------------------------------------------------------------------

/// Error code the chain attaches to a transaction whose proposal key
/// carried the wrong sequence number.
pub const SEQUENCE_NUMBER_MISMATCH_CODE: u32 = 1007;

/// Marker the chain embeds in execution error messages, followed by the
/// numeric code and a closing bracket: `[Error Code: 1007] ...`.
pub const ERROR_CODE_MARKER: &str = "[Error Code: ";

// ---------------------------------------------------------------------------
// Transaction Defaults
// ---------------------------------------------------------------------------

/// Gas limit used when a caller does not specify one. This is the ceiling
/// most access nodes accept for a single transaction.
pub const DEFAULT_GAS_LIMIT: u64 = 9_999;

// ---------------------------------------------------------------------------
// Submission Timing
// ---------------------------------------------------------------------------

/// How often a result monitor asks the access node about a transaction.
/// Block time is roughly a second, so two seconds keeps polling cheap
/// without noticeably delaying conflict detection.
pub const MONITOR_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Floor for the poll interval. A zero period is not a valid timer.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How long a result monitor watches one transaction before giving up.
/// Anything still unsettled after this is not going to tell us about a
/// sequence conflict in time to matter.
pub const MONITOR_OBSERVATION_WINDOW: Duration = Duration::from_secs(30);

/// Pause before refreshing a proposal key that is known to be in conflict.
/// Gives in-flight transactions a chance to land so the refreshed sequence
/// number is the one the chain will actually expect.
pub const RECOVERY_BACKOFF: Duration = Duration::from_secs(3);

/// Per-request timeout applied by [`crate::network::TimeoutClient`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Extracts the numeric error code from an execution error message.
///
/// Returns `None` when the message carries no `[Error Code: N]` marker or
/// the code is not a number. We don't guess.
pub fn parse_error_code(message: &str) -> Option<u32> {
    let start = message.find(ERROR_CODE_MARKER)? + ERROR_CODE_MARKER.len();
    let rest = &message[start..];
    let end = rest.find(']')?;
    rest[..end].trim().parse().ok()
}
