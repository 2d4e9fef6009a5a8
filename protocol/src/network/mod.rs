//! # Network Module
//!
//! The boundary between the transaction core and an access node.
//!
//! ## Architecture
//!
//! ```text
//! types.rs    Block, Account, AccountKey, TransactionStatus, TransactionResult
//! client.rs   AccessClient trait, ClientError, TimeoutClient wrapper
//! memory.rs   InMemoryAccessNode for tests and offline use
//! ```
//!
//! ## Design Decisions
//!
//! - The crate stays transport-agnostic. A gRPC or REST client implements
//!   [`AccessClient`] in whatever crate owns that transport.
//! - Every request a coordinator makes can be bounded with
//!   [`TimeoutClient`]. A stuck node then shows up as an error instead of a
//!   submission that never returns.

pub mod client;
pub mod memory;
pub mod types;

pub use client::{AccessClient, ClientError, TimeoutClient};
pub use memory::{transaction_id, ExecutionMode, InMemoryAccessNode};
pub use types::{Account, AccountKey, Block, Event, TransactionResult, TransactionStatus};
