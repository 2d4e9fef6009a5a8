// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # flowkit: Transaction Core
//!
//! Everything between "I have a Cadence script and some arguments" and
//! "the access node accepted my transaction" lives in this crate. It is
//! the part of a Flow client that cannot be approximated: the canonical
//! bytes must match what the chain recomputes, bit for bit, or the
//! signatures verify against nothing and the transaction bounces.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **encoding**: RLP element/list encoder, minimal big-endian integers,
//!   and a decoder for inspection and tests.
//! - **crypto**: Domain tags, SHA2-256 / SHA3-256, ECDSA P-256 and
//!   secp256k1 keys with fixed-width 64-byte signatures.
//! - **transaction**: The transaction model, canonical payload and
//!   envelope encodings, signer-index bookkeeping, and role-based signing.
//! - **network**: The access-node collaborator interface plus an
//!   in-memory node for tests and offline work.
//! - **submission**: The sequence-number coordinator: pipelines several
//!   transactions per proposal key, watches their results, and recovers
//!   after the chain reports a sequence-number mismatch.
//! - **config**: Protocol constants and default timings.
//!
//! ## Design Philosophy
//!
//! 1. Byte-exact over convenient. The encoder is boring on purpose.
//! 2. Every public operation returns a `Result`. Nothing panics across an
//!    `.await`.
//! 3. Shared state is owned, locked per key, and resettable.

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod network;
pub mod submission;
pub mod transaction;
