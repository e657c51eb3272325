//! Keepsake - GFS-style retention classification for dated backups
//!
//! This crate decides which of a set of dated artifacts survive a tiered
//! (monthly/weekly/daily/intra-daily) retention policy. Walking directories
//! and acting on files is left to callers such as the `keepsake` CLI.

pub mod calendar;
pub mod classify;
pub mod config;
pub mod error;
pub mod policy;

pub use classify::{Candidate, RetentionDecision, RetentionReason, SortOrder, classify, classify_at};
pub use error::KeepsakeError;
pub use policy::RetentionPolicy;
