//! Shared library components for the Keepsake CLI

pub mod commands;
pub mod error;
pub mod output;
