//! Common utilities and types shared across FolioVault crates.
//!
//! This module provides the workspace-wide error type and the durable
//! filesystem helpers every state-carrying component writes through.

pub mod error;
pub mod fs;

pub use error::{Error, Result};
