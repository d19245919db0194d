//! Test infrastructure for the data access layer.
//!
//! This module provides backend doubles that record what the provider sends
//! them, and small fixtures for building providers and records.

#![allow(dead_code)]

pub mod doubles;
pub mod fixtures;

// Re-export commonly used items
pub use doubles::*;
pub use fixtures::*;
