//! Utilities for schema_evolve
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{check_prefix, format_name, is_camel_case, PrefixMatch};
