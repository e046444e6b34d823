//! Utility functions for DraftTree Core
//!
//! This module provides common utility functions used across the codebase.

mod logging;

pub use logging::init_tracing;
