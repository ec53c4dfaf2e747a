//! Optimization module
//!
//! This module provides optimizations over generated IR.

pub mod constant_folding;

// Re-export for convenience
pub use constant_folding::ConstantFolder;
