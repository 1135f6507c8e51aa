//! # Recache Core
//!
//! Core error types and result aliases shared by every recache crate.

pub mod error;
pub mod result;

pub use error::*;
pub use result::*;
