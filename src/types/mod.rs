//! Shared types.

pub mod config;
pub mod declarations;
pub mod errors;
pub mod knowledge;
