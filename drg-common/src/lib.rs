//! # DRG Common Library
//!
//! Shared code for the Deep Research Gateway:
//! - Gateway configuration loading
//! - Outbound frame payload conventions
//! - Progress inference (phase classifier + per-job tracker)
//! - Client-side stream consumer contract
//! - Common error types

pub mod config;
pub mod consumer;
pub mod error;
pub mod frame;
pub mod progress;

pub use error::{Error, Result};
pub use progress::Phase;
