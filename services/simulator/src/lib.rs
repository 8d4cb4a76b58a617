//! Audit Walkthrough Simulator Service
//!
//! Environment configuration and startup helpers for the `walkthrough`
//! console binary. The session logic itself lives in `walkthrough-core`.

pub mod bootstrap;
pub mod config;
