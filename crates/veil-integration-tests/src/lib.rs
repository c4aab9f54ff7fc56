//! Integration test crate for Veil.
//!
//! This crate has no library code. It only contains integration tests that
//! exercise whole message flows across the workspace crates.
//!
//! Tests that bind fixed localhost ports are `#[ignore]`d. Run everything:
//! ```sh
//! cargo test -p veil-integration-tests -- --include-ignored
//! ```
