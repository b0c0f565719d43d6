//! Core types and trait definitions for the Beacon status page.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod component;
pub mod error;
pub mod incident;
pub mod label;
pub mod phase;
pub mod reference;
pub mod store;
pub mod update;

pub use error::{Classify, Error, ErrorKind, Result};
