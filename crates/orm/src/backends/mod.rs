//! Datastore Abstractions
//!
//! The core talks to storage through [`DataStore`]. Host crates adapt their
//! driver to it; [`MockStore`] is a scripted implementation for tests.

pub mod core;
pub mod mock;

pub use core::*;
pub use mock::{ExecutedQuery, MockResponse, MockStore};
