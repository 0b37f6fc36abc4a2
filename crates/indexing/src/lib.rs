//! # Indexing
//!
//! Search-index sink for published archive records.
//!
//! The publish layer feeds it after delivery; its outcome never decides
//! whether a destination succeeded.

pub mod client;
pub mod document;
pub mod error;

pub use client::MeiliClient;
pub use document::{documents, Document};
pub use error::{IndexError, Result};
