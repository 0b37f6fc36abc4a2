//! # Contracts
//!
//! Frozen interface contracts shared by the publish layer: archive records,
//! trigger flags, the reduxer bundle, configuration model and errors.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Record Model
//! - One `Collect` per (source page, archive slot)
//! - Records sharing a `source` are grouped before publishing

mod collect;
mod error;
mod flag;
mod options;
mod reduxer;

pub use collect::*;
pub use error::*;
pub use flag::Flag;
pub use options::*;
pub use reduxer::*;
