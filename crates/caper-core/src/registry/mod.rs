//! Run registry — the engine's list of known runs and how user queries are
//! resolved against it.
//!
//! The registry itself lives on the engine; `CromwellRestApi::query_runs`
//! fetches one snapshot with labels attached, and `resolve_runs` filters it
//! without any further requests.

mod resolver;
mod summary;

pub use resolver::{expect_single, resolve_runs};
pub use summary::*;
