//! Transformation module.
//!
//! This module turns raw source tables into flat output tables:
//! - Normalize: Column flattening, index promotion, scalar coercion
//! - Filter: Team filtering
//! - Pipeline: Request orchestration

pub mod filter;
pub mod normalize;
pub mod pipeline;

pub use filter::{filter_by_team, team_names};
pub use normalize::normalize;
pub use pipeline::*;
