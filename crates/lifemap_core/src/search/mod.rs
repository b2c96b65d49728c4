//! Node search entry points.
//!
//! # Responsibility
//! - Expose query APIs over a loaded tree.
//! - Keep result shaping inside core so launchers only print hits.

pub mod substring;
