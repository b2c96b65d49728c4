//! Core use-case services.
//!
//! # Responsibility
//! - Derive page views (projection, classification, breadcrumb) from a
//!   loaded tree.
//! - Orchestrate the generation pass and structure edits.

pub mod breadcrumb;
pub mod classify;
pub mod projection;
pub mod site;
pub mod structure_service;
