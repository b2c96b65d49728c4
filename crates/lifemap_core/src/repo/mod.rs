//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence contract for the editable YAML structure.
//! - Isolate file replacement details from edit orchestration.

pub mod structure_repo;
