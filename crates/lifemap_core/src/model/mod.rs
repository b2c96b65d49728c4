//! Knowledge tree domain model.
//!
//! # Responsibility
//! - Define the canonical node shape shared by every source variant.
//! - Hold the loaded tree immutably for one generation pass.
//!
//! # Invariants
//! - Parent pointers and depth are computed once, at insertion time.
//! - A node is a leaf iff its child list is empty.
//! - Loaders never expose which variant produced a tree.

pub mod diagnostic;
pub mod due;
pub mod node;
pub mod tree;
