//! Page rendering.
//!
//! # Responsibility
//! - Turn one projection plus its breadcrumb into a self-contained HTML
//!   document.
//!
//! # Invariants
//! - Rendering is pure: no filesystem access, no clock access.
//! - Every piece of node text is HTML-escaped.

pub mod html;

pub use html::{escape_html, render_page, PageView};
