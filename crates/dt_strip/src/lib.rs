//! Structural type stripper for the detype token stream.
//!
//! [`Document::parse`] lexes a file and pairs its brackets; [`strip`] finds
//! every range of pure type syntax; [`Stripped::render`] prints what is
//! left.

mod decl;
pub mod document;
mod emit;
mod imports;
mod stripper;
mod types;

pub use document::Document;
pub use emit::{Rendered, Rewrite, Stripped};
pub use imports::rewrite_specifier;
pub use stripper::{strip, StripOptions};
