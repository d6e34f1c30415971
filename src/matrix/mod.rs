//! Matrix Module
//!
//! The dense integer matrix type and the collaborators around the distributed
//! core: loading a validated matrix pair from text, exporting a result as
//! column-aligned text, and the local serial multiplication used as a
//! baseline.

pub mod loader;
pub mod reference;
pub mod types;
pub mod writer;

pub use types::Matrix;
