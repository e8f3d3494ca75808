//! Platform helpers for lwe-helper.
//!
//! - [`path`] - Tilde expansion, path resolution and directory creation

pub mod path;
