//! Utility functions and helpers.
//!
//! # Submodules
//!
//! - [`paths`]: Path normalization and resolution
//!
//! # Examples
//!
//! ```
//! use patman::utils::normalize_slashes;
//!
//! assert_eq!(normalize_slashes("atoms\\button.hbs"), "atoms/button.hbs");
//! ```

/// Path manipulation and resolution utilities
pub mod paths;

pub use paths::{
    ensure_parent_dirs, make_absolute, normalize_slashes, resolve_against, to_manifest_path,
};
