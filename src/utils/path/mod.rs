//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Separator and lexical normalization (`slash`, `normalize_lexically`, `relative_to`)

pub mod fs;

pub use fs::{normalize_lexically, relative_to, resolve_sibling, slash};
