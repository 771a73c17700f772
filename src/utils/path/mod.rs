//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`)
//! - [`posix`]: `/`-separated string paths (module paths, URLs)
//! - [`route`]: URL classification (`is_scheme_url`, `is_absolute_url`)

pub mod fs;
pub mod posix;
pub mod route;

pub use fs::normalize_path;
