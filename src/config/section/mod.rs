//! Configuration section definitions.
//!
//! Each module corresponds to a section in `collate.toml`:
//!
//! | Module       | TOML Section       | Purpose                               |
//! |--------------|--------------------|---------------------------------------|
//! | `collation`  | `[[collations]]`   | Named module groups                   |
//! | `build`      | `[build]`          | Build dirs, mirroring, file types     |
//! | `templates`  | `[templates]`      | Document rendering                    |
//! | `adapters`   | `[adapters]`       | Minifier / transpiler descriptors     |
//! | `cache`      | `[cache]`          | Content hash cache                    |

mod adapters;
mod build;
mod cache;
mod collation;
mod templates;

pub use adapters::AdaptersConfig;
pub use build::{BuildConfig, CommentStyle, FileTypeConfig, FileTypeRule};
pub use cache::CacheConfig;
pub use collation::CollationConfig;
pub use templates::TemplatesConfig;
