//! Stylesheet URL handling and built-in minification.

pub mod css;
pub mod minify;

pub use css::{Relocation, relocate_css_urls, rewrite_css_urls};
