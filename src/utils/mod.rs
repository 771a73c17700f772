//! Shared helpers: process execution, HTML escaping, path manipulation.

pub mod exec;
pub mod html;
pub mod path;
