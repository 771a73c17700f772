//! `[[collations]]` entries.
//!
//! ```toml
//! [[collations]]
//! name = "vendor"
//! modules = ["lib/**"]
//!
//! [[collations]]              # unnamed: gets `collation_prefix`
//! modules = ["src/**", "!src/legacy"]
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub modules: Vec<String>,
}

impl CollationConfig {
    pub fn new(name: Option<&str>, modules: &[&str]) -> Self {
        Self {
            name: name.map(str::to_owned),
            modules: modules.iter().map(|m| (*m).to_owned()).collect(),
        }
    }
}
