//! Collation planning.
//!
//! A collation is a named, ordered group of modules whose files are
//! concatenated (or loaded) together: `site.css`, `site.js`, ...
//!
//! [`plan`] resolves every configured collation's patterns, names the
//! unnamed ones (`site`, `site-1`, ...), and, with `collate_pages`, splits
//! each page module into its own collation.

mod pages;

pub use pages::{TEMPLATE_EXT, document_path, find_page_modules, page_collation_name};

use rustc_hash::FxHashSet;

use crate::config::Settings;
use crate::debug;
use crate::error::{Error, Result};
use crate::module::{ModuleDescriptor, resolve};

/// One planned collation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollationPlan {
    pub name: String,
    /// Document path (`/about/index.html`) for page collations.
    pub page: Option<String>,
    pub modules: Vec<ModuleDescriptor>,
}

impl CollationPlan {
    pub fn module_paths(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.rel_path.as_str())
    }
}

/// Names for configured collations: explicit ones as given, unnamed ones
/// `prefix`, `prefix-1`, `prefix-2`, ... in order.
fn collation_names(settings: &Settings) -> Vec<String> {
    let mut generated = 0usize;
    settings
        .collations
        .iter()
        .map(|c| match &c.name {
            Some(name) => name.clone(),
            None => {
                let name = match generated {
                    0 => settings.collation_prefix.clone(),
                    n => format!("{}-{n}", settings.collation_prefix),
                };
                generated += 1;
                name
            }
        })
        .collect()
}

/// Plan every collation for a build.
pub fn plan(settings: &Settings) -> Result<Vec<CollationPlan>> {
    if !settings.base.is_dir() {
        return Err(Error::Config(format!(
            "base `{}` is not a directory",
            settings.base.display()
        )));
    }

    let names = collation_names(settings);

    let mut pages: Vec<(String, String)> = Vec::new();
    if settings.collate_pages {
        for module in find_page_modules(settings) {
            if let Some(document) = document_path(settings, &module) {
                pages.push((module, document));
            }
        }
    }
    let page_modules: FxHashSet<&str> = pages.iter().map(|(m, _)| m.as_str()).collect();

    let mut plans = Vec::with_capacity(names.len() + pages.len());
    for (name, collation) in names.into_iter().zip(&settings.collations) {
        let modules = resolve(&settings.base, &collation.modules)?
            .into_iter()
            .filter(|m| !page_modules.contains(m.as_str()))
            .map(|m| ModuleDescriptor::scan(&settings.base, &m))
            .collect::<Result<Vec<_>>>()?;
        plans.push(CollationPlan {
            name,
            page: None,
            modules,
        });
    }

    for (module, document) in &pages {
        plans.push(CollationPlan {
            name: page_collation_name(document),
            page: Some(document.clone()),
            modules: vec![ModuleDescriptor::scan(&settings.base, module)?],
        });
    }

    let mut seen = FxHashSet::default();
    for plan in &plans {
        if !seen.insert(plan.name.as_str()) {
            return Err(Error::Config(format!(
                "collation name `{}` is used more than once",
                plan.name
            )));
        }
    }

    debug!("collate"; "planned {} collations", plans.len());
    Ok(plans)
}

/// Every module of every collation, once, in first-seen order.
pub fn module_list(plans: &[CollationPlan]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    plans
        .iter()
        .flat_map(CollationPlan::module_paths)
        .filter(|m| seen.insert(*m))
        .map(str::to_owned)
        .collect()
}
