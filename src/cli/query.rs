//! `modules` and `config`: JSON views of the project.

use std::fs;
use std::io::Write;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::cli::args::QueryArgs;
use crate::collation::{CollationPlan, plan};
use crate::config::{CollateConfig, Settings};
use crate::log;

/// Modules of every collation, keyed by collation name, in planned order.
pub fn modules(settings: &Settings, args: &QueryArgs) -> Result<()> {
    let plans = plan(settings)?;
    output(&modules_json(&plans), args, "modules")
}

/// Effective configuration.
pub fn config(config: &CollateConfig, args: &QueryArgs) -> Result<()> {
    output(&config.export()?, args, "config")
}

fn modules_json(plans: &[CollationPlan]) -> Value {
    let map: Map<String, Value> = plans
        .iter()
        .map(|plan| {
            let modules = plan.module_paths().map(Value::from).collect();
            (plan.name.clone(), Value::Array(modules))
        })
        .collect();
    Value::Object(map)
}

fn output(value: &Value, args: &QueryArgs, module: &str) -> Result<()> {
    let formatted = if args.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    if let Some(ref path) = args.output {
        let mut file = fs::File::create(path)?;
        writeln!(file, "{formatted}")?;
        log!(module; "wrote output to {}", path.display());
    } else {
        println!("{formatted}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;
    use crate::output::tests::fixture;

    #[test]
    fn test_modules_json() {
        let dir = tempfile::tempdir().unwrap();
        fixture(
            dir.path(),
            &[("src/a/a.css", ""), ("src/b/b.js", ""), ("lib/x/x.js", "")],
        );
        let settings = test_settings(
            dir.path(),
            "[[collations]]\nname = \"vendor\"\nmodules = [\"lib/**\"]\n\n[[collations]]\nmodules = [\"src/**\"]",
        );
        let plans = plan(&settings).unwrap();
        assert_eq!(
            serde_json::to_string(&modules_json(&plans)).unwrap(),
            r#"{"vendor":["lib/x"],"site":["src/a","src/b"]}"#
        );
    }

    #[test]
    fn test_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let args = QueryArgs {
            pretty: false,
            output: Some(path.clone()),
        };
        output(&serde_json::json!({"a": 1}), &args, "config").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "{\"a\":1}\n");
    }
}
