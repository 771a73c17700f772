//! Adapters backed by an external process.
//!
//! Minifiers receive code on stdin and answer on stdout. Transpilers get the
//! entry and output paths through `{entry}` / `{output}` placeholders (or
//! appended, when neither is used) and through the environment:
//!
//! - `COLLATE_ENTRY`, `COLLATE_OUTPUT`: absolute paths
//! - `COLLATE_DEV`: `1` in dev mode, `0` otherwise

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{Minifier, TranspileJob, Transpiler};
use crate::error::{Error, Result};
use crate::utils::exec::Cmd;

const ENTRY: &str = "{entry}";
const OUTPUT: &str = "{output}";

/// Split a command line into words.
fn split_command(cmd: &str) -> Result<Vec<String>> {
    let words: Vec<String> = cmd.split_whitespace().map(str::to_owned).collect();
    if words.is_empty() {
        return Err(Error::Config("empty adapter command".into()));
    }
    Ok(words)
}

pub struct CommandMinifier {
    name: String,
    words: Vec<String>,
}

impl CommandMinifier {
    pub fn parse(cmd: &str) -> Result<Self> {
        let words = split_command(cmd)?;
        Ok(Self {
            name: format!("command:{}", words[0]),
            words,
        })
    }

    pub fn program(&self) -> &str {
        &self.words[0]
    }
}

impl Minifier for CommandMinifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn minify(&self, code: String) -> Result<String> {
        let output = Cmd::from_words(&self.words).stdin(code).run(&self.name)?;
        String::from_utf8(output.stdout)
            .map_err(|_| Error::adapter(&self.name, "output is not valid UTF-8"))
    }
}

pub struct CommandTranspiler {
    name: String,
    words: Vec<String>,
    input_types: Vec<String>,
    entry_format: String,
}

impl CommandTranspiler {
    pub fn parse(cmd: &str, input_types: Vec<String>, entry_format: String) -> Result<Self> {
        let words = split_command(cmd)?;
        if !entry_format.contains("{path}") {
            return Err(Error::Config(format!(
                "transpiler entry format `{entry_format}` has no `{{path}}`"
            )));
        }
        Ok(Self {
            name: format!("command:{}", words[0]),
            words,
            input_types,
            entry_format,
        })
    }

    pub fn program(&self) -> &str {
        &self.words[0]
    }

    /// Final argument list for one job.
    fn command_for(&self, job: &TranspileJob) -> Cmd {
        let entry = job.entry_path.to_string_lossy();
        let output = job.output_path.to_string_lossy();

        let templated = self
            .words
            .iter()
            .any(|w| w.contains(ENTRY) || w.contains(OUTPUT));
        let mut words: Vec<String> = self
            .words
            .iter()
            .map(|w| w.replace(ENTRY, &entry).replace(OUTPUT, &output))
            .collect();
        if !templated {
            words.push(entry.to_string());
            words.push(output.to_string());
        }

        let mut cmd = Cmd::from_words(&words).envs([
            ("COLLATE_ENTRY", &*entry),
            ("COLLATE_OUTPUT", &*output),
            ("COLLATE_DEV", if job.is_dev { "1" } else { "0" }),
        ]);
        if let Some(dir) = job.entry_path.parent() {
            cmd = cmd.cwd(dir);
        }
        cmd
    }
}

impl Transpiler for CommandTranspiler {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_types(&self) -> &[String] {
        &self.input_types
    }

    fn entry_line(&self, source_path: &str) -> String {
        self.entry_format.replace("{path}", source_path)
    }

    fn run(&self, job: TranspileJob) -> BoxFuture<'_, Result<()>> {
        let cmd = self.command_for(&job);
        let name = self.name.clone();
        async move {
            let run_name = name.clone();
            tokio::task::spawn_blocking(move || cmd.run(&run_name))
                .await
                .map_err(|e| Error::adapter(&name, e))??;
            if !job.output_path.is_file() {
                return Err(Error::adapter(
                    &name,
                    format!("no output written to `{}`", job.output_path.display()),
                ));
            }
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(dir: &std::path::Path) -> TranspileJob {
        TranspileJob {
            source_paths: vec!["../src/a/a.scss".into()],
            entry_path: dir.join("entry.scss"),
            output_path: dir.join("out.css"),
            is_dev: false,
        }
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(CommandMinifier::parse("   ").is_err());
        assert!(CommandTranspiler::parse("sass", vec!["scss".into()], "@use;".into()).is_err());
    }

    #[test]
    fn test_entry_line() {
        let t = CommandTranspiler::parse(
            "sass {entry} {output}",
            vec!["scss".into()],
            "@import \"{path}\";".into(),
        )
        .unwrap();
        assert_eq!(t.entry_line("../src/a/a.scss"), "@import \"../src/a/a.scss\";");
        assert_eq!(t.name(), "command:sass");
        assert_eq!(t.program(), "sass");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_minifier_pipes_stdin() {
        let m = CommandMinifier::parse("tr -d \\n").unwrap();
        assert_eq!(m.minify("a\nb\n".into()).unwrap(), "ab");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_minifier_large_input() {
        let code = "var x = 1;\n".repeat(100_000);
        let m = CommandMinifier::parse("cat").unwrap();
        assert_eq!(m.minify(code.clone()).unwrap().len(), code.len());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_transpiler_appends_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("entry.scss"), "a{}").unwrap();
        let t = CommandTranspiler::parse("cp", vec!["scss".into()], "{path}".into()).unwrap();
        t.run(job(dir.path())).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("out.css")).unwrap(), "a{}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_transpiler_env_and_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let t = CommandTranspiler::parse(
            "sh -c true {entry}",
            vec!["scss".into()],
            "{path}".into(),
        )
        .unwrap();
        let err = t.run(job(dir.path())).await.unwrap_err();
        assert!(err.to_string().contains("no output written"));

        let mut j = job(dir.path());
        j.output_path = dir.path().join("dev.txt");
        j.is_dev = true;
        let t = CommandTranspiler::parse("sh {entry}", vec!["scss".into()], "{path}".into())
            .unwrap();
        std::fs::write(
            dir.path().join("entry.scss"),
            "echo $COLLATE_DEV > \"$COLLATE_OUTPUT\"",
        )
        .unwrap();
        t.run(j).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("dev.txt")).unwrap().trim(),
            "1"
        );
    }
}
