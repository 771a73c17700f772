//! External process execution for command adapters.
//!
//! ```ignore
//! let stdout = Cmd::from_words(&["sass", "entry.scss", "out.css"])
//!     .cwd(scratch)
//!     .run("command:sass")?;
//! ```

use regex::Regex;
use std::{
    ffi::OsString,
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    sync::LazyLock,
    thread,
};

use crate::error::{Error, Result};
use crate::log;

static ANSI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

/// Command builder for one adapter invocation.
#[derive(Default, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    /// First word is the program, the rest are arguments. Empty words are dropped.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        let mut iter = words.iter().map(AsRef::as_ref).filter(|w| !w.is_empty());
        Self {
            program: iter.next().unwrap_or_default().into(),
            args: iter.map(OsString::from).collect(),
            ..Default::default()
        }
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.envs.extend(
            vars.into_iter()
                .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned())),
        );
        self
    }

    /// Pipe `data` to the process.
    pub fn stdin<D: Into<Vec<u8>>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.into());
        self
    }

    /// Run to completion. A non-zero exit is an [`Error::Adapter`] carrying
    /// stderr; on success stderr is logged under `adapter`.
    pub fn run(self, adapter: &str) -> Result<Output> {
        let program = self.program.to_string_lossy().into_owned();
        let fail = |action: &str, e: std::io::Error| {
            Error::adapter(adapter, format!("failed to {action} `{program}`: {e}"))
        };

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if self.stdin_data.is_some() {
            cmd.stdin(Stdio::piped());
        }
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| fail("spawn", e))?;

        // Feed stdin from its own thread while stdout is drained here;
        // otherwise a filter that streams output blocks on a full pipe.
        let writer = match (self.stdin_data, child.stdin.take()) {
            (Some(data), Some(mut stdin)) => Some(thread::spawn(move || stdin.write_all(&data))),
            _ => None,
        };
        let output = child.wait_with_output().map_err(|e| fail("wait for", e))?;
        let written = writer.map_or(Ok(()), |handle| {
            handle
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")))
        });

        let stderr = stderr_lines(&output);
        if output.status.success()
            && let Err(e) = written
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            return Err(fail("write stdin to", e));
        }
        if !output.status.success() {
            let mut message = format!("`{program}` exited with {}", output.status);
            if !stderr.is_empty() {
                message.push('\n');
                message.push_str(&stderr);
            }
            return Err(Error::adapter(adapter, message));
        }
        if !stderr.is_empty() {
            log!(adapter; "{}", stderr);
        }
        Ok(output)
    }
}

/// Non-empty stderr lines with color codes removed.
fn stderr_lines(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .map(|line| ANSI.replace_all(line, ""))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_words() {
        let cmd = Cmd::from_words(&["npx", "", "sass", "--quiet"]).cwd("/tmp");
        assert_eq!(cmd.program, OsString::from("npx"));
        assert_eq!(cmd.args, [OsString::from("sass"), OsString::from("--quiet")]);
        assert_eq!(cmd.cwd, Some(PathBuf::from("/tmp")));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_pipe() {
        let output = Cmd::from_words(&["cat"]).stdin("test data").run("cat").unwrap();
        assert_eq!(output.stdout, b"test data");
    }

    #[cfg(unix)]
    #[test]
    fn test_large_stdin_streams_through() {
        let data = "a{color:red}\n".repeat(100_000);
        let output = Cmd::from_words(&["cat"]).stdin(data.as_str()).run("cat").unwrap();
        assert_eq!(output.stdout.len(), data.len());
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_stderr() {
        let err = Cmd::from_words(&["sh", "-c", "printf '\\033[31mboom\\033[0m' >&2; exit 3"])
            .run("command:sh")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("command:sh failed: `sh` exited with"));
        assert!(msg.ends_with("\nboom"));
    }

    #[test]
    fn test_missing_program() {
        let err = Cmd::from_words(&["collate-no-such-program"])
            .run("command:x")
            .unwrap_err();
        assert!(matches!(err, Error::Adapter { .. }));
    }
}
