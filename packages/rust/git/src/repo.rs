//! Access to the `git` command line.
//!
//! Everything that talks to git goes through [`GitSource`], so callers can be
//! exercised against canned output in tests.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::trace;

use labdoc_shared::{LabdocError, Result};

/// A source of git command output.
pub trait GitSource {
    /// Run `git <args>` and return its raw stdout. A non-zero exit is an error.
    fn output(&self, args: &[&str]) -> Result<Vec<u8>>;

    /// Run `git <args>` and return stdout as trimmed text.
    fn text(&self, args: &[&str]) -> Result<String> {
        let bytes = self.output(args)?;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }

    /// `git fetch <remote> <refspec>`.
    fn fetch(&self, remote: &str, refspec: &str) -> Result<()> {
        self.output(&["fetch", remote, refspec]).map(|_| ())
    }

    /// Paths added, copied, modified or renamed in `range`, in diff order.
    fn diff_names(&self, range: &str) -> Result<Vec<String>> {
        let out = self.output(&["diff", "--name-only", "-z", "--diff-filter=ACMR", range])?;
        Ok(nul_separated(&out))
    }

    /// Every file path in the tree of `rev`.
    fn list_tree(&self, rev: &str) -> Result<Vec<String>> {
        let out = self.output(&["ls-tree", "-r", "--name-only", "-z", rev])?;
        Ok(nul_separated(&out))
    }

    /// Raw contents of `path` at `rev`.
    fn show_file(&self, rev: &str, path: &str) -> Result<Vec<u8>> {
        self.output(&["show", &format!("{rev}:{path}")])
    }
}

/// Split `-z` output. Paths come back verbatim, without git's C-style quoting
/// of non-ASCII bytes.
fn nul_separated(out: &[u8]) -> Vec<String> {
    out.split(|b| *b == 0)
        .filter(|path| !path.is_empty())
        .map(|path| String::from_utf8_lossy(path).into_owned())
        .collect()
}

/// [`GitSource`] backed by the `git` executable on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    workdir: Option<PathBuf>,
}

impl GitCli {
    /// Run git in the current working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run git inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            workdir: Some(dir.as_ref().to_path_buf()),
        }
    }
}

impl GitSource for GitCli {
    fn output(&self, args: &[&str]) -> Result<Vec<u8>> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        trace!(?args, "running git");
        let output = cmd
            .output()
            .map_err(|e| LabdocError::git(format!("failed to run `git {}`: {e}", args.join(" "))))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LabdocError::git(format!(
                "`git {}` exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}
