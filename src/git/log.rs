use crate::error::{GhoursError, Result};
use crate::history::HistoryProvider;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::debug;

pub const PRETTY_FORMAT: &str = "--pretty=format:%an|%ad";
pub const DATE_FORMAT: &str = "--date=iso";

/// Runs `git log` and hands back its `author|date` lines.
#[derive(Debug, Clone)]
pub struct GitLogProvider {
    repo: Option<PathBuf>,
    all_refs: bool,
    include_merges: bool,
    program: String,
}

impl GitLogProvider {
    /// Read history of the repository at `repo`, or the current dir if `None`
    pub fn new<P: AsRef<Path>>(repo: Option<P>) -> Self {
        Self {
            repo: repo.map(|p| p.as_ref().to_path_buf()),
            all_refs: true,
            include_merges: true,
            program: "git".to_string(),
        }
    }

    pub fn all_refs(mut self, all_refs: bool) -> Self {
        self.all_refs = all_refs;
        self
    }

    pub fn include_merges(mut self, include_merges: bool) -> Self {
        self.include_merges = include_merges;
        self
    }

    /// Run `program` instead of `git`.
    #[cfg(test)]
    pub(crate) fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(repo) = &self.repo {
            args.push("-C".to_string());
            args.push(repo.to_string_lossy().to_string());
        }
        args.push("log".to_string());
        if self.all_refs {
            args.push("--all".to_string());
        }
        if !self.include_merges {
            args.push("--no-merges".to_string());
        }
        args.push(PRETTY_FORMAT.to_string());
        args.push(DATE_FORMAT.to_string());
        args
    }
}

impl HistoryProvider for GitLogProvider {
    fn fetch(&self) -> Result<String> {
        let args = self.args();
        debug!(program = %self.program, ?args, "running history command");

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Reading git history...");
        pb.enable_steady_tick(Duration::from_millis(100));

        let output = Command::new(&self.program).args(&args).output();
        pb.finish_and_clear();

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GhoursError::source_unavailable(format!("{} not found", self.program)));
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(status = ?output.status, %stderr, "history command failed");
            return Err(GhoursError::source_unavailable(stderr.trim()));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(bytes = text.len(), "history fetched");
        Ok(text)
    }

    fn describe(&self) -> String {
        match &self.repo {
            Some(p) => p.to_string_lossy().to_string(),
            None => std::env::current_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|_| ".".to_string()),
        }
    }
}
