//! Thin wrappers around the git CLI.
//!
//! Every function runs git in the process working directory — callers
//! hold a [`crate::workdir::DirGuard`] for the repository they are
//! operating on. Arguments are always passed as a vector, never through a
//! shell.

use crate::error::AiderResult;
use crate::process::{self, ProcessOutput};

fn git(args: &[&str]) -> Vec<String> {
    std::iter::once("git")
        .chain(args.iter().copied())
        .map(str::to_owned)
        .collect()
}

/// Run a git query, returning its stdout only on a zero exit.
fn query(args: &[&str]) -> Option<String> {
    process::run(&git(args), None, &[], None)
        .ok()
        .filter(ProcessOutput::success)
        .map(|out| out.stdout)
}

/// Explicit work-tree check (`git rev-parse --is-inside-work-tree`).
///
/// Deliberately never errors: a missing git binary or a rev-parse failure
/// both mean "not usable as a git repository here".
pub fn is_inside_work_tree() -> bool {
    query(&["rev-parse", "--is-inside-work-tree"])
        .is_some_and(|out| out.trim() == "true")
}

/// Machine-readable status (`git status --porcelain`).
pub fn porcelain_status() -> AiderResult<String> {
    process::run_checked(&git(&["status", "--porcelain"]), None, &[], None)
        .map(|out| out.stdout)
}

/// Stage the given files. The `--` sentinel keeps file names from being
/// read as options.
pub fn stage(files: &[String]) -> AiderResult<ProcessOutput> {
    let mut argv = git(&["add", "--"]);
    argv.extend(files.iter().cloned());
    process::run_checked(&argv, None, &[], None)
}

/// Commit staged changes. Returns the raw output — callers distinguish
/// "nothing to commit" from real failures.
pub fn commit(message: &str) -> AiderResult<ProcessOutput> {
    process::run(&git(&["commit", "-m", message]), None, &[], None)
}

pub fn remote_origin_url() -> Option<String> {
    query(&["config", "--get", "remote.origin.url"])
        .map(|out| out.trim().to_owned())
        .filter(|url| !url.is_empty())
}

pub fn current_branch() -> Option<String> {
    query(&["branch", "--show-current"])
        .map(|out| out.trim().to_owned())
        .filter(|branch| !branch.is_empty())
}

/// The last `limit` commits, one line each.
pub fn recent_commits(limit: usize) -> Option<String> {
    query(&["log", "--oneline", "-n", &limit.to_string()])
}

pub fn branches() -> Option<String> {
    query(&["branch", "--list"])
}

/// Diff of staged changes, empty when nothing is staged.
pub fn staged_diff() -> Option<String> {
    query(&["diff", "--staged"])
}
