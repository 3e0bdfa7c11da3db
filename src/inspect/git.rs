//! Git helpers
//!
//! Metadata is read by running the `git` binary against each app checkout.
//! Every query is best-effort: a missing binary, a repository without
//! commits or without remotes simply leaves the corresponding field unset.

use std::path::Path;
use std::process::Command;

use tracing::debug;

/// Version-control state of one checkout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitInfo {
    pub remote: Option<String>,
    pub revision: Option<String>,
    pub branch: Option<String>,
    pub dirty: Option<bool>,
}

/// Whether `dir` looks like a git checkout (`.git` dir or worktree file)
pub fn is_git_checkout(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Whether a usable `git` binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Read remote, revision, branch and dirty state of a checkout
pub fn read_git_info(dir: &Path, preferred_remotes: &[String]) -> GitInfo {
    if !is_git_checkout(dir) {
        return GitInfo::default();
    }

    let revision = git_output(dir, &["rev-parse", "--verify", "HEAD"]).ok();
    let branch = git_output(dir, &["symbolic-ref", "--quiet", "--short", "HEAD"]).ok();
    let dirty = git_output(dir, &["status", "--porcelain"])
        .ok()
        .map(|status| !status.is_empty());
    let remote = remote_url(dir, preferred_remotes);

    GitInfo {
        remote,
        revision,
        branch,
        dirty,
    }
}

fn remote_url(dir: &Path, preferred_remotes: &[String]) -> Option<String> {
    let remotes: Vec<String> = git_output(dir, &["remote"])
        .ok()?
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    let chosen = preferred_remotes
        .iter()
        .find(|p| remotes.contains(p))
        .or_else(|| remotes.first())?;

    git_output(dir, &["remote", "get-url", chosen]).ok()
}

/// Clone `url` into `dest`
pub fn clone_repo(url: &str, dest: &Path) -> Result<(), String> {
    let out = Command::new("git")
        .arg("clone")
        .arg("--quiet")
        .arg(url)
        .arg(dest)
        .output()
        .map_err(|e| format!("failed to run git clone: {e}"))?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(format!("git clone {} failed: {}", url, stderr.trim()));
    }
    Ok(())
}

/// Check out `rev` (a commit or branch) in an existing checkout
pub fn checkout(dir: &Path, rev: &str) -> Result<(), String> {
    git_output(dir, &["checkout", "--quiet", rev]).map(|_| ())
}

/// Run git in `dir` and return trimmed stdout on success
fn git_output(dir: &Path, args: &[&str]) -> Result<String, String> {
    // Benches are often owned by another user than the one taking the backup
    let out = Command::new("git")
        .arg("-c")
        .arg("safe.directory=*")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(|e| format!("failed to run git in {}: {e}", dir.display()))?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        debug!(
            "git {} failed in {}: {}",
            args.join(" "),
            dir.display(),
            stderr.trim()
        );
        return Err(format!(
            "git {} failed in {}: {}",
            args.join(" "),
            dir.display(),
            stderr.trim()
        ));
    }

    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}


#[cfg(test)]
mod tests {
    use super::test_support::init_repo;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_plain_directory_has_no_git_info() {
        let temp = TempDir::new().unwrap();
        let info = read_git_info(temp.path(), &[]);
        assert_eq!(info, GitInfo::default());
        assert!(!is_git_checkout(temp.path()));
    }

    #[test]
    fn test_reads_git_info() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("app1");
        let rev = init_repo(&repo, Some(("origin", "https://example.com/app1.git")));

        let info = read_git_info(&repo, &["upstream".to_string(), "origin".to_string()]);
        assert_eq!(info.revision.as_deref(), Some(rev.as_str()));
        assert_eq!(info.branch.as_deref(), Some("main"));
        assert_eq!(info.remote.as_deref(), Some("https://example.com/app1.git"));
        assert_eq!(info.dirty, Some(false));

        std::fs::write(repo.join("README.md"), "changed\n").unwrap();
        let info = read_git_info(&repo, &[]);
        assert_eq!(info.dirty, Some(true));
    }

    #[test]
    fn test_prefers_upstream_remote() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("app1");
        init_repo(&repo, Some(("origin", "https://example.com/fork.git")));
        super::test_support::git(
            &repo,
            &["remote", "add", "upstream", "https://example.com/upstream.git"],
        );

        let info = read_git_info(&repo, &["upstream".to_string(), "origin".to_string()]);
        assert_eq!(
            info.remote.as_deref(),
            Some("https://example.com/upstream.git")
        );
    }

    #[test]
    fn test_detached_head_has_no_branch() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("app1");
        let rev = init_repo(&repo, None);
        super::test_support::git(&repo, &["checkout", "--quiet", "--detach", "HEAD"]);

        let info = read_git_info(&repo, &[]);
        assert_eq!(info.revision.as_deref(), Some(rev.as_str()));
        assert_eq!(info.branch, None);
        assert_eq!(info.remote, None);
    }
}
