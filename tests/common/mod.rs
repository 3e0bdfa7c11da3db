//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .output()
        .expect("git runs");
    assert!(out.status.success(), "git {:?} failed", args);
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

/// Bench with sites `a` and `b`, `app1` as a git checkout (when git exists)
/// and `app2` as a plain directory. Returns app1's revision if any.
pub fn create_bench(root: &Path) -> Option<String> {
    fs::create_dir_all(root.join("apps/app2")).unwrap();
    fs::write(root.join("apps/app2/setup.py"), "# plain app\n").unwrap();
    fs::create_dir_all(root.join("sites/assets/css")).unwrap();
    fs::write(root.join("sites/apps.txt"), "app1\napp2\n").unwrap();
    fs::write(root.join("sites/common_site_config.json"), "{}").unwrap();

    fs::create_dir_all(root.join("sites/a/private/backups")).unwrap();
    fs::create_dir_all(root.join("sites/a/public/files")).unwrap();
    fs::write(root.join("sites/a/site_config.json"), r#"{"db_name": "_a"}"#).unwrap();
    fs::write(
        root.join("sites/a/private/backups/20250101-database.sql.gz"),
        [0x1f, 0x8b, 0x08, 0x00, 0xde, 0xad, 0xbe, 0xef],
    )
    .unwrap();
    fs::write(root.join("sites/a/public/files/logo.png"), vec![7u8; 4096]).unwrap();

    fs::create_dir_all(root.join("sites/b/private/files")).unwrap();
    fs::write(root.join("sites/b/site_config.json"), r#"{"db_name": "_b"}"#).unwrap();
    fs::write(root.join("sites/b/private/files/report.csv"), "x,y\n1,2\n").unwrap();

    let app1 = root.join("apps/app1");
    fs::create_dir_all(&app1).unwrap();
    fs::write(app1.join("README.md"), "app1\n").unwrap();
    if !git_available() {
        return None;
    }
    git(&app1, &["init", "--quiet"]);
    git(&app1, &["add", "."]);
    git(&app1, &["commit", "--quiet", "-m", "initial"]);
    git(&app1, &["remote", "add", "upstream", "https://example.com/app1.git"]);
    Some(git(&app1, &["rev-parse", "HEAD"]))
}

/// Relative path -> contents for every file below `dir`
pub fn tree_contents(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut out = BTreeMap::new();
    collect(dir, dir, &mut out);
    out
}

fn collect(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_path_buf();
            out.insert(rel, fs::read(&path).unwrap());
        }
    }
}
