use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A scratch cache home plus a source tree to cache from
struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = tempdir().unwrap();
        write_file(&temp.path().join("src/notes.txt"), "hello");
        write_file(&temp.path().join("src/docs/guide.md"), "# guide");
        Self { temp }
    }

    fn home(&self) -> std::path::PathBuf {
        self.temp.path().join("home")
    }

    fn source(&self, rel: &str) -> String {
        self.temp.path().join("src").join(rel).to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cacher"));
        cmd.env_remove("CACHER_HOME")
            .env_remove("CACHER_TIMEOUT")
            .env_remove("CACHER_INTERVAL")
            .env_remove("CACHER_GITHUB_API")
            .env_remove("RUST_LOG")
            .arg("--home")
            .arg(self.home());
        cmd
    }

    /// Cache a local path and return the reported item
    fn cache_local(&self, rel: &str) -> Value {
        let assert = self
            .cmd()
            .arg("cache")
            .arg("localTarget")
            .arg(format!("path={}", self.source(rel)))
            .assert()
            .success();
        let items = parse_jsonl(&assert.get_output().stdout);
        assert_eq!(items.len(), 1);
        items[0].clone()
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(|v| v.as_str()).unwrap_or_default()
}

#[test]
fn cache_local_file_dedups_equivalent_paths() {
    let ws = Workspace::new();

    let first = ws.cache_local("notes.txt");
    assert_eq!(str_field(&first, "kind"), "item");
    assert_eq!(str_field(&first, "type"), "localTarget");
    let id = str_field(&first, "id").to_string();
    assert_eq!(id.len(), 36);

    let content = Path::new(str_field(&first, "path")).join("notes.txt");
    assert_eq!(fs::read_to_string(content).unwrap(), "hello");

    let second = ws.cache_local("./notes.txt");
    assert_eq!(str_field(&second, "id"), id);

    let assert = ws.cmd().arg("list").assert().success();
    assert_eq!(parse_jsonl(&assert.get_output().stdout).len(), 1);
}

#[test]
fn cache_local_directory_copies_contents() {
    let ws = Workspace::new();
    let item = ws.cache_local("docs");
    let guide = Path::new(str_field(&item, "path")).join("guide.md");
    assert_eq!(fs::read_to_string(guide).unwrap(), "# guide");
}

#[test]
fn cache_alias_matches_full_kind_name() {
    let ws = Workspace::new();
    let full = ws.cache_local("notes.txt");

    let assert = ws
        .cmd()
        .arg("cache")
        .arg("local")
        .arg(format!("path={}", ws.source("notes.txt")))
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(str_field(&items[0], "id"), str_field(&full, "id"));
}

#[test]
fn cache_rejects_insufficient_parameters() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("cache")
        .arg("githubRawFile")
        .arg("owner=o")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid reference"));

    assert!(!ws.home().join("cache.json").exists());
}

#[test]
fn cache_rejects_unknown_keys() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("cache")
        .arg("webTarget")
        .arg("colour=blue")
        .assert()
        .failure();
}

#[test]
fn cache_missing_local_path_is_not_found() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("cache")
        .arg("localTarget")
        .arg(format!("path={}", ws.source("absent.txt")))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn resolve_prints_canonical_form_without_caching() {
    let ws = Workspace::new();
    let assert = ws
        .cmd()
        .arg("resolve")
        .arg("raw")
        .arg("https://github.com/o/r/blob/main/docs/a.md")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);
    assert_eq!(str_field(&items[0], "kind"), "resolved");
    assert_eq!(
        str_field(&items[0], "signature"),
        "https://raw.githubusercontent.com/o/r/main/docs/a.md"
    );
    assert_eq!(items[0]["data"]["meta"]["path"], "docs/a.md");
    assert!(!ws.home().join("cache.json").exists());
}

#[test]
fn list_filters_by_kind_and_renders_table() {
    let ws = Workspace::new();
    let item = ws.cache_local("notes.txt");
    let id = str_field(&item, "id");

    let assert = ws.cmd().args(["list", "-c", "web"]).assert().success();
    assert!(parse_jsonl(&assert.get_output().stdout).is_empty());

    ws.cmd()
        .args(["--format", "table", "--no-color", "list"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ID"))
        .stdout(predicate::str::contains(&id[..8]))
        .stdout(predicate::str::contains("localTarget"));
}

#[test]
fn query_finds_item_by_short_id_and_value() {
    let ws = Workspace::new();
    let item = ws.cache_local("notes.txt");
    let id = str_field(&item, "id").to_string();
    let signature = str_field(&item, "signature").to_string();

    let assert = ws
        .cmd()
        .arg("query")
        .arg(format!("localTarget/{}", &id[..8]))
        .assert()
        .success();
    assert_eq!(str_field(&parse_jsonl(&assert.get_output().stdout)[0], "id"), id);

    let assert = ws.cmd().arg("query").arg(&signature).assert().success();
    assert_eq!(str_field(&parse_jsonl(&assert.get_output().stdout)[0], "id"), id);

    ws.cmd()
        .arg("query")
        .arg("nothing-like-this")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn check_is_noop_until_forced() {
    let ws = Workspace::new();
    let item = ws.cache_local("notes.txt");
    let id = str_field(&item, "id");

    let assert = ws.cmd().args(["check", "--id", id]).assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(str_field(&items[0], "message"), "not due for checking");

    fs::write(ws.source("notes.txt"), "changed").unwrap();
    let assert = ws.cmd().args(["check", "--id", id, "-f"]).assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(str_field(&items[0], "message"), "refreshed");

    let content = Path::new(str_field(&items[0], "path")).join("notes.txt");
    assert_eq!(fs::read_to_string(content).unwrap(), "changed");
}

#[test]
fn check_refetches_emptied_item() {
    let ws = Workspace::new();
    let item = ws.cache_local("notes.txt");
    let dir = Path::new(str_field(&item, "path")).to_path_buf();
    fs::remove_file(dir.join("notes.txt")).unwrap();

    let assert = ws
        .cmd()
        .args(["check", "-c", "local", "-a"])
        .arg(format!("path={}", ws.source("notes.txt")))
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(str_field(&items[0], "message"), "refreshed");
    assert!(dir.join("notes.txt").exists());
}

#[test]
fn check_requires_a_target() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--id"));
}

#[test]
fn path_resolves_subpaths_inside_item() {
    let ws = Workspace::new();
    let item = ws.cache_local("docs");
    let id = str_field(&item, "id");

    let assert = ws
        .cmd()
        .args(["path", "--id", id, "guide.md"])
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let path = str_field(&items[0], "path");
    assert!(path.ends_with("/guide.md"));

    ws.cmd()
        .args(["path", "--id", id, "missing.md"])
        .assert()
        .failure();
}

#[test]
fn remove_deletes_record_and_content() {
    let ws = Workspace::new();
    let item = ws.cache_local("notes.txt");
    let id = str_field(&item, "id");
    let dir = Path::new(str_field(&item, "path")).to_path_buf();

    let assert = ws.cmd().args(["remove", "--id", id]).assert().success();
    assert_eq!(
        str_field(&parse_jsonl(&assert.get_output().stdout)[0], "message"),
        "removed"
    );
    assert!(!dir.exists());

    ws.cmd()
        .args(["remove", "--id", id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn purge_force_clears_everything() {
    let ws = Workspace::new();
    ws.cache_local("notes.txt");
    ws.cache_local("docs");

    ws.cmd()
        .args(["purge", "-f"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache purged"));

    let assert = ws.cmd().arg("list").assert().success();
    assert!(parse_jsonl(&assert.get_output().stdout).is_empty());
    let root = ws.home().join("cache");
    assert!(root.is_dir());
    assert_eq!(fs::read_dir(root).unwrap().count(), 0);
}

#[test]
fn purge_removes_orphans_after_confirmation() {
    let ws = Workspace::new();
    let item = ws.cache_local("notes.txt");
    let stray = ws.home().join("cache").join("stray");
    fs::create_dir_all(&stray).unwrap();

    let assert = ws
        .cmd()
        .arg("purge")
        .write_stdin("n\n")
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(str_field(&items[0], "kind"), "orphan");
    assert_eq!(str_field(&items[0], "id"), "stray");
    assert_eq!(str_field(&items[1], "message"), "cache not purged");
    assert!(stray.exists());

    let assert = ws.cmd().args(["purge", "-y"]).assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(str_field(&items[1], "message"), "removed 1 orphan entry");
    assert!(!stray.exists());
    assert!(Path::new(str_field(&item, "path")).exists());
}

#[test]
fn purge_without_orphans_reports_nothing_to_do() {
    let ws = Workspace::new();
    ws.cache_local("notes.txt");
    ws.cmd()
        .arg("purge")
        .assert()
        .success()
        .stdout(predicate::str::contains("no orphan entries"));
}

#[test]
fn store_survives_between_invocations_in_order() {
    let ws = Workspace::new();
    let a = ws.cache_local("notes.txt");
    let b = ws.cache_local("docs");

    let assert = ws.cmd().arg("list").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let ids: Vec<_> = items.iter().map(|v| str_field(v, "id")).collect();
    assert_eq!(ids, vec![str_field(&a, "id"), str_field(&b, "id")]);

    let doc: Value =
        serde_json::from_str(&fs::read_to_string(ws.home().join("cache.json")).unwrap()).unwrap();
    let record = &doc[str_field(&a, "id")];
    assert_eq!(record["resource"]["type"], "localTarget");
    assert!(record["lastChecked"].is_string());
    assert_eq!(record["checkInterval"], 86400);
}

#[test]
fn interval_zero_records_no_interval() {
    let ws = Workspace::new();
    let assert = ws
        .cmd()
        .args(["--interval", "0", "cache", "local"])
        .arg(format!("path={}", ws.source("notes.txt")))
        .assert()
        .success();
    let id = str_field(&parse_jsonl(&assert.get_output().stdout)[0], "id").to_string();

    let doc: Value =
        serde_json::from_str(&fs::read_to_string(ws.home().join("cache.json")).unwrap()).unwrap();
    assert!(doc[&id]["checkInterval"].is_null());
}

#[test]
fn failures_print_an_error_item() {
    let ws = Workspace::new();
    let assert = ws
        .cmd()
        .args(["remove", "--id", "no-such-item"])
        .assert()
        .failure();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 1);
    assert_eq!(str_field(&items[0], "kind"), "error");
    assert_eq!(items[0]["errors"][0]["code"], "NOT_FOUND");
}

#[test]
fn resolve_accepts_url_with_query_string() {
    let ws = Workspace::new();
    let assert = ws
        .cmd()
        .args(["resolve", "web", "https://example.com/dl?file=a.zip"])
        .assert()
        .success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(
        str_field(&items[0], "signature"),
        "https://example.com/dl?file=a.zip"
    );
}

#[test]
fn unknown_format_is_rejected() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["--format", "xml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}

#[test]
fn doctor_reports_home_state() {
    let ws = Workspace::new();
    let assert = ws.cmd().arg("doctor").assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(items.len(), 4);
    assert!(items.iter().all(|v| str_field(v, "kind") == "status"));
    assert!(str_field(&items[0], "message").contains("git"));
}
