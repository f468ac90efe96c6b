//! Config loading and cache-service integration tests.

use std::path::PathBuf;
use std::time::Duration;

use assert_fs::prelude::*;
use platsync_core::{
    config, CoreError, Config, Environment, EnvironmentCache, EnvironmentId, FileEnvironmentCache,
    ProjectId,
};
use rstest::rstest;

fn env(id: &str, dirty: bool) -> Environment {
    Environment {
        id: EnvironmentId::from(id),
        title: id.to_string(),
        parent: Some(EnvironmentId::from("master")),
        is_dirty: dirty,
        machine_name: format!("{id}-abc123"),
        variables: [("internal_site_code".to_string(), "acme".to_string())]
            .into_iter()
            .collect(),
        operations: vec!["branch".to_string()],
    }
}

// ---------------------------------------------------------------------------
// 1. Config
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".platsync/config.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = Config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"), "must contain file path, got: {err}");
}

#[test]
fn empty_config_file_yields_defaults() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".platsync/config.yaml").write_str("\n").expect("write");
    let config = Config::load_at(home.path()).expect("load");
    assert_eq!(config.git_remote_name, Config::default().git_remote_name);
}

#[rstest]
#[case("profiles_root: ~/work/profiles\n", "work/profiles")]
#[case("profiles_root: \"~\"\n", "")]
fn tilde_in_profiles_root_is_expanded(#[case] yaml: &str, #[case] rel: &str) {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".platsync/config.yaml").write_str(yaml).expect("write");
    let config = Config::load_at(home.path()).expect("load");
    assert_eq!(config.profiles_root, home.path().join(rel));
}

#[test]
fn absolute_sites_root_is_kept() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".platsync/config.yaml")
        .write_str("sites_root: /var/www/sites\nwait_timeout_secs: 5\n")
        .expect("write");
    let config = Config::load_at(home.path()).expect("load");
    assert_eq!(config.sites_root, PathBuf::from("/var/www/sites"));
    assert_eq!(config.wait_timeout(), Duration::from_secs(5));
}

// ---------------------------------------------------------------------------
// 2. File cache
// ---------------------------------------------------------------------------

#[test]
fn file_cache_lives_under_platsync_dir() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let cache = FileEnvironmentCache::new(home.path(), Duration::from_secs(600));
    let project = ProjectId::from("abc123");
    assert_eq!(
        cache.entry_path(&project).expect("safe id"),
        config::cache_dir_at(home.path()).join("abc123.json")
    );
}

#[test]
fn file_cache_preserves_environment_fields() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let cache = FileEnvironmentCache::new(home.path(), Duration::from_secs(600));
    let project = ProjectId::from("abc123");
    cache.put(&project, vec![env("develop", true)]);

    let hit = cache.get(&project).expect("cache hit");
    assert_eq!(hit, vec![env("develop", true)]);
}

#[test]
fn file_cache_entries_are_per_project() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let cache = FileEnvironmentCache::new(home.path(), Duration::from_secs(600));
    let a = ProjectId::from("a");
    let b = ProjectId::from("b");
    cache.put(&a, vec![env("master", false)]);
    cache.put(&b, vec![env("develop", false)]);

    cache.invalidate(&a);
    assert!(cache.get(&a).is_none());
    assert!(cache.get(&b).is_some());
}
