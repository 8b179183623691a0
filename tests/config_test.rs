//! Integration tests for Settings loading with layered precedence.
//!
//! Precedence (lowest to highest): defaults, global file, explicit file,
//! `BOARDTREE_*` variables. The environment is injected as a map so tests
//! never touch process state.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;

use boardtree::application::ApplicationError;
use boardtree::config::Settings;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

// ============================================================
// File layers
// ============================================================

#[test]
fn given_global_file_when_loading_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let global = write(&dir, "global.toml", "[fetch]\nlatency_ms = 10\n");

    // Act
    let settings = Settings::load_layers(Some(&global), None, env(&[])).unwrap();

    // Assert: only the named key changes
    assert_eq!(settings.fetch.latency_ms, 10);
    assert_eq!(settings.fetch.timeout_ms, 5_000);
    assert_eq!(settings.defaults.card_title, "New Task");
}

#[test]
fn given_global_and_explicit_files_when_loading_then_explicit_wins() {
    let dir = TempDir::new().unwrap();
    let global = write(
        &dir,
        "global.toml",
        "[fetch]\nlatency_ms = 10\n[defaults]\nnode_name = \"Global\"\n",
    );
    let explicit = write(&dir, "explicit.toml", "[fetch]\nlatency_ms = 20\n");

    let settings = Settings::load_layers(Some(&global), Some(&explicit), env(&[])).unwrap();

    assert_eq!(settings.fetch.latency_ms, 20);
    assert_eq!(settings.defaults.node_name, "Global");
}

#[test]
fn given_missing_explicit_file_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = Settings::load_layers(None, Some(&missing), env(&[])).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn given_missing_global_file_when_loading_then_ignored() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("global.toml");

    let settings = Settings::load_layers(Some(&missing), None, env(&[])).unwrap();

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_fail_ids_in_file_when_loading_then_list_parsed() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "c.toml", "[fetch]\nfail_ids = [\"1-1\", \"1-2\"]\n");

    let settings = Settings::load_layers(None, Some(&file), env(&[])).unwrap();

    assert_eq!(settings.fetch.fail_ids, vec!["1-1", "1-2"]);
}

// ============================================================
// Environment layer
// ============================================================

#[test]
fn given_env_vars_when_loading_then_override_files() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "c.toml", "[fetch]\nlatency_ms = 20\n");

    let settings = Settings::load_layers(
        None,
        Some(&file),
        env(&[
            ("BOARDTREE_FETCH__LATENCY_MS", "0"),
            ("BOARDTREE_FETCH__FAIL_IDS", "1-1,1-2-2"),
            ("BOARDTREE_DEFAULTS__CARD_TITLE", "Untitled"),
        ]),
    )
    .unwrap();

    assert_eq!(settings.fetch.latency_ms, 0);
    assert_eq!(settings.fetch.fail_ids, vec!["1-1", "1-2-2"]);
    assert_eq!(settings.defaults.card_title, "Untitled");
}

#[test]
fn given_unrelated_env_vars_when_loading_then_ignored() {
    let settings =
        Settings::load_layers(None, None, env(&[("OTHER_FETCH__LATENCY_MS", "1")])).unwrap();

    assert_eq!(settings.fetch.latency_ms, 500);
}

// ============================================================
// Validation
// ============================================================

#[rstest]
#[case("[fetch]\ntimeout_ms = 0\n", "timeout_ms")]
#[case("[defaults]\ncard_title = \"  \"\n", "card_title")]
#[case("[defaults]\nnode_name = \"\"\n", "node_name")]
fn given_invalid_values_when_loading_then_rejected(#[case] content: &str, #[case] key: &str) {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "bad.toml", content);

    let err = Settings::load_layers(None, Some(&file), env(&[])).unwrap_err();

    assert!(err.to_string().contains(key), "{} should mention {}", err, key);
}

#[test]
fn given_settings_when_rendered_then_toml_reloads_identically() {
    let dir = TempDir::new().unwrap();
    let mut original = Settings::default();
    original.fetch.latency_ms = 42;
    original.fetch.fail_ids = vec!["1-2".into()];
    let file = write(&dir, "round.toml", &original.to_toml().unwrap());

    let reloaded = Settings::load_layers(None, Some(&file), env(&[])).unwrap();

    assert_eq!(reloaded, original);
}
