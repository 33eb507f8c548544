//! Unit tests for config file resolution and graceful degradation
//!
//! Tests that manipulate FLING_CONFIG are marked with #[serial] so they run
//! sequentially.

use fling_common::config::{load_toml_or_default, resolve_config_path};
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, PartialEq)]
struct SampleConfig {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    name: Option<String>,
}

fn default_port() -> u16 {
    4000
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self { port: default_port(), name: None }
    }
}

#[test]
#[serial]
fn test_cli_argument_has_priority() {
    env::set_var("FLING_TEST_CONFIG", "/from/env.toml");
    let path = resolve_config_path(Some(Path::new("/from/cli.toml")), "FLING_TEST_CONFIG");
    assert_eq!(path, Some(PathBuf::from("/from/cli.toml")));
    env::remove_var("FLING_TEST_CONFIG");
}

#[test]
#[serial]
fn test_environment_variable_used_without_cli() {
    env::set_var("FLING_TEST_CONFIG", "/from/env.toml");
    let path = resolve_config_path(None, "FLING_TEST_CONFIG");
    assert_eq!(path, Some(PathBuf::from("/from/env.toml")));
    env::remove_var("FLING_TEST_CONFIG");
}

#[test]
fn test_missing_file_yields_defaults() {
    let config: SampleConfig =
        load_toml_or_default(Some(Path::new("/definitely/not/here/config.toml"))).unwrap();
    assert_eq!(config, SampleConfig::default());

    let config: SampleConfig = load_toml_or_default(None).unwrap();
    assert_eq!(config.port, 4000);
}

#[test]
fn test_file_values_override_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name = \"living-room\"").unwrap();

    let config: SampleConfig = load_toml_or_default(Some(file.path())).unwrap();
    assert_eq!(config.port, 4000);
    assert_eq!(config.name.as_deref(), Some("living-room"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();

    let result: fling_common::Result<SampleConfig> = load_toml_or_default(Some(file.path()));
    assert!(matches!(result, Err(fling_common::Error::Config(_))));
}
