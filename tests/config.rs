//! Config files on disk: load, save, and diagnostics for broken files.

use shape_captions::captioner::Mode;
use shape_captions::config::DatasetConfig;
use shape_captions::error::ConfigError;
use shape_captions::presets;

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.toml");

    let mut config = presets::load("logical").unwrap();
    config.generator.mode = Mode::Test;
    config.generator.seed = 17;
    config.save(&path).unwrap();

    let loaded = DatasetConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.build().is_ok());
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = DatasetConfig::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn parse_errors_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[captioner]\ncomponent = \"no-such-component\"\n").unwrap();
    match DatasetConfig::load(&path) {
        Err(ConfigError::Parse { path: reported, .. }) => assert!(reported.ends_with("broken.toml")),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn invalid_policy_fails_at_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rates.toml");
    std::fs::write(
        &path,
        r#"
        [captioner]
        component = "existential"

        [captioner.restrictor]
        component = "regular-type"
        hypernym_rate = 1.5
        "#,
    )
    .unwrap();
    let config = DatasetConfig::load(&path).unwrap();
    assert!(matches!(config.build(), Err(ConfigError::InvalidRate { .. })));
}
