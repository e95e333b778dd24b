use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::tempdir;
use versa_config::{ConfigError, JdkConfig, LoggingConfig, OutputConfig, OutputFormat, VersaConfig};

#[test]
fn empty_config_uses_defaults() {
    let config = VersaConfig::load_from_str("").unwrap();
    assert_eq!(config, VersaConfig::default());
    assert_eq!(config.output.dir, PathBuf::from("generated"));
    assert_eq!(config.output.format, OutputFormat::Bytecode);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn full_config_parses() {
    let text = r#"
version_package = "v1_16_5"
classpath = ["libs/minecraft.jar", "build/classes"]

[jdk]
home = "/usr/lib/jvm/java-17"

[output]
dir = "out"
format = "java"

[logging]
level = "debug"
json = true
"#;
    let config = VersaConfig::load_from_str(text).unwrap();
    assert_eq!(
        config,
        VersaConfig {
            version_package: "v1_16_5".to_owned(),
            classpath: vec![PathBuf::from("libs/minecraft.jar"), PathBuf::from("build/classes")],
            jdk: JdkConfig {
                home: Some(PathBuf::from("/usr/lib/jvm/java-17")),
            },
            output: OutputConfig {
                dir: PathBuf::from("out"),
                format: OutputFormat::Java,
            },
            logging: LoggingConfig {
                level: "debug".to_owned(),
                json: true,
            },
        }
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let err = VersaConfig::load_from_str("[output]\nformat = \"java\"\nsplit = true\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(ref message) if message.contains("split")), "{err}");

    let err = VersaConfig::load_from_str("[output]\nformat = \"jar\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn load_from_path_resolves_against_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("versa.toml");
    std::fs::write(&path, "version_package = \"v2\"\nclasspath = [\"libs/a.jar\"]\n").unwrap();

    let config = VersaConfig::load_from_path(&path).unwrap();
    assert_eq!(config.version_package, "v2");
    assert_eq!(config.classpath, vec![dir.path().join("libs/a.jar")]);
    assert_eq!(config.output.dir, dir.path().join("generated"));
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = VersaConfig::load_from_path(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, path.display().to_string()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn init_tracing_is_idempotent() {
    let logging = LoggingConfig::default();
    versa_config::init_tracing(&logging);
    versa_config::init_tracing(&logging);
    tracing::info!("still logging");
}
