use logship::cli::run::{process_components, run_pass};
use logship::config::types::ComponentType;
use logship::config::{generate::generate_starter_config, load_config, ConfigError};
use logship::source::level::LogLevel;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_generated_config_is_valid() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    fs::write(&config_path, generate_starter_config()).unwrap();

    let config = load_config(&config_path).expect("Generated config should be valid");

    assert_eq!(config.device.thing_name.as_deref(), Some("my-thing"));
    assert_eq!(config.components.len(), 2);
    assert_eq!(config.components[0].files.len(), 2);
    assert_eq!(config.components[1].component_type, ComponentType::System);
    assert_eq!(config.components[1].min_level, LogLevel::Warn);
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();

    let result = load_config(&temp_dir.path().join("nope.yml"));

    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_tilde_expansion_in_paths() {
    let yaml = r#"
device:
  thing_name: t
  region: us-east-1
components:
  - name: app
    files:
      - path: ~/logs/app.log
"#;

    let config = logship::config::parse_config(yaml).unwrap();

    if let Some(home) = dirs::home_dir() {
        assert_eq!(config.components[0].files[0].path, home.join("logs/app.log"));
    }
}

#[test]
fn test_thing_name_defaults_to_host_name() {
    let yaml = "device:\n  region: us-east-1\n";

    let config = logship::config::parse_config(yaml).unwrap();

    assert!(config.device.thing_name.is_some_and(|name| !name.is_empty()));
}

#[tokio::test]
async fn test_run_pass_reports_attempts_and_pending() {
    let temp_dir = TempDir::new().unwrap();
    let app_log = temp_dir.path().join("app.log");
    let sys_log = temp_dir.path().join("greengrass.log");
    fs::write(&app_log, "hello\nworld\n").unwrap();
    fs::write(
        &sys_log,
        "{\"level\":\"INFO\",\"timestamp\":1607990400000,\"message\":\"skip\"}\n\
         {\"level\":\"ERROR\",\"timestamp\":1607990400001,\"message\":\"keep\"}\n",
    )
    .unwrap();

    let config_path = temp_dir.path().join("config.yml");
    let yaml = format!(
        r#"
device:
  thing_name: "gw:1"
  region: eu-central-1
components:
  - name: com.example.App
    files:
      - path: {}
  - name: System
    type: system
    min_level: warn
    files:
      - path: {}
"#,
        app_log.display(),
        sys_log.display()
    );
    fs::write(&config_path, yaml).unwrap();

    let report = run_pass(&config_path).await.unwrap();

    assert_eq!(report.attempts.len(), 2);
    assert_eq!(
        report.attempts[0].log_group_name,
        "/aws/greengrass/UserComponent/eu-central-1/com.example.App"
    );
    assert_eq!(report.attempts[0].event_count(), 2);

    let system = &report.attempts[1];
    assert_eq!(
        system.log_group_name,
        "/aws/greengrass/GreengrassSystemComponent/eu-central-1/System"
    );
    let bucket = &system.log_streams["/2020/12/15/thing/gw+1"];
    assert_eq!(bucket.log_events.len(), 1);
    assert!(bucket.log_events[0].message.contains("keep"));

    assert!(report.pending["com.example.App"].is_empty());
    assert!(report.pending["System"].is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["attempts"][0]["attemptId"].is_string());
}

#[tokio::test]
async fn test_process_components_without_components() {
    let config = logship::config::parse_config("device:\n  thing_name: t\n  region: r\n").unwrap();

    let report = process_components(&config).await.unwrap();

    assert!(report.attempts.is_empty());
    assert!(report.pending.is_empty());
}
