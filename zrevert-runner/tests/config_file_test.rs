//! Loading session configs from disk and launching from them.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use zrevert_core::ConfigError;
use zrevert_runner::{launch, launch_from_file, PaperVenue, SchedulerError, SessionConfig};

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn partial_file_fills_defaults() {
    let file = write_config(
        r#"
market_id = 3
tick_interval_ms = 1000

[risk]
period = 30
max_window = 120
"#,
    );
    let config = SessionConfig::from_file(file.path()).unwrap();
    assert_eq!(config.market_id, 3);
    assert_eq!(config.tick_interval(), Duration::from_secs(1));
    assert_eq!(config.risk.period, 30);
    assert_eq!(config.risk.entry_z, 2.0);
}

#[test]
fn written_config_loads_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    let mut config = SessionConfig::default();
    config.risk.max_confidence_fraction = Some(0.01);
    std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

    let loaded = SessionConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.risk.fingerprint(), config.risk.fingerprint());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SessionConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let file = write_config("[risk]\nentry_z = 0.2\nexit_z = 0.5\n");
    let err = SessionConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "exit_z", .. }));
}

#[tokio::test(start_paused = true)]
async fn launch_from_file_starts_ticking() {
    let file = write_config("tick_interval_ms = 500\n");
    let venue = Arc::new(PaperVenue::scripted(&[100.0; 5]));

    let mut scheduler = launch_from_file(file.path(), venue.clone(), venue.clone()).unwrap();
    assert!(scheduler.is_running());
    tokio::time::sleep(Duration::from_millis(1_200)).await;
    scheduler.shutdown().await;

    // Ticks at 0, 500 and 1000 ms.
    assert_eq!(scheduler.ticks_completed(), 3);
    assert_eq!(venue.price_requests(), 3);
}

#[tokio::test]
async fn launch_from_bad_file_reports_context() {
    let file = write_config("tick_interval_ms = 0\n");
    let venue = Arc::new(PaperVenue::scripted(&[100.0]));

    let Err(err) = launch_from_file(file.path(), venue.clone(), venue) else {
        panic!("zero interval must not launch");
    };
    assert!(format!("{err:#}").contains("loading session config"));
}

#[tokio::test]
async fn launch_rejects_invalid_risk_config() {
    let mut config = SessionConfig::default();
    config.risk.period = 1;
    let venue = Arc::new(PaperVenue::scripted(&[100.0]));

    let Err(err) = launch(config, venue.clone(), venue) else {
        panic!("invalid risk config must not launch");
    };
    assert!(matches!(err, SchedulerError::Config(ConfigError::Invalid { .. })));
}
