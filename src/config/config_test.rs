use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_kibitz_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("KIBITZ__") {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let settings = Settings::default();

    assert_eq!(settings.server.port, 5000);
    assert_eq!(settings.server.serve_path, "/analysis.pl");
    assert_eq!(settings.server.hash_path, "/hash");
    assert_eq!(settings.server.poll_timeout_secs, None);
    assert_eq!(settings.ingest.history, 5);
    assert_eq!(settings.ingest.heartbeat_secs, 30);
    assert_eq!(settings.ingest.max_bytes, 1_048_576);
    assert_eq!(settings.viewers.window_secs, 5);
    assert_eq!(settings.probe.backends.len(), 2);
    assert!(settings.validate().is_ok());
}

#[test]
#[serial]
fn load_should_merge_environment_overrides() {
    cleanup_all_kibitz_env_vars();
    with_vars(
        vec![
            ("KIBITZ__SERVER__PORT", Some("8080")),
            ("KIBITZ__VIEWERS__WINDOW_SECS", Some("60")),
        ],
        || {
            let settings = Settings::load(None).unwrap();

            assert_eq!(settings.server.port, 8080);
            assert_eq!(settings.viewers.window_secs, 60);
        },
    );
}

#[test]
#[serial]
fn load_should_merge_override_file_settings() {
    cleanup_all_kibitz_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("deploy.toml");

    std::fs::write(
        &config_path,
        r#"
        [server]
        poll_timeout_secs = 30

        [ingest]
        file = "/srv/analysis/analysis.json"
        history = 3
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        let settings = Settings::load(config_path.to_str()).unwrap();

        assert_eq!(settings.server.poll_timeout_secs, Some(30));
        assert_eq!(
            settings.ingest.file.as_os_str().to_str(),
            Some("/srv/analysis/analysis.json")
        );
        assert_eq!(settings.ingest.history, 3);
    });
}

#[test]
fn validation_should_fail_with_invalid_settings() {
    let mut settings = Settings::default();
    settings.ingest.history = 0;
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.server.serve_path = "analysis.pl".to_string();
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.server.poll_timeout_secs = Some(0);
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.probe.backends.clear();
    assert!(settings.validate().is_err());
}
