use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_dir(label: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("ride_cli_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn missing_settings_file_falls_back_to_defaults() {
    let dir = temp_dir("missing");
    let settings = read_settings_file(&dir.join("ride.toml")).expect("defaults");

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.backend_choice(), BackendChoice::Missing);

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn settings_file_overrides_selected_keys() {
    let dir = temp_dir("file");
    let path = dir.join("ride.toml");
    fs::write(
        &path,
        r#"
api_url = "https://abc123.execute-api.us-east-1.amazonaws.com/prod"
auth_token = "token-from-file"
fleet = ["Bucephalus"]
"#,
    )
    .expect("write settings");

    let settings = read_settings_file(&path).expect("settings");
    assert_eq!(settings.auth_token.as_deref(), Some("token-from-file"));
    assert_eq!(settings.fleet, ["Bucephalus"]);
    assert_eq!(settings.ride_path, "/ride");
    assert_eq!(
        settings.backend_choice(),
        BackendChoice::Http {
            api_url: "https://abc123.execute-api.us-east-1.amazonaws.com/prod".to_string()
        }
    );

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn malformed_settings_file_is_an_error() {
    let dir = temp_dir("bad");
    let path = dir.join("ride.toml");
    fs::write(&path, "simulate = \"sometimes\"").expect("write settings");

    let err = read_settings_file(&path).expect_err("should fail");
    assert!(err.to_string().contains("failed to parse settings file"));

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn app_prefixed_env_wins_over_short_names() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("RIDE_API_URL", "https://short.example.com"),
            ("APP__API_URL", "https://app.example.com"),
            ("RIDE_AUTH_TOKEN", "short-token"),
            ("APP__SIMULATED_ETA_SECONDS", "5"),
        ]),
    );

    assert_eq!(settings.api_url.as_deref(), Some("https://app.example.com"));
    assert_eq!(settings.auth_token.as_deref(), Some("short-token"));
    assert_eq!(settings.simulated_eta_seconds, 5);
}

#[test]
fn unparsable_env_numbers_are_ignored() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("APP__SIMULATED_ETA_SECONDS", "soon"),
            ("APP__SIMULATE", "maybe"),
        ]),
    );

    assert_eq!(settings.simulated_eta_seconds, 30);
    assert!(!settings.simulate);
}

#[test]
fn simulation_takes_precedence_over_api_url() {
    let settings = Settings {
        api_url: Some("https://api.example.com".into()),
        simulate: true,
        ..Settings::default()
    };
    assert_eq!(settings.backend_choice(), BackendChoice::Simulated);

    let blank = Settings {
        api_url: Some("   ".into()),
        ..Settings::default()
    };
    assert_eq!(blank.backend_choice(), BackendChoice::Missing);
}
