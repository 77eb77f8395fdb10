use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn defaults_point_at_local_server() {
    let config = ClientConfig::default();
    assert_eq!(config.api_url, "http://localhost:8000");
    assert_eq!(config.socket_url, "http://localhost:8000");
    assert_eq!(config.typing_stop_delay(), Duration::from_millis(1000));
}

#[test]
fn file_values_override_defaults_and_keep_the_rest() {
    let mut config = ClientConfig::default();
    apply_file(
        &mut config,
        r#"
api_url = "https://api.example.test"
typing_stop_delay_ms = 250
"#,
    )
    .expect("apply file");

    assert_eq!(config.api_url, "https://api.example.test");
    assert_eq!(config.typing_stop_delay_ms, 250);
    assert_eq!(config.socket_path, "/ws");
}

#[test]
fn malformed_file_is_rejected() {
    let mut config = ClientConfig::default();
    let err = apply_file(&mut config, "api_url = [").expect_err("must fail");
    assert!(err.to_string().contains("invalid client config file"));
}

#[test]
fn env_overrides_win_and_ignore_unparsable_numbers() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("CHAT_SOCKET_URL", "wss://rt.example.test"),
        ("CHAT_TYPING_STOP_DELAY_MS", "soon"),
    ]);
    let mut config = ClientConfig::default();
    apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(config.socket_url, "wss://rt.example.test");
    assert_eq!(config.typing_stop_delay_ms, DEFAULT_TYPING_STOP_DELAY_MS);
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("chat_client_missing_{suffix}.toml"));

    let err = load_config(Some(&path)).expect_err("must fail");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn explicit_config_file_is_loaded() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("chat_client_config_{suffix}.toml"));
    fs::write(&path, "socket_path = \"/realtime\"\nevent_buffer = 0\n").expect("write config");

    let config = load_config(Some(&path)).expect("load");
    assert_eq!(config.socket_path, "/realtime");
    assert_eq!(config.event_buffer, 1);

    fs::remove_file(path).expect("cleanup");
}
