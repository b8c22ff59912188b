use std::{env, fs};

use syncline_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    // Create a temporary TOML configuration file
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("syncline.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081

[logging]
level = "debug"

[sync]
mode = "registry"
interval_secs = 30
max_in_flight = 2
tolerance_factor = 2

[registry]
catalog_base_url = "https://api.catalog.example.com/v2"
catalog_user_secret = "user-secret"
catalog_organization_secret = "org-secret"
catalog_tags = ["crm", "prod"]
registry_base_url = "https://registry.example.com"
registry_tenant = "tenant-1"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses; defaults fill the unspecified fields
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.sync.interval_secs, 30);
    assert_eq!(cfg.sync.max_in_flight, 2);
    assert_eq!(cfg.sync.tolerance_factor, 2);
    assert_eq!(cfg.logging.level.to_ascii_lowercase(), "debug");
    let registry = cfg.registry.as_ref().expect("registry section");
    assert_eq!(registry.catalog_tags, vec!["crm", "prod"]);
    assert_eq!(registry.name_prefix, "instance");
    assert_eq!(registry.effective_context(), "api.catalog.example.com");
    assert_eq!(
        registry.effective_api_target_url(),
        "https://api.catalog.example.com/v2"
    );

    // 2) Env override should win over file
    unsafe {
        env::set_var("SYNCLINE__SYNC__INTERVAL_SECS", "90");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.sync.interval_secs, 90);
    // cleanup env var
    unsafe {
        env::remove_var("SYNCLINE__SYNC__INTERVAL_SECS");
    }

    // 3) Invalid config (mode without its section) should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[sync]
mode = "webhooks"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("[webhooks] section is required"));
}
