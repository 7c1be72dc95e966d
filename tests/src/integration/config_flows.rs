//! # Configuration Flows
//!
//! From a configuration file on disk to running modules and back:
//!
//! 1. **Layering**: defaults, file, then override string
//! 2. **First run**: `local_uid` generated, written back, stable afterwards
//! 3. **Module sections**: descriptors drive what the framework loads
//! 4. **Identity**: the configured address yields uid and IPv6 address

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use cfx_runtime::config::{
        gen_uid, ConfigError, ControllerConfig, NodeIdentity, PeerAddressBook,
    };
    use cfx_runtime::{builtin_catalog, Cfx};
    use cfx_types::{ModuleState, OverlayVariant};
    use serde_json::{json, Value};
    use tempfile::TempDir;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn write_config(dir: &TempDir, body: &Value) -> PathBuf {
        let path = dir.path().join("controller.json");
        fs::write(&path, serde_json::to_string_pretty(body).unwrap()).unwrap();
        path
    }

    fn group_vpn_document() -> Value {
        json!({
            "CFx": {
                "vpn_type": "GroupVPN",
                "xmpp_username": "alice@example.org",
                "xmpp_host": "xmpp.example.org",
                "ip4": "172.31.0.100"
            },
            "Logger": { "default_level": "debug" },
            "Watchdog": { "dependencies": ["Logger"], "enabled": false, "timer_interval": 2 }
        })
    }

    // =============================================================================
    // LAYERING
    // =============================================================================

    #[test]
    fn test_file_and_override_layering() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, &group_vpn_document());

        let mut config = ControllerConfig::load(&path).unwrap();
        config
            .apply_override(r#"{"CFx": {"contr_port": 6801}, "Unknown": {"x": 1}}"#)
            .unwrap();
        let settings = config.validate().unwrap();

        assert_eq!(settings.contr_port, 6801);
        assert_eq!(settings.svpn_port, 5800);
        assert_eq!(settings.xmpp_host.as_deref(), Some("xmpp.example.org"));
        assert!(config.section("Unknown").is_none());
        assert_eq!(
            config.section_names().collect::<Vec<_>>(),
            vec!["CFx", "Logger", "Watchdog"]
        );
    }

    #[test]
    fn test_missing_signaling_settings_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, &json!({ "CFx": { "ip4": "10.0.0.1" } }));

        let config = ControllerConfig::load(&path).unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("xmpp_username"))
        ));
    }

    #[test]
    fn test_unreadable_file_reported() {
        let dir = TempDir::new().unwrap();

        let err = ControllerConfig::load(&dir.path().join("missing.json")).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
    }

    // =============================================================================
    // FIRST RUN
    // =============================================================================

    #[test]
    fn test_generated_uid_survives_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, &group_vpn_document());

        let mut first = ControllerConfig::load(&path).unwrap();
        assert!(first.setup().unwrap());
        first.save(&path).unwrap();
        let uid = first.settings().unwrap().local_uid;

        let mut second = ControllerConfig::load(&path).unwrap();
        let changed = second.setup().unwrap();

        assert!(!changed);
        assert_eq!(uid.len(), 40);
        assert!(uid.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(second.settings().unwrap().local_uid, uid);
        assert_eq!(second.section("Watchdog"), first.section("Watchdog"));
    }

    // =============================================================================
    // MODULE SECTIONS
    // =============================================================================

    #[test]
    fn test_sections_drive_loading() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, &group_vpn_document());
        let config = ControllerConfig::load(&path).unwrap();

        let mut cfx = Cfx::new(&config, builtin_catalog()).unwrap();
        cfx.load_all().unwrap();
        cfx.start_all().unwrap();

        assert_eq!(cfx.load_order(), ["Logger"]);
        assert_eq!(cfx.module_state("Logger"), Some(ModuleState::Running));
        assert!(!cfx.is_loaded("Watchdog"));
        cfx.submit_cbt(cfx.create_cbt("Logger", "info", json!("hello")))
            .unwrap();
        assert!(cfx
            .submit_cbt(cfx.create_cbt("Watchdog", "PING", Value::Null))
            .is_err());

        let report = cfx.terminate();
        assert_eq!(report.joined, vec!["Logger"]);
    }

    #[test]
    fn test_malformed_section_rejected() {
        let config = ControllerConfig::from_value(json!({
            "Logger": { "dependencies": "CFx" }
        }))
        .unwrap();

        assert!(matches!(config.descriptors(), Err(ConfigError::Descriptor(_))));
        assert!(Cfx::new(&config, builtin_catalog()).is_err());
    }

    // =============================================================================
    // IDENTITY
    // =============================================================================

    #[test]
    fn test_group_vpn_identity_from_address() {
        let config = ControllerConfig::from_value(group_vpn_document()).unwrap();
        let settings = config.validate().unwrap();

        let identity = NodeIdentity::resolve(&config, &settings).unwrap();

        assert_eq!(identity.ip4.to_string(), "172.31.0.100");
        assert_eq!(identity.uid, gen_uid("172.31.0.100", 40).unwrap());
        assert!(identity.ip6.starts_with("fd50:0dbc:41f2:4a3c:"));
        assert_eq!(identity.ip6.split(':').count(), 8);
    }

    #[test]
    fn test_social_vpn_identity_uses_local_uid() {
        let config = ControllerConfig::from_value(json!({
            "CFx": {
                "vpn_type": "SocialVPN",
                "local_uid": "0123456789abcdef0123456789abcdef01234567",
                "xmpp_username": "bob@example.org",
                "xmpp_host": "xmpp.example.org"
            },
            "AddressMapper": { "ip4": "172.16.5.1" }
        }))
        .unwrap();
        let settings = config.validate().unwrap();

        let identity = NodeIdentity::resolve(&config, &settings).unwrap();

        assert_eq!(settings.vpn_type, OverlayVariant::SocialVpn);
        assert_eq!(identity.uid, "0123456789abcdef0123456789abcdef01234567");
        assert_eq!(identity.ip4.to_string(), "172.16.5.1");
        assert!(identity.ip6.ends_with("0123:4567:89ab:cdef"));
    }

    #[test]
    fn test_peer_file_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("peers.json");
        fs::write(&path, r#"{"peer-a": "172.31.0.7", "peer-b": "172.31.0.8"}"#).unwrap();

        let peers = PeerAddressBook::load(&path).unwrap();

        assert_eq!(peers.len(), 2);
        assert_eq!(peers.peer_ip4("peer-b").map(|ip| ip.to_string()).as_deref(), Some("172.31.0.8"));
        assert!(peers.peer_ip4("peer-c").is_none());
    }
}
