//! Typed view of the framework's own configuration section.

use cfx_types::OverlayVariant;
use serde::{Deserialize, Serialize};

/// Settings read from the `CFx` section. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkSettings {
    pub vpn_type: OverlayVariant,
    /// Node identity; generated on first run when empty.
    pub local_uid: String,
    /// Identity length in hex characters.
    pub uid_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip4: Option<String>,
    pub ip6_prefix: String,
    pub ip4_mask: u8,
    pub ip6_mask: u8,
    pub subnet_mask: u8,
    /// Port the controller receives daemon notifications on.
    pub contr_port: u16,
    /// Port the daemon receives control calls on.
    pub svpn_port: u16,
    pub localhost: String,
    pub localhost6: String,
    pub tincan_logging: u8,
    pub switchmode: u8,
    pub trim_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xmpp_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xmpp_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xmpp_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_ignore_list: Option<Vec<String>>,
    /// Release string reported to modules.
    #[serde(rename = "ipopVerRel", skip_serializing_if = "Option::is_none")]
    pub ipop_ver_rel: Option<String>,
}

impl Default for FrameworkSettings {
    fn default() -> Self {
        Self {
            vpn_type: OverlayVariant::GroupVpn,
            local_uid: String::new(),
            uid_size: 40,
            ip4: None,
            ip6_prefix: "fd50:0dbc:41f2:4a3c".to_string(),
            ip4_mask: 24,
            ip6_mask: 64,
            subnet_mask: 32,
            contr_port: 5801,
            svpn_port: 5800,
            localhost: "127.0.0.1".to_string(),
            localhost6: "::1".to_string(),
            tincan_logging: 1,
            switchmode: 0,
            trim_enabled: false,
            xmpp_username: None,
            xmpp_password: None,
            xmpp_host: None,
            network_ignore_list: None,
            ipop_ver_rel: None,
        }
    }
}

impl FrameworkSettings {
    /// Look up one of the settings modules may query by name.
    ///
    /// Only identity and signaling fields are exposed; the password is not.
    pub fn query(&self, name: &str) -> Option<String> {
        match name {
            "xmpp_host" => self.xmpp_host.clone(),
            "xmpp_username" => self.xmpp_username.clone(),
            "local_uid" => Some(self.local_uid.clone()),
            "vpn_type" => Some(self.vpn_type.to_string()),
            "ipopVerRel" => self.ipop_ver_rel.clone(),
            _ => None,
        }
    }

    /// Address of the daemon's control port on the loopback interface.
    pub fn daemon_host(&self, ipv6: bool) -> &str {
        if ipv6 {
            &self.localhost6
        } else {
            &self.localhost
        }
    }
}
