//! # Node Identity
//!
//! The overlay identifies a node by a hex `uid` and gives it an IPv6 address
//! derived from that uid.
//!
//! | Variant   | uid                                   |
//! |-----------|---------------------------------------|
//! | GroupVPN  | `hex(SHA-1(ip4))`, first `uid_size`   |
//! | SocialVPN | `local_uid` from the configuration    |

use std::net::{Ipv4Addr, Ipv6Addr};

use cfx_types::OverlayVariant;
use rand::RngCore;
use sha1::{Digest, Sha1};

use super::{ConfigError, ControllerConfig, FrameworkSettings};

/// Hex characters of uid consumed by the IPv6 suffix.
const IP6_SUFFIX_CHARS: usize = 16;

/// Identity handed to the daemon at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub uid: String,
    pub ip4: Ipv4Addr,
    pub ip6: String,
}

impl NodeIdentity {
    /// Derive the identity for the configured overlay variant.
    pub fn resolve(
        config: &ControllerConfig,
        settings: &FrameworkSettings,
    ) -> Result<Self, ConfigError> {
        let ip4 = resolve_ip4(config, settings)?;
        let uid = match settings.vpn_type {
            OverlayVariant::GroupVpn => gen_uid(&ip4.to_string(), settings.uid_size)?,
            OverlayVariant::SocialVpn => {
                if settings.local_uid.is_empty() {
                    return Err(ConfigError::MissingField("local_uid"));
                }
                settings.local_uid.clone()
            }
        };
        let ip6 = gen_ip6(&uid, &settings.ip6_prefix)?;

        Ok(Self { uid, ip4, ip6 })
    }
}

/// Find the local IPv4 address.
///
/// `CFx.ip4` wins; otherwise GroupVPN reads `BaseTopologyManager.ip4` and
/// SocialVPN reads `AddressMapper.ip4`.
pub fn resolve_ip4(
    config: &ControllerConfig,
    settings: &FrameworkSettings,
) -> Result<Ipv4Addr, ConfigError> {
    let fallback_section = match settings.vpn_type {
        OverlayVariant::GroupVpn => "BaseTopologyManager",
        OverlayVariant::SocialVpn => "AddressMapper",
    };
    let raw = settings
        .ip4
        .clone()
        .or_else(|| {
            config
                .section(fallback_section)
                .and_then(|s| s.get("ip4"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .ok_or(ConfigError::MissingField("ip4"))?;

    raw.parse().map_err(|_| ConfigError::Invalid {
        field: "ip4".to_string(),
        reason: format!("{raw} is not an IPv4 address"),
    })
}

/// GroupVPN uid: hex digest of the IPv4 address text, truncated.
pub fn gen_uid(ip4: &str, uid_size: usize) -> Result<String, ConfigError> {
    let digest = hex::encode(Sha1::digest(ip4.as_bytes()));
    if uid_size < IP6_SUFFIX_CHARS || uid_size > digest.len() {
        return Err(ConfigError::Invalid {
            field: "uid_size".to_string(),
            reason: format!(
                "must be between {IP6_SUFFIX_CHARS} and {} for GroupVPN, got {uid_size}",
                digest.len()
            ),
        });
    }
    Ok(digest[..uid_size].to_string())
}

/// Random hex uid of `uid_size` characters.
pub fn random_uid(uid_size: usize) -> String {
    let mut bytes = vec![0u8; uid_size.div_ceil(2)];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut uid = hex::encode(bytes);
    uid.truncate(uid_size);
    uid
}

/// `prefix` followed by four 4-character groups taken from the uid.
pub fn gen_ip6(uid: &str, prefix: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        field: "uid".to_string(),
        reason,
    };

    let head = uid
        .get(..IP6_SUFFIX_CHARS)
        .ok_or_else(|| invalid(format!("{uid} is shorter than {IP6_SUFFIX_CHARS} characters")))?;
    if !head.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(format!("{uid} is not hexadecimal")));
    }

    let ip6 = format!(
        "{prefix}:{}:{}:{}:{}",
        &head[0..4],
        &head[4..8],
        &head[8..12],
        &head[12..16]
    );
    ip6.parse::<Ipv6Addr>().map_err(|_| ConfigError::Invalid {
        field: "ip6_prefix".to_string(),
        reason: format!("{ip6} is not an IPv6 address"),
    })?;

    Ok(ip6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gen_uid_is_stable_and_sized() {
        let a = gen_uid("172.31.0.100", 40).unwrap();
        let b = gen_uid("172.31.0.100", 40).unwrap();
        let other = gen_uid("172.31.0.101", 40).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_gen_uid_rejects_bad_size() {
        assert!(gen_uid("10.0.0.1", 8).is_err());
        assert!(gen_uid("10.0.0.1", 41).is_err());
        assert_eq!(gen_uid("10.0.0.1", 40).unwrap().len(), 40);
    }

    #[test]
    fn test_gen_uid_is_sha1_of_address_text() {
        assert_eq!(
            gen_uid("abc", 40).unwrap(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            gen_uid("172.31.0.100", 20).unwrap(),
            "437e4c0475866c603073"
        );
    }

    #[test]
    fn test_gen_ip6() {
        let ip6 = gen_ip6("0123456789abcdef0000", "fd50:0dbc:41f2:4a3c").unwrap();
        assert_eq!(ip6, "fd50:0dbc:41f2:4a3c:0123:4567:89ab:cdef");
    }

    #[test]
    fn test_gen_ip6_rejects_short_or_non_hex_uid() {
        assert!(gen_ip6("abc", "fd50:0dbc:41f2:4a3c").is_err());
        assert!(gen_ip6("zzzzzzzzzzzzzzzzzzzz", "fd50:0dbc:41f2:4a3c").is_err());
    }

    #[test]
    fn test_random_uid_size() {
        assert_eq!(random_uid(40).len(), 40);
        assert_eq!(random_uid(7).len(), 7);
        assert_ne!(random_uid(40), random_uid(40));
    }

    #[test]
    fn test_group_vpn_identity_from_topology_section() {
        let config = ControllerConfig::from_value(json!({
            "BaseTopologyManager": { "ip4": "172.31.0.100" }
        }))
        .unwrap();
        let settings = config.settings().unwrap();

        let identity = NodeIdentity::resolve(&config, &settings).unwrap();

        assert_eq!(identity.ip4, Ipv4Addr::new(172, 31, 0, 100));
        assert_eq!(identity.uid, gen_uid("172.31.0.100", 40).unwrap());
        assert!(identity.ip6.starts_with("fd50:0dbc:41f2:4a3c:"));
        assert_eq!(&identity.ip6[20..24], &identity.uid[0..4]);
    }

    #[test]
    fn test_social_vpn_identity_uses_local_uid() {
        let config = ControllerConfig::from_value(json!({
            "CFx": { "vpn_type": "SocialVPN", "local_uid": "00112233445566778899aabbccddeeff00112233" },
            "AddressMapper": { "ip4": "172.31.0.100" }
        }))
        .unwrap();
        let settings = config.settings().unwrap();

        let identity = NodeIdentity::resolve(&config, &settings).unwrap();

        assert_eq!(identity.uid, "00112233445566778899aabbccddeeff00112233");
        assert_eq!(identity.ip6, "fd50:0dbc:41f2:4a3c:0011:2233:4455:6677");
    }

    #[test]
    fn test_missing_or_bad_ip4() {
        let config = ControllerConfig::new();
        let settings = config.settings().unwrap();
        assert!(matches!(
            resolve_ip4(&config, &settings),
            Err(ConfigError::MissingField("ip4"))
        ));

        let config = ControllerConfig::from_value(json!({"CFx": {"ip4": "not-an-ip"}})).unwrap();
        let settings = config.settings().unwrap();
        assert!(matches!(
            resolve_ip4(&config, &settings),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
