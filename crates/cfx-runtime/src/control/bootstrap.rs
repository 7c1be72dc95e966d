use std::net::SocketAddr;

use cfx_types::OverlayVariant;
use tracing::info;

use super::call::{ControlCall, Secret};
use super::{ControlError, ControlTransport};
use crate::config::{FrameworkSettings, NodeIdentity};

/// Calls that bring a freshly started daemon in line with this controller.
///
/// Order matters: logging, translation, callback endpoint, local addressing,
/// signaling registration, trim policy, state query, then the optional
/// network ignore list.
pub fn bootstrap_calls(
    settings: &FrameworkSettings,
    identity: &NodeIdentity,
    callback: SocketAddr,
    password: &str,
) -> Vec<ControlCall> {
    let mut calls = vec![ControlCall::SetLogging {
        logging: settings.tincan_logging,
    }];

    calls.push(ControlCall::SetTranslation {
        translate: settings.vpn_type.translation_mode(),
    });
    if settings.vpn_type == OverlayVariant::GroupVpn {
        calls.push(ControlCall::SetSwitchmode {
            switchmode: settings.switchmode,
        });
    }

    calls.push(ControlCall::SetCbEndpoint {
        ip: callback.ip().to_string(),
        port: callback.port(),
    });
    calls.push(ControlCall::SetLocalIp {
        uid: identity.uid.clone(),
        ip4: identity.ip4.to_string(),
        ip6: identity.ip6.clone(),
        ip4_mask: settings.ip4_mask,
        ip6_mask: settings.ip6_mask,
        subnet_mask: settings.subnet_mask,
        switchmode: settings.switchmode,
    });
    calls.push(ControlCall::RegisterService {
        username: settings.xmpp_username.clone().unwrap_or_default(),
        password: Secret::new(password),
        host: settings.xmpp_host.clone().unwrap_or_default(),
    });
    calls.push(ControlCall::SetTrimpolicy {
        trim_enabled: settings.trim_enabled,
    });
    calls.push(ControlCall::GetState {
        uid: String::new(),
        stats: true,
    });

    if let Some(list) = &settings.network_ignore_list {
        calls.push(ControlCall::SetNetworkIgnoreList {
            network_ignore_list: list.clone(),
        });
    }

    calls
}

/// Send the bootstrap sequence. Returns the number of calls sent.
pub fn bootstrap_daemon(
    transport: &ControlTransport,
    settings: &FrameworkSettings,
    identity: &NodeIdentity,
    password: &str,
) -> Result<usize, ControlError> {
    let callback = transport.callback_endpoint()?;
    let calls = bootstrap_calls(settings, identity, callback, password);
    for call in &calls {
        transport.send(call)?;
    }
    info!(
        daemon = %transport.daemon_addr(),
        uid = %identity.uid,
        ip4 = %identity.ip4,
        ip6 = %identity.ip6,
        calls = calls.len(),
        "Daemon bootstrap sent"
    );
    Ok(calls.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn identity() -> NodeIdentity {
        NodeIdentity {
            uid: "0123456789abcdef0123456789abcdef01234567".into(),
            ip4: Ipv4Addr::new(172, 31, 0, 100),
            ip6: "fd50:0dbc:41f2:4a3c:0123:4567:89ab:cdef".into(),
        }
    }

    fn settings(variant: OverlayVariant) -> FrameworkSettings {
        FrameworkSettings {
            vpn_type: variant,
            xmpp_username: Some("alice@example.org".into()),
            xmpp_host: Some("xmpp.example.org".into()),
            ..FrameworkSettings::default()
        }
    }

    fn methods(calls: &[ControlCall]) -> Vec<&'static str> {
        calls.iter().map(ControlCall::method).collect()
    }

    #[test]
    fn test_group_vpn_sequence() {
        let callback: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let calls = bootstrap_calls(
            &settings(OverlayVariant::GroupVpn),
            &identity(),
            callback,
            "pw",
        );

        assert_eq!(
            methods(&calls),
            vec![
                "set_logging",
                "set_translation",
                "set_switchmode",
                "set_cb_endpoint",
                "set_local_ip",
                "register_svc",
                "set_trimpolicy",
                "get_state",
            ]
        );
        assert_eq!(calls[1], ControlCall::SetTranslation { translate: 0 });
        assert_eq!(
            calls[3],
            ControlCall::SetCbEndpoint {
                ip: "127.0.0.1".into(),
                port: 40000
            }
        );
    }

    #[test]
    fn test_social_vpn_sequence_with_ignore_list() {
        let mut settings = settings(OverlayVariant::SocialVpn);
        settings.network_ignore_list = Some(vec!["docker0".into()]);
        let calls = bootstrap_calls(
            &settings,
            &identity(),
            "[::1]:40000".parse().unwrap(),
            "pw",
        );

        assert_eq!(calls[1], ControlCall::SetTranslation { translate: 1 });
        assert_eq!(calls[2].method(), "set_cb_endpoint");
        assert_eq!(
            calls.last(),
            Some(&ControlCall::SetNetworkIgnoreList {
                network_ignore_list: vec!["docker0".into()]
            })
        );
        assert!(!methods(&calls).contains(&"set_switchmode"));
    }
}
