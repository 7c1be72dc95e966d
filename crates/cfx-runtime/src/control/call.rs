//! Control calls understood by the data-plane daemon.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::{ControlError, IPOP_VERSION, TINCAN_CONTROL};

/// A string that never shows up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// One fire-and-forget call. Serialized as a JSON object whose `m` field
/// names the method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "m", rename_all = "snake_case")]
pub enum ControlCall {
    SetLogging {
        logging: u8,
    },
    SetTranslation {
        translate: u8,
    },
    SetSwitchmode {
        switchmode: u8,
    },
    /// Where the daemon sends notifications and replies.
    SetCbEndpoint {
        ip: String,
        port: u16,
    },
    SetLocalIp {
        uid: String,
        ip4: String,
        ip6: String,
        ip4_mask: u8,
        ip6_mask: u8,
        subnet_mask: u8,
        switchmode: u8,
    },
    /// Register with the signaling service.
    #[serde(rename = "register_svc")]
    RegisterService {
        username: String,
        password: Secret,
        host: String,
    },
    SetTrimpolicy {
        trim_enabled: bool,
    },
    /// The reply arrives later on the callback endpoint.
    GetState {
        uid: String,
        stats: bool,
    },
    SetNetworkIgnoreList {
        network_ignore_list: Vec<String>,
    },
}

impl ControlCall {
    /// Wire name of the method.
    pub fn method(&self) -> &'static str {
        match self {
            Self::SetLogging { .. } => "set_logging",
            Self::SetTranslation { .. } => "set_translation",
            Self::SetSwitchmode { .. } => "set_switchmode",
            Self::SetCbEndpoint { .. } => "set_cb_endpoint",
            Self::SetLocalIp { .. } => "set_local_ip",
            Self::RegisterService { .. } => "register_svc",
            Self::SetTrimpolicy { .. } => "set_trimpolicy",
            Self::GetState { .. } => "get_state",
            Self::SetNetworkIgnoreList { .. } => "set_network_ignore_list",
        }
    }

    /// Header plus JSON body.
    pub fn encode(&self) -> Result<Vec<u8>, ControlError> {
        encode_body(&serde_json::to_value(self)?)
    }
}

/// Frame an arbitrary JSON body as a control datagram.
pub fn encode_body(body: &Value) -> Result<Vec<u8>, ControlError> {
    let mut datagram = vec![IPOP_VERSION, TINCAN_CONTROL];
    serde_json::to_writer(&mut datagram, body)?;
    Ok(datagram)
}
