//! Turns CBT requests from other modules into control calls.
//!
//! | Action                        | Payload                              |
//! |-------------------------------|--------------------------------------|
//! | `DO_GET_STATE`                | `{"uid": str?, "stats": bool?}`      |
//! | `DO_SET_LOGGING`              | `{"level": int}`                     |
//! | `DO_SET_TRIMPOLICY`           | `{"trim": bool}`                     |
//! | `DO_SET_SWITCHMODE`           | `{"switchmode": int}`                |
//! | `DO_SET_NETWORK_IGNORE_LIST`  | `{"network_ignore_list": [str]}`     |
//! | `DO_SEND_RAW`                 | `{"json": object}`                   |

use cfx_types::{Cbt, ControllerModule, ModuleError};
use serde_json::Value;
use tracing::debug;

use crate::context::ModuleContext;
use crate::control::{ControlCall, ControlTransport};

pub struct TincanSender {
    ctx: ModuleContext,
    transport: ControlTransport,
}

impl TincanSender {
    pub fn new(
        transport: ControlTransport,
        ctx: ModuleContext,
        _config: &Value,
    ) -> Result<Self, ModuleError> {
        Ok(Self { ctx, transport })
    }

    fn call_for(cbt: &Cbt) -> Result<Option<ControlCall>, ModuleError> {
        let data = cbt.data();
        let payload = |reason: &str| ModuleError::Payload {
            action: cbt.action().to_string(),
            reason: reason.to_string(),
        };
        let small_int = |key: &str| -> Result<u8, ModuleError> {
            data.get(key)
                .and_then(Value::as_u64)
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| payload(&format!("{key} must be a small integer")))
        };

        let call = match cbt.action() {
            "DO_GET_STATE" => ControlCall::GetState {
                uid: data
                    .get("uid")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                stats: data.get("stats").and_then(Value::as_bool).unwrap_or(true),
            },
            "DO_SET_LOGGING" => ControlCall::SetLogging {
                logging: small_int("level")?,
            },
            "DO_SET_SWITCHMODE" => ControlCall::SetSwitchmode {
                switchmode: small_int("switchmode")?,
            },
            "DO_SET_TRIMPOLICY" => ControlCall::SetTrimpolicy {
                trim_enabled: data
                    .get("trim")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| payload("trim must be a boolean"))?,
            },
            "DO_SET_NETWORK_IGNORE_LIST" => ControlCall::SetNetworkIgnoreList {
                network_ignore_list: data
                    .get("network_ignore_list")
                    .and_then(Value::as_array)
                    .ok_or_else(|| payload("network_ignore_list must be a list"))?
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| payload("network_ignore_list must contain strings"))?,
            },
            "DO_SEND_RAW" => return Ok(None),
            other => {
                return Err(ModuleError::UnsupportedAction {
                    action: other.to_string(),
                    initiator: cbt.initiator().to_string(),
                })
            }
        };
        Ok(Some(call))
    }
}

impl ControllerModule for TincanSender {
    fn initialize(&mut self) -> Result<(), ModuleError> {
        debug!(
            module = %self.ctx.name(),
            daemon = %self.transport.daemon_addr(),
            "Control sender ready"
        );
        Ok(())
    }

    fn process_cbt(&mut self, cbt: Cbt) -> Result<(), ModuleError> {
        match Self::call_for(&cbt)? {
            Some(call) => {
                debug!(initiator = %cbt.initiator(), method = call.method(), "Forwarding control call");
                self.transport.send(&call)?;
            }
            None => {
                let body = cbt
                    .data()
                    .get("json")
                    .filter(|v| v.is_object())
                    .ok_or_else(|| ModuleError::Payload {
                        action: cbt.action().to_string(),
                        reason: "json must be an object".to_string(),
                    })?;
                self.transport.send_raw(body)?;
            }
        }
        Ok(())
    }
}
