//! # Overlay Module Flows
//!
//! Small stand-ins for overlay modules exercising the framework the way real
//! controllers use it.
//!
//! ## Flows Tested
//!
//! 1. **Request / reply**: `Asker` queries `Directory`, which answers with
//!    [`Cbt::reply`] using the peer address book
//! 2. **Timers**: `Heartbeat` sends `TICK` from its timer thread
//! 3. **Fault isolation**: a module that errors or panics keeps processing
//! 4. **Parameter queries**: modules read framework settings by name

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use cfx_runtime::config::{FrameworkSettings, PeerAddressBook};
    use cfx_runtime::{Cfx, ModuleCatalog, ModuleContext};
    use cfx_telemetry::{CBT_PROCESSED, MODULE_FAULTS};
    use cfx_types::{Cbt, ControllerModule, ModuleDescriptor, ModuleError, OverlayVariant};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    type Log = Arc<Mutex<Vec<Cbt>>>;

    /// Answers `QUERY_PEER` with the peer's IPv4 address.
    struct Directory {
        ctx: ModuleContext,
    }

    impl ControllerModule for Directory {
        fn initialize(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }

        fn process_cbt(&mut self, cbt: Cbt) -> Result<(), ModuleError> {
            match cbt.action() {
                "QUERY_PEER" => {
                    let uid = cbt.data()["uid"].as_str().unwrap_or_default();
                    let answer = match self.ctx.peer_ip4(uid) {
                        Some(ip4) => json!({ "uid": uid, "ip4": ip4.to_string() }),
                        None => json!({ "uid": uid, "ip4": null }),
                    };
                    self.ctx.submit_cbt(cbt.reply("PEER_IP4", answer))?;
                    Ok(())
                }
                other => Err(ModuleError::UnsupportedAction {
                    action: other.to_string(),
                    initiator: cbt.initiator().to_string(),
                }),
            }
        }
    }

    /// Asks `Directory` about each uid at startup and keeps the answers.
    struct Asker {
        ctx: ModuleContext,
        uids: Vec<String>,
        answers: Log,
    }

    impl ControllerModule for Asker {
        fn initialize(&mut self) -> Result<(), ModuleError> {
            for uid in &self.uids {
                self.ctx.send("Directory", "QUERY_PEER", json!({ "uid": uid }))?;
            }
            Ok(())
        }

        fn process_cbt(&mut self, cbt: Cbt) -> Result<(), ModuleError> {
            self.answers.lock().push(cbt);
            Ok(())
        }
    }

    /// Sends `TICK` to `target` on every timer firing.
    struct Heartbeat {
        ctx: ModuleContext,
        target: String,
    }

    impl ControllerModule for Heartbeat {
        fn initialize(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }

        fn process_cbt(&mut self, _cbt: Cbt) -> Result<(), ModuleError> {
            Ok(())
        }

        fn timer_method(&mut self) -> Result<(), ModuleError> {
            self.ctx.send(&self.target, "TICK", Value::Null)?;
            Ok(())
        }
    }

    /// Records CBTs, failing on `FAIL` and panicking on `BOOM`.
    struct Fragile {
        seen: Log,
    }

    impl ControllerModule for Fragile {
        fn initialize(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }

        fn process_cbt(&mut self, cbt: Cbt) -> Result<(), ModuleError> {
            match cbt.action() {
                "FAIL" => Err(ModuleError::Other("asked to fail".into())),
                "BOOM" => panic!("asked to panic"),
                _ => {
                    self.seen.lock().push(cbt);
                    Ok(())
                }
            }
        }
    }

    fn recorder(log: &Log) -> impl Fn(ModuleContext, &Value) -> Result<Fragile, ModuleError> {
        let log = Arc::clone(log);
        move |_ctx: ModuleContext, _config: &Value| Ok(Fragile { seen: Arc::clone(&log) })
    }

    fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    // =============================================================================
    // REQUEST / REPLY
    // =============================================================================

    #[test]
    fn test_query_reply_through_bus() {
        let answers = Log::default();
        let mut catalog = ModuleCatalog::new();
        catalog.register("Directory", |ctx: ModuleContext, _config: &Value| {
            Ok(Directory { ctx })
        });
        let sink = Arc::clone(&answers);
        catalog.register("Asker", move |ctx: ModuleContext, config: &Value| {
            let uids = config["uids"]
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default();
            Ok(Asker {
                ctx,
                uids,
                answers: Arc::clone(&sink),
            })
        });

        let mut peers = PeerAddressBook::new();
        peers.insert("peer-a", Ipv4Addr::new(172, 31, 0, 7));
        let mut cfx = Cfx::with_descriptors(
            FrameworkSettings::default(),
            vec![
                ModuleDescriptor::new("Asker")
                    .depends_on(["Directory"])
                    .with_config(json!({ "uids": ["peer-a", "peer-b"] })),
                ModuleDescriptor::new("Directory"),
            ],
            catalog,
        )
        .with_peers(peers);

        cfx.load_all().unwrap();
        cfx.start_all().unwrap();
        wait_until(|| answers.lock().len() == 2);

        let answers = answers.lock().clone();
        assert_eq!(answers[0].initiator(), "Directory");
        assert_eq!(answers[0].recipient(), "Asker");
        assert_eq!(answers[0].action(), "PEER_IP4");
        assert_eq!(answers[0].data()["ip4"], "172.31.0.7");
        assert_eq!(answers[1].data()["uid"], "peer-b");
        assert!(answers[1].data()["ip4"].is_null());
        cfx.terminate();
    }

    // =============================================================================
    // TIMERS
    // =============================================================================

    #[test]
    fn test_timer_drives_periodic_cbts() {
        let ticks = Log::default();
        let mut catalog = ModuleCatalog::new();
        catalog
            .register("TickSink", recorder(&ticks))
            .register("Heartbeat", |ctx: ModuleContext, config: &Value| {
                Ok(Heartbeat {
                    ctx,
                    target: config["target"].as_str().unwrap_or("TickSink").to_string(),
                })
            });
        let mut cfx = Cfx::with_descriptors(
            FrameworkSettings::default(),
            vec![
                ModuleDescriptor::new("TickSink"),
                ModuleDescriptor::new("Heartbeat")
                    .depends_on(["TickSink"])
                    .with_timer(Duration::from_millis(10))
                    .with_config(json!({ "target": "TickSink" })),
            ],
            catalog,
        );

        cfx.load_all().unwrap();
        cfx.start_all().unwrap();
        wait_until(|| ticks.lock().len() >= 3);
        let report = cfx.terminate();

        assert!(ticks.lock().iter().all(|c| c.action() == "TICK" && c.initiator() == "Heartbeat"));
        assert_eq!(report.joined, vec!["TickSink", "Heartbeat"]);
    }

    // =============================================================================
    // FAULT ISOLATION
    // =============================================================================

    #[test]
    fn test_failing_module_keeps_running() {
        let seen = Log::default();
        let mut catalog = ModuleCatalog::new();
        catalog.register("FragileFlow", recorder(&seen));
        let mut cfx = Cfx::with_descriptors(
            FrameworkSettings::default(),
            vec![ModuleDescriptor::new("FragileFlow")],
            catalog,
        );
        let faults_before = MODULE_FAULTS
            .with_label_values(&["FragileFlow", "process_cbt"])
            .get();
        let processed_before = CBT_PROCESSED.with_label_values(&["FragileFlow"]).get();

        cfx.load_all().unwrap();
        cfx.start_all().unwrap();
        for action in ["BEFORE", "FAIL", "BOOM", "AFTER"] {
            cfx.submit_cbt(cfx.create_cbt("FragileFlow", action, Value::Null))
                .unwrap();
        }
        wait_until(|| seen.lock().len() == 2);
        let report = cfx.terminate();

        let actions: Vec<String> = seen.lock().iter().map(|c| c.action().to_string()).collect();
        assert_eq!(actions, vec!["BEFORE", "AFTER"]);
        assert_eq!(seen.lock()[0].initiator(), "CFx");
        assert_eq!(report.joined, vec!["FragileFlow"]);
        assert_eq!(
            MODULE_FAULTS
                .with_label_values(&["FragileFlow", "process_cbt"])
                .get()
                - faults_before,
            2.0
        );
        assert_eq!(
            CBT_PROCESSED.with_label_values(&["FragileFlow"]).get() - processed_before,
            2.0
        );
    }

    // =============================================================================
    // PARAMETER QUERIES
    // =============================================================================

    #[test]
    fn test_query_param_hides_password() {
        let settings = FrameworkSettings {
            vpn_type: OverlayVariant::SocialVpn,
            local_uid: "feedface".into(),
            xmpp_username: Some("bob@example.org".into()),
            xmpp_password: Some("hunter2".into()),
            ..FrameworkSettings::default()
        };
        let seen = Arc::new(Mutex::new(Vec::<Option<String>>::new()));
        let sink = Arc::clone(&seen);
        let mut catalog = ModuleCatalog::new();
        catalog.register_for(
            "Inspector",
            OverlayVariant::SocialVpn,
            move |ctx: ModuleContext, _config: &Value| {
                let mut seen = sink.lock();
                for name in ["vpn_type", "local_uid", "xmpp_username", "xmpp_password"] {
                    seen.push(ctx.query_param(name));
                }
                Ok(Fragile {
                    seen: Log::default(),
                })
            },
        );
        let mut cfx = Cfx::with_descriptors(
            settings,
            vec![ModuleDescriptor::new("Inspector")],
            catalog,
        );

        cfx.load_all().unwrap();
        cfx.terminate();

        assert_eq!(
            *seen.lock(),
            vec![
                Some("SocialVPN".to_string()),
                Some("feedface".to_string()),
                Some("bob@example.org".to_string()),
                None,
            ]
        );
    }
}
