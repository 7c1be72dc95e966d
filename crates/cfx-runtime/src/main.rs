//! # CFx Controller
//!
//! Entry point of the controller process. See the library documentation for
//! the startup sequence.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{debug, info, warn};

use cfx_runtime::cli::Args;
use cfx_runtime::config::{
    resolve_password, ControllerConfig, NodeIdentity, PeerAddressBook, TerminalPrompt,
    PASSWORD_ENV,
};
use cfx_runtime::control::ControlTransport;
use cfx_runtime::{builtin_catalog, wait_for_shutdown_signal, Cfx};
use cfx_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};

fn load_config(args: &Args) -> Result<ControllerConfig> {
    let mut config = match &args.config_file {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::new(),
    };
    if let Some(overrides) = &args.config_string {
        config
            .apply_override(overrides)
            .context("invalid -s configuration string")?;
    }

    if config.setup()? {
        match (&args.config_file, args.update_config) {
            (Some(path), true) => config.save(path)?,
            (None, true) => warn!("-u given without -c; generated settings not saved"),
            _ => {}
        }
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let telemetry = TelemetryConfig::from_env().with_verbosity(args.verbose);
    let _telemetry = init_telemetry(telemetry).context("failed to initialize telemetry")?;

    let mut config = load_config(&args)?;
    let settings = config.validate().context("invalid configuration")?;

    let password = resolve_password(
        &settings,
        std::env::var(PASSWORD_ENV).ok(),
        &TerminalPrompt {
            to_stdout: args.pwd_stdout,
        },
    )?;
    config.set_framework_value("xmpp_password", Value::String(password.clone()));

    let peers = match &args.peer_file {
        Some(path) => PeerAddressBook::load(path)?,
        None => PeerAddressBook::new(),
    };
    let identity = NodeIdentity::resolve(&config, &settings)?;
    info!(
        vpn_type = %settings.vpn_type,
        uid = %identity.uid,
        ip4 = %identity.ip4,
        ip6 = %identity.ip6,
        "Node identity resolved"
    );

    let transport = ControlTransport::bind(&settings).context("failed to bind control sockets")?;
    let mut cfx = Cfx::new(&config, builtin_catalog())?
        .with_transport(transport)
        .with_peers(peers);

    cfx.initialize_daemon(&identity, &password)?;
    cfx.load_all()?;
    cfx.start_all()?;

    info!("Controller running. Press Ctrl+C to stop.");
    wait_for_shutdown_signal().await?;

    let report = tokio::task::spawn_blocking(move || cfx.terminate())
        .await
        .context("shutdown task failed")?;
    info!(
        joined = report.joined.len(),
        detached = report.detached.len(),
        "Shutdown complete"
    );
    match encode_metrics() {
        Ok(metrics) => debug!("Final metrics:\n{metrics}"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }

    Ok(())
}
