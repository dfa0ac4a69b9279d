//! Command handlers and the shared connection setup they use.

pub mod config_cmd;
pub mod layout;
pub mod reports;

use fleetdash_api::FleetClient;
use fleetdash_config::{Config, ConfigError};
use tracing::debug;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Resolve configuration: file + environment, then CLI flag overrides.
pub fn resolve_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = fleetdash_config::load_config()?;
    apply_overrides(&mut cfg, global);
    cfg.validate()?;
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref url) = global.url {
        cfg.server.url = Some(url.clone());
    }
    if let Some(ref token) = global.token {
        cfg.server.token = Some(token.clone());
        cfg.server.token_env = None;
    }
    if global.insecure {
        cfg.server.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.server.timeout = timeout;
    }
}

/// Build an HTTP client for the configured server.
pub fn connect(cfg: &Config) -> Result<FleetClient, CliError> {
    let url = cfg.server_url().map_err(|e| match e {
        ConfigError::NoServer => CliError::NoServer {
            path: fleetdash_config::config_path().display().to_string(),
        },
        other => other.into(),
    })?;
    debug!(%url, "connecting");
    Ok(FleetClient::new(url.as_str(), &cfg.transport_config())?)
}

/// Route a server-backed command.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = resolve_config(global)?;

    match cmd {
        Command::Layout(args) => layout::handle(args, &cfg, global).await,
        Command::Summary(args) => reports::summary(args, &cfg, global).await,
        Command::Events(args) => reports::events(args, &cfg, global).await,
        Command::Daily(args) => reports::daily(args, &cfg, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to server dispatch".into(),
        )),
    }
}
