//! Config subcommand handlers.

use fleetdash_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(super::resolve_config(global)?);
            let rendered = output::render_single(global.output, &cfg, |c| {
                toml::to_string_pretty(c).unwrap_or_else(|e| format!("<unrenderable: {e}>"))
            })?;
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let cfg = initial_config(global)?;
            let written = config::save_config(&cfg)?;
            eprintln!("Wrote {}", written.display());
            Ok(())
        }
    }
}

/// Build a fresh config from the global flags. `--url` is required.
fn initial_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let url = global.url.clone().ok_or_else(|| CliError::Validation {
        field: "url".into(),
        reason: "pass --url (or FLEETDASH_URL) to initialize the config".into(),
    })?;

    let mut cfg = Config::default();
    cfg.server.url = Some(url);
    cfg.server.token.clone_from(&global.token);
    cfg.server.insecure = global.insecure;
    if let Some(timeout) = global.timeout {
        cfg.server.timeout = timeout;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn redacted(mut cfg: Config) -> Config {
    if cfg.server.token.is_some() {
        cfg.server.token = Some(REDACTED.into());
    }
    cfg
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;

    fn global(url: Option<&str>) -> GlobalOpts {
        GlobalOpts {
            url: url.map(Into::into),
            token: Some("secret".into()),
            output: OutputFormat::Table,
            verbose: 0,
            quiet: false,
            insecure: false,
            timeout: Some(10),
        }
    }

    #[test]
    fn init_requires_url() {
        assert!(matches!(
            initial_config(&global(None)),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn init_takes_flags() {
        let cfg = initial_config(&global(Some("https://track.example.com"))).unwrap();
        assert_eq!(cfg.server.url.as_deref(), Some("https://track.example.com"));
        assert_eq!(cfg.server.token.as_deref(), Some("secret"));
        assert_eq!(cfg.server.timeout, 10);
    }

    #[test]
    fn show_hides_token() {
        let mut cfg = Config::default();
        cfg.server.token = Some("secret".into());
        assert_eq!(redacted(cfg).server.token.as_deref(), Some(REDACTED));
    }
}
