use anyhow::bail;
use clap::Parser;
use gatecreds::cli::{Cli, Commands, ConfigAction};
use gatecreds::config::{validate_config, validate_config_object, Config};
use gatecreds::credentials::{CredentialOverrideState, CredentialProvider};
use gatecreds::infra::secrets::{redact_secret, SecretRequest, SecretResolution};
use gatecreds::logging;
use std::sync::Arc;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = logging::with_bootstrap(cli.json_logs, || Config::load(cli.config.as_deref()))?;
    logging::init(&config.logging.level, cli.json_logs || config.logging.json);

    for error in validate_config(&config) {
        warn!("{error}");
    }

    let state = Arc::new(CredentialOverrideState::new());
    let provider = CredentialProvider::from_config(&config, state.clone())?;
    debug!("Secret resolver: {}", provider.resolver().describe());

    match cli.command {
        Commands::Account => {
            println!("{}", required("account", provider.account().await)?);
        }
        Commands::Password(opts) => {
            let password = required("password", provider.password().await)?;
            println!("{}", display(&password, opts.reveal));
        }
        Commands::Key(opts) => {
            let key = required("key", provider.key().await)?;
            println!("{}", display(&key, opts.reveal));
        }
        Commands::Resolve(opts) => {
            let mut request = SecretRequest::new(&opts.name).right_trim(Some(opts.rstrip.as_str()));
            if let Some(lstrip) = opts.lstrip {
                request = request.left_trim(lstrip);
            }
            match provider.resolver().resolve_detailed(request).await {
                SecretResolution::Resolved(value) => println!("{}", display(&value, opts.reveal)),
                SecretResolution::Failed(msg) | SecretResolution::NotFound(msg) => {
                    bail!("{}: {msg}", opts.name)
                }
            }
        }
        Commands::Policy => {
            let use_paper = provider.gate().should_use_override().await;
            println!("use_paper_account={use_paper}");
        }
        Commands::Env(opts) => {
            provider.account().await;
            provider.password().await;
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&state.snapshot())?);
            } else {
                for line in state.export_lines(opts.reveal) {
                    println!("{line}");
                }
            }
        }
        Commands::Config(opts) => match opts.action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Validate => {
                validate_config_object(&config)?;
                println!("Configuration is valid");
            }
        },
        Commands::Version => {
            println!("gatecreds {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn required(what: &str, value: Option<String>) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => bail!("No {what} could be resolved"),
    }
}

fn display(value: &str, reveal: bool) -> String {
    if reveal {
        value.to_string()
    } else {
        redact_secret(value)
    }
}
