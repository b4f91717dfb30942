use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gatecreds", version, about = "Trading gateway credential resolver")]
pub struct Cli {
    /// Config file (JSON, YAML or TOML)
    #[arg(short, long, global = true, env = "GATECREDS_CONFIG")]
    pub config: Option<String>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the gateway account
    Account,
    /// Print the gateway password
    Password(RevealOpts),
    /// Print the password decryption key
    Key(RevealOpts),
    /// Resolve an arbitrary configured secret name
    Resolve(ResolveOpts),
    /// Run the paper account policy check and print the decision
    Policy,
    /// Resolve account and password, then print the override state as KEY=value lines
    Env(EnvOpts),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct RevealOpts {
    /// Print the value instead of a redacted form
    #[arg(long)]
    pub reveal: bool,
}

#[derive(clap::Args)]
pub struct EnvOpts {
    /// Print the paper password instead of a redacted form
    #[arg(long)]
    pub reveal: bool,
    /// Print the override state as JSON (the password is never included)
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct ResolveOpts {
    pub name: String,
    /// Characters to strip from the left of the value
    #[arg(long)]
    pub lstrip: Option<String>,
    /// Characters to strip from the right of the value
    #[arg(long, default_value = "\r\n")]
    pub rstrip: String,
    #[arg(long)]
    pub reveal: bool,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
}
