use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use trapper_config::{Config, OverridableConfig};
use trapper_protocol::{Metric, Packet, UnixTimestamp};
use trapper_sender::{DEFAULT_INSTANCE, SendOutcome};

use crate::{batch, setup};

/// Pushes metrics to a monitoring server over the trapper protocol.
#[derive(Debug, Parser)]
#[command(name = "trapper", version)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, short = 'c', global = true, env = "TRAPPER_CONFIG")]
    config: Option<PathBuf>,

    /// Address of the server, overriding the configuration of the selected sender.
    #[arg(long, short = 'z', global = true)]
    server: Option<String>,

    /// Port of the server, overriding the configuration of the selected sender.
    #[arg(long, short = 'p', global = true)]
    port: Option<String>,

    /// The log level, overriding the configuration.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Name of the configured sender to use.
    #[arg(long, short = 's', global = true, default_value = DEFAULT_INSTANCE)]
    sender: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sends a single metric.
    Send(SendArgs),
    /// Sends all metrics from a file as one packet.
    Batch(BatchArgs),
    /// Inspects the configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Args)]
struct SendArgs {
    /// Key of the monitored item.
    #[arg(long, short = 'k')]
    key: String,

    /// Value to send.
    #[arg(long, short = 'o')]
    value: String,

    /// Host the metric is attributed to. Defaults to the local hostname.
    #[arg(long)]
    host: Option<String>,

    /// Unix timestamp of the observation. Defaults to now.
    #[arg(long)]
    clock: Option<u64>,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// File with one `<host> <key> <value> [<clock>]` entry per line.
    file: PathBuf,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Prints the effective configuration as YAML.
    Show,
}

impl Cli {
    fn overrides(&self) -> OverridableConfig {
        OverridableConfig {
            server: self.server.clone(),
            port: self.port.clone(),
            disable: None,
            log_level: self.log_level.clone(),
            instance: Some(self.sender.clone()),
        }
    }
}

/// Loads the configuration file, if any, and applies command line and environment overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    config.apply_override(cli.overrides().or(OverridableConfig::from_env()))?;
    Ok(config)
}

/// Runs the command line application.
pub fn execute() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    trapper_log::init(config.logging());
    setup::dump_spawn_infos(&config);

    match &cli.command {
        Command::Send(args) => {
            let packet = single_packet(args)?;
            send(&config, &cli.sender, &packet)
        }
        Command::Batch(args) => {
            let packet = batch::read(&args.file)?;
            send(&config, &cli.sender, &packet)
        }
        Command::Config {
            command: ConfigCommand::Show,
        } => setup::dump_config(&config),
    }
}

fn single_packet(args: &SendArgs) -> Result<Packet> {
    let mut metric = Metric::new(args.key.as_str(), args.value.as_str())?;

    if let Some(host) = &args.host {
        metric = metric.with_hostname(host.as_str());
    }

    if let Some(clock) = args.clock {
        metric = metric.with_timestamp(UnixTimestamp::from_secs(clock));
    }

    Ok([metric].into_iter().collect())
}

fn send(config: &Config, name: &str, packet: &Packet) -> Result<()> {
    let registry = config.registry()?;
    let sender = registry.instance(name);

    let outcome = sender
        .send(packet)
        .with_context(|| format!("failed to send {} metrics", packet.len()))?;

    setup::dump_outcome(&outcome);

    if let SendOutcome::Delivered(response) = &outcome
        && response.failed() > 0
    {
        anyhow::bail!(
            "server failed to process {} of {} metrics",
            response.failed(),
            response.total()
        );
    }

    Ok(())
}
