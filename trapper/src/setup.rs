use anyhow::Result;
use trapper_config::Config;
use trapper_sender::SendOutcome;

/// Print spawn infos to the log.
pub fn dump_spawn_infos(config: &Config) {
    match config.path() {
        Some(path) => trapper_log::debug!("using config file {}", path.display()),
        None => trapper_log::debug!("running without config file"),
    }

    let sender = config.sender();
    trapper_log::debug!("  server: {}:{}", sender.server_address, sender.server_port);
    trapper_log::debug!("  named senders: {}", config.senders().len());
    trapper_log::debug!("  log level: {}", config.logging().level);
}

/// Prints the effective configuration.
#[allow(clippy::print_stdout)]
pub fn dump_config(config: &Config) -> Result<()> {
    print!("{}", config.to_yaml_string()?);
    Ok(())
}

/// Prints the server's summary of a delivery.
#[allow(clippy::print_stdout)]
pub fn dump_outcome(outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Skipped => println!("sender disabled, nothing sent"),
        SendOutcome::Delivered(response) => println!(
            "processed: {}; failed: {}; total: {}; seconds spent: {:.6}",
            response.processed(),
            response.failed(),
            response.total(),
            response.seconds_spent(),
        ),
    }
}
