// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod player;
mod signals;

fn build_cli() -> Command {
    Command::new("bookbox")
        .version("0.1.0")
        .about("Button-driven audiobook player for embedded boards")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Path to the configuration file")
                .default_value("bookbox.toml")
                .global(true),
        )
        .arg(
            Arg::new("keyboard")
                .short('k')
                .long("keyboard")
                .help("Simulate buttons with the keyboard instead of GPIO")
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("check-config").about("Validate the configuration file and exit"))
}

fn check_config(path: &Path) -> Result<()> {
    let config = bookbox_config::load(path)
        .with_context(|| format!("Configuration at {} is invalid", path.display()))?;
    println!(
        "Configuration OK: {} audiobooks, {} decoder backend, {} input",
        config.audiobooks.len(),
        config.decoder.backend,
        config.input.backend
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = build_cli().get_matches();
    let config_path = PathBuf::from(
        matches
            .get_one::<String>("config")
            .map(String::as_str)
            .unwrap_or("bookbox.toml"),
    );

    if let Some(("check-config", _)) = matches.subcommand() {
        return check_config(&config_path);
    }

    // The only fatal error class: a bad config exits non-zero at startup.
    let config = bookbox_config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let mut player = player::Player::new(config, matches.get_flag("keyboard"))
        .context("Failed to initialize player")?;

    signals::install_shutdown_handler().context("Failed to install signal handlers")?;

    player.start_from_saved_state();
    log::info!("BookBox running (Ctrl+C to exit)");

    while player.is_running() && !signals::shutdown_requested() {
        std::thread::sleep(Duration::from_millis(250));
    }

    player.shutdown();
    Ok(())
}
