// SPDX-FileCopyrightText: 2026 Plantcare Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plantcare - a Telegram bot that reminds you to water your plants.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use clap::{Parser, Subcommand};
use plantcare_config::PlantcareConfig;

/// Plantcare - watering reminders over Telegram.
#[derive(Parser, Debug)]
#[command(name = "plantcare", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot: long polling plus the reminder scheduler.
    Serve,
    /// Validate the configuration and print the effective settings.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match plantcare_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            plantcare_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match effective_config(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("plantcare: use --help for available commands");
        }
    }
}

/// Renders the loaded configuration as TOML with the bot token masked.
fn effective_config(config: &PlantcareConfig) -> Result<String, toml::ser::Error> {
    let mut redacted = config.clone();
    if redacted.bot.token.is_some() {
        redacted.bot.token = Some("********".to_string());
    }
    toml::to_string_pretty(&redacted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc answers the epoch/stats controls.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn effective_config_masks_token() {
        let mut config = plantcare_config::load_and_validate_str("").unwrap();
        config.bot.token = Some("123456:secret".to_string());

        let rendered = effective_config(&config).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("********"));
        assert!(rendered.contains("[scheduler]"));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["plantcare", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        let cli = Cli::try_parse_from(["plantcare"]).unwrap();
        assert!(cli.command.is_none());
    }
}
