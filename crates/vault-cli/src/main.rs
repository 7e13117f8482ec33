//! FileVault CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::Cli;
use vault_core::config::logging::LoggingConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration may be absent or broken; logging still has to come up,
    // so fall back to the defaults instead of failing here.
    let logging = commands::load_config(&cli.env)
        .map(|config| config.logging)
        .unwrap_or_default();
    init_tracing(&logging);

    if let Err(e) = cli.execute().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize the subscriber from the `[logging]` section. `RUST_LOG`
/// overrides the configured level.
fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config_filter(config));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
}

fn config_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::new(&config.level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_becomes_the_filter() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        };
        assert_eq!(config_filter(&config).to_string(), "debug");
        assert_eq!(config_filter(&LoggingConfig::default()).to_string(), "info");
    }
}
