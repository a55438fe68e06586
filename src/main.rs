use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod acquire;
mod audio;
mod captions;
mod cli;
mod config;
mod extractor;
mod output;
mod transcribe;
mod transcript;
mod utils;

use acquire::{Acquirer, Strategy};
use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "tubescript=debug"
    } else {
        "tubescript=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load()?;

    match cli.command {
        Commands::Acquire {
            url,
            strategy,
            output,
            language,
        } => {
            let strategy = Strategy::from(strategy);

            if let Some(lang) = &language {
                config.override_language(lang);
            }

            // The audio fallback needs external tools; warn up front but
            // keep going, they may still resolve at spawn time.
            if strategy == Strategy::AudioFallback {
                let missing = utils::check_dependencies(&config).await;
                for dep in missing {
                    eprintln!("warning: {dep}");
                }
            }

            // Ctrl-C cancels between chunk iterations instead of leaving
            // half-processed temp state behind.
            let cancel = CancellationToken::new();
            let ctrlc = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrlc.cancel();
                }
            });

            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap(),
            );
            progress.set_message(match strategy {
                Strategy::Captions => "Fetching captions...",
                Strategy::AudioFallback => "Downloading and transcribing audio...",
            });
            progress.enable_steady_tick(std::time::Duration::from_millis(120));

            let acquirer = Acquirer::new(&config);
            let result = acquirer.acquire(&url, strategy, &cancel).await;
            progress.finish_and_clear();

            let transcript = result?;

            match output {
                Some(path) => {
                    output::save_to_file(&transcript, &path)?;
                    eprintln!("Transcript saved to: {}", path.display());
                }
                None => output::print_to_console(&transcript),
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.save()?;
                println!("Configuration written.");
            }
        }
    }

    Ok(())
}
