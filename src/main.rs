use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tube_scribe::extractors::YtDlpSource;
use tube_scribe::{output, utils, Cli, Commands, Config, TranscriptionPipeline, WhisperEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "tube_scribe=debug,tubescribe=debug"
    } else if cli.quiet {
        "tube_scribe=warn,tubescribe=warn"
    } else {
        "tube_scribe=info,tubescribe=info"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().await?;

    match cli.command {
        Commands::Transcribe {
            urls,
            batch_file,
            output_dir,
            model,
            report,
        } => {
            let mut config = config;
            if let Some(dir) = output_dir {
                config.app.output_dir = dir;
            }
            if let Some(size) = model {
                config.whisper.model = size;
            }

            let mut inputs = urls;
            if let Some(path) = &batch_file {
                inputs.extend(utils::read_url_list(path)?);
            }
            if inputs.is_empty() {
                anyhow::bail!("no URLs given; pass them as arguments or with --batch-file");
            }

            for url in inputs.iter().filter(|u| !utils::is_recognized_url(u)) {
                tracing::warn!("URL is not from a recognized video host: {}", url);
            }

            // The external tools are non-negotiable; bail before touching any item.
            utils::check_required_tools().await?;

            let engine = WhisperEngine::load(&config).await?;
            let pipeline = TranscriptionPipeline::new(
                config.clone(),
                Box::new(YtDlpSource::new()),
                Box::new(engine),
            )?;

            let report = match report {
                Some(format) => format,
                None => config.report_format()?,
            };

            tracing::info!("Starting batch of {} URL(s)", inputs.len());
            let batch = pipeline.process_batch(&inputs).await;

            for path in output::write_report(&batch, &config.app.output_dir, report)? {
                println!("Report saved to: {}", path.display());
            }

            // For a single-URL run, show the start of the transcript inline.
            if inputs.len() == 1 {
                if let Some(item) = batch.items.first() {
                    let preview: String = item.transcript.chars().take(500).collect();
                    println!("\n{}...", preview);
                }
            }

            let summary = format!("{}/{} URL(s) transcribed", batch.len(), inputs.len());
            if batch.len() == inputs.len() {
                println!("{}", console::style(summary).green().bold());
            } else {
                println!("{}", console::style(summary).yellow().bold());
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.save().await?;
                println!("Configuration written to: {}", Config::config_path()?.display());
            }
        }
        Commands::Platforms => {
            println!("Supported platforms:");
            for domain in utils::RECOGNIZED_DOMAINS {
                println!("  • {}", domain);
            }
        }
    }

    Ok(())
}
