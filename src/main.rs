//! shape-captions CLI: generate caption datasets for synthetic shape worlds.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use shape_captions::captioner::Mode;
use shape_captions::config::DatasetConfig;
use shape_captions::error::CaptionError;
use shape_captions::presets;

#[derive(Parser)]
#[command(name = "shape-captions", version, about = "Caption generation for synthetic shape worlds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate examples as JSON lines.
    Generate {
        /// Dataset config file.
        #[arg(long, conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Bundled preset to use instead of a config file.
        #[arg(long)]
        preset: Option<String>,

        /// Number of examples (overrides the config).
        #[arg(long)]
        count: Option<usize>,

        /// Random seed (overrides the config).
        #[arg(long)]
        seed: Option<u64>,

        /// Dataset split: train, validation or test (overrides the config).
        #[arg(long)]
        mode: Option<Mode>,

        /// Fraction of examples labelled correct (overrides the config).
        #[arg(long)]
        correct_ratio: Option<f64>,

        /// Output file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Load and build a config, reporting any problems.
    Validate {
        /// Dataset config file.
        #[arg(long, conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Bundled preset to validate.
        #[arg(long)]
        preset: Option<String>,
    },

    /// List the bundled presets, or print one.
    Presets {
        /// Print the TOML of this preset.
        name: Option<String>,
    },
}

fn load_config(config: Option<PathBuf>, preset: Option<String>) -> Result<DatasetConfig> {
    let config = match (config, preset) {
        (Some(path), _) => DatasetConfig::load(&path)?,
        (None, Some(name)) => presets::load(&name)?,
        (None, None) => DatasetConfig::default(),
    };
    Ok(config)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            preset,
            count,
            seed,
            mode,
            correct_ratio,
            output,
        } => {
            let mut config = load_config(config, preset)?;
            let generator_config = &mut config.generator;
            generator_config.count = count.unwrap_or(generator_config.count);
            generator_config.seed = seed.unwrap_or(generator_config.seed);
            generator_config.mode = mode.unwrap_or(generator_config.mode);
            generator_config.correct_ratio = correct_ratio.unwrap_or(generator_config.correct_ratio);
            config.validate()?;

            let (generator, sampler) = config.build()?;
            let settings = &config.generator;
            let examples =
                generator.generate_batch(&sampler, settings.count, settings.seed, settings.correct_ratio, settings.mode);

            let sink: Box<dyn Write> = match &output {
                Some(path) => Box::new(std::fs::File::create(path).map_err(|source| CaptionError::Io {
                    path: path.display().to_string(),
                    source,
                })?),
                None => Box::new(std::io::stdout().lock()),
            };
            let mut sink = BufWriter::new(sink);
            for example in &examples {
                serde_json::to_writer(&mut sink, example).into_diagnostic()?;
                writeln!(sink).into_diagnostic()?;
            }
            sink.flush().into_diagnostic()?;

            tracing::info!(
                requested = settings.count,
                generated = examples.len(),
                mode = %settings.mode,
                "generation finished"
            );
        }

        Commands::Validate { config, preset } => {
            let config = load_config(config, preset)?;
            config.build()?;
            println!(
                "Config OK: {} captioner, {} examples ({} split)",
                config.captioner.component(),
                config.generator.count,
                config.generator.mode
            );
        }

        Commands::Presets { name } => match name {
            Some(name) => print!("{}", presets::source(&name)?),
            None => {
                println!("Presets:");
                for (name, config) in presets::all() {
                    println!(
                        "  {name:<16} {} captioner, {} examples",
                        config.captioner.component(),
                        config.generator.count
                    );
                }
            }
        },
    }

    Ok(())
}
