use clap::{Parser, Subcommand};
use layergen::{config, generate, output, scan};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "layergen")]
#[command(about = "Composite layered trait images into compressed PNG artwork")]
#[command(long_about = "\
Composite layered trait images into compressed PNG artwork

Each job in the job list selects one trait value per layer. Layers are drawn
bottom to top in the config's `order`, scaled to the configured size, and the
result is written as a palette-quantized PNG named after the job id.

Input layout:

  config.json                # order, width, height (+ optional tuning)
  jobs.json                  # [{\"id\": 1, \"background\": \"red.png\", ...}, ...]
  traits/
  ├── background/
  │   ├── red.png
  │   └── blue.png
  └── body/
      └── circle.png

Output: assets/0.png for id 1, assets/1.png for id 2, and so on.

Set RUST_LOG=debug for per-image timing diagnostics.
Run 'layergen gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (.json or .toml)
    #[arg(long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Job list: JSON array of image descriptors
    #[arg(long, default_value = "jobs.json", global = true)]
    jobs: PathBuf,

    /// Traits directory, one subdirectory per layer
    #[arg(long, default_value = "traits", global = true)]
    traits: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Composite every job into a PNG
    Generate {
        /// Output directory for generated images
        #[arg(long, default_value = "assets")]
        assets: PathBuf,

        /// Maximum concurrent workers (overrides processing.max_workers)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Verify that every job references traits that exist, without generating
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Generate { assets, workers } => {
            let art = config::load_config(&cli.config)?;
            let descriptors = scan::load_descriptors(&cli.jobs)?;
            let mut options = generate::GenerateOptions::from_config(&art);
            if let Some(n) = workers {
                options = options.with_max_workers(n);
            }
            std::fs::create_dir_all(&assets)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_generate_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = generate::generate_files(
                &art,
                descriptors,
                &cli.traits,
                &assets,
                &options,
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let summary = result?;
            output::print_summary(&summary);

            if !summary.is_success() {
                return Err(format!("{} of {} images failed", summary.failures.len(), summary.total).into());
            }
        }
        Command::Check => {
            let art = config::load_config(&cli.config)?;
            let descriptors = scan::load_descriptors(&cli.jobs)?;
            println!("==> Checking {}", cli.traits.display());
            let catalog = scan::TraitCatalog::scan(&cli.traits, &art.order)?;
            let missing = catalog.missing_traits(&descriptors);
            output::print_check_output(&catalog, descriptors.len(), &missing);
            if !missing.is_empty() {
                return Err(format!("{} missing trait references", missing.len()).into());
            }
            println!("==> All jobs resolve");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so they never interleave with progress on stdout.
/// Defaults to `warn`; `RUST_LOG` overrides.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
