use clap::{Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use thumbwell::{config, listing, output, warm, worker};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thumbwell")]
#[command(about = "On-demand thumbnail cache for photo galleries")]
#[command(long_about = "\
On-demand thumbnail cache for photo galleries

Image paths are relative to gallery_root. Thumbnails are written under
cache_root, mirroring the gallery tree with a _<size> suffix:

  <gallery_root>/gallery/2016/beach.jpg
  <cache_root>/gallery/2016/beach.jpg_300

Cached files are never invalidated. Delete them to force regeneration.

Run 'thumbwell gen-config' to generate a documented thumbwell.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "thumbwell.toml", global = true)]
    config: PathBuf,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one image and write its bytes to a file or stdout
    Resolve {
        /// Gallery path, e.g. gallery/2016/beach.jpg
        path: String,
        /// Bounding box in pixels; 0 serves the original
        #[arg(long, default_value_t = 0)]
        size: u32,
        /// Write here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Generate thumbnails for every image in a directory
    Warm {
        /// Gallery directory
        #[arg(default_value = "")]
        dir: String,
        /// Sizes to generate (repeatable); defaults to the listing sizes
        #[arg(long = "size")]
        sizes: Vec<u32>,
        /// Descend into subdirectories
        #[arg(long, short)]
        recursive: bool,
    },
    /// List a gallery directory
    List {
        #[arg(default_value = "")]
        dir: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock thumbwell.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Resolve { path, size, output } => {
            let config = load(&cli.config)?;
            let (gateway, handle) = worker::spawn(&config)?;
            let resolved = gateway.resolve(path, size);
            drop(gateway);
            let stats = handle.join()?;
            let mut resolved = resolved?;
            match output {
                Some(dest) => {
                    let mut file = File::create(&dest)?;
                    io::copy(&mut resolved.file, &mut file)?;
                }
                None => {
                    io::copy(&mut resolved.file, &mut io::stdout().lock())?;
                }
            }
            tracing::info!(origin = ?resolved.origin, %stats, "resolved");
        }
        Command::Warm {
            dir,
            sizes,
            recursive,
        } => {
            let config = load(&cli.config)?;
            let sizes = if sizes.is_empty() {
                vec![config.listing.thumb_size, config.listing.slide_size]
            } else {
                sizes
            };
            let (gateway, handle) = worker::spawn(&config)?;
            let options = warm::WarmOptions { sizes, recursive };
            let warmed = warm::warm_directory(&gateway, &config.gallery_root, &dir, &options);
            drop(gateway);
            let stats = handle.join()?;
            output::print_warm_report(&warmed?);
            println!("Cache: {}", stats);
        }
        Command::List { dir, json } => {
            let config = load(&cli.config)?;
            let listing = listing::list_directory(&config.gallery_root, &dir, &config.listing)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                output::print_listing(&listing);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load(path: &std::path::Path) -> Result<config::GalleryConfig, config::ConfigError> {
    let config = config::load_config(path)?;
    tracing::debug!(
        path = %path.display(),
        gallery_root = %config.gallery_root.display(),
        cache_root = %config.cache_root.display(),
        "config loaded"
    );
    Ok(config)
}

/// Log to stderr so `resolve` can stream image bytes on stdout.
fn init_tracing(verbose: bool) {
    let default = if verbose { "thumbwell=debug" } else { "thumbwell=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
