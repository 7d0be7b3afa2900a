use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use webp_ingest::config::{self, Settings};
use webp_ingest::output;
use webp_ingest::pipeline::{IngestionPipeline, UploadedInput};
use webp_ingest::storage::Visibility;
use webp_ingest::upload_field::WebpUploadField;

#[derive(Clone, Copy, ValueEnum)]
enum VisibilityArg {
    Public,
    Private,
}

impl From<VisibilityArg> for Visibility {
    fn from(arg: VisibilityArg) -> Self {
        match arg {
            VisibilityArg::Public => Visibility::Public,
            VisibilityArg::Private => Visibility::Private,
        }
    }
}

/// Flags for a single ingestion.
#[derive(clap::Args)]
struct IngestArgs {
    /// File to ingest
    file: PathBuf,

    /// Filename to store under (defaults to the file's own name)
    #[arg(long)]
    name: Option<String>,

    /// Declared MIME type (defaults to the type implied by the extension)
    #[arg(long)]
    mime: Option<String>,

    /// Destination directory on the disk
    #[arg(long, default_value = "")]
    directory: String,

    /// Disk to store on (defaults to storage.default_disk)
    #[arg(long)]
    disk: Option<String>,

    /// Visibility of the stored file (defaults to storage.visibility)
    #[arg(long, value_enum)]
    visibility: Option<VisibilityArg>,

    /// WebP quality 1-100 (defaults to uploads.quality)
    #[arg(long, conflicts_with = "no_webp")]
    quality: Option<u32>,

    /// Max width in pixels (defaults to uploads.resize_width)
    #[arg(long, conflicts_with = "no_webp")]
    max_width: Option<u32>,

    /// Store the file verbatim without converting
    #[arg(long)]
    no_webp: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
#[command(name = "webp-ingest")]
#[command(about = "Convert uploaded images to WebP and store them, keeping the original on failure")]
#[command(long_about = "\
Convert uploaded images to WebP and store them, keeping the original on failure

Images (by declared MIME type) are decoded, scaled down to the max width if
one is set, encoded as WebP, and stored as <directory>/<stem>.webp. Anything
that is not an image, or fails to convert, is stored unchanged as
<directory>/<original name>.

Settings are read from <config-dir>/config.toml.
Run 'webp-ingest gen-config' to print a documented config.toml.

Set RUST_LOG=debug to see every step.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert and store one file
    Ingest(IngestArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Print the resolved settings
    ShowConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Ingest(args) => {
            let settings = load_settings(&cli.config_dir)?;
            let pipeline = IngestionPipeline::from_settings(&settings);

            let mut input = UploadedInput::from_path(&args.file, args.mime.as_deref())?;
            if let Some(name) = args.name {
                input = input.with_original_name(name);
            }

            let mut field = WebpUploadField::new("cli", &settings).directory(&args.directory);
            if let Some(disk) = args.disk {
                field = field.disk(disk);
            }
            if let Some(visibility) = args.visibility {
                field = field.visibility(visibility.into());
            }
            if !args.no_webp {
                field = field.webp(args.quality)?.resize(args.max_width)?;
            }

            let result = field.save(&pipeline, &input)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let config = field.ingestion_config();
                let stored_size = settings
                    .storage
                    .disks
                    .get(&config.disk)
                    .and_then(|disk| std::fs::metadata(disk.root.join(&result.stored_path)).ok())
                    .map(|meta| meta.len());
                output::print_ingest_result(&input, &config, &result, stored_size);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::ShowConfig => {
            let settings = load_settings(&cli.config_dir)?;
            print!("{}", config::to_toml_string(&settings)?);
        }
    }

    Ok(())
}

/// Load settings and anchor relative disk roots at the config directory.
fn load_settings(config_dir: &std::path::Path) -> Result<Settings, config::ConfigError> {
    let settings = config::load_config(config_dir)?;
    Ok(Settings {
        storage: settings.storage.rooted_at(config_dir),
        ..settings
    })
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings and errors).
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
