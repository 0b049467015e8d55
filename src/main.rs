use clap::{ArgAction, Parser, Subcommand};
use meme_caption::batch;
use meme_caption::compose::{CaptionRequest, CaptionSource, Composer, CompositionRequest};
use meme_caption::config::{self, CaptionConfig};
use meme_caption::output;
use meme_caption::templates::{DEFAULT_TEMPLATE_LIMIT, TemplateDirectory};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meme-caption")]
#[command(about = "Draw classic meme captions onto any image")]
#[command(long_about = "\
Draw classic meme captions onto any image

The source is scaled to a fixed width (1024px by default), the captions are
uppercased, word-wrapped and drawn in white with a black outline, top block
from the top edge and bottom block up from the bottom edge. The result is a
JPEG, byte-identical for identical inputs.

Sources:
  --url URL           fetched over HTTP(S) with a timeout
  --file PATH         read from disk
  --template ID|NAME  looked up in the template directory (see 'templates')

A single --text caption is split at its midpoint into top and bottom when
neither --top nor --bottom is given.

Run 'meme-caption gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (TOML); stock defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log detail (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
#[command(group(
    clap::ArgGroup::new("source")
        .required(true)
        .args(["url", "file", "template"]),
))]
struct ComposeArgs {
    /// Source image URL
    #[arg(long)]
    url: Option<String>,

    /// Source image file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Template id or name from the template directory
    #[arg(long)]
    template: Option<String>,

    /// Top caption
    #[arg(long)]
    top: Option<String>,

    /// Bottom caption
    #[arg(long)]
    bottom: Option<String>,

    /// Single caption, split between top and bottom
    #[arg(long)]
    text: Option<String>,

    /// Output width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long)]
    quality: Option<u32>,

    /// Where to write the JPEG
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Caption one image
    Compose(ComposeArgs),
    /// Caption every job of a JSON job file, in parallel
    Batch {
        /// Job file
        jobs: PathBuf,

        /// Directory for the composed images
        #[arg(long, default_value = "memes")]
        out_dir: PathBuf,
    },
    /// List popular templates
    Templates {
        /// How many templates to show
        #[arg(long, default_value_t = DEFAULT_TEMPLATE_LIMIT)]
        limit: usize,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Compose(args) => run_compose(&config, args)?,
        Command::Batch { jobs, out_dir } => {
            init_thread_pool(&config.processing);
            let composer = Composer::from_config(&config)?;
            let job_list = batch::load_jobs(&jobs)?;
            let base_dir = jobs.parent().unwrap_or(Path::new("."));
            let report =
                batch::run_batch(&composer, &job_list, base_dir, &out_dir, &config.output)?;
            output::print_batch_report(&report);
            if report.failed() > 0 {
                return Err(format!("{} of {} jobs failed", report.failed(), job_list.len()).into());
            }
        }
        Command::Templates { limit } => {
            let fetcher = meme_caption::fetch::Fetcher::new(&config.fetch)?;
            let templates =
                TemplateDirectory::new(&fetcher, &config.fetch.templates_url).top_templates(limit)?;
            output::print_templates(&templates);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn run_compose(config: &CaptionConfig, args: ComposeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let composer = Composer::from_config(config)?;

    let request = CompositionRequest::resolve(
        CaptionRequest {
            top_text: args.top,
            bottom_text: args.bottom,
            text: args.text,
            width: args.width,
            quality: args.quality,
        },
        &config.output,
    )?;

    let source = match (args.url, args.file, args.template) {
        (Some(url), _, _) => CaptionSource::Url(url),
        (_, Some(path), _) => CaptionSource::from_path(&path)?,
        (_, _, Some(key)) => {
            let template = TemplateDirectory::new(composer.fetcher(), &config.fetch.templates_url)
                .lookup(&key)?;
            tracing::info!(id = %template.id, name = %template.name, "using template");
            CaptionSource::Url(template.url)
        }
        (None, None, None) => return Err("one of --url, --file or --template is required".into()),
    };

    let result = composer.compose(source, &request)?;
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&args.output, &result.bytes)?;
    output::print_compose_result(&result, &args.output);
    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
