use clap::{Parser, Subcommand};
use page_images::config::{self, ProjectConfig};
use page_images::imaging::{RustBackend, ScaleRequest};
use page_images::layout::{CropVariant, ImageCategory, ProjectLayout};
use page_images::retrieve::Retriever;
use page_images::{output, preprocess};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Optional target size shared by the retrieval commands.
#[derive(clap::Args, Clone)]
struct SizeArgs {
    /// Target width in pixels (height follows the aspect ratio if omitted)
    #[arg(long)]
    width: Option<u32>,

    /// Target height in pixels (width follows the aspect ratio if omitted)
    #[arg(long)]
    height: Option<u32>,
}

impl SizeArgs {
    fn request(&self) -> Result<ScaleRequest, page_images::imaging::BackendError> {
        ScaleRequest::new(self.width, self.height)
    }
}

#[derive(Parser)]
#[command(name = "page-images")]
#[command(about = "Serve OCR project page images as base64")]
#[command(long_about = "\
Serve OCR project page images as base64

Images are printed to stdout as base64 text. Without --width or --height
the stored file is served byte for byte; with either, the image is scaled
(nearest-neighbor down to the nearest power of two, then bilinear) and
re-encoded in the configured output format.

Project structure:

  project/
  ├── config.toml                  # Optional, see 'page-images gen-config'
  ├── Original/0001.png            # --category original
  ├── PreProc/
  │   ├── Gray/0001.png            # --category gray
  │   ├── Binary/0001.png          # --category binary
  │   └── Despeckled/0001.png      # --category despeckled (written by 'despeckle')
  └── PageSegmentation/0001/
      ├── <segment>.bin.png        # segment crop, --variant binary
      ├── <segment>.nrm.png        # segment crop, --variant gray
      └── <segment>/<line>.bin.png # line crop

Logging goes to stderr; set RUST_LOG=debug for detail.")]
#[command(version)]
struct Cli {
    /// Project root directory
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a page image as base64
    Page {
        page_id: String,
        #[arg(long, value_enum, default_value = "original", ignore_case = true)]
        category: ImageCategory,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Print a segment crop as base64
    Segment {
        page_id: String,
        segment_id: String,
        #[arg(long, value_enum, default_value = "binary", ignore_case = true)]
        variant: CropVariant,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Print a line crop as base64
    Line {
        page_id: String,
        segment_id: String,
        line_id: String,
        #[arg(long, value_enum, default_value = "binary", ignore_case = true)]
        variant: CropVariant,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Print every page image of a category as a JSON object of id → base64
    List {
        #[arg(long, value_enum, default_value = "original", ignore_case = true)]
        category: ImageCategory,
    },
    /// Remove small noise components from every binary page
    Despeckle {
        /// Override [despeckle] max_area from config.toml
        #[arg(long)]
        max_area: Option<f64>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.project)?;
    let ProjectConfig {
        layout,
        output: output_config,
        despeckle,
        processing,
    } = config;
    let layout = ProjectLayout::new(&cli.project, layout);
    let retriever = Retriever::new(RustBackend::new(), output_config.format);

    match cli.command {
        Command::Page {
            page_id,
            category,
            size,
        } => {
            let b64 = retriever.page_image(&layout, &page_id, category, &size.request()?)?;
            println!("{b64}");
        }
        Command::Segment {
            page_id,
            segment_id,
            variant,
            size,
        } => {
            let b64 =
                retriever.segment_image(&layout, &page_id, &segment_id, variant, &size.request()?)?;
            println!("{b64}");
        }
        Command::Line {
            page_id,
            segment_id,
            line_id,
            variant,
            size,
        } => {
            let b64 = retriever.line_image(
                &layout,
                &page_id,
                &segment_id,
                &line_id,
                variant,
                &size.request()?,
            )?;
            println!("{b64}");
        }
        Command::List { category } => {
            let images = retriever.image_list(&layout, category)?;
            println!("{}", output::format_image_list(&images)?);
        }
        Command::Despeckle { max_area } => {
            let max_area = max_area.unwrap_or(despeckle.max_area);
            init_thread_pool(&processing);
            let root = layout.root().to_path_buf();
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_despeckle_event(&event, &root) {
                        println!("{line}");
                    }
                }
            });
            let events =
                preprocess::despeckle_pages(&RustBackend::new(), &layout, max_area, Some(tx));
            printer
                .join()
                .map_err(|_| "despeckle output thread panicked")?;
            output::print_despeckle_summary(&events?);
        }
        Command::GenConfig => unreachable!("handled before config loading"),
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Log filter from `RUST_LOG` directives, `warn` when unset or unparsable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}
