//! unocr CLI - structured content extraction from OCR output

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unocr::extract::{assets_from_value, BackendResponse};
use unocr::model::content_items_from_value;
use unocr::{
    render, ExtractInput, ExtractOptions, Extractor, JsonFormat, LayoutReport, PageSource,
    RasterPages, UnifiedDocument,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "unocr")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract tables, formulas, images and text from OCR output", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract from a markdown file plus optional structured backend output
    Extract {
        /// Backend markdown file
        #[arg(value_name = "MARKDOWN")]
        input: PathBuf,

        /// Content list JSON file
        #[arg(long, value_name = "FILE")]
        content_list: Option<PathBuf>,

        /// Layout report (middle json) file
        #[arg(long, value_name = "FILE")]
        layout: Option<PathBuf>,

        /// Image asset map JSON file
        #[arg(long, value_name = "FILE")]
        assets: Option<PathBuf>,

        #[command(flatten)]
        raster: RasterArgs,

        /// Use the formula confidences of markdown-only backends
        #[arg(long)]
        markdown_only_confidence: bool,

        /// Append image assets nothing references
        #[arg(long)]
        unreferenced: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Extract from a whole backend response JSON
    Response {
        /// Backend response file
        #[arg(value_name = "JSON")]
        input: PathBuf,

        #[command(flatten)]
        raster: RasterArgs,

        /// Append image assets nothing references
        #[arg(long)]
        unreferenced: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show a summary of what a markdown or response file contains
    Info {
        /// Markdown or backend response file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args)]
struct RasterArgs {
    /// Directory of rendered page images (sorted by name)
    #[arg(long, value_name = "DIR")]
    pages: Option<PathBuf>,

    /// Source PDF to render pages from (requires the pdfium feature)
    #[arg(long, value_name = "FILE")]
    pdf: Option<PathBuf>,

    /// Page render scale in pixels per PDF point (minimum 2)
    #[arg(long, value_name = "SCALE", default_value = "2.0")]
    render_scale: f32,
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Output compact JSON
    #[arg(long)]
    compact: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            content_list,
            layout,
            assets,
            raster,
            markdown_only_confidence,
            unreferenced,
            output,
        } => cmd_extract(
            &input,
            content_list.as_deref(),
            layout.as_deref(),
            assets.as_deref(),
            &raster,
            markdown_only_confidence,
            unreferenced,
            &output,
        ),
        Commands::Response {
            input,
            raster,
            unreferenced,
            output,
        } => cmd_response(&input, &raster, unreferenced, &output),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_extract(
    input: &Path,
    content_list: Option<&Path>,
    layout: Option<&Path>,
    assets: Option<&Path>,
    raster: &RasterArgs,
    markdown_only_confidence: bool,
    unreferenced: bool,
    output: &OutputArgs,
) -> CliResult<()> {
    let pb = progress(3);

    pb.set_message("Loading pages...");
    let pages = load_pages(raster)?;
    pb.inc(1);

    pb.set_message("Reading input...");
    let markdown = fs::read_to_string(input)?;
    let mut input = ExtractInput::new(markdown);
    if let Some(path) = content_list {
        input = input.with_content_items(content_items_from_value(&read_json(path)?));
    }
    if let Some(path) = layout {
        input = input.with_layout(LayoutReport::from_value(&read_json(path)?));
    }
    if let Some(path) = assets {
        input = input.with_assets(assets_from_value(&read_json(path)?));
    }
    if let Some(pages) = pages.as_deref() {
        input = input.with_page_source(pages);
    }
    pb.inc(1);

    let mut options = ExtractOptions::new()
        .with_render_scale(raster.render_scale)
        .with_unreferenced_assets(unreferenced);
    if markdown_only_confidence {
        options = options.markdown_only();
    }

    pb.set_message("Extracting...");
    let doc = Extractor::new(options).extract(&input)?;
    pb.inc(1);
    pb.finish_and_clear();

    write_document(&doc, output)?;

    Ok(())
}

fn cmd_response(
    input: &Path,
    raster: &RasterArgs,
    unreferenced: bool,
    output: &OutputArgs,
) -> CliResult<()> {
    let pages = load_pages(raster)?;
    let response = BackendResponse::from_json(&fs::read_to_string(input)?)?;

    let mut input = response.into_input();
    if let Some(pages) = pages.as_deref() {
        input = input.with_page_source(pages);
    }

    let options = ExtractOptions::new()
        .with_render_scale(raster.render_scale)
        .with_unreferenced_assets(unreferenced);
    let doc = Extractor::new(options).extract(&input)?;

    write_document(&doc, output)
}

fn cmd_info(input: &Path) -> CliResult<()> {
    let doc = unocr::extract_file(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Mode".bold(), doc.metadata.mode);
    println!("{}: {}", "Pages".bold(), doc.text.stats.pages);
    if let Some(time) = doc.metadata.processing_time {
        println!("{}: {:.3}s", "Processing time".bold(), time);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Words".bold(), doc.text.stats.words);
    println!("{}: {}", "Characters".bold(), doc.text.stats.characters);
    println!("{}: {}", "Text blocks".bold(), doc.text.blocks.len());
    println!("{}: {}", "Tables".bold(), doc.tables.len());
    println!("{}: {}", "Formulas".bold(), doc.formulas.len());
    println!(
        "{}: {} ({} with pixels)",
        "Images".bold(),
        doc.images.len(),
        doc.resolved_images().count()
    );

    if !doc.text.keywords.is_empty() {
        println!("{}: {}", "Keywords".bold(), doc.text.keywords.join(", "));
    }

    for table in &doc.tables {
        println!(
            "  {} {} ({}x{}, {})",
            "├─".dimmed(),
            table.title,
            table.row_count,
            table.column_count,
            table.source_strategy
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "unocr".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Structured content extraction from OCR output");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/unocr".dimmed());
    println!("License: MIT");
}

fn progress(steps: u64) -> ProgressBar {
    let pb = ProgressBar::new(steps);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

fn read_json(path: &Path) -> CliResult<serde_json::Value> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn load_pages(args: &RasterArgs) -> CliResult<Option<Box<dyn PageSource>>> {
    if let Some(pdf) = args.pdf.as_deref() {
        return open_pdf(pdf).map(Some);
    }
    match args.pages.as_deref() {
        Some(dir) => {
            let pages = RasterPages::from_dir(dir)?;
            log::debug!("loaded {} pages from {}", pages.page_count(), dir.display());
            Ok(Some(Box::new(pages)))
        }
        None => Ok(None),
    }
}

#[cfg(feature = "pdfium")]
fn open_pdf(path: &Path) -> CliResult<Box<dyn PageSource>> {
    if !unocr::is_pdf(path) {
        return Err(format!("{} is not a PDF file", path.display()).into());
    }
    Ok(Box::new(unocr::raster::PdfiumPages::open(path)?))
}

#[cfg(not(feature = "pdfium"))]
fn open_pdf(_path: &Path) -> CliResult<Box<dyn PageSource>> {
    Err("--pdf requires unocr to be built with the pdfium feature".into())
}

fn write_document(doc: &UnifiedDocument, args: &OutputArgs) -> CliResult<()> {
    let format = if args.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = render::to_json(doc, format)?;

    if let Some(path) = args.output.as_deref() {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}
