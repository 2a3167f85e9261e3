//! mingest CLI - manuscript ingestion and checks

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use manuscript_ingest::check::{CheckContext, CheckRegistry, CheckStatus};
use manuscript_ingest::json::{to_json, JsonFormat};
use manuscript_ingest::{
    ingest, ingest_latex, ingest_pdf, process_dir_for, DocumentKind, DocumentSummary,
    IngestOptions, Ingested, LayoutMode,
};

#[derive(Parser)]
#[command(name = "mingest")]
#[command(version)]
#[command(about = "Ingest PDF and LaTeX manuscripts into plain text and run checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a PDF or zipped LaTeX project (format auto-detected)
    Ingest {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        ingest: IngestArgs,

        /// Run the default checks after ingestion
        #[arg(long)]
        check: bool,
    },

    /// Ingest a PDF
    Pdf {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        ingest: IngestArgs,
    },

    /// Ingest a zipped LaTeX project
    Latex {
        /// Input ZIP archive
        #[arg(value_name = "ZIP")]
        input: PathBuf,

        #[command(flatten)]
        ingest: IngestArgs,
    },

    /// Run checks against an ingested document
    Check {
        /// The originally uploaded file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Process directory (derived from FILE if not specified)
        #[arg(short, long, value_name = "DIR")]
        process_dir: Option<PathBuf>,

        /// Output root used to derive the process directory
        #[arg(long, env = "UPLOAD_DIR", value_name = "DIR")]
        output_root: Option<PathBuf>,

        /// Checks to run (all registered checks if not specified)
        #[arg(long, value_delimiter = ',')]
        checks: Option<Vec<String>>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the summary of a process directory
    Info {
        /// Process directory
        #[arg(value_name = "DIR")]
        process_dir: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct IngestArgs {
    /// Page layout of PDF input
    #[arg(long, value_enum, env = "MINGEST_LAYOUT", default_value = "single")]
    layout: LayoutArg,

    /// Directory under which `process/` is created (input's directory if not specified)
    #[arg(long, env = "UPLOAD_DIR", value_name = "DIR")]
    output_root: Option<PathBuf>,
}

impl IngestArgs {
    fn options(&self) -> IngestOptions {
        let mut options = IngestOptions::new().with_layout(self.layout.into());
        if let Some(ref root) = self.output_root {
            options = options.with_output_root(root);
        }
        options
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    /// One text column per page
    Single,
    /// Two text columns per page
    Dual,
}

impl From<LayoutArg> for LayoutMode {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::Single => LayoutMode::Single,
            LayoutArg::Dual => LayoutMode::Dual,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest {
            input,
            ingest,
            check,
        } => cmd_ingest(&input, &ingest, check),
        Commands::Pdf { input, ingest } => cmd_ingest_as(&input, &ingest, DocumentKind::Pdf),
        Commands::Latex { input, ingest } => cmd_ingest_as(&input, &ingest, DocumentKind::Latex),
        Commands::Check {
            input,
            process_dir,
            output_root,
            checks,
            json,
        } => cmd_check(
            &input,
            process_dir.as_deref(),
            output_root.as_deref(),
            checks.as_deref(),
            json,
        ),
        Commands::Info { process_dir } => cmd_info(&process_dir),
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

fn file_name(input: &Path) -> Result<&str, Box<dyn std::error::Error>> {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("invalid file name: {}", input.display()).into())
}

fn cmd_ingest(
    input: &Path,
    args: &IngestArgs,
    check: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ingested = ingest(input, &args.options())?;
    print_ingested(&ingested);

    if check {
        let ctx = CheckContext::new(input, &ingested.process_dir);
        let reports = CheckRegistry::with_defaults().run_and_save(&ctx, None)?;
        println!();
        for report in &reports {
            print_status(&report.check_type, report.status);
        }
    }
    Ok(())
}

fn cmd_ingest_as(
    input: &Path,
    args: &IngestArgs,
    kind: DocumentKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = file_name(input)?;
    let options = args.options();
    let ingested = match kind {
        DocumentKind::Pdf => ingest_pdf(input, name, &options)?,
        DocumentKind::Latex => ingest_latex(input, name, &options)?,
    };
    print_ingested(&ingested);
    Ok(())
}

fn print_ingested(ingested: &Ingested) {
    let summary = &ingested.summary;

    println!("{}", "Ingestion complete".green().bold());
    println!(
        "  {} {}",
        "├─".dimmed(),
        ingested.process_dir.display()
    );
    println!(
        "  {} {} text files",
        "├─".dimmed(),
        summary.text_files.len()
    );
    if let Some(ref main_tex) = summary.main_tex {
        println!("  {} entry: {}", "├─".dimmed(), main_tex.display());
    }
    println!("  {} {} images", "├─".dimmed(), summary.images.len());
    println!("  {} {}", "└─".dimmed(), summary.full_text.display());
}

fn cmd_check(
    input: &Path,
    process_dir: Option<&Path>,
    output_root: Option<&Path>,
    checks: Option<&[String]>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let process_dir = match process_dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let name = file_name(input)?;
            let kind = DocumentKind::from_filename(name)
                .ok_or("cannot derive the process directory; pass --process-dir")?;
            let root = output_root
                .or_else(|| input.parent())
                .unwrap_or_else(|| Path::new("."));
            process_dir_for(root, name, kind)
        }
    };

    log::debug!("Checking {} against {}", input.display(), process_dir.display());
    let ctx = CheckContext::new(input, &process_dir);
    let reports = CheckRegistry::with_defaults().run_and_save(&ctx, checks)?;

    if json {
        println!("{}", to_json(&reports, JsonFormat::Pretty)?);
        return Ok(());
    }

    for report in &reports {
        print_status(&report.check_type, report.status);
        if let Some(ref message) = report.message {
            println!("  {}", message.dimmed());
        }
        for result in &report.results {
            println!("  {}", result);
        }
    }
    Ok(())
}

fn print_status(name: &str, status: CheckStatus) {
    let label = match status {
        CheckStatus::Passed => status.to_string().green().bold(),
        CheckStatus::Failed | CheckStatus::Error => status.to_string().red().bold(),
        CheckStatus::NotApplicable | CheckStatus::NotFound => status.to_string().yellow(),
    };
    println!("{}: {}", name.bold(), label);
}

fn cmd_info(process_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let summary = DocumentSummary::load(process_dir)?;

    println!("{}", "Document Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Process dir".bold(), process_dir.display());
    println!("{}: {}", "Full text".bold(), summary.full_text.display());
    if let Some(ref main_tex) = summary.main_tex {
        println!("{}: {}", "Entry file".bold(), main_tex.display());
    }
    println!("{}: {}", "Text files".bold(), summary.text_files.len());
    println!(
        "{}: {}",
        "Embedded images".bold(),
        summary.embedded_images().count()
    );

    let graphics: Vec<_> = summary.graphics().collect();
    if !graphics.is_empty() {
        let unresolved = graphics.iter().filter(|g| g.resolved_path.is_none()).count();
        println!(
            "{}: {} ({} unresolved)",
            "Graphics".bold(),
            graphics.len(),
            unresolved
        );
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = summary.read_full_text()?;
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), text.chars().count());
    println!("{}: {}", "Lines".bold(), text.lines().count());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "mingest".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Manuscript ingestion and cross-reference checking");
}
