//! nailview command-line entry point.
//!
//! # Responsibility
//! - Expose `generate` (generate-all) and `append` (append-and-regenerate).
//! - Initialize logging before any pipeline work.
//! - Map failures to exit code 1 with the full error chain on stderr.

use clap::{Args, Parser, Subcommand};
use nailview_core::{
    append_and_regenerate, default_log_level, generate_all, init_logging, init_stderr_logging,
    Dataset, GenerateOptions, RawRecord,
};
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nailview")]
#[command(version)]
#[command(about = "Render the neutral and reveal compositions of a research dataset")]
struct Cli {
    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; stderr when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every artifact from the current dataset
    Generate {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Validate and append one record, archive old outputs, regenerate
    Append {
        #[command(flatten)]
        output: OutputArgs,

        /// JSON file holding one record object
        #[arg(long)]
        record: PathBuf,

        /// Directory receiving versioned copies of previous outputs
        #[arg(long, default_value = "archive")]
        archive_dir: PathBuf,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Dataset JSON document
    #[arg(long, default_value = "data/domains.json")]
    dataset: PathBuf,

    /// Output directory for all artifacts
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// SVG canvas edge in pixels
    #[arg(long, default_value_t = nailview_core::pipeline::DEFAULT_PIXEL_SIZE)]
    size: f64,

    /// Physical canvas edge in centimetres for the instructions
    #[arg(long, default_value_t = nailview_core::instructions::DEFAULT_CANVAS_CM)]
    canvas_cm: f64,
}

impl OutputArgs {
    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            out_dir: self.out_dir.clone(),
            pixel_size: self.size,
            canvas_cm: self.canvas_cm,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let logging = match &cli.log_dir {
        Some(dir) => init_logging(level, &dir.to_string_lossy()),
        None => init_stderr_logging(level),
    };
    if let Err(message) = logging {
        eprintln!("error: {message}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Generate { output } => {
            let dataset = Dataset::load(&output.dataset)?;
            let report = generate_all(&dataset, &output.options())?;
            info!(
                "event=cli_run module=cli status=ok command=generate artifacts={}",
                report.artifacts.len()
            );
            for artifact in &report.artifacts {
                println!("{}", artifact.display());
            }
            if report.warnings > 0 {
                println!("{} record warning(s), see log", report.warnings);
            }
        }
        Commands::Append {
            output,
            record,
            archive_dir,
        } => {
            let text = std::fs::read_to_string(&record)
                .map_err(|err| format!("cannot read record `{}`: {err}", record.display()))?;
            let raw: RawRecord = serde_json::from_str(&text)
                .map_err(|err| format!("record `{}` is not valid JSON: {err}", record.display()))?;
            let report =
                append_and_regenerate(&output.dataset, raw, &output.options(), &archive_dir)?;
            info!(
                "event=cli_run module=cli status=ok command=append records={}",
                report.dataset.records().len()
            );
            if let Some(archived) = &report.archived {
                println!("archived previous outputs to {}", archived.display());
            }
            println!(
                "dataset now holds {} record(s)",
                report.dataset.records().len()
            );
            for artifact in &report.generation.artifacts {
                println!("{}", artifact.display());
            }
        }
    }
    Ok(())
}
