//! excel2csv CLI - XLSX worksheet to CSV conversion tool
//!
//! A command-line tool for exporting one sheet of an Excel workbook as
//! delimited text.

use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use excel2csv::{CsvOptions, LineTerminator, QuoteStyle, WorkbookKind, XlsxReader};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Convert a worksheet of an Excel workbook to CSV
#[derive(Parser)]
#[command(
    name = "excel2csv",
    author = "mammb",
    version,
    about = "Convert an Excel worksheet to CSV",
    long_about = "excel2csv - Streaming XLSX to CSV conversion.\n\n\
                  Exports one sheet of an .xlsx/.xlsm workbook, keeping empty rows and \
                  columns in place and rendering numbers and dates as Excel displays them."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress the success message
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a sheet to CSV
    Convert {
        /// Input workbook path
        input: PathBuf,

        /// Sheet name (default: first sheet)
        sheet: Option<String>,

        /// Output file path (default: input path with a .csv extension)
        #[arg(short, long, conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Write CSV to stdout instead of a file
        #[arg(long)]
        stdout: bool,

        /// Field delimiter (a single ASCII character, or "tab")
        #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
        delimiter: u8,

        /// Terminate lines with LF instead of CRLF
        #[arg(long)]
        lf: bool,

        /// Quote every field
        #[arg(long)]
        quote_all: bool,
    },

    /// List the sheets of a workbook
    #[command(visible_alias = "ls")]
    Sheets {
        /// Input workbook path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Convert {
            input,
            sheet,
            output,
            stdout,
            delimiter,
            lf,
            quote_all,
        } => {
            check_input(&input)?;

            let mut options = CsvOptions::new().with_delimiter(delimiter);
            if lf {
                options = options.with_line_terminator(LineTerminator::Lf);
            }
            if quote_all {
                options = options.with_quote_style(QuoteStyle::Always);
            }

            if stdout {
                let out = io::stdout();
                let summary =
                    excel2csv::convert_to_writer(&input, out.lock(), sheet.as_deref(), &options)?;
                log::info!(
                    "Converted sheet {:?}: {} rows, {} cells",
                    summary.sheet,
                    summary.rows,
                    summary.cells
                );
                return Ok(());
            }

            let output = output.unwrap_or_else(|| default_output(&input));
            check_output(&input, &output)?;
            let pb = create_spinner(cli.verbose, "Converting workbook...");
            let result =
                excel2csv::convert_with_options(&input, &output, sheet.as_deref(), &options);
            pb.finish_and_clear();
            let summary = result?;

            if !cli.quiet {
                println!(
                    "{} Converted sheet {:?} to {} ({} rows, {} cells)",
                    "✓".green().bold(),
                    summary.sheet,
                    output.display(),
                    summary.rows,
                    summary.cells
                );
            }
        }

        Commands::Sheets { input, json } => {
            check_input(&input)?;
            let reader = XlsxReader::open(&input)?;

            if json {
                let value = serde_json::json!({
                    "kind": reader.kind(),
                    "sheets": reader.sheets(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            println!("{}", "Workbook Sheets".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Format".bold(), reader.kind());
            println!();
            for sheet in reader.sheets() {
                match sheet.state {
                    Some(ref state) => println!(
                        "{:>3}. {} {}",
                        sheet.index + 1,
                        sheet.name,
                        format!("({})", state).dimmed()
                    ),
                    None => println!("{:>3}. {}", sheet.index + 1, sheet.name),
                }
            }
            if reader.sheet_count() == 0 {
                println!("{} Workbook has no worksheets", "!".yellow().bold());
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_version() {
    println!("{} {}", "excel2csv".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Streaming conversion of a single XLSX worksheet to CSV");
    println!();
    println!("Supported formats: XLSX, XLSM, XLTX, XLTM");
    println!("Repository: https://github.com/mammb/excel2csv");
}

/// Reject inputs that are missing, not regular files or not workbooks.
fn check_input(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    if !path.is_file() {
        return Err(format!("Input is not a file: {}", path.display()).into());
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    if WorkbookKind::from_extension(&ext).is_none() {
        return Err(format!(
            "Unsupported file extension: {} (expected .xlsx or .xlsm)",
            path.display()
        )
        .into());
    }
    Ok(())
}

/// Reject an output path that names the input workbook.
fn check_output(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let same = match (std::fs::canonicalize(input), std::fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => input == output,
    };
    if same {
        return Err(format!("Output would overwrite the input: {}", output.display()).into());
    }
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    input.with_extension("csv")
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() && !matches!(c, '\r' | '\n' | '"') => Ok(c as u8),
                _ => Err(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    value
                )),
            }
        }
    }
}

fn create_spinner(verbose: u8, message: &str) -> ProgressBar {
    // Log lines on stderr would tear through the spinner
    if verbose > 0 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            log::Level::Error => "ERROR".red().bold(),
            log::Level::Warn => "WARN".yellow().bold(),
            log::Level::Info => "INFO".green(),
            log::Level::Debug => "DEBUG".blue(),
            log::Level::Trace => "TRACE".dimmed(),
        };
        let _ = writeln!(io::stderr().lock(), "{} {}", level, record.args());
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
