//! table-ir CLI - command-line interface for HTML <-> OTSL table conversion.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use table_ir::{ConversionOptions, Converter, Result};

#[derive(Parser)]
#[command(
    name = "table-ir",
    version,
    about = "Bidirectional HTML table <-> OTSL conversion",
    long_about = "Converts between HTML <table> markup and OTSL (Optimized Table\n\
                  Structure Language) through a shared intermediate representation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an HTML table to OTSL
    ToOtsl {
        /// Input HTML file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Output file (writes stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit `<loc_N>` placeholder location tokens
        #[arg(long)]
        include_location: bool,

        /// Seed for deterministic location tokens
        #[arg(long)]
        location_seed: Option<u64>,

        /// Reject malformed input instead of recovering from it
        #[arg(long)]
        strict: bool,

        /// Skip LaTeX formula detection
        #[arg(long)]
        no_latex: bool,
    },

    /// Convert an OTSL string to HTML
    ToHtml {
        /// Input OTSL file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Output file (writes stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit a `border="1"` attribute
        #[arg(long)]
        include_borders: bool,

        /// Force a consistent thead/tbody structure
        #[arg(long)]
        normalize_for_teds: bool,

        /// Force row 0 into the header section regardless of header detection
        #[arg(long)]
        force_first_row_thead: bool,

        /// Reject malformed input instead of recovering from it
        #[arg(long)]
        strict: bool,

        /// Skip LaTeX formula detection
        #[arg(long)]
        no_latex: bool,
    },

    /// Check that an HTML table and an OTSL string describe the same table
    Validate {
        /// HTML file
        html: PathBuf,

        /// OTSL file
        otsl: PathBuf,
    },

    /// Round-trip a table through the other format and back
    Roundtrip {
        /// Input file
        input: PathBuf,

        /// Treat the input as OTSL instead of HTML
        #[arg(long)]
        from_otsl: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(log_level).with_target(false).init();

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::ToOtsl {
            input,
            output,
            include_location,
            location_seed,
            strict,
            no_latex,
        } => {
            let html = read_input(input.as_ref())?;
            let options = ConversionOptions {
                preserve_latex: !no_latex,
                strict,
                include_location,
                location_seed,
                ..Default::default()
            };
            let converter = Converter::new(options);
            let otsl = converter.html_to_otsl(&html)?;
            write_output(output.as_ref(), &otsl)?;
            Ok(())
        }

        Commands::ToHtml {
            input,
            output,
            include_borders,
            normalize_for_teds,
            force_first_row_thead,
            strict,
            no_latex,
        } => {
            let otsl = read_input(input.as_ref())?;
            let options = ConversionOptions {
                preserve_latex: !no_latex,
                strict,
                include_borders,
                normalize_for_teds,
                force_first_row_thead,
                ..Default::default()
            };
            let converter = Converter::new(options);
            let html = converter.otsl_to_html(&otsl)?;
            write_output(output.as_ref(), &html)?;
            Ok(())
        }

        Commands::Validate { html, otsl } => {
            let html_content = fs::read_to_string(&html).map_err(to_malformed_html_error)?;
            let otsl_content = fs::read_to_string(&otsl).map_err(to_malformed_otsl_error)?;
            let converter = Converter::new(ConversionOptions::default());
            let report = converter.validate_conversion(&html_content, &otsl_content);
            if report.is_valid {
                println!("valid: {}", report.message);
            } else {
                println!("invalid: {}", report.message);
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Roundtrip { input, from_otsl } => {
            let content = fs::read_to_string(&input).map_err(to_malformed_html_error)?;
            let converter = Converter::new(ConversionOptions::default());
            if from_otsl {
                let (html, reconstructed, summary) = converter.roundtrip_otsl(&content)?;
                println!("{summary}");
                println!("--- intermediate html ---\n{html}");
                println!("--- reconstructed otsl ---\n{reconstructed}");
            } else {
                let (otsl, reconstructed, summary) = converter.roundtrip_html(&content)?;
                println!("{summary}");
                println!("--- intermediate otsl ---\n{otsl}");
                println!("--- reconstructed html ---\n{reconstructed}");
            }
            Ok(())
        }
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    use std::io::Read;
    match path {
        Some(p) => fs::read_to_string(p).map_err(to_malformed_html_error),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(to_malformed_html_error)?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(p) => fs::write(p, content).map_err(to_malformed_html_error),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

fn to_malformed_html_error(e: std::io::Error) -> table_ir::TableIrError {
    table_ir::TableIrError::MalformedHtml(e.to_string())
}

fn to_malformed_otsl_error(e: std::io::Error) -> table_ir::TableIrError {
    table_ir::TableIrError::MalformedOtsl(e.to_string())
}
