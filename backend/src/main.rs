//! Dupcheck CLI - find duplicate rows in transaction exports
//!
//! # Main Commands
//!
//! ```bash
//! dupcheck serve                         # Start HTTP server (port 3000)
//! dupcheck check export.csv --out-dir out  # Both rules, write artifacts
//! dupcheck clean export.xlsx -o clean.xlsx # Exact rule, cleaned table only
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! dupcheck parse export.csv         # Just parse the table to JSON
//! dupcheck normalize rate "8,1%"    # Canonical form of one value
//! dupcheck default-config           # Show the built-in rule configuration
//! ```
//!
//! `DUPCHECK_CONFIG` and `DUPCHECK_PORT` (also read from `.env`) supply
//! defaults for `--config` and `--port`.

use clap::{Parser, Subcommand};
use dupcheck::{
    dedupe_file, export_outcome, parse_file_auto, table_to_csv_string, table_to_xlsx_bytes,
    CheckResponse,
    DedupConfig, DedupOptions, FieldNormalizer, FieldType, RuleSelection,
};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "dupcheck")]
#[command(about = "Detect and remove duplicate rows in spreadsheet exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the duplicate rules and print the report JSON
    Check {
        /// Input CSV or XLSX file
        input: PathBuf,

        /// Rules to apply: exact, core or both
        #[arg(short, long, default_value = "both")]
        rule: RuleSelection,

        /// Rule configuration JSON (default: $DUPCHECK_CONFIG or built-in)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Directory for cleaned.csv and the identifier lists
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Apply the exact rule and output the cleaned table
    Clean {
        /// Input CSV or XLSX file
        input: PathBuf,

        /// Rule configuration JSON (default: $DUPCHECK_CONFIG or built-in)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file, XLSX when it ends in .xlsx (default: CSV on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a CSV or XLSX file and output JSON
    Parse {
        /// Input CSV or XLSX file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the canonical form of a value
    Normalize {
        /// Field type: boolean, rate, name or text
        field_type: FieldType,

        /// Raw value
        value: String,

        /// Take stop words from this configuration (default: $DUPCHECK_CONFIG or built-in)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show the built-in rule configuration
    DefaultConfig,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: $DUPCHECK_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Rule configuration JSON (default: $DUPCHECK_CONFIG or built-in)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            input,
            rule,
            config,
            delimiter,
            out_dir,
        } => cmd_check(&input, rule, config.as_deref(), delimiter, out_dir.as_deref()),

        Commands::Clean {
            input,
            config,
            delimiter,
            output,
        } => cmd_clean(&input, config.as_deref(), delimiter, output.as_deref()),

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Normalize {
            field_type,
            value,
            config,
        } => cmd_normalize(field_type, &value, config.as_deref()),

        Commands::DefaultConfig => cmd_default_config(),

        Commands::Serve { port, config } => cmd_serve(port, config.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Explicit path, then `DUPCHECK_CONFIG`, then the built-in rules.
fn load_config(path: Option<&Path>) -> Result<DedupConfig, Box<dyn std::error::Error>> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("DUPCHECK_CONFIG").map(PathBuf::from));

    match path {
        Some(p) => {
            eprintln!("⚙️  Config: {}", p.display());
            Ok(DedupConfig::from_file(&p)?)
        }
        None => Ok(DedupConfig::default()),
    }
}

fn cmd_check(
    input: &Path,
    rules: RuleSelection,
    config: Option<&Path>,
    delimiter: Option<char>,
    out_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Checking: {}", input.display());

    let options = DedupOptions {
        config: load_config(config)?,
        rules,
        delimiter,
    };
    let run = dedupe_file(input, &options)?;

    eprintln!("\n📊 Results:");
    if let Some(exact) = &run.outcome.exact {
        eprintln!("   Exact: {}", exact.report.summary());
        eprintln!("   Rows: {} in, {} kept", exact.report.input_rows, exact.report.survivor_rows);
    }
    if let Some(core) = &run.outcome.core {
        eprintln!("   Core:  {}", core.report.summary());
    }

    if let Some(dir) = out_dir {
        let written = export_outcome(&run.outcome, &options.config.identifier_column, dir)?;
        for path in written {
            eprintln!("   💾 Saved to: {}", path.display());
        }
    }

    let json = serde_json::to_string_pretty(&CheckResponse::from(run))?;
    println!("{}", json);

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_clean(
    input: &Path,
    config: Option<&Path>,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🧹 Cleaning: {}", input.display());

    let options = DedupOptions {
        config: load_config(config)?,
        rules: RuleSelection::Exact,
        delimiter,
    };
    let run = dedupe_file(input, &options)?;
    let exact = run
        .outcome
        .exact
        .ok_or("exact rule produced no result")?;

    eprintln!("   {}", exact.report.summary());
    if !exact.report.removed_ids.is_empty() {
        eprintln!("   Removed: {}", exact.report.removed_ids.join(", "));
    }

    match output {
        Some(path) if is_xlsx_path(path) => {
            fs::write(path, table_to_xlsx_bytes(&exact.cleaned)?)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        Some(path) => {
            fs::write(path, table_to_csv_string(&exact.cleaned)?)?;
            eprintln!("💾 Output written to: {}", path.display());
        }
        None => print!("{}", table_to_csv_string(&exact.cleaned)?),
    }

    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let result = parse_file_auto(input, delimiter)?;

    eprintln!("   Format: {}", result.format);
    if let Some(used) = result.delimiter {
        eprintln!("   Encoding: {}", result.encoding);
        eprintln!(
            "   Delimiter: '{}'{}",
            dupcheck::format_delimiter(used),
            if delimiter.is_none() { " (auto-detected)" } else { "" }
        );
    }
    eprintln!("   Columns: {}", result.headers().join(", "));
    eprintln!("✅ Parsed {} records", result.table.len());

    let json = serde_json::to_string_pretty(&result.table)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_normalize(
    field_type: FieldType,
    value: &str,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let normalizer = FieldNormalizer::from_config(&load_config(config)?);
    println!("{}", normalizer.normalize(field_type, value));
    Ok(())
}

fn cmd_default_config() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", DedupConfig::default().to_json()?);
    Ok(())
}

async fn cmd_serve(port: Option<u16>, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let port = match port {
        Some(p) => p,
        None => match std::env::var("DUPCHECK_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| format!("Invalid DUPCHECK_PORT '{}'", value))?,
            Err(_) => DEFAULT_PORT,
        },
    };

    dupcheck::server::start_server(port, load_config(config)?).await
}

fn is_xlsx_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"))
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
