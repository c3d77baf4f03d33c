//! Healthdata CLI - Clean, validate and analyze healthcare records
//!
//! # Commands
//!
//! ```bash
//! healthdata serve                          # Start HTTP server (port 3000)
//! healthdata process records.json           # Clean + transform + validate + analyze
//! healthdata analyze records.json           # Summary only (no cleaning)
//! healthdata group records.json --by subjectId
//! healthdata sample                         # Print the built-in sample batch
//! ```
//!
//! Input files hold either a JSON array of records or `{ "data": [...] }`.

use clap::{Parser, Subcommand};
use chrono::Utc;
use healthdata::{
    analyze, api::mock::mock_records, group_by, logging::init_logging, parse_required_fields,
    read_batch, run, Config, ProcessOptions, RecordField,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "healthdata")]
#[command(about = "Clean, validate and analyze healthcare records", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Run the full pipeline on a batch
    Process {
        /// Input JSON file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Required fields, comma separated (default: id,subjectId,category)
        #[arg(long, value_delimiter = ',')]
        required_fields: Option<Vec<String>>,
    },

    /// Summarize a batch as-is
    Analyze {
        /// Input JSON file
        input: PathBuf,
    },

    /// Partition a batch by a record field
    Group {
        /// Input JSON file
        input: PathBuf,

        /// Field to group by (id, subjectId, category, value, timestamp)
        #[arg(short, long)]
        by: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the built-in sample records
    Sample {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let result = match cli.command {
        Commands::Serve { port } => cmd_serve(port).await,

        Commands::Process {
            input,
            output,
            required_fields,
        } => cmd_process(&input, output.as_deref(), required_fields.as_deref()),

        Commands::Analyze { input } => cmd_analyze(&input),

        Commands::Group { input, by, output } => cmd_group(&input, &by, output.as_deref()),

        Commands::Sample { output } => cmd_sample(output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    healthdata::server::start_server(config, port).await?;
    Ok(())
}

fn cmd_process(
    input: &Path,
    output: Option<&Path>,
    required_fields: Option<&[String]>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let raw = read_batch(input)?;
    let options = match required_fields {
        Some(names) => ProcessOptions::default().with_required_fields(parse_required_fields(names)?),
        None => ProcessOptions::default(),
    };

    let result = run(raw, &options)?;

    eprintln!("   Received: {}", result.report.received);
    eprintln!("   Duplicates: {}", result.report.duplicates);
    eprintln!("   Incomplete: {}", result.report.incomplete);
    eprintln!("✅ Kept {} records", result.report.kept);

    let json = serde_json::to_string_pretty(&json!({
        "processedData": result.records,
        "analysis": result.analysis,
        "report": result.report,
    }))?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_analyze(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let records = read_batch(input)?;
    let summary = analyze(&records);

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_group(input: &Path, by: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📦 Grouping: {} by {}", input.display(), by);

    let field: RecordField = by.parse()?;
    let records = read_batch(input)?;
    let groups = group_by(&records, field);

    eprintln!("   {} records in {} groups", records.len(), groups.len());

    let json = serde_json::to_string_pretty(&groups)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_sample(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&mock_records(Utc::now()))?;
    write_output(&json, output)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("   💾 Saved to: {}", p.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
