use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "querysim",
    about = "Generate labeled synthetic SQL workloads for query-cost models",
    version,
    after_help = "Examples:
  querysim generate --num 5000 --seed 42 --out data/queries.csv
  querysim generate --num 100000 --shards 8 --format jsonl --out data/queries.jsonl
  querysim preview --num 5 --pattern multi_join
  querysim schema
  querysim graph --format mermaid
  querysim check --manifest data/querysim.manifest.json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a querysim.toml (defaults to ./querysim.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a labeled dataset
    Generate(GenerateArgs),

    /// Print a few generated records without writing a dataset
    Preview(PreviewArgs),

    /// Show the schema registry in use
    Schema(SchemaArgs),

    /// Visualize the join graph
    Graph(GraphArgs),

    /// Print the feature contract
    Features,

    /// Check a dataset manifest for schema drift and file integrity
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Number of queries to generate
    #[arg(short, long, env = "QUERYSIM_NUM")]
    pub num: Option<usize>,

    /// Output file path; stdout when omitted
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Random seed for deterministic generation
    #[arg(long, env = "QUERYSIM_SEED")]
    pub seed: Option<u64>,

    /// Output format (auto-detected from file extension if not specified)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Split generation over this many parallel streams
    #[arg(long)]
    pub shards: Option<usize>,

    /// Skip writing querysim.manifest.json next to the dataset
    #[arg(long)]
    pub no_manifest: bool,
}

#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Number of records to preview
    #[arg(short, long, default_value = "5")]
    pub num: usize,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Only preview this pattern (e.g. select_join)
    #[arg(long)]
    pub pattern: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// Output format
    #[arg(long, default_value = "table")]
    pub format: SchemaFormat,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Manifest to check
    #[arg(long, default_value = "querysim.manifest.json")]
    pub manifest: PathBuf,

    /// Output format for drift report
    #[arg(long, default_value = "text")]
    pub format: CheckFormat,
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Output format for the join graph
    #[arg(long, default_value = "mermaid")]
    pub format: GraphFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum SchemaFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CheckFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum GraphFormat {
    Mermaid,
    Dot,
}

impl GenerateArgs {
    /// Determine output format from the explicit flag or the file extension.
    pub fn output_format(&self) -> querysim_core::output::OutputFormat {
        use querysim_core::output::OutputFormat as Core;

        if let Some(fmt) = self.format {
            return match fmt {
                OutputFormat::Csv => Core::Csv,
                OutputFormat::Jsonl => Core::Jsonl,
            };
        }
        self.out
            .as_ref()
            .and_then(|p| p.extension())
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or(Core::Csv)
    }
}
