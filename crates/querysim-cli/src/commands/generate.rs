use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};
use indicatif::{ProgressBar, ProgressStyle};

use querysim_core::config::DEFAULT_NUM_QUERIES;
use querysim_core::generate::engine::DatasetRecord;
use querysim_core::manifest::types::{RunManifest, RunParameters};
use querysim_core::manifest::{self, HashingWriter};
use querysim_core::output::{self, OutputFormat};
use querysim_core::summary::DatasetSummary;

use crate::args::GenerateArgs;

pub fn run(args: &GenerateArgs, config_path: Option<&Path>) -> Result<()> {
    let (config, generator) = super::load_generator(config_path)?;

    // CLI flag > querysim.toml > built-in default
    let num = args
        .num
        .or(config.generate.num)
        .unwrap_or(DEFAULT_NUM_QUERIES);
    let shards = args.shards.or(config.generate.shards).unwrap_or(1);
    // A run without a seed still records one, so the manifest can reproduce it.
    let seed = args
        .seed
        .or(config.generate.seed)
        .unwrap_or_else(clock_seed);

    // Phase 1: Generate
    let pb = ProgressBar::new(num as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.cyan} [1/2] Generating queries... {bar:40.cyan/dim} {pos}/{len} ({eta})",
            )
            .context("Invalid progress template")?
            .progress_chars("█▓░"),
    );

    let progress = |done: usize, _total: usize| pb.set_position(done as u64);
    let records = if shards > 1 {
        generator.generate_sharded(num, seed, shards, Some(&progress))?
    } else {
        generator.generate(num, Some(seed), Some(&progress))?
    };

    pb.finish_with_message(format!("Generating queries... ✓ ({} records)", records.len()));

    // Phase 2: Output
    let format = args.output_format();
    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = HashingWriter::new(BufWriter::new(file));
            write_records(&mut writer, &records, format)?;
            let (_, dataset_sha256) = writer.finish();

            eprintln!(
                "\n✓ Generated {} queries → {} ({})",
                records.len(),
                path.display(),
                format
            );

            if !args.no_manifest {
                let snapshot = generator.registry().snapshot();
                let run_manifest = RunManifest::new(
                    RunParameters {
                        seed,
                        num_queries: num,
                        shards,
                        pattern_weights: generator.dispatcher().weights().clone(),
                        slow_threshold_ms: generator.cost_model().slow_threshold_ms,
                        subquery_fallback: generator.subquery_fallback(),
                    },
                    manifest::compute_schema_hash(&snapshot)?,
                    snapshot,
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    dataset_sha256,
                );
                let manifest_path = manifest::manifest_path_for(path);
                manifest::write_manifest(&run_manifest, &manifest_path)?;
                eprintln!("Manifest written to {}", manifest_path.display());
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_records(&mut writer, &records, format)?;
        }
    }

    if let Some(summary) = DatasetSummary::from_records(&records) {
        eprintln!("\n{}", summary_table(&summary));
        eprintln!("{}", pattern_table(&summary));
    }

    Ok(())
}

fn write_records<W: Write>(
    writer: &mut W,
    records: &[DatasetRecord],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => output::csv::write_csv(writer, records)?,
        OutputFormat::Jsonl => output::json::write_jsonl(writer, records)?,
    }
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn summary_table(summary: &DatasetSummary) -> ComfyTable {
    let mut t = ComfyTable::new();
    t.set_header(vec!["Metric", "Value"]);
    t.add_row(vec![Cell::new("records"), Cell::new(summary.total)]);
    t.add_row(vec![
        Cell::new("slow"),
        Cell::new(format!(
            "{} ({:.1}%)",
            summary.slow,
            summary.slow_share * 100.0
        )),
    ]);
    t.add_row(vec![
        Cell::new("mean ms"),
        Cell::new(format!("{:.2}", summary.mean_ms)),
    ]);
    t.add_row(vec![
        Cell::new("median ms"),
        Cell::new(format!("{:.2}", summary.median_ms)),
    ]);
    t.add_row(vec![
        Cell::new("min / max ms"),
        Cell::new(format!("{:.2} / {:.2}", summary.min_ms, summary.max_ms)),
    ]);
    t
}

fn pattern_table(summary: &DatasetSummary) -> ComfyTable {
    let mut t = ComfyTable::new();
    t.set_header(vec!["Pattern", "Count", "Share"]);
    for (pattern, count) in &summary.patterns {
        t.add_row(vec![
            Cell::new(pattern),
            Cell::new(count),
            Cell::new(format!("{:.1}%", summary.pattern_share(*pattern) * 100.0)),
        ]);
    }
    t
}
