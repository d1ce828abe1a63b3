use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};

use querysim_core::check::{self, DatasetIntegrity};
use querysim_core::manifest;

use crate::args::{CheckArgs, CheckFormat};

/// Compare a dataset manifest against the schema a rerun would use, and
/// re-hash the dataset it points at.
///
/// Exit codes:
///   0: no drift, dataset intact
///   1: drift detected, dataset modified or missing (or error)
pub fn run(args: &CheckArgs, config_path: Option<&Path>) -> Result<()> {
    if !args.manifest.exists() {
        bail!(
            "No manifest at {}. Run `querysim generate --out <file>` first.",
            args.manifest.display()
        );
    }

    let run_manifest = manifest::read_manifest(&args.manifest)?;
    let (_, generator) = super::load_generator(config_path)?;

    let report = check::check_drift(&run_manifest, generator.registry())?;
    let dir = args
        .manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let integrity = check::verify_dataset(&run_manifest, dir)?;

    match args.format {
        CheckFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize drift report")?;
            println!("{}", json);
        }
        CheckFormat::Text => {
            println!("{}", report.summary());
            match &integrity {
                DatasetIntegrity::Intact => {
                    println!("Dataset {} matches its manifest.", run_manifest.dataset_file)
                }
                DatasetIntegrity::Modified { expected, actual } => println!(
                    "Dataset {} was modified (expected {}, found {}).",
                    run_manifest.dataset_file,
                    &expected[..expected.len().min(16)],
                    &actual[..actual.len().min(16)]
                ),
                DatasetIntegrity::Missing => {
                    println!("Dataset {} not found.", run_manifest.dataset_file)
                }
            }
        }
    }

    if report.has_drift || integrity != DatasetIntegrity::Intact {
        process::exit(1);
    }

    Ok(())
}
