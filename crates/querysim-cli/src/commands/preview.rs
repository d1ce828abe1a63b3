use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Table as ComfyTable;
use rand::rngs::StdRng;
use rand::SeedableRng;

use querysim_core::generate::query::Pattern;

use crate::args::PreviewArgs;

pub fn run(args: &PreviewArgs, config_path: Option<&Path>) -> Result<()> {
    let (_, generator) = super::load_generator(config_path)?;

    let forced: Option<Pattern> = args
        .pattern
        .as_deref()
        .map(str::parse::<Pattern>)
        .transpose()
        .context("Invalid --pattern")?;

    let seed = args.seed.unwrap_or(42); // Fixed seed for preview
    let mut rng = StdRng::seed_from_u64(seed);

    let mut t = ComfyTable::new();
    t.set_header(vec!["#", "pattern", "tables", "joins", "ms", "slow", "sql"]);

    for i in 0..args.num {
        let record = match forced {
            Some(pattern) => generator.generate_forced(pattern, &mut rng)?,
            None => generator.generate_one(&mut rng)?,
        };
        t.add_row(vec![
            (i + 1).to_string(),
            record.pattern.to_string(),
            record.features.num_tables.to_string(),
            record.features.num_joins.to_string(),
            format!("{:.2}", record.execution_time_ms),
            record.is_slow.to_string(),
            super::truncate(&record.sql, 80),
        ]);
    }

    println!("{}", t);
    Ok(())
}
