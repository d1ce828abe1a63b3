pub mod check;
pub mod features;
pub mod generate;
pub mod graph;
pub mod preview;
pub mod schema;

use std::path::Path;

use anyhow::{Context, Result};

use querysim_core::config::{self, QuerySimConfig};
use querysim_core::generate::engine::WorkloadGenerator;

/// Load `--config <path>` if given, else `./querysim.toml` if present,
/// else the built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<QuerySimConfig> {
    let loaded = match explicit {
        Some(path) => Some(
            config::read_config_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
        ),
        None => config::read_config(Path::new("."))?,
    };
    if let Some(ref cfg) = loaded {
        tracing::debug!(dir = ?cfg.config_dir, "loaded config");
    }
    Ok(loaded.unwrap_or_default())
}

/// Config plus the generator built from it.
pub fn load_generator(explicit: Option<&Path>) -> Result<(QuerySimConfig, WorkloadGenerator)> {
    let cfg = load_config(explicit)?;
    let generator = WorkloadGenerator::from_config(&cfg)?;
    Ok((cfg, generator))
}

/// Truncate long SQL for terminal tables.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
