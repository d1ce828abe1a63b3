use anyhow::Result;
use comfy_table::Table as ComfyTable;

use querysim_core::features::{FEATURE_COLUMNS, FEATURE_CONTRACT_VERSION, FLAG_COLUMNS};

/// Print the feature contract shared with training and serving.
pub fn run() -> Result<()> {
    println!("Feature contract v{}\n", FEATURE_CONTRACT_VERSION);

    let mut t = ComfyTable::new();
    t.set_header(vec!["#", "Feature", "Kind"]);
    for (i, name) in FEATURE_COLUMNS.iter().enumerate() {
        let kind = if FLAG_COLUMNS.contains(name) {
            "flag (0/1)"
        } else {
            "count"
        };
        t.add_row(vec![i.to_string(), name.to_string(), kind.to_string()]);
    }
    println!("{}", t);
    Ok(())
}
