use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};

use querysim_core::classify::rules::classify_registry;
use querysim_core::graph::join_graph::JoinGraph;

use crate::args::{SchemaArgs, SchemaFormat};

pub fn run(args: &SchemaArgs, config_path: Option<&Path>) -> Result<()> {
    let (config, generator) = super::load_generator(config_path)?;
    let registry = generator.registry();

    match args.format {
        SchemaFormat::Json => {
            let json = serde_json::to_string_pretty(&registry.snapshot())
                .context("Failed to serialize schema")?;
            println!("{}", json);
        }
        SchemaFormat::Table => {
            let classes = classify_registry(registry);
            let graph = JoinGraph::from_registry(registry);

            println!(
                "Schema: {} ({} tables, {} columns, {} joins)\n",
                if config.has_custom_schema() {
                    "custom"
                } else {
                    "built-in"
                },
                registry.table_count(),
                registry.column_count(),
                registry.join_count()
            );

            let mut t = ComfyTable::new();
            t.set_header(vec!["Table", "Column", "Value class", "Joins"]);
            for table in registry.tables() {
                for (i, column) in table.columns.iter().enumerate() {
                    let class = classes
                        .get(&(table.name.clone(), column.clone()))
                        .map(|c| c.to_string())
                        .unwrap_or_default();
                    let joins = if i == 0 {
                        (table.outgoing.len() + table.incoming.len()).to_string()
                    } else {
                        String::new()
                    };
                    let name = if i == 0 { table.name.as_str() } else { "" };
                    t.add_row(vec![
                        Cell::new(name),
                        Cell::new(column),
                        Cell::new(class),
                        Cell::new(joins),
                    ]);
                }
            }
            println!("{}\n", t);

            let mut j = ComfyTable::new();
            j.set_header(vec!["Child", "Parent", "ON"]);
            for edge in registry.joins() {
                j.add_row(vec![
                    Cell::new(&edge.child),
                    Cell::new(&edge.parent),
                    Cell::new(edge.on_clause()),
                ]);
            }
            println!("{}\n", j);

            let isolated = graph.isolated_tables();
            if !isolated.is_empty() {
                println!("Tables without joins: {}", isolated.join(", "));
            }
            println!(
                "Connected components: {}, longest join chain: {}",
                graph.component_count(),
                graph.max_join_depth()
            );
        }
    }

    Ok(())
}
