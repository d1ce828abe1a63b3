use std::path::Path;

use anyhow::Result;

use querysim_core::graph::join_graph::JoinGraph;
use querysim_core::graph::visualize::{self, GraphFormat as VizFormat};

use crate::args::GraphArgs;

pub fn run(args: &GraphArgs, config_path: Option<&Path>) -> Result<()> {
    let (_, generator) = super::load_generator(config_path)?;
    let graph = JoinGraph::from_registry(generator.registry());

    let format = match args.format {
        crate::args::GraphFormat::Mermaid => VizFormat::Mermaid,
        crate::args::GraphFormat::Dot => VizFormat::Dot,
    };

    let output = visualize::visualize(&graph, format);
    println!("{}", output);

    Ok(())
}
