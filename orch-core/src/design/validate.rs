//! Design validation: reject cycles, unknown block ids, unknown patterns,
//! and duplicate agent names within a block before the graph executor runs
//! a single block.

use std::collections::HashSet;

use super::Design;
use crate::error::OrchestraError;
use crate::graph::topo::topological_sort;

pub fn validate_design(design: &Design) -> Result<(), OrchestraError> {
    let block_ids: HashSet<&str> = design.blocks.iter().map(|b| b.id.as_str()).collect();

    for connection in &design.connections {
        let source = connection.source.block_id();
        let target = connection.target.block_id();
        if !block_ids.contains(source) {
            return Err(OrchestraError::DesignInvalid(format!(
                "connection references unknown source block '{source}'"
            )));
        }
        if !block_ids.contains(target) {
            return Err(OrchestraError::DesignInvalid(format!(
                "connection references unknown target block '{target}'"
            )));
        }
    }

    for block in &design.blocks {
        if block.pattern().is_none() {
            return Err(OrchestraError::DesignInvalid(format!(
                "block '{}' has unknown pattern '{}'",
                block.id, block.block_type
            )));
        }
        let mut seen = HashSet::new();
        for agent in &block.data.agents {
            if !seen.insert(agent.name.as_str()) {
                return Err(OrchestraError::DesignInvalid(format!(
                    "block '{}' declares agent name '{}' more than once",
                    block.id, agent.name
                )));
            }
        }
    }

    let node_ids: Vec<String> = design.blocks.iter().map(|b| b.id.clone()).collect();
    let edges: Vec<(String, String)> = design
        .connections
        .iter()
        .map(|c| (c.source.block_id().to_string(), c.target.block_id().to_string()))
        .collect();
    topological_sort(&node_ids, &edges)?;

    Ok(())
}
