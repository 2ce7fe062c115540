use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{directory::ensure_dir, io::StreamError};

/// Written directly under the destination root.
pub const GRAPH_FILE_NAME: &str = "graph.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleNode {
    pub requires: Vec<String>,
}

/// Module name to the modules it requires. Serializes with sorted keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph(BTreeMap<String, ModuleNode>);

impl DependencyGraph {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, module_name: &str) -> Option<&ModuleNode> {
        self.0.get(module_name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("two input files resolve to the module name {name:?}")]
    DuplicateModule { name: String },

    #[error("unable to serialize the dependency graph")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Directory(#[from] StreamError),

    #[error("unable to write dependency graph to {path:?}")]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Collects one node per compiled module. A disabled accumulator ignores
/// every node and never writes anything.
#[derive(Debug, Default)]
pub struct GraphAccumulator {
    graph: Option<DependencyGraph>,
}

impl GraphAccumulator {
    pub fn new(enabled: bool) -> Self {
        Self {
            graph: enabled.then(DependencyGraph::default),
        }
    }

    pub fn graph(&self) -> Option<&DependencyGraph> {
        self.graph.as_ref()
    }

    pub fn append_node(
        &mut self,
        module_name: &str,
        requires: &[String],
    ) -> Result<(), GraphError> {
        let graph = match self.graph.as_mut() {
            Some(graph) => graph,
            None => return Ok(()),
        };
        if graph.0.contains_key(module_name) {
            return Err(GraphError::DuplicateModule {
                name: module_name.to_owned(),
            });
        }
        debug!("{} requires {:?}", module_name, requires);
        graph.0.insert(
            module_name.to_owned(),
            ModuleNode {
                requires: requires.to_vec(),
            },
        );
        Ok(())
    }

    /// Write the graph to `destination/graph.json`, returning the path
    /// written, or `None` when graph generation is disabled.
    pub fn flush<P: AsRef<Path>>(&self, destination: P) -> Result<Option<PathBuf>, GraphError> {
        let graph = match &self.graph {
            Some(graph) => graph,
            None => return Ok(None),
        };
        let destination = destination.as_ref();
        ensure_dir(destination)?;

        let path = destination.join(GRAPH_FILE_NAME);
        let mut contents = serde_json::to_string_pretty(graph)?;
        contents.push('\n');
        fs::write(&path, contents).map_err(|source| GraphError::Write {
            source,
            path: path.clone(),
        })?;
        info!("wrote dependency graph of {} modules to {:?}", graph.len(), path);
        Ok(Some(path))
    }
}
