pub mod loader;
pub mod synthetic;

use crate::assignment::Assignment;
use crate::error::{BfResult, BorderForgeError};
use crate::graph::{AdjacencyGraph, Unit, UnitAttributes};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use typed_builder::TypedBuilder;

/// Everything a run needs, resolved and validated. Immutable once built.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub graph: Arc<AdjacencyGraph>,
    pub attrs: Arc<UnitAttributes>,
    /// "Current borders", if the data source has them.
    pub reference: Option<Assignment>,
    pub region_count: u32,
    /// Display weights for the fixed weight rule.
    pub region_weights: Option<Vec<u32>>,
    pub region_names: Option<Vec<String>>,
}

impl Bootstrap {
    pub fn unit_count(&self) -> usize {
        self.graph.len()
    }

    pub fn region_name(&self, region: u32) -> String {
        self.region_names
            .as_ref()
            .and_then(|names| names.get(region as usize).cloned())
            .unwrap_or_else(|| format!("R{}", region))
    }
}

#[derive(TypedBuilder)]
pub struct BootstrapParams {
    pub graph: AdjacencyGraph,
    pub units: Vec<Unit>,
    pub region_count: u32,
    #[builder(default)]
    pub reference: Option<HashMap<String, u32>>,
    #[builder(default)]
    pub region_weights: Option<Vec<u32>>,
    #[builder(default)]
    pub region_names: Option<Vec<String>>,
}

impl BootstrapParams {
    pub fn build_bootstrap(self) -> BfResult<Bootstrap> {
        let n = self.graph.len();
        let r = self.region_count;

        if r == 0 {
            return Err(BorderForgeError::Config(
                "region count must be at least 1".into(),
            ));
        }
        if r as usize > n {
            return Err(BorderForgeError::Config(format!(
                "region count {} exceeds the {} available units",
                r, n
            )));
        }

        let attrs = UnitAttributes::from_units(&self.graph, &self.units)?;

        let reference = self
            .reference
            .map(|map| Assignment::from_map(&self.graph, &map, r))
            .transpose()?;

        if let Some(w) = &self.region_weights {
            if w.len() != r as usize {
                return Err(BorderForgeError::DataIntegrity(format!(
                    "{} region weights supplied for {} regions",
                    w.len(),
                    r
                )));
            }
        }
        if let Some(names) = &self.region_names {
            if names.len() != r as usize {
                return Err(BorderForgeError::DataIntegrity(format!(
                    "{} region names supplied for {} regions",
                    names.len(),
                    r
                )));
            }
        }

        info!(
            units = n,
            edges = self.graph.edge_count(),
            regions = r,
            population = attrs.total_population(),
            reference = reference.is_some(),
            "bootstrap ready"
        );

        Ok(Bootstrap {
            graph: Arc::new(self.graph),
            attrs: Arc::new(attrs),
            reference,
            region_count: r,
            region_weights: self.region_weights,
            region_names: self.region_names,
        })
    }
}
