use super::{Bootstrap, BootstrapParams};
use crate::error::{BfResult, BorderForgeError};
use crate::graph::{AdjacencyGraph, Unit};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use strum_macros::{Display, EnumString};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ValueEnum)]
#[strum(serialize_all = "snake_case")]
pub enum AdjacencyFormat {
    /// `Name, ST|id|Neighbor Name, ST|neighbor_id|...`
    Census,
    /// Two-column CSV with a `unit,neighbor` header.
    Edges,
}

/// Reads unit records. Accepts either `id,population,lean` or `id,side1,side2`
/// (vote counts, with an optional `population` column).
pub fn load_units<P: AsRef<Path>>(path: P) -> BfResult<Vec<Unit>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = rdr.headers()?.clone();
    let has = |name: &str| headers.iter().any(|h| h == name);

    let units = if has("lean") {
        rdr.deserialize::<Unit>().collect::<Result<Vec<_>, _>>()?
    } else if has("side1") && has("side2") {
        let mut out = Vec::new();
        for row in rdr.deserialize::<VoteRow>() {
            out.push(row?.into_unit());
        }
        out
    } else {
        return Err(BorderForgeError::DataIntegrity(format!(
            "Units file '{}' needs an 'id,population,lean' or 'id,side1,side2' header",
            path.display()
        )));
    };

    debug!(path = %path.display(), units = units.len(), "loaded units");
    Ok(units)
}

#[derive(Debug, Deserialize)]
struct VoteRow {
    id: String,
    side1: u64,
    side2: u64,
    #[serde(default)]
    population: Option<u64>,
}

impl VoteRow {
    fn into_unit(self) -> Unit {
        let total = self.side1 + self.side2;
        let lean = if total > 0 {
            (self.side1 as f64 - self.side2 as f64) / total as f64
        } else {
            0.0
        };
        Unit {
            id: self.id,
            population: self.population.unwrap_or(total),
            lean,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    unit: String,
    neighbor: String,
}

/// Plain edge list. The unit set is every id that appears in either column.
pub fn load_edge_list<P: AsRef<Path>>(path: P) -> BfResult<AdjacencyGraph> {
    let file = File::open(path.as_ref())?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut ids = Vec::new();
    let mut known = HashSet::new();
    let mut edges = Vec::new();
    for row in rdr.deserialize::<EdgeRow>() {
        let row = row?;
        for id in [&row.unit, &row.neighbor] {
            if known.insert(id.clone()) {
                ids.push(id.clone());
            }
        }
        edges.push((row.unit, row.neighbor));
    }
    AdjacencyGraph::from_edges(ids, edges)
}

/// Census county adjacency plus the state each county belongs to.
#[derive(Debug)]
pub struct CensusAdjacency {
    pub graph: AdjacencyGraph,
    pub state_of: Vec<String>,
}

impl CensusAdjacency {
    /// Current borders: counties grouped by state, states numbered alphabetically.
    pub fn reference(&self) -> (HashMap<String, u32>, Vec<String>) {
        let states: Vec<String> = self
            .state_of
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let region_of: HashMap<&str, u32> = states
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i as u32))
            .collect();
        let map = self
            .graph
            .ids()
            .iter()
            .zip(&self.state_of)
            .map(|(id, st)| (id.clone(), region_of[st.as_str()]))
            .collect();
        (map, states)
    }
}

fn state_suffix(name: &str) -> Option<&str> {
    name.rsplit_once(", ").map(|(_, st)| st.trim())
}

/// Reads the pipe-delimited census adjacency file. Rows whose county (or
/// neighbour) lies in an `excluded` state are skipped.
pub fn load_census_adjacency<P: AsRef<Path>>(
    path: P,
    excluded: &[String],
) -> BfResult<CensusAdjacency> {
    let file = File::open(path.as_ref())?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let is_excluded = |st: &str| excluded.iter().any(|e| e.eq_ignore_ascii_case(st));

    let mut ids = Vec::new();
    let mut state_of = Vec::new();
    let mut known = HashSet::new();
    let mut edges = Vec::new();
    let mut skipped = 0usize;

    for (row_idx, result) in rdr.records().enumerate() {
        let rec = result?;
        if rec.len() < 4 {
            skipped += 1;
            continue;
        }
        let (name, id, adj_name, adj_id) = (rec[0].trim(), rec[1].trim(), rec[2].trim(), rec[3].trim());
        if row_idx == 0 && id.parse::<u64>().is_err() {
            // Header line of newer census releases
            continue;
        }
        let state = state_suffix(name).ok_or_else(|| {
            BorderForgeError::DataIntegrity(format!(
                "Row {}: county name '{}' has no ', ST' suffix",
                row_idx + 1,
                name
            ))
        })?;
        if is_excluded(state) {
            continue;
        }
        if known.insert(id.to_string()) {
            ids.push(id.to_string());
            state_of.push(state.to_string());
        }
        if state_suffix(adj_name).is_some_and(|st| is_excluded(st)) {
            continue;
        }
        edges.push((id.to_string(), adj_id.to_string()));
    }

    if skipped > 0 {
        warn!(skipped, "skipped short rows in census adjacency");
    }

    let graph = AdjacencyGraph::from_edges(ids, edges)?;
    Ok(CensusAdjacency { graph, state_of })
}

/// Reference assignment as `id,region` rows.
pub fn load_reference<P: AsRef<Path>>(path: P) -> BfResult<HashMap<String, u32>> {
    #[derive(Deserialize)]
    struct Row {
        id: String,
        region: u32,
    }

    let file = File::open(path.as_ref())?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let mut map = HashMap::new();
    for row in rdr.deserialize::<Row>() {
        let row = row?;
        if map.insert(row.id.clone(), row.region).is_some() {
            return Err(BorderForgeError::DataIntegrity(format!(
                "Reference assignment lists unit '{}' twice",
                row.id
            )));
        }
    }
    Ok(map)
}

/// Inputs for assembling a [`Bootstrap`] from files.
#[derive(Debug, Clone)]
pub struct FileSource<'a> {
    pub units: &'a Path,
    pub adjacency: &'a Path,
    pub format: AdjacencyFormat,
    pub reference: Option<&'a Path>,
    pub exclude: &'a [String],
    /// Required for edge lists; census data defaults to the number of states.
    pub region_count: Option<u32>,
}

pub fn load_bootstrap(src: &FileSource<'_>) -> BfResult<Bootstrap> {
    info!(units = %src.units.display(), adjacency = %src.adjacency.display(), format = %src.format, "loading dataset");
    let units = load_units(src.units)?;

    let (graph, mut reference, mut names) = match src.format {
        AdjacencyFormat::Census => {
            let census = load_census_adjacency(src.adjacency, src.exclude)?;
            let (reference, names) = census.reference();
            (census.graph, Some(reference), Some(names))
        }
        AdjacencyFormat::Edges => (load_edge_list(src.adjacency)?, None, None),
    };

    if let Some(path) = src.reference {
        reference = Some(load_reference(path)?);
        names = None;
    }

    let natural = names.as_ref().map(|n| n.len() as u32);
    let region_count = match (src.region_count, natural) {
        (Some(r), Some(states)) if r != states => {
            // The state borders only make sense with one region per state.
            warn!(requested = r, states, "region count differs from the state count; dropping current borders");
            reference = None;
            names = None;
            r
        }
        (Some(r), _) => r,
        (None, Some(states)) => states,
        (None, None) => {
            let regions = reference
                .as_ref()
                .and_then(|m| m.values().max().map(|&r| r + 1));
            regions.ok_or_else(|| {
                BorderForgeError::Config(
                    "region count is required when the data carries no reference assignment".into(),
                )
            })?
        }
    };

    // Units outside the adjacency (e.g. excluded states) are not part of the map.
    let before = units.len();
    let units: Vec<Unit> = units
        .into_iter()
        .filter(|u| graph.index_of(&u.id).is_some())
        .collect();
    if units.len() < before {
        warn!(dropped = before - units.len(), "units without adjacency entries ignored");
    }

    BootstrapParams::builder()
        .graph(graph)
        .units(units)
        .region_count(region_count)
        .reference(reference)
        .region_names(names)
        .build()
        .build_bootstrap()
}
