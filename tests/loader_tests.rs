use borderforge::dataset::loader::{
    load_bootstrap, load_census_adjacency, load_edge_list, load_reference, load_units,
    AdjacencyFormat, FileSource,
};
use borderforge::error::BorderForgeError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    fn write(&self, name: &str, lines: &[&str]) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    /// Two states, three counties each side of the line, plus an excluded AK county.
    fn census(&self) -> PathBuf {
        self.write(
            "county_adjacency.txt",
            &[
                "County Name|County GEOID|Neighbor Name|Neighbor GEOID|Length",
                "Alpha County, AA|1001|Alpha County, AA|1001|0",
                "Alpha County, AA|1001|Beta County, AA|1002|10",
                "Beta County, AA|1002|Alpha County, AA|1001|10",
                "Beta County, AA|1002|Gamma County, BB|2001|4",
                "Gamma County, BB|2001|Beta County, AA|1002|4",
                "Gamma County, BB|2001|Polar Borough, AK|9001|1",
                "Polar Borough, AK|9001|Gamma County, BB|2001|1",
            ],
        )
    }

    fn census_units(&self) -> PathBuf {
        self.write(
            "units.csv",
            &[
                "id,side1,side2",
                "1001,60,40",
                "1002,30,70",
                "2001,50,50",
                "9001,10,0",
            ],
        )
    }
}

fn source<'a>(units: &'a Path, adjacency: &'a Path, format: AdjacencyFormat, exclude: &'a [String]) -> FileSource<'a> {
    FileSource {
        units,
        adjacency,
        format,
        reference: None,
        exclude,
        region_count: None,
    }
}

#[test]
fn test_units_with_lean_column() {
    let ctx = TestContext::new();
    let path = ctx.write("u.csv", &["id,population,lean", "a, 120, 0.25", "b,80,-0.5"]);
    let units = load_units(&path).unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].id, "a");
    assert_eq!(units[0].population, 120);
    assert_eq!(units[1].lean, -0.5);
}

#[test]
fn test_units_from_vote_counts() {
    let ctx = TestContext::new();
    let path = ctx.write(
        "u.csv",
        &["id,side1,side2,population", "a,75,25,500", "b,0,0,", "c,10,30,"],
    );
    let units = load_units(&path).unwrap();
    assert!((units[0].lean - 0.5).abs() < 1e-12);
    assert_eq!(units[0].population, 500);
    assert_eq!(units[1].lean, 0.0);
    // Population defaults to the vote total.
    assert_eq!(units[2].population, 40);
    assert!((units[2].lean + 0.5).abs() < 1e-12);
}

#[test]
fn test_units_unknown_header() {
    let ctx = TestContext::new();
    let path = ctx.write("u.csv", &["name,size", "a,1"]);
    assert!(matches!(
        load_units(&path),
        Err(BorderForgeError::DataIntegrity(_))
    ));
}

#[test]
fn test_edge_list_is_symmetric() {
    let ctx = TestContext::new();
    let path = ctx.write("e.csv", &["unit,neighbor", "a,b", "b,a", "b,c", "c,c"]);
    let graph = load_edge_list(&path).unwrap();
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.edge_count(), 2);
    let b = graph.index_of("b").unwrap();
    assert_eq!(graph.neighbors(b).len(), 2);
    let c = graph.index_of("c").unwrap();
    assert_eq!(graph.neighbors(c), &[b]);
}

#[test]
fn test_census_skips_header_and_excluded_states() {
    let ctx = TestContext::new();
    let path = ctx.census();
    let census = load_census_adjacency(&path, &["AK".to_string()]).unwrap();

    assert_eq!(census.graph.len(), 3);
    assert!(census.graph.index_of("9001").is_none());
    assert_eq!(census.graph.edge_count(), 2);
    assert_eq!(census.state_of, vec!["AA", "AA", "BB"]);

    let (reference, names) = census.reference();
    assert_eq!(names, vec!["AA", "BB"]);
    assert_eq!(reference["1002"], 0);
    assert_eq!(reference["2001"], 1);
}

#[test]
fn test_census_rejects_names_without_state() {
    let ctx = TestContext::new();
    let path = ctx.write("bad.txt", &["Nowhere|1|Nowhere|1|0"]);
    assert!(matches!(
        load_census_adjacency(&path, &[]),
        Err(BorderForgeError::DataIntegrity(_))
    ));
}

#[test]
fn test_census_bootstrap_uses_state_borders() {
    let ctx = TestContext::new();
    let units = ctx.census_units();
    let adjacency = ctx.census();
    let exclude = vec!["AK".to_string()];

    let b = load_bootstrap(&source(&units, &adjacency, AdjacencyFormat::Census, &exclude)).unwrap();
    assert_eq!(b.region_count, 2);
    assert_eq!(b.unit_count(), 3);
    assert_eq!(b.attrs.total_population(), 300);
    assert_eq!(b.region_name(1), "BB");
    let reference = b.reference.as_ref().unwrap();
    assert_eq!(reference.region_sizes(), vec![2, 1]);
}

#[test]
fn test_region_count_override_drops_state_borders() {
    let ctx = TestContext::new();
    let units = ctx.census_units();
    let adjacency = ctx.census();
    let exclude = vec!["AK".to_string()];

    let mut src = source(&units, &adjacency, AdjacencyFormat::Census, &exclude);
    src.region_count = Some(3);
    let b = load_bootstrap(&src).unwrap();
    assert_eq!(b.region_count, 3);
    assert!(b.reference.is_none());
    assert_eq!(b.region_name(0), "R0");
}

#[test]
fn test_edges_bootstrap_with_reference_file() {
    let ctx = TestContext::new();
    let units = ctx.write("u.csv", &["id,population,lean", "a,10,0.1", "b,10,0.2", "c,10,-0.3"]);
    let adjacency = ctx.write("e.csv", &["unit,neighbor", "a,b", "b,c"]);
    let reference = ctx.write("ref.csv", &["id,region", "a,0", "b,0", "c,1"]);

    let mut src = source(&units, &adjacency, AdjacencyFormat::Edges, &[]);
    src.reference = Some(reference.as_path());
    let b = load_bootstrap(&src).unwrap();
    // Inferred from the highest region label.
    assert_eq!(b.region_count, 2);
    assert_eq!(b.reference.as_ref().unwrap().labels(), &[0, 0, 1]);
}

#[test]
fn test_edges_without_region_count() {
    let ctx = TestContext::new();
    let units = ctx.write("u.csv", &["id,population,lean", "a,10,0.1", "b,10,0.2"]);
    let adjacency = ctx.write("e.csv", &["unit,neighbor", "a,b"]);
    let err = load_bootstrap(&source(&units, &adjacency, AdjacencyFormat::Edges, &[])).unwrap_err();
    assert!(matches!(err, BorderForgeError::Config(_)));
}

#[test]
fn test_missing_unit_record() {
    let ctx = TestContext::new();
    let units = ctx.write("u.csv", &["id,population,lean", "a,10,0.1"]);
    let adjacency = ctx.write("e.csv", &["unit,neighbor", "a,b"]);
    let mut src = source(&units, &adjacency, AdjacencyFormat::Edges, &[]);
    src.region_count = Some(1);
    assert!(matches!(
        load_bootstrap(&src),
        Err(BorderForgeError::DataIntegrity(_))
    ));
}

#[test]
fn test_duplicate_reference_rows() {
    let ctx = TestContext::new();
    let path = ctx.write("ref.csv", &["id,region", "a,0", "a,1"]);
    assert!(matches!(
        load_reference(&path),
        Err(BorderForgeError::DataIntegrity(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    assert!(matches!(
        load_units("/no/such/units.csv"),
        Err(BorderForgeError::Io(_))
    ));
}
