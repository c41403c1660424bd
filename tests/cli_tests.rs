use regex::Regex;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn borderforge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_borderforge"))
        .args(args)
        .output()
        .expect("Failed to execute process")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_synthetic_search_reports_best_plan() {
    let output = borderforge(&[
        "--synthetic",
        "grid:6x4",
        "-r",
        "3",
        "--data-seed",
        "3",
        "search",
        "-g",
        "20",
        "--population-size",
        "16",
        "-S",
        "1",
    ]);
    let out = stdout(&output);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let final_gen = Regex::new(r"Gen\s+20 \| Score: -?\d+\.\d{4} \| Best: -?\d+\.\d{4}").unwrap();
    assert!(final_gen.is_match(&out), "no final progress line in:\n{}", out);
    assert!(out.contains("Completed 20 generations"));
    assert!(out.contains("BEST PLAN"));
    assert!(Regex::new(r"Winner: (GOP|DEM|Tie)").unwrap().is_match(&out));
}

#[test]
fn test_same_seed_same_result() {
    let args = [
        "--synthetic",
        "grid:5x5",
        "-r",
        "2",
        "--data-seed",
        "9",
        "search",
        "-g",
        "10",
        "--population-size",
        "12",
        "-S",
        "42",
    ];
    let best = Regex::new(r"Completed 10 generations in [\d.]+s \(best (-?\d+\.\d{4})\)").unwrap();
    let scores: Vec<String> = (0..2)
        .map(|_| {
            let out = stdout(&borderforge(&args));
            best.captures(&out)
                .map(|c| c[1].to_string())
                .unwrap_or_else(|| panic!("no completion line in:\n{}", out))
        })
        .collect();
    assert_eq!(scores[0], scores[1]);
}

#[test]
fn test_pause_and_resume_from_cli() {
    let output = borderforge(&[
        "--synthetic",
        "grid:6x4",
        "-r",
        "3",
        "search",
        "-g",
        "30",
        "--render-every",
        "5",
        "--stop-after",
        "5",
        "--population-size",
        "8",
        "-S",
        "2",
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Completed 30 generations"));
}

#[test]
fn test_follow_the_leader_with_population_floor() {
    let output = borderforge(&[
        "--synthetic",
        "grid:6x4",
        "-r",
        "3",
        "search",
        "-g",
        "10",
        "-m",
        "follow-the-leader",
        "--min-region-population",
        "1000",
        "--population-size",
        "8",
        "-S",
        "4",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("Completed 10 generations"));
}

#[test]
fn test_validate_scores_reference() {
    let output = borderforge(&["--synthetic", "grid:6x4", "-r", "3", "validate", "-t", "tie"]);
    let out = stdout(&output);
    assert!(output.status.success());
    assert!(out.contains("CURRENT BORDERS"));
    assert!(out.contains("Homogeneity"));
    assert!(out.contains("R2"));
}

#[test]
fn test_validate_census_files() {
    let dir = TempDir::new().unwrap();
    let units = write(&dir, "units.csv", &["id,side1,side2", "1001,60,40", "1002,30,70", "2001,50,50"]);
    let adjacency = write(
        &dir,
        "adj.txt",
        &[
            "Alpha County, AA|1001|Beta County, AA|1002|1",
            "Beta County, AA|1002|Gamma County, BB|2001|1",
            "Gamma County, BB|2001|Beta County, AA|1002|1",
        ],
    );

    let output = borderforge(&[
        "--units",
        units.to_str().unwrap(),
        "--adjacency",
        adjacency.to_str().unwrap(),
        "validate",
        "--side1-name",
        "Red",
        "--side2-name",
        "Blue",
    ]);
    let out = stdout(&output);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(out.contains("AA"));
    assert!(out.contains("BB"));
    assert!(out.contains("Red"));
}

#[test]
fn test_synthetic_needs_region_count() {
    let output = borderforge(&["--synthetic", "grid:4x4", "validate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--regions is required"));
}

#[test]
fn test_unknown_target_side() {
    let output = borderforge(&[
        "--synthetic",
        "grid:4x4",
        "-r",
        "2",
        "search",
        "-g",
        "2",
        "-t",
        "green",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown target side 'green'"));
}

#[test]
fn test_bad_grid_spec_is_rejected_by_parser() {
    let output = borderforge(&["--synthetic", "grid:4by4", "-r", "2", "validate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("grid:8x6"));
}

fn write(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = File::create(&path).unwrap();
    for l in lines {
        writeln!(f, "{}", l).unwrap();
    }
    path
}
