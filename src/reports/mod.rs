use borderforge::assignment::RegionAggregate;
use borderforge::config::{SideConfig, TargetSide};
use borderforge::control::GenerationSummary;
use borderforge::dataset::Bootstrap;
use borderforge::fitness::outcome::tally;
use borderforge::fitness::SubScores;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::time::Duration;

pub fn print_progress(s: &GenerationSummary, elapsed: Duration) {
    println!(
        "Gen {:5} | Score: {:.4} | Best: {:.4} | H {:.3} B {:.3} C {:.0} | {:.1}s",
        s.generation,
        s.score,
        s.best_score,
        s.subscores.homogeneity,
        s.subscores.balance,
        s.subscores.contiguity,
        elapsed.as_secs_f32()
    );
}

pub fn print_subscores(fitness: f64, s: &SubScores) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Fitness").add_attribute(Attribute::Bold),
        Cell::new("Homogeneity"),
        Cell::new("Balance"),
        Cell::new("Fragments").fg(Color::Red),
        Cell::new("Outcome"),
    ]);
    table.add_row(vec![
        Cell::new(format!("{:.4}", fitness))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{:.4}", s.homogeneity)),
        Cell::new(format!("{:.4}", s.balance)),
        Cell::new(format!("{:.0}", s.contiguity)).fg(if s.contiguity > 0.0 {
            Color::Red
        } else {
            Color::Green
        }),
        Cell::new(format!("{:.4}", s.outcome)),
    ]);
    println!("{}", table);
}

pub fn print_region_table(bootstrap: &Bootstrap, aggregates: &[RegionAggregate], sides: &SideConfig) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Region").add_attribute(Attribute::Bold),
        Cell::new("Units"),
        Cell::new("Population"),
        Cell::new("Lean"),
        Cell::new("Weight"),
        Cell::new("Leader"),
    ]);
    for i in 1..=4 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for a in aggregates {
        let (leader, color) = if a.units == 0 {
            ("-", Color::DarkGrey)
        } else if a.avg_lean > 0.0 {
            (sides.side1_name.as_str(), Color::Red)
        } else if a.avg_lean < 0.0 {
            (sides.side2_name.as_str(), Color::Blue)
        } else {
            ("Tie", Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(bootstrap.region_name(a.region)).add_attribute(Attribute::Bold),
            Cell::new(a.units),
            Cell::new(a.population),
            Cell::new(format!("{:+.3}", a.avg_lean)),
            Cell::new(a.weight),
            Cell::new(leader).fg(color),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_tally(aggregates: &[RegionAggregate], sides: &SideConfig) {
    let t = tally(aggregates);
    let winner = match t.winner {
        TargetSide::Tie => "Tie".to_string(),
        side => sides.name_of(side).to_string(),
    };
    println!(
        "\n🗳️  {} {} - {} {} ({} undecided) => Winner: {}",
        sides.side1_name, t.side1, t.side2, sides.side2_name, t.undecided, winner
    );
}
