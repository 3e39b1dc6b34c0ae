use comfy_table::{Cell, ContentArrangement, Table};

/// Prints a ranked archetype/score table.
pub fn print_scores(title: &str, scores: &[(String, f64)]) {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Archetype", "Score"]);

    for (archetype, score) in scores {
        table.add_row(vec![
            Cell::new(archetype),
            Cell::new(format!("{score:.4}")),
        ]);
    }

    println!("\n=== {title} SCORES ===");
    if scores.is_empty() {
        println!("(no archetypes scored)");
    } else {
        println!("{table}");
    }
}
