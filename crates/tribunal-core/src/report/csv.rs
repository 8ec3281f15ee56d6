//! CSV aggregation report: one row per team, one column per criterion in
//! display order (headed by the criterion description), averages printed
//! with six decimal places.

use crate::aggregate::TeamAggregation;
use crate::model::CriterionSet;

pub fn render(aggregation: &TeamAggregation, criteria: &CriterionSet) -> String {
    // (lookup name, column label) pairs in display order.
    let mut columns: Vec<(&str, &str)> = criteria
        .iter()
        .filter(|c| aggregation.criteria_evaluated.contains(&c.name))
        .map(|c| (c.name.as_str(), c.description.as_str()))
        .collect();
    // Evaluated criteria the criteria file no longer defines (stale
    // artifacts re-aggregated against a newer file) trail under their raw
    // names, keeping the CSV in step with the JSON export.
    for name in &aggregation.criteria_evaluated {
        if criteria.get(name).is_none() {
            columns.push((name.as_str(), name.as_str()));
        }
    }

    let mut out = String::from("Team");
    for (_, label) in &columns {
        out.push(',');
        out.push_str(&escape(label));
    }
    out.push('\n');

    for (team, cells) in &aggregation.teams {
        out.push_str(&escape(team));
        for (name, _) in &columns {
            out.push(',');
            if let Some(cell) = cells.get(*name) {
                out.push_str(&format!("{:.6}", cell.average_rank));
            }
        }
        out.push('\n');
    }
    out
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
