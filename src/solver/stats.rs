use prettytable::{Cell, Row, Table};

use crate::solver::{engine::RunReport, value::ValueEquality};

/// Renders a completed run's per-variable statistics as a text table.
pub fn render_run_table<V: ValueEquality>(report: &RunReport<V>) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Variable"),
        Cell::new("Committed Value"),
        Cell::new("Role"),
        Cell::new("Visits"),
        Cell::new("Infeasible Rounds"),
    ]));

    for stats in &report.variables {
        table.add_row(Row::new(vec![
            Cell::new(&format!("?{}", stats.variable)),
            Cell::new(
                &stats
                    .value
                    .as_ref()
                    .map(|value| format!("{:?}", value))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(if stats.is_leaf { "leaf" } else { "interior" }),
            Cell::new(&stats.visits.to_string()),
            Cell::new(&stats.infeasible_rounds.to_string()),
        ]));
    }

    table.add_row(Row::new(vec![
        Cell::new("global cost"),
        Cell::new(&report.global_cost.to_string()),
        Cell::new(""),
        Cell::new(&format!("{} deliveries", report.deliveries)),
        Cell::new(
            &report
                .bound
                .map(|bound| format!("bound {bound}"))
                .unwrap_or_else(|| "no bound".to_string()),
        ),
    ]));

    table.to_string()
}
