//! Server-rendered HTML for the dashboard root.

use std::fmt::Write;

use super::{DashboardState, DashboardSummary, HabitLogRow};

const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Personal Analytics</title>
<style>
body { font-family: system-ui, sans-serif; margin: 2rem; }
table { border-collapse: collapse; }
td, th { padding: 0.25rem 0.75rem; border-bottom: 1px solid #ddd; text-align: left; }
.metric { font-size: 2rem; font-weight: 600; }
.banner { padding: 0.75rem 1rem; border-radius: 4px; margin: 1rem 0; }
.warning { background: #fff4e5; }
.error { background: #fdecea; }
.done { color: #1b7f3b; }
.missed { color: #b3261e; }
</style>
</head>
<body>
<h1>Personal Habits Dashboard</h1>
"#;

const FOOT: &str = "</body>\n</html>\n";

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Page shown when the warehouse could not be queried.
pub fn render_error(message: &str) -> String {
    format!(
        "{HEAD}<div class=\"banner error\">Connection Error: {}</div>\n{FOOT}",
        escape(message)
    )
}

/// Page with the total-logs metric, per-habit rates and the log table.
pub fn render(summary: &DashboardSummary, rows: &[HabitLogRow], total_in_warehouse: u64) -> String {
    let mut html = String::from(HEAD);

    if summary.state == DashboardState::Empty {
        let message = summary.message.as_deref().unwrap_or(super::EMPTY_MESSAGE);
        let _ = writeln!(html, "<div class=\"banner warning\">{}</div>", escape(message));
        html.push_str(FOOT);
        return html;
    }

    let _ = writeln!(
        html,
        "<p>Total Logs</p><p class=\"metric\">{}</p><p>{} of {} shown completed ({:.0}%)</p>",
        total_in_warehouse,
        summary.completed,
        summary.total_logs,
        summary.completion_rate * 100.0
    );

    html.push_str("<h2>Habits</h2>\n<table>\n<tr><th>Habit</th><th>Logs</th><th>Completed</th><th>Rate</th></tr>\n");
    for stat in &summary.habits {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.0}%</td></tr>",
            escape(&stat.habit_name),
            stat.total,
            stat.completed,
            stat.completion_rate * 100.0
        );
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Recent logs</h2>\n<table>\n<tr><th>Date</th><th>Habit</th><th>Completed</th><th>Status</th></tr>\n");
    for row in rows {
        let (class, mark) = if row.is_completed {
            ("done", "yes")
        } else {
            ("missed", "no")
        };
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td class=\"{class}\">{mark}</td><td>{}</td></tr>",
            row.date.format("%Y-%m-%d"),
            escape(&row.habit_name),
            escape(&row.status)
        );
    }
    html.push_str("</table>\n");
    html.push_str(FOOT);
    html
}
