use std::fmt::Write;

use habit_core::date::format_date;
use habit_service::Dashboard;

/// Plain-text rendering of a dashboard, one section per view.
pub fn render_text(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let window = &dashboard.window;
    let _ = writeln!(out, "Habits as of {}", format_date(dashboard.as_of));
    let _ = writeln!(
        out,
        "Window {} .. {}: {}/{} completed ({:.1}%)",
        format_date(window.start),
        format_date(window.end),
        dashboard.totals.completed,
        dashboard.totals.planned,
        dashboard.completion_rate
    );

    out.push_str("\nToday\n");
    if dashboard.habits.is_empty() {
        out.push_str("  no active habits\n");
    }
    for status in &dashboard.habits {
        let mark = match (status.due_today, status.completed_today) {
            (_, true) => "[x]",
            (true, false) => "[ ]",
            (false, false) => " - ",
        };
        let _ = writeln!(
            out,
            "  {mark} {:<20} {:<9} streak {:>3} (best {:>3})  {:>5.1}%",
            status.name,
            status.frequency,
            status.current_streak,
            status.longest_streak,
            status.completion_rate
        );
    }

    if !dashboard.abandoned.is_empty() {
        out.push_str("\nMost missed\n");
        for (rank, entry) in dashboard.abandoned.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {:<20} missed {}/{} ({:.1}%)",
                rank + 1,
                entry.name,
                entry.missed,
                entry.planned,
                entry.failure_rate
            );
        }
    }

    if !dashboard.trend.is_empty() {
        out.push_str("\nTrend\n");
        for point in &dashboard.trend {
            let _ = writeln!(
                out,
                "  {}  {:>3}/{:<3} {:>5.1}%",
                point.label, point.totals.completed, point.totals.planned, point.rate
            );
        }
    }
    out
}
