//! Plain-text rendering for command output.
//!
//! Output is tab-separated with a header line, so it reads in a terminal and
//! pastes cleanly into a spreadsheet. Missing values print as `-`.

/// Placeholder for a missing value.
pub const MISSING: &str = "-";

/// Shows an optional value, or [`MISSING`].
#[must_use]
pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(MISSING)
}

/// Shows an optional id, or [`MISSING`].
#[must_use]
pub fn id_or_dash(value: Option<i64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

/// Formats an attendance percentage: `75.0%`.
#[must_use]
pub fn format_percent(percent: f64) -> String {
    format!("{percent:.1}%")
}

/// Formats a weighted average to two decimals, or `no data` when undefined.
#[must_use]
pub fn format_average(average: Option<f64>) -> String {
    average.map_or_else(|| "no data".to_string(), |avg| format!("{avg:.2}"))
}

/// Renders rows as tab-separated lines under a header.
///
/// An empty `rows` renders `empty_message` instead.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>], empty_message: &str) -> String {
    if rows.is_empty() {
        return format!("{empty_message}\n");
    }
    let mut out = headers.join("\t");
    out.push('\n');
    for row in rows {
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}
