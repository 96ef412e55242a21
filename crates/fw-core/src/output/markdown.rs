//! Markdown table and number formatting helpers.

/// Render a GitHub-style table. Pipes inside cells are escaped.
pub fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    out.push_str(&row_line(headers.iter().map(|h| h.to_string())));
    out.push_str(&row_line(headers.iter().map(|_| "---".to_string())));
    for row in rows {
        out.push_str(&row_line(row.into_iter()));
    }
    out
}

fn row_line(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |\n", cells.join(" | "))
}

/// Whole number with no decimals.
pub fn fmt_count(value: f64) -> String {
    format!("{:.0}", value)
}

/// A 0-1 rate as a percentage with one decimal.
pub fn fmt_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// A value already in percent, two decimals.
pub fn fmt_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

pub fn fmt_money(value: f64) -> String {
    format!("${:.2}", value)
}
