// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text, JSON and HTML renderings of recorded statistics.

use super::StatisticsSnapshot;
use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Write};
use std::str::FromStr;

const CHILD_PREFIX: &str = "  └─ ";
const ID_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Html,
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            _ => Err(Error::UnsupportedReportFormat(s.to_string())),
        }
    }
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
        })
    }
}

/// Document written by [`ReportFormat::Json`].
#[derive(Debug, Serialize)]
pub struct StatisticsReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub total_trackers: usize,
    pub trackers: &'a [StatisticsSnapshot],
}

/// Renders `stats` in `format`, stamped with the current time.
///
/// ```rust
/// use tracewise::statistics::{ReportFormat, StatisticsRegistry, generate_report};
///
/// let registry = StatisticsRegistry::new();
/// registry.record("db::query", "query()", 12, Some(10), None);
/// let text = generate_report(&registry.snapshot(), ReportFormat::Text).unwrap();
/// assert!(text.contains("db::query"));
/// ```
pub fn generate_report(stats: &[StatisticsSnapshot], format: ReportFormat) -> Result<String> {
    generate_report_at(stats, format, Utc::now())
}

pub fn generate_report_at(
    stats: &[StatisticsSnapshot],
    format: ReportFormat,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(text_report(stats, generated_at)),
        ReportFormat::Json => json_report(stats, generated_at),
        ReportFormat::Html => Ok(html_report(stats, generated_at)),
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parents first, each followed by its subtree; children ordered by identity.
///
/// Entries whose parent is not in `stats` are treated as roots.
fn display_order(stats: &[StatisticsSnapshot]) -> Vec<&StatisticsSnapshot> {
    let present: HashSet<&str> = stats.iter().map(|s| s.identity.as_str()).collect();
    let mut by_parent: BTreeMap<&str, Vec<&StatisticsSnapshot>> = BTreeMap::new();
    let mut roots = Vec::new();
    for stat in stats {
        match stat.parent_identity.as_deref() {
            Some(parent) if present.contains(parent) => {
                by_parent.entry(parent).or_default().push(stat)
            }
            _ => roots.push(stat),
        }
    }
    roots.sort_by(|a, b| a.identity.cmp(&b.identity));
    for children in by_parent.values_mut() {
        children.sort_by(|a, b| a.identity.cmp(&b.identity));
    }

    let mut ordered = Vec::with_capacity(stats.len());
    let mut seen = HashSet::new();
    let mut stack: Vec<&StatisticsSnapshot> = roots.into_iter().rev().collect();
    while let Some(stat) = stack.pop() {
        if !seen.insert(stat.identity.as_str()) {
            continue;
        }
        ordered.push(stat);
        if let Some(children) = by_parent.get(stat.identity.as_str()) {
            stack.extend(children.iter().rev());
        }
    }
    // Parent chains that loop back on themselves never reach a root.
    let mut rest: Vec<&StatisticsSnapshot> = stats
        .iter()
        .filter(|s| !seen.contains(s.identity.as_str()))
        .collect();
    rest.sort_by(|a, b| a.identity.cmp(&b.identity));
    ordered.extend(rest);
    ordered
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width - 3).collect();
    cut.push_str("...");
    cut
}

fn threshold_counts(stat: &StatisticsSnapshot) -> (String, String) {
    match stat.threshold {
        Some(_) => (stat.exceeded_count.to_string(), stat.within_count.to_string()),
        None => ("-".to_string(), "-".to_string()),
    }
}

fn text_report(stats: &[StatisticsSnapshot], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "===== Statistics Report =====");
    let _ = writeln!(out, "Generated: {}", timestamp(generated_at));
    let _ = writeln!(out, "Total tracked operations: {}", stats.len());
    out.push('\n');

    if stats.is_empty() {
        out.push_str("No statistics recorded.\n");
    } else {
        let _ = writeln!(
            out,
            "{:<ID_WIDTH$} | {:>7} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8} | {:>10} | {:>10}",
            "Tracker ID", "Count", "Avg", "p50", "p90", "p95", "Min", "Max", "Exceeded", "Within"
        );
        out.push_str(&"-".repeat(140));
        out.push('\n');
        for stat in display_order(stats) {
            let prefix = if stat.parent_identity.is_some() { CHILD_PREFIX } else { "" };
            let id = truncate(&format!("{prefix}{}", stat.identity), ID_WIDTH);
            let (exceeded, within) = threshold_counts(stat);
            let _ = writeln!(
                out,
                "{id:<ID_WIDTH$} | {:>7} | {:>6}ms | {:>6}ms | {:>6}ms | {:>6}ms | {:>6}ms | {:>6}ms | {exceeded:>10} | {within:>10}",
                stat.sample_count, stat.average, stat.p50, stat.p90, stat.p95, stat.min, stat.max
            );
        }
    }
    out.push_str("\n===== End of Report =====\n");
    out
}

fn json_report(stats: &[StatisticsSnapshot], generated_at: DateTime<Utc>) -> Result<String> {
    let report = StatisticsReport {
        generated_at,
        total_trackers: stats.len(),
        trackers: stats,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Statistics Report</title>
<style>
body { font-family: sans-serif; background: #1a1a2e; color: #eaeaea; margin: 2rem; }
table { border-collapse: collapse; width: 100%; }
th, td { padding: 0.4rem 0.8rem; border-bottom: 1px solid #0f3460; }
td.num { text-align: right; font-family: monospace; }
tr.child td.id { padding-left: 2rem; }
tr.child { background: #0f3460; }
.exceeded { color: #e94560; font-weight: bold; }
.within { color: #00d9ff; }
</style>
</head>
<body>
"#;

fn html_row(out: &mut String, stat: &StatisticsSnapshot) {
    let class = if stat.parent_identity.is_some() { "child" } else { "root" };
    let threshold = match stat.threshold {
        Some(t) => format!(
            "{t}ms: <span class=\"exceeded\">{}</span> / <span class=\"within\">{}</span>",
            stat.exceeded_count, stat.within_count
        ),
        None => "-".to_string(),
    };
    let _ = writeln!(
        out,
        "<tr class=\"{class}\"><td class=\"id\" title=\"{}\">{}</td>\
         <td class=\"num\">{}</td><td class=\"num\">{}ms</td><td class=\"num\">{}ms</td>\
         <td class=\"num\">{}ms</td><td class=\"num\">{}ms</td><td class=\"num\">{}ms</td>\
         <td class=\"num\">{}ms</td><td>{threshold}</td></tr>",
        escape_html(&stat.display_name),
        escape_html(&stat.identity),
        stat.sample_count,
        stat.average,
        stat.p50,
        stat.p90,
        stat.p95,
        stat.min,
        stat.max,
    );
}

fn html_report(stats: &[StatisticsSnapshot], generated_at: DateTime<Utc>) -> String {
    let mut out = String::from(HTML_HEAD);
    let _ = writeln!(out, "<h1>Statistics Report</h1>");
    let _ = writeln!(out, "<p>Generated: {}</p>", timestamp(generated_at));
    let _ = writeln!(
        out,
        "<p>Total tracked operations: <strong>{}</strong></p>",
        stats.len()
    );
    if stats.is_empty() {
        out.push_str("<p>No statistics recorded.</p>\n");
    } else {
        out.push_str(
            "<table>\n<thead><tr><th>Tracker ID</th><th>Count</th><th>Avg</th><th>p50</th>\
             <th>p90</th><th>p95</th><th>Min</th><th>Max</th><th>Threshold</th></tr></thead>\n<tbody>\n",
        );
        for stat in display_order(stats) {
            html_row(&mut out, stat);
        }
        out.push_str("</tbody>\n</table>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::StatisticsRegistry;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 12).unwrap()
    }

    fn family() -> Vec<StatisticsSnapshot> {
        let registry = StatisticsRegistry::new();
        registry.record("app::query", "query()", 5, None, Some("app::load"));
        registry.record("app::load", "load()", 20, Some(10), Some("app::main"));
        registry.record("app::main", "main()", 40, None, None);
        registry.record("app::orphan", "orphan()", 1, None, Some("gone"));
        registry.snapshot()
    }

    #[rstest]
    #[case("text", ReportFormat::Text)]
    #[case("JSON", ReportFormat::Json)]
    #[case(" html ", ReportFormat::Html)]
    fn format_parses(#[case] input: &str, #[case] expected: ReportFormat) {
        assert_eq!(input.parse::<ReportFormat>().unwrap(), expected);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(matches!(
            "csv".parse::<ReportFormat>(),
            Err(Error::UnsupportedReportFormat(_))
        ));
    }

    #[test]
    fn children_follow_parents() {
        let stats = family();
        let order: Vec<&str> = display_order(&stats)
            .into_iter()
            .map(|s| s.identity.as_str())
            .collect();
        assert_eq!(order, ["app::main", "app::load", "app::query", "app::orphan"]);
    }

    #[test]
    fn text_report_layout() {
        let report = generate_report_at(&family(), ReportFormat::Text, at()).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "===== Statistics Report =====");
        assert_eq!(lines[1], "Generated: 2024-05-01T09:30:12.000Z");
        assert_eq!(lines[2], "Total tracked operations: 4");
        assert!(lines[4].starts_with("Tracker ID"));
        assert!(lines[6].starts_with("app::main "));
        assert!(lines[7].starts_with("  └─ app::load"));
        assert!(lines[7].trim_end().ends_with("1 |          0"));
        assert!(lines[6].trim_end().ends_with("- |          -"));
        assert_eq!(*lines.last().unwrap(), "===== End of Report =====");
    }

    #[test]
    fn empty_text_report() {
        let report = generate_report_at(&[], ReportFormat::Text, at()).unwrap();
        assert!(report.contains("No statistics recorded."));
        assert!(!report.contains("Tracker ID"));
    }

    #[test]
    fn json_report_fields() {
        let report = generate_report_at(&family(), ReportFormat::Json, at()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(value["total_trackers"], 4);
        let load = value["trackers"]
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["identity"] == "app::load")
            .unwrap();
        assert_eq!(load["display_name"], "load()");
        assert_eq!(load["sample_count"], 1);
        assert_eq!(load["threshold"], 10);
        assert_eq!(load["exceeded_count"], 1);
        assert_eq!(load["parent_identity"], "app::main");
        assert_eq!(load["child_identities"], serde_json::json!(["app::query"]));
    }

    #[test]
    fn html_report_escapes() {
        let registry = StatisticsRegistry::new();
        registry.record("Vec<T>::push", "push(&mut self)", 1, None, None);
        let report = generate_report_at(&registry.snapshot(), ReportFormat::Html, at()).unwrap();
        assert!(report.starts_with("<!DOCTYPE html>"));
        assert!(report.contains("Vec&lt;T&gt;::push"));
        assert!(report.contains("push(&amp;mut self)"));
        assert!(!report.contains("Vec<T>"));
    }

    #[test]
    fn long_identities_are_truncated() {
        let long = "x".repeat(80);
        let cut = truncate(&long, ID_WIDTH);
        assert_eq!(cut.chars().count(), ID_WIDTH);
        assert!(cut.ends_with("..."));
    }
}
