//! Report module - renders a `DashboardView` as terminal text or JSON.

use crate::dashboard::{BarPoint, Cell, DashboardView, SeriesPoint, TableView};
use crate::data::PercentDiagnostic;
use crate::stats::Describe;
use std::fmt::Write;

const NOT_AVAILABLE: &str = "N/A";
const RULE_WIDTH: usize = 72;

/// Format a number with a fixed number of decimals and `,` thousands separators.
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (i, c) in integer_part.chars().enumerate() {
        if i > 0 && (integer_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };

    match decimal_part {
        Some(dec) => format!("{sign}{grouped}.{dec}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Missing aggregates render as "N/A", never as zero.
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format_number(v, decimals))
}

pub fn render_json(view: &DashboardView) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(view)
}

pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, view);
    out
}

fn write_report(out: &mut String, view: &DashboardView) -> std::fmt::Result {
    writeln!(out, "Ecommerce Business Dashboard")?;
    let show = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    writeln!(
        out,
        "Date range: {} .. {}",
        show(view.interval.start),
        show(view.interval.end)
    )?;
    divider(out)?;

    let kpis = &view.kpis;
    writeln!(out, "{:<24}{:>20}", "Total Revenue", format_number(kpis.total_revenue, 0))?;
    writeln!(
        out,
        "{:<24}{:>20}",
        "Avg Monthly Revenue",
        format_optional(kpis.avg_monthly_revenue, 0)
    )?;
    writeln!(
        out,
        "{:<24}{:>20}",
        "Avg MoM Growth (%)",
        format_optional(kpis.avg_mom_growth_pct, 2)
    )?;
    writeln!(
        out,
        "{:<24}{:>20}",
        "Avg Return Rate (%)",
        format_optional(kpis.avg_return_rate_pct, 2)
    )?;
    divider(out)?;

    write_series(out, "Revenue by Month", &view.revenue_by_month, 0)?;
    write_series(out, "Return Rate by Month (%)", &view.return_rate_by_month, 2)?;
    write_series(out, "MoM Revenue Growth (%)", &view.mom_growth, 2)?;
    write_bars(out, "Total Revenue by Customer Segment", &view.segment_revenue)?;
    divider(out)?;

    write_table(out, &view.top_categories)?;
    write_table(out, &view.top_brands)?;
    write_table(out, &view.top_rfm)?;
    divider(out)?;

    writeln!(out, "Data Quality Checks")?;
    write_describe(out, "Return rate monthly", &view.quality.return_rate_pct)?;
    write_describe(out, "MoM growth", &view.quality.mom_growth_pct)?;
    for diagnostic in &view.quality.percent_columns {
        write_percent_diagnostic(out, diagnostic)?;
    }
    Ok(())
}

fn divider(out: &mut String) -> std::fmt::Result {
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))
}

fn write_series(
    out: &mut String,
    title: &str,
    points: &[SeriesPoint],
    decimals: usize,
) -> std::fmt::Result {
    writeln!(out, "{title}")?;
    if points.is_empty() {
        return writeln!(out, "  (no data)");
    }
    for point in points {
        writeln!(
            out,
            "  {}  {:>16}",
            point.date,
            format_optional(point.value, decimals)
        )?;
    }
    Ok(())
}

fn write_bars(out: &mut String, title: &str, bars: &[BarPoint]) -> std::fmt::Result {
    writeln!(out, "{title}")?;
    if bars.is_empty() {
        return writeln!(out, "  (no data)");
    }
    for bar in bars {
        writeln!(
            out,
            "  {:<24}{:>20}",
            bar.label.as_deref().unwrap_or("-"),
            format_optional(bar.value, 0)
        )?;
    }
    Ok(())
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Number(v) if v.fract() == 0.0 => format_number(*v, 0),
        Cell::Number(v) => format_number(*v, 2),
        Cell::Text(s) => s.clone(),
        Cell::Missing => "-".to_string(),
    }
}

fn write_table(out: &mut String, table: &TableView) -> std::fmt::Result {
    writeln!(out, "{}", table.title)?;
    if table.is_empty() {
        return writeln!(out, "  (no data)");
    }

    let rendered: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rendered
                .iter()
                .filter_map(|row| row.get(i).map(String::len))
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(name, &w)| format!("{name:<w$}"))
        .collect();
    writeln!(out, "  {}", header.join("  ").trim_end())?;

    for row in &rendered {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(text, &w)| format!("{text:<w$}"))
            .collect();
        writeln!(out, "  {}", line.join("  ").trim_end())?;
    }
    Ok(())
}

fn write_describe(out: &mut String, label: &str, describe: &Describe) -> std::fmt::Result {
    writeln!(out, "{label} (describe):")?;
    let stats = [
        ("count", Some(describe.count as f64)),
        ("missing", Some(describe.missing as f64)),
        ("mean", describe.mean),
        ("std", describe.std),
        ("min", describe.min),
        ("25%", describe.p25),
        ("50%", describe.p50),
        ("75%", describe.p75),
        ("max", describe.max),
    ];
    for (name, value) in stats {
        writeln!(out, "  {name:<8}{:>16}", format_optional(value, 2))?;
    }
    Ok(())
}

fn write_percent_diagnostic(out: &mut String, diagnostic: &PercentDiagnostic) -> std::fmt::Result {
    let report = &diagnostic.report;
    let source = diagnostic.source_column.as_deref().unwrap_or("(none)");
    writeln!(
        out,
        "  {}.{} <- {}: {} values, fraction share {}, rescaled: {}, discarded: {}",
        diagnostic.dataset,
        diagnostic.target_column,
        source,
        report.non_missing,
        format_optional(report.frac_ratio, 2),
        if report.rescaled { "yes" } else { "no" },
        report.discarded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(1234567.891, 0), "1,234,568");
        assert_eq!(format_number(1234.5, 2), "1,234.50");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(100000.0, 0), "100,000");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-1234.5, 1), "-1,234.5");
        assert_eq!(format_number(-0.001, 2), "0.00");
    }

    #[test]
    fn test_format_optional_missing_is_not_zero() {
        assert_eq!(format_optional(None, 2), "N/A");
        assert_eq!(format_optional(Some(11.666), 2), "11.67");
    }

    #[test]
    fn test_write_table_aligns_columns() {
        let table = TableView {
            title: "Top".into(),
            columns: vec!["brand".into(), "rate".into()],
            rows: vec![
                vec![Cell::Text("acme".into()), Cell::Number(12.5)],
                vec![Cell::Text("b".into()), Cell::Missing],
            ],
        };

        let mut out = String::new();
        write_table(&mut out, &table).unwrap();
        assert_eq!(out, "Top\n  brand  rate\n  acme   12.50\n  b      -\n");
    }

    #[test]
    fn test_write_empty_table() {
        let table = TableView {
            title: "Top".into(),
            columns: vec!["brand".into()],
            rows: Vec::new(),
        };
        let mut out = String::new();
        write_table(&mut out, &table).unwrap();
        assert_eq!(out, "Top\n  (no data)\n");
    }
}
