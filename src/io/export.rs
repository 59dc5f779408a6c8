use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::application::{DailyRevenue, GroupStat, ShareSummary};
use crate::domain::format_cents;

/// Write ranked group statistics as CSV. Returns the number of rows written.
pub fn export_group_stats_csv<W: Write>(writer: W, stats: &[GroupStat]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "key",
        "label",
        "count",
        "completed_count",
        "cancelled_count",
        "total_revenue",
        "average_value",
        "completion_rate",
        "cancellation_rate",
    ])?;

    for stat in stats {
        csv_writer.write_record([
            stat.key.clone(),
            stat.label.clone(),
            stat.count.to_string(),
            stat.completed_count.to_string(),
            stat.cancelled_count.to_string(),
            format_cents(stat.total_revenue),
            format_cents(stat.average_value),
            format!("{:.2}", stat.completion_rate),
            format!("{:.2}", stat.cancellation_rate),
        ])?;
    }

    csv_writer.flush()?;
    Ok(stats.len())
}

/// Write a share breakdown (payment methods, expense categories) as CSV.
pub fn export_shares_csv<W: Write>(writer: W, shares: &[ShareSummary]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["key", "count", "total", "settled", "percentage"])?;

    for share in shares {
        csv_writer.write_record([
            share.key.clone(),
            share.count.to_string(),
            format_cents(share.total),
            format_cents(share.settled),
            format!("{:.2}", share.percentage),
        ])?;
    }

    csv_writer.flush()?;
    Ok(shares.len())
}

/// Write the per-day revenue series as CSV.
pub fn export_daily_csv<W: Write>(writer: W, days: &[DailyRevenue]) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["date", "revenue", "expenses", "net"])?;

    for day in days {
        csv_writer.write_record([
            day.date.format("%Y-%m-%d").to_string(),
            format_cents(day.revenue),
            format_cents(day.expenses),
            format_cents(day.net),
        ])?;
    }

    csv_writer.flush()?;
    Ok(days.len())
}

/// Write any report as pretty-printed JSON
pub fn export_json<W: Write, T: Serialize>(mut writer: W, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
