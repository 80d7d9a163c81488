use crate::models::{MonthSummary, Record};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Sum of amounts grouped by day-of-month for records in the given month.
/// Linear scan; the ledger is personal-scale so no index is kept.
pub fn aggregate_by_day(records: &[Record], year: i32, month: u32) -> BTreeMap<u32, f64> {
    let mut daily = BTreeMap::new();
    for record in records {
        if record.date.year() == year && record.date.month() == month {
            *daily.entry(record.date.day()).or_insert(0.0) += record.amount;
        }
    }
    daily
}

pub fn total_for_month(records: &[Record], year: i32, month: u32) -> f64 {
    records
        .iter()
        .filter(|record| record.date.year() == year && record.date.month() == month)
        .map(|record| record.amount)
        .sum()
}

pub fn month_summary(records: &[Record], year: i32, month: u32) -> MonthSummary {
    MonthSummary {
        year,
        month,
        daily: aggregate_by_day(records, year, month),
        total: total_for_month(records, year, month),
    }
}

/// Calendar layout for a month: Monday-first weeks, 0 in slots that belong to
/// the neighbouring months. An invalid year/month yields no weeks.
pub fn month_weeks(year: i32, month: u32) -> Vec<[u32; 7]> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    let mut weeks = Vec::new();
    let mut week = [0u32; 7];
    let mut slot = first.weekday().num_days_from_monday() as usize;

    for day in 1..=days_in_month(first) {
        week[slot] = day;
        if slot == 6 {
            weeks.push(week);
            week = [0u32; 7];
            slot = 0;
        } else {
            slot += 1;
        }
    }
    if week.iter().any(|&day| day != 0) {
        weeks.push(week);
    }
    weeks
}

fn days_in_month(first: NaiveDate) -> u32 {
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next_month.map_or(31, |next| {
        next.signed_duration_since(first).num_days() as u32
    })
}
