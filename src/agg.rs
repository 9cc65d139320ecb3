use std::collections::HashMap;
use time::{Date, Month, OffsetDateTime};

pub const RACE_RANK_LIMIT: usize = 10;
pub const TOP_TRACK_LIMIT: usize = 15;

// Window used when a filtered set is empty and no data extent exists.
pub const DEFAULT_TIMELINE_YEAR: i32 = 2025;

pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthBucket {
    pub month_start: Date,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatCell {
    pub weekday: &'static str,
    pub day_index: usize,
    pub hour: u8,
    pub count: u64,
}

/// Group rows by a key, sum a value over each group, sort descending and
/// keep the top `limit`. Ties keep first-seen key order.
pub fn rank_by<T>(
    rows: &[T],
    key_fn: impl Fn(&T) -> &str,
    value_fn: impl Fn(&T) -> u64,
    limit: usize,
) -> Vec<RankEntry> {
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<RankEntry> = Vec::new();

    for row in rows {
        let key = key_fn(row);
        let index = *order.entry(key.to_string()).or_insert_with(|| {
            entries.push(RankEntry {
                label: key.to_string(),
                value: 0,
            });
            entries.len() - 1
        });
        entries[index].value = entries[index].value.saturating_add(value_fn(row));
    }

    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries.truncate(limit);
    entries
}

/// Dense calendar-month histogram over the rows' date extent. Empty
/// input falls back to a full default year so a chart axis always has a
/// domain to draw.
pub fn month_buckets<T>(rows: &[T], date_fn: impl Fn(&T) -> Date) -> Vec<MonthBucket> {
    let mut min_date: Option<Date> = None;
    let mut max_date: Option<Date> = None;
    for row in rows {
        let date = date_fn(row);
        min_date = Some(min_date.map_or(date, |current| current.min(date)));
        max_date = Some(max_date.map_or(date, |current| current.max(date)));
    }

    let (start, end) = match (min_date, max_date) {
        (Some(min), Some(max)) => (month_floor(min), month_floor(max)),
        _ => (
            first_of(DEFAULT_TIMELINE_YEAR, Month::January),
            first_of(DEFAULT_TIMELINE_YEAR, Month::December),
        ),
    };

    let mut buckets = Vec::new();
    let mut cursor = start;
    loop {
        buckets.push(MonthBucket {
            month_start: cursor,
            count: 0,
        });
        if cursor >= end {
            break;
        }
        cursor = next_month(cursor);
    }

    for row in rows {
        let month = month_floor(date_fn(row));
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|bucket| bucket.month_start == month)
        {
            bucket.count += 1;
        }
    }

    buckets
}

/// Fixed 7x24 grid counting one event per row into its weekday and
/// hour-of-day cell. Always emits all 168 cells, zero-filled.
pub fn weekday_hour_histogram<T>(
    rows: &[T],
    when_fn: impl Fn(&T) -> OffsetDateTime,
) -> Vec<HeatCell> {
    let mut counts = [[0_u64; HOURS_PER_DAY]; WEEKDAY_LABELS.len()];
    for row in rows {
        let when = when_fn(row);
        let day = when.weekday().number_days_from_monday() as usize;
        let hour = when.hour() as usize;
        counts[day][hour] += 1;
    }

    let mut cells = Vec::with_capacity(WEEKDAY_LABELS.len() * HOURS_PER_DAY);
    for (day_index, label) in WEEKDAY_LABELS.iter().enumerate() {
        for (hour, count) in counts[day_index].iter().enumerate() {
            cells.push(HeatCell {
                weekday: label,
                day_index,
                hour: hour as u8,
                count: *count,
            });
        }
    }
    cells
}

pub fn month_floor(date: Date) -> Date {
    first_of(date.year(), date.month())
}

pub fn next_month(date: Date) -> Date {
    let (year, month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        other => (date.year(), other.next()),
    };
    first_of(year, month)
}

fn first_of(year: i32, month: Month) -> Date {
    // Day 1 exists in every month of every supported year.
    Date::from_calendar_date(year, month, 1).unwrap_or(Date::MIN)
}
