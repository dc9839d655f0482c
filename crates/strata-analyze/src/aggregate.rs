//! Calendar bucketing of deduplicated records.
//!
//! Every view is derived from each record's local modification time:
//! - line totals per year, per weekday and per hour of day
//! - a contiguous monthly series with running totals
//! - file counts per year with their share of the whole

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_core::FileRecord;

/// Weekdays in report order.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Lines attributed to one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTotal {
    pub year: i32,
    pub lines: u64,
}

/// Lines attributed to one day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayTotal {
    pub weekday: Weekday,
    pub lines: u64,
}

/// Lines attributed to one hour of the day (0-23).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourTotal {
    pub hour: u32,
    pub lines: u64,
}

/// One month of the resampled series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// First day of the month.
    pub month: NaiveDate,
    /// Lines of files last modified in this month.
    pub lines: u64,
    /// Files last modified in this month.
    pub files: u64,
    /// Lines from the first observed month through this one.
    pub cumulative_lines: u64,
    /// Files from the first observed month through this one.
    pub cumulative_files: u64,
}

/// File count for a year and its percentage of all files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearShare {
    pub year: i32,
    pub files: u64,
    /// Percentage in `0.0..=100.0`.
    pub percent: f64,
}

/// Read-only calendar views over a frozen record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucketDataset {
    /// Ascending by year; only years with files appear.
    pub annual: Vec<YearTotal>,
    /// Always seven entries, Monday first.
    pub weekday: Vec<WeekdayTotal>,
    /// Always 24 entries, hour 0 first.
    pub hourly: Vec<HourTotal>,
    /// Every month from the first to the last observed, gaps filled with zero.
    pub monthly: Vec<MonthlyPoint>,
    /// Ascending by year.
    pub yearly_share: Vec<YearShare>,
}

/// Builds a [`TimeBucketDataset`] from records.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataAggregator;

impl MetadataAggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Bucket `records` by year, weekday, hour and month.
    pub fn aggregate(&self, records: &[FileRecord]) -> TimeBucketDataset {
        let mut by_year: BTreeMap<i32, (u64, u64)> = BTreeMap::new();
        let mut by_weekday = [0u64; 7];
        let mut by_hour = [0u64; 24];
        let mut by_month: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();

        for record in records {
            let at = record.modified_at;
            let lines = record.line_count;

            let year = by_year.entry(at.year()).or_default();
            year.0 += lines;
            year.1 += 1;

            by_weekday[at.weekday().num_days_from_monday() as usize] += lines;
            by_hour[at.hour() as usize] += lines;

            if let Some(month) = month_start(at.year(), at.month()) {
                let slot = by_month.entry(month).or_default();
                slot.0 += lines;
                slot.1 += 1;
            }
        }

        let annual = by_year
            .iter()
            .map(|(&year, &(lines, _))| YearTotal { year, lines })
            .collect();

        let weekday = WEEKDAYS
            .iter()
            .zip(by_weekday)
            .map(|(&weekday, lines)| WeekdayTotal { weekday, lines })
            .collect();

        let hourly = (0u32..24)
            .zip(by_hour)
            .map(|(hour, lines)| HourTotal { hour, lines })
            .collect();

        let monthly = cumulative_months(&by_month);

        let total_files = records.len() as u64;
        let yearly_share = by_year
            .iter()
            .map(|(&year, &(_, files))| YearShare {
                year,
                files,
                percent: if total_files > 0 {
                    files as f64 / total_files as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        debug!(
            records = records.len(),
            years = by_year.len(),
            months = by_month.len(),
            "aggregated time buckets"
        );

        TimeBucketDataset {
            annual,
            weekday,
            hourly,
            monthly,
            yearly_share,
        }
    }
}

fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        month_start(date.year() + 1, 1)
    } else {
        month_start(date.year(), date.month() + 1)
    }
}

/// Walk every month between the first and last key, accumulating totals.
fn cumulative_months(by_month: &BTreeMap<NaiveDate, (u64, u64)>) -> Vec<MonthlyPoint> {
    let (Some((&first, _)), Some((&last, _))) =
        (by_month.first_key_value(), by_month.last_key_value())
    else {
        return Vec::new();
    };

    let mut points = Vec::new();
    let mut cumulative_lines = 0u64;
    let mut cumulative_files = 0u64;
    let mut current = Some(first);

    while let Some(month) = current.filter(|m| *m <= last) {
        let (lines, files) = by_month.get(&month).copied().unwrap_or((0, 0));
        cumulative_lines += lines;
        cumulative_files += files;
        points.push(MonthlyPoint {
            month,
            lines,
            files,
            cumulative_lines,
            cumulative_files,
        });
        current = next_month(month);
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::{Local, TimeZone};
    use strata_core::{ContentHash, TextEncoding};

    fn record(id: u8, lines: u64, y: i32, mo: u32, d: u32, h: u32) -> FileRecord {
        FileRecord {
            path: PathBuf::from(format!("/src/f{id}.py")),
            name: format!("f{id}.py").into(),
            line_count: lines,
            size_kb: lines as f64 / 10.0,
            modified_at: Local.with_ymd_and_hms(y, mo, d, h, 15, 0).unwrap(),
            content_hash: ContentHash::new([id; 32]),
            encoding: TextEncoding::Utf8,
        }
    }

    #[test]
    fn test_hourly_zero_fill() {
        let records = vec![record(1, 10, 2022, 5, 2, 9), record(2, 5, 2022, 5, 3, 14)];
        let dataset = MetadataAggregator::new().aggregate(&records);

        assert_eq!(dataset.hourly.len(), 24);
        assert_eq!(dataset.hourly[9].lines, 10);
        assert_eq!(dataset.hourly[14].lines, 5);
        assert_eq!(dataset.hourly.iter().filter(|h| h.lines == 0).count(), 22);
        assert!(dataset.hourly.iter().enumerate().all(|(i, h)| h.hour == i as u32));
    }

    #[test]
    fn test_weekday_order_and_zeros() {
        // 2022-05-02 is a Monday, 2022-05-08 a Sunday
        let records = vec![record(1, 7, 2022, 5, 2, 10), record(2, 3, 2022, 5, 8, 10)];
        let dataset = MetadataAggregator::new().aggregate(&records);

        let days: Vec<Weekday> = dataset.weekday.iter().map(|w| w.weekday).collect();
        assert_eq!(days, WEEKDAYS.to_vec());
        assert_eq!(dataset.weekday[0].lines, 7);
        assert_eq!(dataset.weekday[6].lines, 3);
        assert_eq!(dataset.weekday[1..6].iter().map(|w| w.lines).sum::<u64>(), 0);
    }

    #[test]
    fn test_annual_totals() {
        let records = vec![
            record(1, 100, 2019, 1, 10, 8),
            record(2, 50, 2021, 7, 1, 8),
            record(3, 25, 2021, 12, 31, 20),
        ];
        let dataset = MetadataAggregator::new().aggregate(&records);

        assert_eq!(
            dataset.annual,
            vec![
                YearTotal { year: 2019, lines: 100 },
                YearTotal { year: 2021, lines: 75 },
            ]
        );
    }

    #[test]
    fn test_monthly_series_is_contiguous_and_cumulative() {
        let records = vec![
            record(1, 10, 2021, 11, 5, 12),
            record(2, 20, 2022, 2, 5, 12),
            record(3, 5, 2022, 2, 20, 12),
        ];
        let dataset = MetadataAggregator::new().aggregate(&records);

        let months: Vec<(i32, u32)> = dataset
            .monthly
            .iter()
            .map(|p| (p.month.year(), p.month.month()))
            .collect();
        assert_eq!(months, vec![(2021, 11), (2021, 12), (2022, 1), (2022, 2)]);

        let last = dataset.monthly.last().unwrap();
        assert_eq!(last.cumulative_lines, 35);
        assert_eq!(last.cumulative_files, 3);
        assert_eq!(last.lines, 25);
        assert_eq!(dataset.monthly[1].lines, 0);
        assert_eq!(dataset.monthly[1].cumulative_lines, 10);

        for pair in dataset.monthly.windows(2) {
            assert!(pair[1].cumulative_lines >= pair[0].cumulative_lines);
            assert!(pair[1].cumulative_files >= pair[0].cumulative_files);
        }
    }

    #[test]
    fn test_yearly_share_sums_to_100() {
        let records = vec![
            record(1, 1, 2020, 3, 3, 3),
            record(2, 1, 2020, 4, 3, 3),
            record(3, 1, 2021, 3, 3, 3),
            record(4, 1, 2023, 3, 3, 3),
        ];
        let dataset = MetadataAggregator::new().aggregate(&records);

        assert_eq!(dataset.yearly_share.len(), 3);
        assert_eq!(dataset.yearly_share[0].files, 2);
        assert!((dataset.yearly_share[0].percent - 50.0).abs() < 1e-9);
        let total: f64 = dataset.yearly_share.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_records() {
        let dataset = MetadataAggregator::new().aggregate(&[]);
        assert!(dataset.annual.is_empty());
        assert!(dataset.monthly.is_empty());
        assert_eq!(dataset.hourly.len(), 24);
        assert_eq!(dataset.weekday.len(), 7);
    }
}
