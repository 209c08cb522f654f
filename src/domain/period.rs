use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::Partition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodMode {
    Day,
    Month,
}

impl PeriodMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodMode::Day => "day",
            PeriodMode::Month => "month",
        }
    }
}

impl std::fmt::Display for PeriodMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// One partition read, optionally bounded by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceQuery {
    pub partition: Partition,
    pub range: Option<TimeRange>,
}

/// Ordered list of partition reads that make up a period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
    pub queries: Vec<SourceQuery>,
}

impl SourcePlan {
    /// Partitions read independently must be re-sorted once merged.
    pub fn needs_merge_sort(&self) -> bool {
        self.queries.len() > 1
    }
}

/// How the selected period relates to the viewer's current day or month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Current,
    Other,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Period,
    Unbounded,
}

const SOURCE_TABLE: &[(PeriodMode, Relation, &[(Partition, Bound)])] = &[
    (PeriodMode::Day, Relation::Current, &[(Partition::Live, Bound::Period)]),
    (PeriodMode::Day, Relation::Other, &[(Partition::Archived, Bound::Period)]),
    (
        PeriodMode::Month,
        Relation::Current,
        &[
            (Partition::Archived, Bound::Period),
            // The archive never holds today yet, so all of live is added
            (Partition::Live, Bound::Unbounded),
        ],
    ),
    (PeriodMode::Month, Relation::Other, &[(Partition::Archived, Bound::Period)]),
];

/// A calendar date plus whether the whole day or its whole month is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSelection {
    pub date: NaiveDate,
    pub mode: PeriodMode,
}

impl PeriodSelection {
    pub fn day(date: NaiveDate) -> Self {
        Self {
            date,
            mode: PeriodMode::Day,
        }
    }

    pub fn month(date: NaiveDate) -> Self {
        Self {
            date,
            mode: PeriodMode::Month,
        }
    }

    /// First and last calendar day covered by the selection.
    pub fn days(&self) -> (NaiveDate, NaiveDate) {
        match self.mode {
            PeriodMode::Day => (self.date, self.date),
            PeriodMode::Month => {
                let first = first_of_month(self.date);
                let last = first_of_next_month(self.date)
                    .pred_opt()
                    .unwrap_or(self.date);
                (first, last)
            }
        }
    }

    /// Resolve the selection to instants in the viewer's time zone: from
    /// the first day's local midnight up to 1 ms before the local midnight
    /// that follows the last day. Consecutive days tile with no gap or
    /// overlap, including across DST changes.
    pub fn range_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<TimeRange, PeriodError> {
        let (first, last) = self.days();
        let next = last
            .succ_opt()
            .ok_or(PeriodError::UnresolvableLocalTime(last))?;
        let start = start_of_day(tz, first)?;
        let end = start_of_day(tz, next)? - Duration::milliseconds(1);
        Ok(TimeRange { start, end })
    }

    /// True when the selection covers `today` (same day, or same month in
    /// month mode).
    pub fn is_current(&self, today: NaiveDate) -> bool {
        match self.mode {
            PeriodMode::Day => self.date == today,
            PeriodMode::Month => {
                self.date.year() == today.year() && self.date.month() == today.month()
            }
        }
    }

    /// Decide which partitions to read for this selection.
    pub fn source_plan(&self, today: NaiveDate, range: TimeRange) -> SourcePlan {
        let relation = if self.is_current(today) {
            Relation::Current
        } else {
            Relation::Other
        };

        let reads = SOURCE_TABLE
            .iter()
            .find(|(mode, rel, _)| *mode == self.mode && *rel == relation)
            .map(|(_, _, reads)| *reads)
            .unwrap_or(&[]);

        SourcePlan {
            queries: reads
                .iter()
                .map(|(partition, bound)| SourceQuery {
                    partition: *partition,
                    range: match bound {
                        Bound::Period => Some(range),
                        Bound::Unbounded => None,
                    },
                })
                .collect(),
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The first day of the following month; its predecessor is "day 0".
fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<DateTime<Utc>, PeriodError> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| local_instant(tz, midnight))
        .ok_or(PeriodError::UnresolvableLocalTime(date))
}

/// Map a local wall-clock time to an instant. Ambiguous times take the
/// earliest candidate; times inside a DST gap move forward to the first
/// valid instant.
fn local_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => (1..=4)
            .map(|step| naive + Duration::minutes(30 * step))
            .find_map(|shifted| tz.from_local_datetime(&shifted).earliest())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    UnresolvableLocalTime(NaiveDate),
}

impl std::fmt::Display for PeriodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodError::UnresolvableLocalTime(date) => {
                write!(f, "cannot resolve local time on {}", date)
            }
        }
    }
}

impl std::error::Error for PeriodError {}
