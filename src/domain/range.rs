use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Appointment, Expense};

/// Anything that carries a point in time the range filter can test.
pub trait Dated {
    fn date(&self) -> NaiveDateTime;
}

impl Dated for Appointment {
    fn date(&self) -> NaiveDateTime {
        self.date
    }
}

impl Dated for Expense {
    fn date(&self) -> NaiveDateTime {
        self.date
    }
}

impl<T: Dated> Dated for &T {
    fn date(&self) -> NaiveDateTime {
        (*self).date()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("date range has no start date and no default was supplied")]
    MissingStart,

    #[error("date range ends ({to}) before it starts ({from})")]
    InvertedRange { from: NaiveDate, to: NaiveDate },

    #[error("no previous period before {start}: it would start before the earliest supported date")]
    NoPreviousPeriod { start: NaiveDate },
}

/// Last representable instant of a day, millisecond precision.
const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_milli_opt(23, 59, 59, 999) {
    Some(time) => time,
    None => panic!("23:59:59.999 is a valid time of day"),
};

/// A date window as selected by the caller. Both ends are inclusive calendar days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    /// When absent the range is the single day of `from`
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self::new(Some(from), Some(to))
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self::new(Some(day), None)
    }

    /// Fill in the caller's default when no start date was selected.
    pub fn or_default(self, default: DateRange) -> DateRange {
        if self.from.is_some() { self } else { default }
    }

    pub fn today(today: NaiveDate) -> Self {
        Self::single_day(today)
    }

    /// The last `days` days ending today, today included.
    pub fn last_days(today: NaiveDate, days: u32) -> Self {
        let span = u64::from(days.max(1)) - 1;
        Self::between(days_before(today, span), today)
    }

    /// From the first of the current month up to today.
    pub fn month_to_date(today: NaiveDate) -> Self {
        Self::between(first_day_of_month(today), today)
    }

    pub fn current_month(today: NaiveDate) -> Self {
        Self::between(first_day_of_month(today), last_day_of_month(today))
    }

    pub fn current_year(today: NaiveDate) -> Self {
        let first = days_before(today, u64::from(today.ordinal0()));
        let last = day_before_or_max(first.checked_add_months(Months::new(12)));
        Self::between(first, last)
    }

    /// Clamp the range to whole days. Fails when there is no start date.
    pub fn resolve(&self) -> Result<ResolvedRange, RangeError> {
        let from = self.from.ok_or(RangeError::MissingStart)?;
        let to = self.to.unwrap_or(from);
        if to < from {
            return Err(RangeError::InvertedRange { from, to });
        }
        Ok(ResolvedRange::from_days(from, to))
    }
}

/// A validated range: `start` is 00:00:00.000 of the first day,
/// `end` is 23:59:59.999 of the last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ResolvedRange {
    fn from_days(from: NaiveDate, to: NaiveDate) -> Self {
        let start = from.and_time(NaiveTime::MIN);
        let end = to.and_time(END_OF_DAY);
        Self { start, end }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.date()
    }

    /// Day-granularity membership test.
    pub fn contains(&self, moment: NaiveDateTime) -> bool {
        let day = moment.date();
        day >= self.first_day() && day <= self.last_day()
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        day >= self.first_day() && day <= self.last_day()
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.last_day() - self.first_day()).num_days() + 1
    }

    /// Every calendar day in the range, in order.
    pub fn each_day(&self) -> Vec<NaiveDate> {
        days_between(self.first_day(), self.last_day())
    }

    /// The window of the same length that ends the day before this one starts.
    /// Fails when that window would begin before `NaiveDate::MIN`.
    pub fn previous_period(&self) -> Result<ResolvedRange, RangeError> {
        let start = self.first_day();
        let no_previous = || RangeError::NoPreviousPeriod { start };
        let to = start.pred_opt().ok_or_else(no_previous)?;
        let from = Duration::try_days(self.days())
            .and_then(|length| start.checked_sub_signed(length))
            .ok_or_else(no_previous)?;
        Ok(ResolvedRange::from_days(from, to))
    }
}

/// Select the records whose day falls inside `range`, preserving input order.
pub fn filter_by_range<'a, T: Dated>(
    records: &'a [T],
    range: &DateRange,
) -> Result<Vec<&'a T>, RangeError> {
    let resolved = range.resolve()?;
    Ok(filter_resolved(records, &resolved))
}

/// Same as [`filter_by_range`] for an already validated range.
pub fn filter_resolved<'a, T: Dated>(records: &'a [T], range: &ResolvedRange) -> Vec<&'a T> {
    records
        .iter()
        .filter(|record| range.contains(record.date()))
        .collect()
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    days_before(date, u64::from(date.day0()))
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    day_before_or_max(first_day_of_month(date).checked_add_months(Months::new(1)))
}

/// Every day from `first` to `last`, both included. Unlike `iter_days`
/// this still yields `NaiveDate::MAX`.
pub fn days_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    std::iter::successors(Some(first), |day| day.succ_opt())
        .take_while(|day| *day <= last)
        .collect()
}

/// `date` moved back `days` days, saturating at `NaiveDate::MIN`.
pub fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN)
}

/// `date` moved forward `days` days, saturating at `NaiveDate::MAX`.
pub fn days_after(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

/// The day before the start of the next period. Only the last supported
/// year has no next period, and it ends on `NaiveDate::MAX`.
fn day_before_or_max(next_start: Option<NaiveDate>) -> NaiveDate {
    match next_start.and_then(|next| next.pred_opt()) {
        Some(day) => day,
        None => NaiveDate::MAX,
    }
}
