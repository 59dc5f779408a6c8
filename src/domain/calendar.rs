use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Dated, days_after, days_before, days_between, first_day_of_month, last_day_of_month};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    Week,
    Month,
    Year,
}

impl CalendarView {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarView::Week => "week",
            CalendarView::Month => "month",
            CalendarView::Year => "year",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "week" => Some(CalendarView::Week),
            "month" => Some(CalendarView::Month),
            "year" => Some(CalendarView::Year),
            _ => None,
        }
    }
}

impl std::fmt::Display for CalendarView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One cell of a calendar grid.
/// In the year view each cell stands for a whole month and `date` is its first day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// False for the leading/trailing days of neighbouring months in the month view
    pub in_view: bool,
    pub appointments: usize,
}

/// Build the cells for `view` around `anchor`. Weeks start on Monday.
pub fn calendar_grid(view: CalendarView, anchor: NaiveDate) -> Vec<CalendarCell> {
    let cell = |date: NaiveDate, in_view: bool| CalendarCell {
        date,
        in_view,
        appointments: 0,
    };

    match view {
        CalendarView::Week => {
            let monday = start_of_week(anchor);
            days_between(monday, days_after(monday, 6))
                .into_iter()
                .map(|day| cell(day, true))
                .collect()
        }
        CalendarView::Month => {
            let first = first_day_of_month(anchor);
            let last = last_day_of_month(anchor);
            let grid_start = start_of_week(first);
            let grid_end = days_after(start_of_week(last), 6);
            days_between(grid_start, grid_end)
                .into_iter()
                .map(|day| cell(day, day.month() == anchor.month()))
                .collect()
        }
        CalendarView::Year => (1..=12)
            .filter_map(|month| NaiveDate::from_ymd_opt(anchor.year(), month, 1))
            .map(|first| cell(first, true))
            .collect(),
    }
}

/// Build the grid and count how many records land on each cell.
pub fn calendar_with_counts<T: Dated>(
    view: CalendarView,
    anchor: NaiveDate,
    records: &[T],
) -> Vec<CalendarCell> {
    let mut grid = calendar_grid(view, anchor);
    for record in records {
        let day = record.date().date();
        let slot = match view {
            CalendarView::Year => grid
                .iter_mut()
                .find(|c| c.date.year() == day.year() && c.date.month() == day.month()),
            CalendarView::Week | CalendarView::Month => grid.iter_mut().find(|c| c.date == day),
        };
        if let Some(cell) = slot {
            cell.appointments += 1;
        }
    }
    grid
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    days_before(date, u64::from(date.weekday().num_days_from_monday()))
}
