use chrono::NaiveDate;

use crate::domain::{
    Appointment, CalendarCell, CalendarView, DateRange, Expense, ResolvedRange,
    calendar_with_counts, filter_resolved,
};

use super::{
    AnalyticsError, ClientReport, ExpenseDimension, FinancialReport, GroupDimension, GroupStat,
    PeriodComparison, ProfessionalReport, RawAppointment, RawExpense, ServiceReport,
    ValidationReport, build_client_report, build_financial_report, build_period_summary,
    build_professional_report, build_service_report, compare_periods, group_appointments,
    group_expenses, inactive_clients, new_clients, normalize_appointments, normalize_expenses,
    rank, top_n,
};

/// Tunables of the analytics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Days without an appointment after which a client counts as inactive
    pub inactive_after_days: i64,
    /// Ranking length when the caller does not ask for one
    pub default_top: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inactive_after_days: 30,
            default_top: 10,
        }
    }
}

/// Validation outcome of loading both record kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub appointments: ValidationReport,
    pub expenses: ValidationReport,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.appointments.is_clean() && self.expenses.is_clean()
    }
}

/// Analytics over one immutable snapshot of appointments and expenses.
/// This is the primary interface for any client (CLI, API, dashboard).
/// Every query is a pure function of the snapshot and its arguments.
pub struct AnalyticsService {
    appointments: Vec<Appointment>,
    expenses: Vec<Expense>,
    config: EngineConfig,
}

impl AnalyticsService {
    /// Create a service over already normalized records.
    pub fn new(appointments: Vec<Appointment>, expenses: Vec<Expense>) -> Self {
        Self {
            appointments,
            expenses,
            config: EngineConfig::default(),
        }
    }

    /// Normalize raw records and build a service over the ones that pass.
    pub fn from_raw(
        appointments: Vec<RawAppointment>,
        expenses: Vec<RawExpense>,
    ) -> (Self, IngestReport) {
        let appointments = normalize_appointments(appointments);
        let expenses = normalize_expenses(expenses);
        let report = IngestReport {
            appointments: appointments.report,
            expenses: expenses.report,
        };
        (Self::new(appointments.records, expenses.records), report)
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    // ========================
    // Filtering
    // ========================

    fn resolve(&self, range: &DateRange) -> Result<ResolvedRange, AnalyticsError> {
        let resolved = range.resolve()?;
        tracing::debug!(
            from = %resolved.first_day(),
            to = %resolved.last_day(),
            "resolved date range"
        );
        Ok(resolved)
    }

    /// Appointments inside `range`, in snapshot order.
    pub fn filter_appointments(
        &self,
        range: &DateRange,
    ) -> Result<Vec<&Appointment>, AnalyticsError> {
        let resolved = self.resolve(range)?;
        Ok(filter_resolved(&self.appointments, &resolved))
    }

    /// Expenses inside `range`, in snapshot order.
    pub fn filter_expenses(&self, range: &DateRange) -> Result<Vec<&Expense>, AnalyticsError> {
        let resolved = self.resolve(range)?;
        Ok(filter_resolved(&self.expenses, &resolved))
    }

    // ========================
    // Grouping and ranking
    // ========================

    /// Ranked group statistics of the appointments in `range`.
    pub fn group_appointments(
        &self,
        range: &DateRange,
        dimension: GroupDimension,
    ) -> Result<Vec<GroupStat>, AnalyticsError> {
        let windowed = self.filter_appointments(range)?;
        let table = group_appointments(windowed, dimension);
        tracing::debug!(
            dimension = dimension.as_str(),
            groups = table.len(),
            "grouped appointments"
        );
        Ok(rank(table.into_stats()))
    }

    /// The `n` best earning groups of the appointments in `range`.
    pub fn top_appointments(
        &self,
        range: &DateRange,
        dimension: GroupDimension,
        n: usize,
    ) -> Result<Vec<GroupStat>, AnalyticsError> {
        Ok(top_n(self.group_appointments(range, dimension)?, n))
    }

    /// Ranked group statistics of the expenses in `range`. Revenue here means paid amount.
    pub fn group_expenses(
        &self,
        range: &DateRange,
        dimension: ExpenseDimension,
    ) -> Result<Vec<GroupStat>, AnalyticsError> {
        let windowed = self.filter_expenses(range)?;
        Ok(rank(group_expenses(windowed, dimension).into_stats()))
    }

    // ========================
    // Reports
    // ========================

    pub fn financial_report(&self, range: &DateRange) -> Result<FinancialReport, AnalyticsError> {
        let resolved = self.resolve(range)?;
        let appointments = filter_resolved(&self.appointments, &resolved);
        let expenses = filter_resolved(&self.expenses, &resolved);
        Ok(build_financial_report(&appointments, &expenses, &resolved))
    }

    /// Client rankings for `range`. New clients are judged against the full
    /// history, inactive clients against `today`.
    pub fn client_report(
        &self,
        range: &DateRange,
        today: NaiveDate,
        top: Option<usize>,
    ) -> Result<ClientReport, AnalyticsError> {
        let resolved = self.resolve(range)?;
        let windowed = filter_resolved(&self.appointments, &resolved);
        let new = new_clients(&self.appointments, &resolved);
        let inactive = inactive_clients(&self.appointments, today, self.config.inactive_after_days);
        tracing::debug!(
            new = new.len(),
            inactive = inactive.len(),
            "computed client lifecycle"
        );
        Ok(build_client_report(
            &windowed,
            &resolved,
            new,
            inactive,
            top.unwrap_or(self.config.default_top),
        ))
    }

    pub fn professional_report(
        &self,
        range: &DateRange,
        top: Option<usize>,
    ) -> Result<ProfessionalReport, AnalyticsError> {
        let resolved = self.resolve(range)?;
        let windowed = filter_resolved(&self.appointments, &resolved);
        Ok(build_professional_report(
            &windowed,
            &resolved,
            top.unwrap_or(self.config.default_top),
        ))
    }

    pub fn service_report(
        &self,
        range: &DateRange,
        top: Option<usize>,
    ) -> Result<ServiceReport, AnalyticsError> {
        let resolved = self.resolve(range)?;
        let windowed = filter_resolved(&self.appointments, &resolved);
        Ok(build_service_report(
            &windowed,
            &resolved,
            top.unwrap_or(self.config.default_top),
        ))
    }

    /// Compare `range` with the window of equal length right before it.
    pub fn compare_with_previous(
        &self,
        range: &DateRange,
    ) -> Result<PeriodComparison, AnalyticsError> {
        let current = self.resolve(range)?;
        let previous = current.previous_period()?;

        let summarize = |window: &ResolvedRange| {
            let appointments = filter_resolved(&self.appointments, window);
            let expenses = filter_resolved(&self.expenses, window);
            build_period_summary(&appointments, &expenses, window)
        };

        Ok(compare_periods(summarize(&current), summarize(&previous)))
    }

    // ========================
    // Calendar
    // ========================

    /// Calendar cells around `anchor` with the number of appointments on each.
    pub fn calendar(&self, view: CalendarView, anchor: NaiveDate) -> Vec<CalendarCell> {
        calendar_with_counts(view, anchor, &self.appointments)
    }
}
