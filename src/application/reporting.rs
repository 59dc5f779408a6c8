use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{Appointment, Cents, ClientId, Expense, ResolvedRange, percentage};

use super::{
    ClientHistory, ExpenseDimension, GroupDimension, GroupStat, GroupTable, average_cents,
    favorite_services, group_appointments, group_expenses, rank, top_n,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSummary {
    pub key: String,
    pub count: i64,
    /// Everything booked or owed under this key
    pub total: Cents,
    /// Completed revenue or paid expenses under this key
    pub settled: Cents,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Cents,
    pub expenses: Cents,
    pub net: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub gross_revenue: Cents,
    pub paid_expenses: Cents,
    pub pending_expenses: Cents,
    pub net_profit: Cents,
    pub profit_margin: f64,
    pub average_ticket: Cents,
    pub appointment_count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
    pub payment_methods: Vec<ShareSummary>,
    pub expense_categories: Vec<ShareSummary>,
    pub daily: Vec<DailyRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummary {
    #[serde(flatten)]
    pub stat: GroupStat,
    pub favorite_service: Option<String>,
    pub last_visit: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientReport {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    /// Distinct clients with at least one appointment in the range
    pub active_clients: usize,
    pub new_clients: Vec<ClientHistory>,
    pub inactive_clients: Vec<ClientHistory>,
    pub clients: Vec<ClientSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalSummary {
    #[serde(flatten)]
    pub stat: GroupStat,
    pub unique_clients: usize,
    pub booked_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalReport {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub professionals: Vec<ProfessionalSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    #[serde(flatten)]
    pub stat: GroupStat,
    pub average_duration_minutes: f64,
    /// Share of the range's completed revenue
    pub revenue_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceReport {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub services: Vec<ServiceSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub revenue: Cents,
    pub expenses: Cents,
    pub net: Cents,
    pub appointments: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current_period: PeriodSummary,
    pub previous_period: PeriodSummary,
    pub revenue_change: Cents,
    pub revenue_change_percentage: f64,
}

fn shares(table: GroupTable, whole: Cents) -> Vec<ShareSummary> {
    let mut shares: Vec<ShareSummary> = table
        .into_entries()
        .into_iter()
        .map(|entry| ShareSummary {
            key: entry.key,
            count: entry.totals.count,
            total: entry.totals.total_amount,
            settled: entry.totals.total_revenue,
            percentage: percentage(entry.totals.total_amount, whole),
        })
        .collect();
    shares.sort_by(|a, b| b.total.cmp(&a.total));
    shares
}

/// Sum of amounts, saturating at the `Cents` bounds.
fn total(amounts: impl IntoIterator<Item = Cents>) -> Cents {
    amounts.into_iter().fold(0, Cents::saturating_add)
}

fn add_to_day(days: &mut HashMap<NaiveDate, Cents>, date: NaiveDate, amount: Cents) {
    let slot = days.entry(date).or_insert(0);
    *slot = slot.saturating_add(amount);
}

fn completed_revenue(appointments: &[&Appointment]) -> Cents {
    total(
        appointments
            .iter()
            .filter(|a| a.is_completed())
            .map(|a| a.price_cents),
    )
}

fn paid_total(expenses: &[&Expense]) -> Cents {
    total(expenses.iter().filter(|e| e.is_paid).map(|e| e.amount_cents))
}

/// Revenue, costs and their breakdowns for the records of one window.
pub fn build_financial_report(
    appointments: &[&Appointment],
    expenses: &[&Expense],
    range: &ResolvedRange,
) -> FinancialReport {
    let completed: Vec<&Appointment> = appointments
        .iter()
        .copied()
        .filter(|a| a.is_completed())
        .collect();
    let cancelled_count = appointments.iter().filter(|a| a.is_cancelled()).count() as i64;
    let appointment_count = appointments.len() as i64;
    let completed_count = completed.len() as i64;

    let gross_revenue = completed_revenue(appointments);
    let paid_expenses = paid_total(expenses);
    let pending_expenses = total(expenses.iter().filter(|e| !e.is_paid).map(|e| e.amount_cents));
    let all_expenses = paid_expenses.saturating_add(pending_expenses);
    let net_profit = gross_revenue.saturating_sub(paid_expenses);

    let payment_methods = shares(
        group_appointments(completed.iter().copied(), GroupDimension::PaymentMethod),
        gross_revenue,
    );
    let expense_categories = shares(
        group_expenses(expenses.iter().copied(), ExpenseDimension::Category),
        all_expenses,
    );

    let mut revenue_by_day: HashMap<NaiveDate, Cents> = HashMap::new();
    for appointment in &completed {
        add_to_day(&mut revenue_by_day, appointment.date.date(), appointment.price_cents);
    }
    let mut expenses_by_day: HashMap<NaiveDate, Cents> = HashMap::new();
    for expense in expenses.iter().filter(|e| e.is_paid) {
        add_to_day(&mut expenses_by_day, expense.date.date(), expense.amount_cents);
    }
    let daily = range
        .each_day()
        .into_iter()
        .map(|date| {
            let revenue = revenue_by_day.get(&date).copied().unwrap_or(0);
            let expenses = expenses_by_day.get(&date).copied().unwrap_or(0);
            DailyRevenue {
                date,
                revenue,
                expenses,
                net: revenue.saturating_sub(expenses),
            }
        })
        .collect();

    FinancialReport {
        from_date: range.first_day(),
        to_date: range.last_day(),
        gross_revenue,
        paid_expenses,
        pending_expenses,
        net_profit,
        profit_margin: percentage(net_profit, gross_revenue),
        average_ticket: average_cents(gross_revenue, completed_count),
        appointment_count,
        completed_count,
        cancelled_count,
        completion_rate: percentage(completed_count, appointment_count),
        cancellation_rate: percentage(cancelled_count, appointment_count),
        payment_methods,
        expense_categories,
        daily,
    }
}

/// Ranked clients of the window plus lifecycle lists computed over the full history.
pub fn build_client_report(
    windowed: &[&Appointment],
    range: &ResolvedRange,
    new_clients: Vec<ClientHistory>,
    inactive_clients: Vec<ClientHistory>,
    top: usize,
) -> ClientReport {
    let favorites = favorite_services(windowed.iter().copied());

    let mut last_visits: HashMap<ClientId, NaiveDateTime> = HashMap::new();
    for appointment in windowed.iter().filter(|a| a.is_completed()) {
        let last = last_visits
            .entry(appointment.client_id)
            .or_insert(appointment.date);
        *last = (*last).max(appointment.date);
    }

    let table = group_appointments(windowed.iter().copied(), GroupDimension::Client);
    let active_clients = table.len();

    // Client ids were the grouping keys, so look them back up through the window.
    let ids: HashMap<String, ClientId> = windowed
        .iter()
        .map(|a| (a.client_id.to_string(), a.client_id))
        .collect();

    let clients = top_n(rank(table.into_stats()), top)
        .into_iter()
        .map(|stat| {
            let client_id = ids.get(&stat.key).copied();
            ClientSummary {
                favorite_service: client_id.and_then(|id| favorites.get(&id).cloned()),
                last_visit: client_id.and_then(|id| last_visits.get(&id).copied()),
                stat,
            }
        })
        .collect();

    ClientReport {
        from_date: range.first_day(),
        to_date: range.last_day(),
        active_clients,
        new_clients,
        inactive_clients,
        clients,
    }
}

pub fn build_professional_report(
    windowed: &[&Appointment],
    range: &ResolvedRange,
    top: usize,
) -> ProfessionalReport {
    let mut clients: HashMap<&str, HashSet<ClientId>> = HashMap::new();
    let mut minutes: HashMap<&str, i64> = HashMap::new();
    for appointment in windowed {
        clients
            .entry(appointment.professional.as_str())
            .or_default()
            .insert(appointment.client_id);
        if !appointment.is_cancelled() {
            *minutes.entry(appointment.professional.as_str()).or_insert(0) +=
                i64::from(appointment.duration_minutes);
        }
    }

    let table = group_appointments(windowed.iter().copied(), GroupDimension::Professional);
    let professionals = top_n(rank(table.into_stats()), top)
        .into_iter()
        .map(|stat| ProfessionalSummary {
            unique_clients: clients.get(stat.key.as_str()).map_or(0, HashSet::len),
            booked_minutes: minutes.get(stat.key.as_str()).copied().unwrap_or(0),
            stat,
        })
        .collect();

    ProfessionalReport {
        from_date: range.first_day(),
        to_date: range.last_day(),
        professionals,
    }
}

pub fn build_service_report(
    windowed: &[&Appointment],
    range: &ResolvedRange,
    top: usize,
) -> ServiceReport {
    let gross_revenue = completed_revenue(windowed);

    let mut durations: HashMap<&str, (i64, i64)> = HashMap::new();
    for appointment in windowed {
        let (sum, count) = durations.entry(appointment.service.as_str()).or_insert((0, 0));
        *sum += i64::from(appointment.duration_minutes);
        *count += 1;
    }

    let table = group_appointments(windowed.iter().copied(), GroupDimension::Service);
    let services = top_n(rank(table.into_stats()), top)
        .into_iter()
        .map(|stat| {
            let (sum, count) = durations.get(stat.key.as_str()).copied().unwrap_or((0, 0));
            ServiceSummary {
                average_duration_minutes: if count == 0 {
                    0.0
                } else {
                    sum as f64 / count as f64
                },
                revenue_share: percentage(stat.total_revenue, gross_revenue),
                stat,
            }
        })
        .collect();

    ServiceReport {
        from_date: range.first_day(),
        to_date: range.last_day(),
        services,
    }
}

pub fn build_period_summary(
    appointments: &[&Appointment],
    expenses: &[&Expense],
    range: &ResolvedRange,
) -> PeriodSummary {
    let revenue = completed_revenue(appointments);
    let expenses = paid_total(expenses);
    PeriodSummary {
        period_start: range.first_day(),
        period_end: range.last_day(),
        revenue,
        expenses,
        net: revenue.saturating_sub(expenses),
        appointments: appointments.len() as i64,
    }
}

pub fn compare_periods(current: PeriodSummary, previous: PeriodSummary) -> PeriodComparison {
    let revenue_change = current.revenue.saturating_sub(previous.revenue);
    PeriodComparison {
        revenue_change_percentage: percentage(revenue_change, previous.revenue),
        revenue_change,
        current_period: current,
        previous_period: previous,
    }
}
