use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Appointment, Cents, ClientId, ResolvedRange, days_after, days_before, percentage,
};

use super::{GroupEntry, GroupTable};

/// Aggregated result for one key within a range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub key: String,
    pub label: String,
    pub count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    pub total_revenue: Cents,
    /// Revenue per completed record, rounded to the cent
    pub average_value: Cents,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
}

impl GroupStat {
    pub fn from_entry(entry: GroupEntry) -> Self {
        let totals = entry.totals;
        Self {
            key: entry.key,
            label: entry.label,
            count: totals.count,
            completed_count: totals.completed_count,
            cancelled_count: totals.cancelled_count,
            total_revenue: totals.total_revenue,
            average_value: average_cents(totals.total_revenue, totals.completed_count),
            completion_rate: percentage(totals.completed_count, totals.count),
            cancellation_rate: percentage(totals.cancelled_count, totals.count),
        }
    }
}

impl GroupTable {
    /// Derive the metrics for every group, in first-seen order.
    pub fn into_stats(self) -> Vec<GroupStat> {
        self.into_entries()
            .into_iter()
            .map(GroupStat::from_entry)
            .collect()
    }
}

/// `total / count` rounded to the nearest cent, 0 when `count` is zero.
pub fn average_cents(total: Cents, count: i64) -> Cents {
    if count == 0 {
        0
    } else {
        (total as f64 / count as f64).round() as Cents
    }
}

/// Order by revenue, highest first. Equal revenue keeps the incoming order.
pub fn rank(mut stats: Vec<GroupStat>) -> Vec<GroupStat> {
    stats.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    stats
}

/// Keep at most `n` entries; shorter inputs are returned whole.
pub fn top_n(mut ranked: Vec<GroupStat>, n: usize) -> Vec<GroupStat> {
    ranked.truncate(n);
    ranked
}

/// A client's full appointment history boiled down to its bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientHistory {
    pub client_id: ClientId,
    /// Name on the first appointment seen for this client
    pub client_name: String,
    pub first_visit: NaiveDateTime,
    pub last_visit: NaiveDateTime,
    pub appointments: i64,
}

/// Earliest and latest appointment per client, over every status.
/// Clients are listed in the order they first appear in `records`.
pub fn client_histories<'a, I>(records: I) -> Vec<ClientHistory>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    let mut index: HashMap<ClientId, usize> = HashMap::new();
    let mut histories: Vec<ClientHistory> = Vec::new();

    for appointment in records {
        match index.get(&appointment.client_id) {
            Some(&slot) => {
                let history = &mut histories[slot];
                history.first_visit = history.first_visit.min(appointment.date);
                history.last_visit = history.last_visit.max(appointment.date);
                history.appointments += 1;
            }
            None => {
                index.insert(appointment.client_id, histories.len());
                histories.push(ClientHistory {
                    client_id: appointment.client_id,
                    client_name: appointment.client_name.clone(),
                    first_visit: appointment.date,
                    last_visit: appointment.date,
                    appointments: 1,
                });
            }
        }
    }

    histories
}

/// Clients whose first appointment ever falls inside `range`.
/// `records` must be the whole history, not the windowed subset.
pub fn new_clients<'a, I>(records: I, range: &ResolvedRange) -> Vec<ClientHistory>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    client_histories(records)
        .into_iter()
        .filter(|history| range.contains(history.first_visit))
        .collect()
}

/// Clients whose latest appointment is older than `today - threshold_days`.
pub fn inactive_clients<'a, I>(
    records: I,
    today: NaiveDate,
    threshold_days: i64,
) -> Vec<ClientHistory>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    // Saturates at the ends of the calendar instead of overflowing
    let cutoff = if threshold_days >= 0 {
        days_before(today, threshold_days.unsigned_abs())
    } else {
        days_after(today, threshold_days.unsigned_abs())
    };
    client_histories(records)
        .into_iter()
        .filter(|history| history.last_visit.date() < cutoff)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{GroupKey, group_by};
    use crate::domain::{AppointmentStatus, DateRange};

    fn at(day: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn visit(client: &str, day: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: format!("{client}-{day}"),
            client_id: ClientId::from_name(client),
            client_name: client.into(),
            service: "Corte".into(),
            professional: "Carlos".into(),
            date: at(day),
            price_cents: 5000,
            status,
            duration_minutes: 30,
            payment_method: None,
        }
    }

    fn stat(key: &str, revenue: Cents) -> GroupStat {
        GroupStat {
            key: key.into(),
            label: key.into(),
            count: 1,
            completed_count: 1,
            cancelled_count: 0,
            total_revenue: revenue,
            average_value: revenue,
            completion_rate: 100.0,
            cancellation_rate: 0.0,
        }
    }

    #[test]
    fn test_zero_denominators() {
        let stat = GroupStat::from_entry(GroupEntry {
            key: "empty".into(),
            label: "empty".into(),
            totals: Default::default(),
        });
        assert_eq!(stat.average_value, 0);
        assert_eq!(stat.completion_rate, 0.0);
        assert_eq!(stat.cancellation_rate, 0.0);
    }

    #[test]
    fn test_average_rounds_to_cent() {
        assert_eq!(average_cents(1000, 3), 333);
        assert_eq!(average_cents(2000, 3), 667);
        assert_eq!(average_cents(500, 0), 0);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let ranked = rank(vec![stat("a", 100), stat("b", 300), stat("c", 100), stat("d", 300)]);
        let keys: Vec<&str> = ranked.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_top_n_with_fewer_groups() {
        let ranked = rank(vec![stat("a", 100), stat("b", 300)]);
        assert_eq!(top_n(ranked.clone(), 3).len(), 2);
        assert_eq!(top_n(ranked, 1)[0].key, "b");
    }

    #[test]
    fn test_rates_from_table() {
        let records = vec![
            visit("Ana", "2024-03-01", AppointmentStatus::Completed),
            visit("Ana", "2024-03-02", AppointmentStatus::Cancelled),
            visit("Ana", "2024-03-03", AppointmentStatus::Confirmed),
            visit("Ana", "2024-03-04", AppointmentStatus::Completed),
        ];
        let stats = group_by(&records, |a: &Appointment| Some(GroupKey::named(&a.client_name)))
            .into_stats();
        assert_eq!(stats[0].completion_rate, 50.0);
        assert_eq!(stats[0].cancellation_rate, 25.0);
        assert_eq!(stats[0].average_value, 5000);
    }

    #[test]
    fn test_new_clients_use_full_history() {
        let history = vec![
            visit("Ana", "2024-01-10", AppointmentStatus::Completed),
            visit("Ana", "2024-03-05", AppointmentStatus::Completed),
            visit("Bia", "2024-03-07", AppointmentStatus::Pending),
            visit("Caio", "2024-02-28", AppointmentStatus::Cancelled),
        ];
        let march = DateRange::between(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
        .resolve()
        .unwrap();

        let new = new_clients(&history, &march);
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].client_name, "Bia");
    }

    #[test]
    fn test_inactive_clients() {
        let history = vec![
            visit("Ana", "2024-01-10", AppointmentStatus::Completed),
            visit("Ana", "2024-03-05", AppointmentStatus::Completed),
            visit("Bia", "2024-02-01", AppointmentStatus::Completed),
            visit("Caio", "2024-02-04", AppointmentStatus::Completed),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let inactive = inactive_clients(&history, today, 30);
        let names: Vec<&str> = inactive.iter().map(|c| c.client_name.as_str()).collect();
        // Cutoff is 2024-02-04: Caio's visit on that day still counts as recent
        assert_eq!(names, vec!["Bia"]);
    }

    #[test]
    fn test_inactive_clients_with_huge_thresholds() {
        let history = vec![visit("Ana", "2024-01-10", AppointmentStatus::Completed)];
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        // The cutoff saturates at the first supported date: nobody is that old
        assert!(inactive_clients(&history, today, 1_000_000_000).is_empty());
        assert!(inactive_clients(&history, today, i64::MAX).is_empty());
        // A negative threshold moves the cutoff into the future
        assert_eq!(inactive_clients(&history, today, i64::MIN).len(), 1);
    }

    #[test]
    fn test_histories_track_bounds() {
        let history = vec![
            visit("Ana", "2024-03-05", AppointmentStatus::Completed),
            visit("Ana", "2024-01-10", AppointmentStatus::Completed),
            visit("Ana", "2024-02-10", AppointmentStatus::Cancelled),
        ];
        let histories = client_histories(&history);
        assert_eq!(histories.len(), 1);
        assert_eq!(histories[0].first_visit, at("2024-01-10"));
        assert_eq!(histories[0].last_visit, at("2024-03-05"));
        assert_eq!(histories[0].appointments, 3);
    }
}
