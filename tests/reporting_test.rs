mod common;

use anyhow::Result;
use common::{Barbershop, at, day};
use salon_insights::application::{EngineConfig, ExpenseDimension};
use salon_insights::domain::{CalendarView, ClientId, DateRange};

fn march() -> DateRange {
    DateRange::between(day("2024-03-01"), day("2024-03-31"))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.01
}

#[test]
fn test_financial_report() -> Result<()> {
    let service = Barbershop::service();
    let report = service.financial_report(&march())?;

    assert_eq!(report.from_date, day("2024-03-01"));
    assert_eq!(report.to_date, day("2024-03-31"));
    assert_eq!(report.gross_revenue, 32000);
    assert_eq!(report.paid_expenses, 17000);
    assert_eq!(report.pending_expenses, 3000);
    assert_eq!(report.net_profit, 15000);
    assert!(close(report.profit_margin, 46.875));
    assert_eq!(report.average_ticket, 5333);

    assert_eq!(report.appointment_count, 9);
    assert_eq!(report.completed_count, 6);
    assert_eq!(report.cancelled_count, 2);
    assert!(close(report.completion_rate, 66.67));
    assert!(close(report.cancellation_rate, 22.22));

    Ok(())
}

#[test]
fn test_payment_method_shares() -> Result<()> {
    let service = Barbershop::service();
    let report = service.financial_report(&march())?;

    let shares: Vec<(&str, i64, i64)> = report
        .payment_methods
        .iter()
        .map(|s| (s.key.as_str(), s.count, s.total))
        .collect();
    assert_eq!(
        shares,
        vec![("pix", 3, 16000), ("credit", 2, 11000), ("cash", 1, 5000)]
    );
    assert!(close(report.payment_methods[0].percentage, 50.0));

    let total: f64 = report.payment_methods.iter().map(|s| s.percentage).sum();
    assert!(close(total, 100.0));

    Ok(())
}

#[test]
fn test_expense_category_shares() -> Result<()> {
    let service = Barbershop::service();
    let report = service.financial_report(&march())?;

    let categories: Vec<(&str, i64, i64)> = report
        .expense_categories
        .iter()
        .map(|s| (s.key.as_str(), s.total, s.settled))
        .collect();
    assert_eq!(
        categories,
        vec![
            ("rent", 15000, 15000),
            ("utilities", 3000, 0),
            ("supplies", 2000, 2000),
        ]
    );
    assert!(close(report.expense_categories[0].percentage, 75.0));
    assert!(close(report.expense_categories[1].percentage, 15.0));
    assert!(close(report.expense_categories[2].percentage, 10.0));

    Ok(())
}

#[test]
fn test_grouped_expenses_rank_by_paid_amount() -> Result<()> {
    let service = Barbershop::service();
    let stats = service.group_expenses(&march(), ExpenseDimension::Category)?;

    let ranked: Vec<(&str, i64)> = stats
        .iter()
        .map(|s| (s.key.as_str(), s.total_revenue))
        .collect();
    assert_eq!(
        ranked,
        vec![("rent", 15000), ("supplies", 2000), ("utilities", 0)]
    );

    Ok(())
}

#[test]
fn test_daily_series_covers_every_day() -> Result<()> {
    let service = Barbershop::service();
    let report = service.financial_report(&march())?;

    assert_eq!(report.daily.len(), 31);
    assert_eq!(report.daily[0].date, day("2024-03-01"));
    assert_eq!(report.daily[0].revenue, 16000);
    assert_eq!(report.daily[0].net, 16000);

    let fifth = &report.daily[4];
    assert_eq!(fifth.date, day("2024-03-05"));
    assert_eq!(fifth.revenue, 0);
    assert_eq!(fifth.expenses, 15000);
    assert_eq!(fifth.net, -15000);

    // Unpaid expenses stay out of the daily series
    let twenty_fifth = &report.daily[24];
    assert_eq!(twenty_fifth.expenses, 0);

    let revenue: i64 = report.daily.iter().map(|d| d.revenue).sum();
    assert_eq!(revenue, report.gross_revenue);

    Ok(())
}

#[test]
fn test_empty_window_report() -> Result<()> {
    let service = Barbershop::service();
    let range = DateRange::between(day("2023-06-01"), day("2023-06-07"));
    let report = service.financial_report(&range)?;

    assert_eq!(report.gross_revenue, 0);
    assert_eq!(report.profit_margin, 0.0);
    assert_eq!(report.average_ticket, 0);
    assert_eq!(report.completion_rate, 0.0);
    assert!(report.payment_methods.is_empty());
    assert_eq!(report.daily.len(), 7);

    Ok(())
}

#[test]
fn test_client_report() -> Result<()> {
    let service = Barbershop::service();
    let report = service.client_report(&march(), day("2024-03-31"), None)?;

    assert_eq!(report.active_clients, 4);

    let clients: Vec<(&str, i64, i64)> = report
        .clients
        .iter()
        .map(|c| (c.stat.label.as_str(), c.stat.count, c.stat.total_revenue))
        .collect();
    assert_eq!(
        clients,
        vec![
            ("Clara", 2, 16000),
            ("Ana", 3, 11000),
            ("Bruno", 2, 5000),
            ("Diego", 2, 0),
        ]
    );

    let favorites: Vec<Option<&str>> = report
        .clients
        .iter()
        .map(|c| c.favorite_service.as_deref())
        .collect();
    assert_eq!(
        favorites,
        vec![Some("Escova"), Some("Barba"), Some("Corte"), None]
    );

    assert_eq!(report.clients[1].last_visit, Some(at("2024-03-20 09:00")));
    assert_eq!(report.clients[3].last_visit, None);

    let bruno = &report.clients[2].stat;
    assert_eq!(bruno.completion_rate, 50.0);
    assert_eq!(bruno.cancellation_rate, 50.0);

    Ok(())
}

#[test]
fn test_new_and_inactive_clients() -> Result<()> {
    let service = Barbershop::service();
    let report = service.client_report(&march(), day("2024-03-31"), None)?;

    let new: Vec<&str> = report
        .new_clients
        .iter()
        .map(|c| c.client_name.as_str())
        .collect();
    assert_eq!(new, vec!["Clara", "Diego"]);

    let inactive: Vec<&str> = report
        .inactive_clients
        .iter()
        .map(|c| c.client_name.as_str())
        .collect();
    assert_eq!(inactive, vec!["Eduardo"]);
    assert_eq!(
        report.inactive_clients[0].client_id,
        ClientId::from_name("eduardo")
    );

    // A tighter threshold also flags Bruno, last seen on the 8th
    let strict = Barbershop::service().with_config(EngineConfig {
        inactive_after_days: 20,
        ..EngineConfig::default()
    });
    let report = strict.client_report(&march(), day("2024-03-31"), None)?;
    let inactive: Vec<&str> = report
        .inactive_clients
        .iter()
        .map(|c| c.client_name.as_str())
        .collect();
    assert_eq!(inactive, vec!["Bruno", "Eduardo"]);

    Ok(())
}

#[test]
fn test_client_report_top_limit() -> Result<()> {
    let service = Barbershop::service();
    let report = service.client_report(&march(), day("2024-03-31"), Some(2))?;

    assert_eq!(report.clients.len(), 2);
    // The active count is not affected by the limit
    assert_eq!(report.active_clients, 4);

    Ok(())
}

#[test]
fn test_professional_report() -> Result<()> {
    let service = Barbershop::service();
    let report = service.professional_report(&march(), None)?;

    let professionals: Vec<(&str, i64, i64, usize, i64)> = report
        .professionals
        .iter()
        .map(|p| {
            (
                p.stat.key.as_str(),
                p.stat.count,
                p.stat.total_revenue,
                p.unique_clients,
                p.booked_minutes,
            )
        })
        .collect();
    assert_eq!(
        professionals,
        vec![
            ("Marina", 2, 16000, 1, 120),
            ("Carlos", 4, 11000, 2, 70),
            ("Rafael", 3, 5000, 2, 50),
        ]
    );

    Ok(())
}

#[test]
fn test_service_report() -> Result<()> {
    let service = Barbershop::service();
    let report = service.service_report(&march(), None)?;

    let names: Vec<&str> = report.services.iter().map(|s| s.stat.key.as_str()).collect();
    assert_eq!(names, vec!["Escova", "Corte", "Barba"]);

    let escova = &report.services[0];
    assert_eq!(escova.stat.total_revenue, 16000);
    assert!(close(escova.revenue_share, 50.0));
    assert!(close(escova.average_duration_minutes, 60.0));

    let corte = &report.services[1];
    assert_eq!(corte.stat.count, 4);
    assert_eq!(corte.stat.completed_count, 2);
    assert_eq!(corte.stat.cancelled_count, 2);
    assert_eq!(corte.stat.total_revenue, 10000);
    assert!(close(corte.average_duration_minutes, 30.0));

    let barba = &report.services[2];
    assert_eq!(barba.stat.total_revenue, 6000);
    assert!(close(barba.average_duration_minutes, 20.0));

    let shares: f64 = report.services.iter().map(|s| s.revenue_share).sum();
    assert!(close(shares, 100.0));

    Ok(())
}

#[test]
fn test_compare_with_previous_period() -> Result<()> {
    let service = Barbershop::service();
    let range = DateRange::between(day("2024-03-16"), day("2024-03-31"));
    let comparison = service.compare_with_previous(&range)?;

    let current = &comparison.current_period;
    assert_eq!(current.period_start, day("2024-03-16"));
    assert_eq!(current.period_end, day("2024-03-31"));
    assert_eq!(current.revenue, 3000);
    assert_eq!(current.expenses, 0);
    assert_eq!(current.appointments, 2);

    let previous = &comparison.previous_period;
    assert_eq!(previous.period_start, day("2024-02-29"));
    assert_eq!(previous.period_end, day("2024-03-15"));
    assert_eq!(previous.revenue, 29000);
    assert_eq!(previous.expenses, 17000);
    assert_eq!(previous.net, 12000);
    assert_eq!(previous.appointments, 7);

    assert_eq!(comparison.revenue_change, -26000);
    assert!(close(comparison.revenue_change_percentage, -89.66));

    Ok(())
}

#[test]
fn test_calendar_counts() {
    let service = Barbershop::service();

    let month = service.calendar(CalendarView::Month, day("2024-03-15"));
    // Monday 2024-02-26 through Sunday 2024-03-31
    assert_eq!(month.len(), 35);
    assert_eq!(month[0].date, day("2024-02-26"));
    assert!(!month[0].in_view);

    let first = month
        .iter()
        .find(|cell| cell.date == day("2024-03-01"))
        .unwrap();
    assert!(first.in_view);
    assert_eq!(first.appointments, 3);

    let total: usize = month.iter().map(|cell| cell.appointments).sum();
    assert_eq!(total, 9);

    let year = service.calendar(CalendarView::Year, day("2024-03-15"));
    assert_eq!(year.len(), 12);
    assert_eq!(year[0].appointments, 3);
    assert_eq!(year[1].appointments, 0);
    assert_eq!(year[2].appointments, 9);
}

#[test]
fn test_report_serializes_to_json() -> Result<()> {
    let service = Barbershop::service();
    let report = service.client_report(&march(), day("2024-03-31"), Some(1))?;

    let json = serde_json::to_value(&report)?;
    let client = &json["clients"][0];
    // Group statistics are flattened into the client entry
    assert_eq!(client["label"], "Clara");
    assert_eq!(client["total_revenue"], 16000);
    assert_eq!(client["favorite_service"], "Escova");

    Ok(())
}
