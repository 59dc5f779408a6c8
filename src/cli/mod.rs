use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;

use crate::application::{
    AnalyticsService, EngineConfig, ExpenseDimension, GroupDimension, GroupStat, ShareSummary,
};
use crate::domain::{CalendarView, DateRange, format_cents};
use crate::io::{
    ImportError, export_daily_csv, export_group_stats_csv, export_json, export_shares_csv,
    load_appointments, load_expenses,
};

/// Salon Insights - booking analytics
#[derive(Parser)]
#[command(name = "salon-insights")]
#[command(about = "Appointment and expense analytics for barbershops, salons and spas")]
#[command(version)]
pub struct Cli {
    /// Appointments file (.csv or .json)
    #[arg(short, long, env = "SALON_APPOINTMENTS", global = true)]
    pub appointments: Option<PathBuf>,

    /// Expenses file (.csv or .json)
    #[arg(short, long, env = "SALON_EXPENSES", global = true)]
    pub expenses: Option<PathBuf>,

    /// Days without an appointment before a client counts as inactive (0 to 36500)
    #[arg(
        long,
        default_value_t = 30,
        global = true,
        value_parser = clap::value_parser!(i64).range(0..=36500)
    )]
    pub inactive_days: i64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the input files and list every record that would be skipped
    Validate,

    /// Generate reports and rankings
    #[command(subcommand)]
    Report(ReportCommands),

    /// Compare revenue with the previous period of the same length
    Compare {
        #[command(flatten)]
        range: RangeArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = SummaryFormat::Table)]
        format: SummaryFormat,
    },

    /// Appointments per day on a calendar grid
    Calendar {
        /// View: week, month, year
        #[arg(long, default_value = "month", value_parser = ["week", "month", "year"])]
        view: String,

        /// Day to center the view on (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = SummaryFormat::Table)]
        format: SummaryFormat,
    },
}

#[derive(Args, Clone)]
pub struct RangeArgs {
    /// Start date (YYYY-MM-DD, defaults to start of current month)
    #[arg(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD, defaults to the start date; needs --from)
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// Formats for outputs that have no tabular CSV shape
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryFormat {
    Table,
    Json,
}

/// Financial report series written as CSV
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Breakdown {
    /// Revenue, expenses and net per day
    Daily,
    /// Revenue share per payment method
    Payments,
    /// Expense share per category
    Categories,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Revenue, expenses and profit
    Financial {
        #[command(flatten)]
        range: RangeArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Which series to write with --format csv
        #[arg(long, value_enum, default_value_t = Breakdown::Daily)]
        breakdown: Breakdown,
    },

    /// Client ranking with new and inactive clients
    Clients {
        #[command(flatten)]
        range: RangeArgs,

        /// Number of clients to list
        #[arg(long)]
        top: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Professional ranking
    Professionals {
        #[command(flatten)]
        range: RangeArgs,

        /// Number of professionals to list
        #[arg(long)]
        top: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Service ranking
    Services {
        #[command(flatten)]
        range: RangeArgs,

        /// Number of services to list
        #[arg(long)]
        top: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Revenue by payment method
    Payments {
        #[command(flatten)]
        range: RangeArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Expenses by category
    Expenses {
        #[command(flatten)]
        range: RangeArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

/// Install the log subscriber. `RUST_LOG` wins over `--verbose`.
/// Logs go to stderr so report output stays clean.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Records loaded from the input files plus everything that was skipped.
struct Loaded {
    service: AnalyticsService,
    appointment_errors: Vec<ImportError>,
    expense_errors: Vec<ImportError>,
    appointment_total: usize,
    expense_total: usize,
}

impl Cli {
    fn load(&self) -> Result<Loaded> {
        let appointments_path = self
            .appointments
            .as_ref()
            .context("No appointments file given (use --appointments or SALON_APPOINTMENTS)")?;
        let appointments = load_appointments(appointments_path)?;

        let (expenses, expense_errors, expense_total) = match &self.expenses {
            Some(path) => {
                let result = load_expenses(path)?;
                (result.records, result.errors, result.total)
            }
            None => (Vec::new(), Vec::new(), 0),
        };

        let service = AnalyticsService::new(appointments.records, expenses).with_config(
            EngineConfig {
                inactive_after_days: self.inactive_days,
                ..EngineConfig::default()
            },
        );

        Ok(Loaded {
            service,
            appointment_errors: appointments.errors,
            expense_errors,
            appointment_total: appointments.total,
            expense_total,
        })
    }

    pub fn run(self) -> Result<()> {
        let loaded = self.load()?;
        let skipped = loaded.appointment_errors.len() + loaded.expense_errors.len();
        if skipped > 0 && !matches!(self.command, Commands::Validate) {
            eprintln!(
                "Warning: {} records skipped due to invalid data (run `validate` for details)",
                skipped
            );
        }

        let today = Local::now().date_naive();

        match self.command {
            Commands::Validate => run_validate_command(&loaded),
            Commands::Report(report_cmd) => {
                run_report_command(&loaded.service, report_cmd, today)
            }
            Commands::Compare { range, format } => {
                run_compare_command(&loaded.service, &range, format, today)
            }
            Commands::Calendar { view, date, format } => {
                run_calendar_command(&loaded.service, &view, date, format, today)
            }
        }
    }
}

fn run_validate_command(loaded: &Loaded) -> Result<()> {
    print_import_errors(
        "Appointments",
        loaded.appointment_total,
        &loaded.appointment_errors,
    );
    if loaded.expense_total > 0 || !loaded.expense_errors.is_empty() {
        println!();
        print_import_errors("Expenses", loaded.expense_total, &loaded.expense_errors);
    }

    let skipped = loaded.appointment_errors.len() + loaded.expense_errors.len();
    if skipped > 0 {
        anyhow::bail!("{} invalid records found", skipped);
    }
    Ok(())
}

fn print_import_errors(title: &str, total: usize, errors: &[ImportError]) {
    println!(
        "{}: {} read, {} valid, {} skipped",
        title,
        total,
        total.saturating_sub(errors.len()),
        errors.len()
    );
    if errors.is_empty() {
        return;
    }

    println!();
    println!("{:<6} {:<15} {}", "LINE", "FIELD", "ERROR");
    println!("{}", "-".repeat(70));
    for error in errors {
        println!(
            "{:<6} {:<15} {}",
            error.line,
            truncate(error.field.as_deref().unwrap_or("-"), 15),
            error.error
        );
    }
}

fn run_report_command(
    service: &AnalyticsService,
    cmd: ReportCommands,
    today: NaiveDate,
) -> Result<()> {
    match cmd {
        ReportCommands::Financial {
            range,
            format,
            breakdown,
        } => {
            let range = parse_date_range(&range, today)?;
            let report = service.financial_report(&range)?;

            match format {
                OutputFormat::Json => export_json(io::stdout(), &report)?,
                OutputFormat::Csv => {
                    match breakdown {
                        Breakdown::Daily => export_daily_csv(io::stdout(), &report.daily)?,
                        Breakdown::Payments => {
                            export_shares_csv(io::stdout(), &report.payment_methods)?
                        }
                        Breakdown::Categories => {
                            export_shares_csv(io::stdout(), &report.expense_categories)?
                        }
                    };
                }
                OutputFormat::Table => {
                    // Table format
                    println!("Financial Report");
                    println!(
                        "Period: {} to {}",
                        report.from_date.format("%Y-%m-%d"),
                        report.to_date.format("%Y-%m-%d")
                    );
                    println!();
                    println!("{:<25} {:>15}", "Gross revenue", format_cents(report.gross_revenue));
                    println!("{:<25} {:>15}", "Paid expenses", format_cents(report.paid_expenses));
                    println!(
                        "{:<25} {:>15}",
                        "Pending expenses",
                        format_cents(report.pending_expenses)
                    );
                    println!("{}", "=".repeat(41));
                    println!(
                        "{:<25} {:>15} ({:.1}%)",
                        "Net profit",
                        format_cents(report.net_profit),
                        report.profit_margin
                    );
                    println!();
                    println!(
                        "{:<25} {:>15}",
                        "Average ticket",
                        format_cents(report.average_ticket)
                    );
                    println!(
                        "{:<25} {:>15}",
                        "Appointments", report.appointment_count
                    );
                    println!(
                        "{:<25} {:>15}",
                        "Completed",
                        format!("{} ({:.1}%)", report.completed_count, report.completion_rate)
                    );
                    println!(
                        "{:<25} {:>15}",
                        "Cancelled",
                        format!("{} ({:.1}%)", report.cancelled_count, report.cancellation_rate)
                    );

                    if !report.payment_methods.is_empty() {
                        println!();
                        println!("Revenue by payment method:");
                        print_shares(&report.payment_methods);
                    }
                    if !report.expense_categories.is_empty() {
                        println!();
                        println!("Expenses by category:");
                        print_shares(&report.expense_categories);
                    }
                }
            }
        }

        ReportCommands::Clients { range, top, format } => {
            let range = parse_date_range(&range, today)?;
            let report = service.client_report(&range, today, top)?;

            match format {
                OutputFormat::Json => export_json(io::stdout(), &report)?,
                OutputFormat::Csv => {
                    let stats: Vec<GroupStat> =
                        report.clients.iter().map(|c| c.stat.clone()).collect();
                    export_group_stats_csv(io::stdout(), &stats)?;
                }
                OutputFormat::Table => {
                    println!("Client Report");
                    println!(
                        "Period: {} to {}",
                        report.from_date.format("%Y-%m-%d"),
                        report.to_date.format("%Y-%m-%d")
                    );
                    println!(
                        "Active: {}   New: {}   Inactive (>{} days): {}",
                        report.active_clients,
                        report.new_clients.len(),
                        service.config().inactive_after_days,
                        report.inactive_clients.len()
                    );
                    println!();
                    println!(
                        "{:<4} {:<20} {:>6} {:>12} {:>10} {:<15} {:<10}",
                        "#", "CLIENT", "VISITS", "REVENUE", "AVG", "FAVORITE", "LAST VISIT"
                    );
                    println!("{}", "-".repeat(83));
                    for (position, client) in report.clients.iter().enumerate() {
                        println!(
                            "{:<4} {:<20} {:>6} {:>12} {:>10} {:<15} {:<10}",
                            position + 1,
                            truncate(&client.stat.label, 20),
                            client.stat.count,
                            format_cents(client.stat.total_revenue),
                            format_cents(client.stat.average_value),
                            truncate(client.favorite_service.as_deref().unwrap_or("-"), 15),
                            client
                                .last_visit
                                .map(|d| d.format("%Y-%m-%d").to_string())
                                .unwrap_or_else(|| "-".to_string())
                        );
                    }

                    if !report.inactive_clients.is_empty() {
                        println!();
                        println!("Inactive clients:");
                        for client in &report.inactive_clients {
                            println!(
                                "  {:<25} last visit {}",
                                truncate(&client.client_name, 25),
                                client.last_visit.format("%Y-%m-%d")
                            );
                        }
                    }
                }
            }
        }

        ReportCommands::Professionals { range, top, format } => {
            let range = parse_date_range(&range, today)?;
            let report = service.professional_report(&range, top)?;

            match format {
                OutputFormat::Json => export_json(io::stdout(), &report)?,
                OutputFormat::Csv => {
                    let stats: Vec<GroupStat> =
                        report.professionals.iter().map(|p| p.stat.clone()).collect();
                    export_group_stats_csv(io::stdout(), &stats)?;
                }
                OutputFormat::Table => {
                    println!("Professional Report");
                    println!();
                    println!(
                        "{:<4} {:<20} {:>6} {:>8} {:>12} {:>8} {:>8}",
                        "#", "PROFESSIONAL", "APPTS", "CLIENTS", "REVENUE", "DONE%", "MINUTES"
                    );
                    println!("{}", "-".repeat(72));
                    for (position, professional) in report.professionals.iter().enumerate() {
                        println!(
                            "{:<4} {:<20} {:>6} {:>8} {:>12} {:>7.1}% {:>8}",
                            position + 1,
                            truncate(&professional.stat.label, 20),
                            professional.stat.count,
                            professional.unique_clients,
                            format_cents(professional.stat.total_revenue),
                            professional.stat.completion_rate,
                            professional.booked_minutes
                        );
                    }
                }
            }
        }

        ReportCommands::Services { range, top, format } => {
            let range = parse_date_range(&range, today)?;
            let report = service.service_report(&range, top)?;

            match format {
                OutputFormat::Json => export_json(io::stdout(), &report)?,
                OutputFormat::Csv => {
                    let stats: Vec<GroupStat> =
                        report.services.iter().map(|s| s.stat.clone()).collect();
                    export_group_stats_csv(io::stdout(), &stats)?;
                }
                OutputFormat::Table => {
                    println!("Service Report");
                    println!();
                    println!(
                        "{:<4} {:<20} {:>6} {:>12} {:>8} {:>8} {:>8}",
                        "#", "SERVICE", "APPTS", "REVENUE", "SHARE", "AVG MIN", "CANCEL%"
                    );
                    println!("{}", "-".repeat(72));
                    for (position, entry) in report.services.iter().enumerate() {
                        println!(
                            "{:<4} {:<20} {:>6} {:>12} {:>7.1}% {:>8.0} {:>7.1}%",
                            position + 1,
                            truncate(&entry.stat.label, 20),
                            entry.stat.count,
                            format_cents(entry.stat.total_revenue),
                            entry.revenue_share,
                            entry.average_duration_minutes,
                            entry.stat.cancellation_rate
                        );
                    }
                }
            }
        }

        ReportCommands::Payments { range, format } => {
            let range = parse_date_range(&range, today)?;
            let stats = service.group_appointments(&range, GroupDimension::PaymentMethod)?;
            print_group_stats("Revenue by payment method", "METHOD", &stats, format)?;
        }

        ReportCommands::Expenses { range, format } => {
            let range = parse_date_range(&range, today)?;
            let stats = service.group_expenses(&range, ExpenseDimension::Category)?;
            print_group_stats("Paid expenses by category", "CATEGORY", &stats, format)?;
        }
    }

    Ok(())
}

fn print_group_stats(
    title: &str,
    column: &str,
    stats: &[GroupStat],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => export_json(io::stdout(), &stats)?,
        OutputFormat::Csv => {
            export_group_stats_csv(io::stdout(), stats)?;
        }
        OutputFormat::Table => {
            println!("{}", title);
            println!();
            println!("{:<20} {:>8} {:>8} {:>12} {:>10}", column, "COUNT", "SETTLED", "TOTAL", "AVG");
            println!("{}", "-".repeat(62));
            for stat in stats {
                println!(
                    "{:<20} {:>8} {:>8} {:>12} {:>10}",
                    truncate(&stat.label, 20),
                    stat.count,
                    stat.completed_count,
                    format_cents(stat.total_revenue),
                    format_cents(stat.average_value)
                );
            }
        }
    }
    Ok(())
}

fn print_shares(shares: &[ShareSummary]) {
    for share in shares {
        println!(
            "  {:<23} {:>15} ({:.1}%)",
            truncate(&share.key, 23),
            format_cents(share.total),
            share.percentage
        );
    }
}

fn run_compare_command(
    service: &AnalyticsService,
    range: &RangeArgs,
    format: SummaryFormat,
    today: NaiveDate,
) -> Result<()> {
    let range = parse_date_range(range, today)?;
    let report = service.compare_with_previous(&range)?;

    if format == SummaryFormat::Json {
        return export_json(io::stdout(), &report);
    }

    println!("Period Comparison Report");
    println!();
    for (title, period) in [
        ("Current Period", &report.current_period),
        ("Previous Period", &report.previous_period),
    ] {
        println!(
            "{}: {} to {}",
            title,
            period.period_start.format("%Y-%m-%d"),
            period.period_end.format("%Y-%m-%d")
        );
        println!("  Revenue:  {:>15}", format_cents(period.revenue));
        println!("  Expenses: {:>15}", format_cents(period.expenses));
        println!("  Net:      {:>15}", format_cents(period.net));
        println!("  Appts:    {:>15}", period.appointments);
        println!();
    }
    println!("{}", "=".repeat(44));
    println!(
        "Change:   {:>15} ({:+.1}%)",
        format_cents(report.revenue_change),
        report.revenue_change_percentage
    );
    Ok(())
}

fn run_calendar_command(
    service: &AnalyticsService,
    view: &str,
    date: Option<String>,
    format: SummaryFormat,
    today: NaiveDate,
) -> Result<()> {
    let view = CalendarView::from_str(view).with_context(|| {
        format!("Invalid view '{}'. Valid: week, month, year", view)
    })?;
    let anchor = match date {
        Some(date_str) => parse_date(&date_str)?,
        None => today,
    };
    let cells = service.calendar(view, anchor);

    if format == SummaryFormat::Json {
        return export_json(io::stdout(), &cells);
    }

    match view {
        CalendarView::Year => {
            println!("{}", anchor.format("%Y"));
            println!();
            for cell in &cells {
                println!("  {:<10} {:>5}", cell.date.format("%B"), cell.appointments);
            }
        }
        CalendarView::Week | CalendarView::Month => {
            println!("{}", anchor.format("%B %Y"));
            println!();
            println!(
                "{}",
                ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
                    .map(|d| format!("{:>8}", d))
                    .join("")
            );
            for week in cells.chunks(7) {
                let line: String = week
                    .iter()
                    .map(|cell| {
                        if !cell.in_view {
                            format!("{:>8}", ".")
                        } else if cell.appointments == 0 {
                            format!("{:>8}", cell.date.format("%d").to_string())
                        } else {
                            format!(
                                "{:>8}",
                                format!("{}({})", cell.date.format("%d"), cell.appointments)
                            )
                        }
                    })
                    .collect();
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// Resolve the command-line range. Without `--from` the range defaults to month to date.
fn parse_date_range(args: &RangeArgs, today: NaiveDate) -> Result<DateRange> {
    let from = args.from.as_deref().map(parse_date).transpose()?;
    let to = args.to.as_deref().map(parse_date).transpose()?;

    if from.is_none() && to.is_some() {
        anyhow::bail!("--to requires --from");
    }

    Ok(DateRange::new(from, to).or_default(DateRange::month_to_date(today)))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").with_context(|| {
        format!(
            "Invalid date format '{}'. Use YYYY-MM-DD (e.g., 2024-03-01)",
            date_str
        )
    })
}
