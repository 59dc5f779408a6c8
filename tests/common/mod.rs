// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use salon_insights::application::{AnalyticsService, RawAppointment, RawExpense, RawNumber};
use salon_insights::domain::{
    Appointment, AppointmentStatus, Cents, ClientId, Expense, ExpenseCategory, PaymentMethod,
};

/// Helper to parse a date string into NaiveDate
pub fn day(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to parse "YYYY-MM-DD HH:MM" into NaiveDateTime
pub fn at(datetime_str: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M").unwrap()
}

/// Builder for appointments in tests
pub struct AppointmentBuilder {
    appointment: Appointment,
}

impl AppointmentBuilder {
    pub fn new(id: &str, client: &str, date: &str) -> Self {
        Self {
            appointment: Appointment {
                id: id.into(),
                client_id: ClientId::from_name(client),
                client_name: client.into(),
                service: "Corte".into(),
                professional: "Carlos".into(),
                date: at(date),
                price_cents: 5000,
                status: AppointmentStatus::Confirmed,
                duration_minutes: 30,
                payment_method: None,
            },
        }
    }

    pub fn service(mut self, service: &str) -> Self {
        self.appointment.service = service.into();
        self
    }

    pub fn professional(mut self, professional: &str) -> Self {
        self.appointment.professional = professional.into();
        self
    }

    pub fn price(mut self, cents: Cents) -> Self {
        self.appointment.price_cents = cents;
        self
    }

    pub fn duration(mut self, minutes: u32) -> Self {
        self.appointment.duration_minutes = minutes;
        self
    }

    pub fn completed(mut self, method: PaymentMethod) -> Self {
        self.appointment.status = AppointmentStatus::Completed;
        self.appointment.payment_method = Some(method);
        self
    }

    pub fn status(mut self, status: AppointmentStatus) -> Self {
        self.appointment.status = status;
        self
    }

    pub fn build(self) -> Appointment {
        self.appointment
    }
}

pub fn expense(id: &str, category: ExpenseCategory, cents: Cents, date: &str, is_paid: bool) -> Expense {
    Expense {
        id: id.into(),
        description: format!("{} {}", category, id),
        category,
        amount_cents: cents,
        date: at(date),
        payment_method: is_paid.then_some(PaymentMethod::Boleto),
        is_paid,
        recurring: false,
    }
}

/// A raw appointment with every field valid.
pub fn raw_appointment(id: &str, client: &str, date: &str, status: &str) -> RawAppointment {
    RawAppointment {
        id: Some(id.into()),
        client_id: None,
        client_name: Some(client.into()),
        service: Some("Corte".into()),
        professional: Some("Carlos".into()),
        date: Some(date.into()),
        time: None,
        price: Some(RawNumber::Number(50.0)),
        status: Some(status.into()),
        duration: Some(RawNumber::Number(30.0)),
        payment_method: (status == "completed").then(|| "pix".to_string()),
    }
}

pub fn raw_expense(id: &str, category: &str, amount: f64, date: &str) -> RawExpense {
    RawExpense {
        id: Some(id.into()),
        description: Some(format!("{} {}", category, id)),
        category: Some(category.into()),
        amount: Some(RawNumber::Number(amount)),
        date: Some(date.into()),
        payment_method: None,
        is_paid: Some(true),
        recurring: Some(false),
    }
}

/// Test fixture: a month of activity at a small barbershop.
///
/// March 2024, three professionals. Ana and Bruno are regulars since
/// January; Clara and Diego show up for the first time in March. Eduardo last came
/// in January.
pub struct Barbershop;

impl Barbershop {
    pub fn appointments() -> Vec<Appointment> {
        use AppointmentStatus::*;
        use PaymentMethod::*;

        vec![
            AppointmentBuilder::new("h1", "Ana", "2024-01-10 10:00").completed(Pix).build(),
            AppointmentBuilder::new("h2", "Bruno", "2024-01-15 11:00").completed(Cash).build(),
            AppointmentBuilder::new("h3", "Eduardo", "2024-01-20 09:00").completed(Debit).build(),
            AppointmentBuilder::new("m1", "Ana", "2024-03-01 09:00")
                .completed(Pix)
                .build(),
            AppointmentBuilder::new("m2", "Ana", "2024-03-01 14:00")
                .service("Barba")
                .price(3000)
                .duration(20)
                .completed(Credit)
                .build(),
            AppointmentBuilder::new("m3", "Clara", "2024-03-01 16:00")
                .service("Escova")
                .professional("Marina")
                .price(8000)
                .duration(60)
                .completed(Credit)
                .build(),
            AppointmentBuilder::new("m4", "Bruno", "2024-03-05 10:00")
                .status(Cancelled)
                .build(),
            AppointmentBuilder::new("m5", "Bruno", "2024-03-08 10:00")
                .professional("Rafael")
                .completed(Cash)
                .build(),
            AppointmentBuilder::new("m6", "Diego", "2024-03-12 17:00")
                .service("Barba")
                .professional("Rafael")
                .price(3000)
                .duration(20)
                .status(Pending)
                .build(),
            AppointmentBuilder::new("m7", "Clara", "2024-03-15 15:00")
                .service("Escova")
                .professional("Marina")
                .price(8000)
                .duration(60)
                .completed(Pix)
                .build(),
            AppointmentBuilder::new("m8", "Ana", "2024-03-20 09:00")
                .service("Barba")
                .price(3000)
                .duration(20)
                .completed(Pix)
                .build(),
            AppointmentBuilder::new("m9", "Diego", "2024-03-28 18:00")
                .professional("Rafael")
                .status(Cancelled)
                .build(),
        ]
    }

    pub fn expenses() -> Vec<Expense> {
        vec![
            expense("e1", ExpenseCategory::Rent, 15000, "2024-03-05 00:00", true),
            expense("e2", ExpenseCategory::Supplies, 2000, "2024-03-10 00:00", true),
            expense("e3", ExpenseCategory::Utilities, 3000, "2024-03-25 00:00", false),
            expense("e4", ExpenseCategory::Supplies, 1000, "2024-02-10 00:00", true),
        ]
    }

    pub fn service() -> AnalyticsService {
        AnalyticsService::new(Self::appointments(), Self::expenses())
    }
}
