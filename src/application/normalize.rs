use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Appointment, AppointmentStatus, Cents, ClientId, Expense, ExpenseCategory, PaymentMethod,
    MAX_RECORD_CENTS, cents_from_f64, format_cents, parse_cents,
};

use super::ValidationError;

/// A number as it arrives from the outside: JSON numbers or text from CSV cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Number(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        RawNumber::Text(value.to_string())
    }
}

/// Appointment exactly as supplied by the data source, nothing validated yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAppointment {
    pub id: Option<String>,
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub service: Option<String>,
    pub professional: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub price: Option<RawNumber>,
    pub status: Option<String>,
    pub duration: Option<RawNumber>,
    pub payment_method: Option<String>,
}

/// Expense exactly as supplied by the data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawExpense {
    pub id: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<RawNumber>,
    pub date: Option<String>,
    pub payment_method: Option<String>,
    pub is_paid: Option<bool>,
    pub recurring: Option<bool>,
}

/// A record that did not survive normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    /// Zero-based position in the input batch
    pub position: usize,
    pub id: Option<String>,
    pub error: ValidationError,
}

/// Partial-failure report returned next to the valid records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    pub rejected: Vec<RejectedRecord>,
}

impl ValidationReport {
    pub fn accepted(&self) -> usize {
        self.total - self.rejected.len()
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} records skipped due to invalid data",
            self.rejected.len(),
            self.total
        )
    }
}

/// Valid records plus the report of everything that was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub report: ValidationReport,
}

pub fn normalize_appointments(raws: Vec<RawAppointment>) -> Normalized<Appointment> {
    normalize_batch(raws, "appointment", |raw| raw.id.clone(), normalize_appointment)
}

pub fn normalize_expenses(raws: Vec<RawExpense>) -> Normalized<Expense> {
    normalize_batch(raws, "expense", |raw| raw.id.clone(), normalize_expense)
}

fn normalize_batch<R, T>(
    raws: Vec<R>,
    kind: &str,
    id_of: impl Fn(&R) -> Option<String>,
    normalize: impl Fn(R) -> Result<T, ValidationError>,
) -> Normalized<T> {
    let total = raws.len();
    let mut records = Vec::with_capacity(total);
    let mut rejected = Vec::new();

    for (position, raw) in raws.into_iter().enumerate() {
        let id = id_of(&raw);
        match normalize(raw) {
            Ok(record) => records.push(record),
            Err(error) => {
                tracing::warn!(position, id = ?id, "skipping invalid {kind}: {error}");
                rejected.push(RejectedRecord {
                    position,
                    id,
                    error,
                });
            }
        }
    }

    tracing::debug!(
        total,
        accepted = records.len(),
        rejected = rejected.len(),
        "normalized {kind} batch"
    );

    Normalized {
        records,
        report: ValidationReport { total, rejected },
    }
}

/// Validate one raw appointment and convert it into its canonical form.
pub fn normalize_appointment(raw: RawAppointment) -> Result<Appointment, ValidationError> {
    let id = required_text(raw.id, "id")?;
    let client_name = required_text(raw.client_name, "clientName")?;
    let service = required_text(raw.service, "service")?;
    let professional = required_text(raw.professional, "professional")?;
    let date_str = required_text(raw.date, "date")?;
    let date = parse_record_date(&date_str, optional_text(raw.time).as_deref())?;
    let price_cents = positive_cents(raw.price, "price")?;

    let status_str = required_text(raw.status, "status")?;
    let status =
        AppointmentStatus::from_str(&status_str).ok_or(ValidationError::InvalidValue {
            field: "status",
            value: status_str,
        })?;

    let duration_minutes = positive_minutes(raw.duration)?;

    let payment_method = optional_payment_method(raw.payment_method)?;
    if payment_method.is_some() && status != AppointmentStatus::Completed {
        return Err(ValidationError::UnexpectedPaymentMethod { status });
    }

    let client_id = match optional_text(raw.client_id) {
        Some(value) => ClientId::parse(&value).ok_or(ValidationError::InvalidValue {
            field: "clientId",
            value,
        })?,
        None => ClientId::from_name(&client_name),
    };

    Ok(Appointment {
        id,
        client_id,
        client_name,
        service,
        professional,
        date,
        price_cents,
        status,
        duration_minutes,
        payment_method,
    })
}

/// Validate one raw expense and convert it into its canonical form.
pub fn normalize_expense(raw: RawExpense) -> Result<Expense, ValidationError> {
    let id = required_text(raw.id, "id")?;
    let description = required_text(raw.description, "description")?;

    let category_str = required_text(raw.category, "category")?;
    let category =
        ExpenseCategory::from_str(&category_str).ok_or(ValidationError::InvalidValue {
            field: "category",
            value: category_str,
        })?;

    let amount_cents = positive_cents(raw.amount, "amount")?;
    let date_str = required_text(raw.date, "date")?;
    let date = parse_record_date(&date_str, None)?;
    let payment_method = optional_payment_method(raw.payment_method)?;

    Ok(Expense {
        id,
        description,
        category,
        amount_cents,
        date,
        payment_method,
        is_paid: raw.is_paid.unwrap_or(false),
        recurring: raw.recurring.unwrap_or(false),
    })
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    optional_text(value).ok_or(ValidationError::MissingField { field })
}

fn optional_payment_method(
    value: Option<String>,
) -> Result<Option<PaymentMethod>, ValidationError> {
    optional_text(value)
        .map(|s| {
            PaymentMethod::from_str(&s).ok_or(ValidationError::InvalidValue {
                field: "paymentMethod",
                value: s,
            })
        })
        .transpose()
}

fn positive_cents(value: Option<RawNumber>, field: &'static str) -> Result<Cents, ValidationError> {
    let cents = match value {
        None => return Err(ValidationError::MissingField { field }),
        Some(RawNumber::Number(n)) => cents_from_f64(n).map_err(|_| {
            ValidationError::InvalidValue {
                field,
                value: n.to_string(),
            }
        })?,
        Some(RawNumber::Text(text)) => {
            if text.trim().is_empty() {
                return Err(ValidationError::MissingField { field });
            }
            parse_cents(&text).map_err(|_| ValidationError::InvalidValue {
                field,
                value: text.clone(),
            })?
        }
    };

    if cents <= 0 {
        return Err(ValidationError::NotPositive {
            field,
            value: cents.to_string(),
        });
    }
    if cents > MAX_RECORD_CENTS {
        return Err(ValidationError::TooLarge {
            field,
            value: format_cents(cents),
        });
    }
    Ok(cents)
}

fn positive_minutes(value: Option<RawNumber>) -> Result<u32, ValidationError> {
    let field = "duration";
    let minutes: i64 = match value {
        None => return Err(ValidationError::MissingField { field }),
        Some(RawNumber::Number(n)) => {
            if !n.is_finite() || n.fract() != 0.0 || n.abs() > f64::from(u32::MAX) {
                return Err(ValidationError::InvalidValue {
                    field,
                    value: n.to_string(),
                });
            }
            n as i64
        }
        Some(RawNumber::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::MissingField { field });
            }
            trimmed.parse().map_err(|_| ValidationError::InvalidValue {
                field,
                value: text.clone(),
            })?
        }
    };

    if minutes <= 0 {
        return Err(ValidationError::NotPositive {
            field,
            value: minutes.to_string(),
        });
    }
    u32::try_from(minutes).map_err(|_| ValidationError::InvalidValue {
        field,
        value: minutes.to_string(),
    })
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a record date, merging in the separate "HH:MM" field when present.
/// Timestamps keep the wall-clock time they were written with.
pub fn parse_record_date(date: &str, time: Option<&str>) -> Result<NaiveDateTime, ValidationError> {
    let time = time
        .map(|t| {
            NaiveTime::parse_from_str(t, "%H:%M").map_err(|_| ValidationError::InvalidValue {
                field: "time",
                value: t.to_string(),
            })
        })
        .transpose()?;

    let timestamp = DateTime::parse_from_rfc3339(date)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(date, format).ok())
        });

    if let Some(timestamp) = timestamp {
        if let Some(time) = time {
            if timestamp.hour() != time.hour() || timestamp.minute() != time.minute() {
                return Err(ValidationError::TimeMismatch {
                    date: date.to_string(),
                    time: time.format("%H:%M").to_string(),
                });
            }
        }
        return Ok(timestamp);
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;
    Ok(day.and_time(time.unwrap_or(NaiveTime::MIN)))
}
