use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

/// Namespace used to derive client identifiers from names when the source
/// does not supply one.
const CLIENT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b9e_4d3a_4c55_9a0e_51a7_c3d8_e201);

/// Stable identity of a client. The display name lives on the appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Derive a deterministic identifier from a client name.
    /// Names are compared trimmed and case-insensitively, so "Ana " and "ana" map to the same id.
    pub fn from_name(name: &str) -> Self {
        let canonical = name.trim().to_lowercase();
        ClientId(Uuid::new_v5(&CLIENT_NAMESPACE, canonical.as_bytes()))
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(ClientId)
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Pix,
    Credit,
    Debit,
    Cash,
    Boleto,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Pix,
        PaymentMethod::Credit,
        PaymentMethod::Debit,
        PaymentMethod::Cash,
        PaymentMethod::Boleto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Boleto => "boleto",
        }
    }

    /// Accepts the canonical names plus the Portuguese labels shown on receipts.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pix" => Some(PaymentMethod::Pix),
            "credit" | "credito" | "crédito" => Some(PaymentMethod::Credit),
            "debit" | "debito" | "débito" => Some(PaymentMethod::Debit),
            "cash" | "dinheiro" => Some(PaymentMethod::Cash),
            "boleto" => Some(PaymentMethod::Boleto),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled service for a client. Immutable once normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub client_id: ClientId,
    /// Display attribute only; grouping uses `client_id`.
    pub client_name: String,
    pub service: String,
    pub professional: String,
    /// Scheduled date and time in the business's local clock
    pub date: NaiveDateTime,
    pub price_cents: Cents,
    pub status: AppointmentStatus,
    pub duration_minutes: u32,
    /// Only ever set on completed appointments
    pub payment_method: Option<PaymentMethod>,
}

impl Appointment {
    /// "HH:MM" derived from `date`, so the two can never disagree.
    pub fn time(&self) -> String {
        format!("{:02}:{:02}", self.date.hour(), self.date.minute())
    }

    pub fn is_completed(&self) -> bool {
        self.status == AppointmentStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == AppointmentStatus::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            assert_eq!(AppointmentStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(AppointmentStatus::from_str("no-show"), None);
    }

    #[test]
    fn test_payment_method_aliases() {
        assert_eq!(PaymentMethod::from_str("Dinheiro"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::from_str("crédito"), Some(PaymentMethod::Credit));
        assert_eq!(PaymentMethod::from_str(" PIX "), Some(PaymentMethod::Pix));
        assert_eq!(PaymentMethod::from_str("paypal"), None);
    }

    #[test]
    fn test_client_id_from_name_is_stable() {
        assert_eq!(ClientId::from_name("Ana"), ClientId::from_name(" ana "));
        assert_ne!(ClientId::from_name("Ana"), ClientId::from_name("Ana Paula"));
    }

    #[test]
    fn test_time_follows_date() {
        let appointment = Appointment {
            id: "a1".into(),
            client_id: ClientId::from_name("Ana"),
            client_name: "Ana".into(),
            service: "Corte".into(),
            professional: "Carlos".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
            price_cents: 5000,
            status: AppointmentStatus::Pending,
            duration_minutes: 30,
            payment_method: None,
        };
        assert_eq!(appointment.time(), "09:05");
    }
}
