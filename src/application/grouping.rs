use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Appointment, AppointmentStatus, Cents, ClientId, Expense};

/// How a record counts toward its group's totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed appointment or paid expense: its amount is revenue
    Settled,
    Cancelled,
    Open,
}

/// A record the grouping reducers can fold.
pub trait Aggregatable {
    fn amount_cents(&self) -> Cents;
    fn outcome(&self) -> Outcome;
}

impl Aggregatable for Appointment {
    fn amount_cents(&self) -> Cents {
        self.price_cents
    }

    fn outcome(&self) -> Outcome {
        match self.status {
            AppointmentStatus::Completed => Outcome::Settled,
            AppointmentStatus::Cancelled => Outcome::Cancelled,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed => Outcome::Open,
        }
    }
}

impl Aggregatable for Expense {
    fn amount_cents(&self) -> Cents {
        self.amount_cents
    }

    fn outcome(&self) -> Outcome {
        if self.is_paid {
            Outcome::Settled
        } else {
            Outcome::Open
        }
    }
}

/// Running totals for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupAccumulator {
    pub count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    /// Sum of settled amounts only
    pub total_revenue: Cents,
    /// Sum of every amount in the group, whatever its outcome
    pub total_amount: Cents,
}

impl GroupAccumulator {
    pub fn add<T: Aggregatable + ?Sized>(&mut self, record: &T) {
        self.count += 1;
        self.total_amount = self.total_amount.saturating_add(record.amount_cents());
        match record.outcome() {
            Outcome::Settled => {
                self.completed_count += 1;
                self.total_revenue = self.total_revenue.saturating_add(record.amount_cents());
            }
            Outcome::Cancelled => self.cancelled_count += 1,
            Outcome::Open => {}
        }
    }
}

/// Grouping key plus the label shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    pub key: String,
    pub label: String,
}

impl GroupKey {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// A key that is also its own label.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            label: name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub key: String,
    /// Label of the first record seen for this key
    pub label: String,
    pub totals: GroupAccumulator,
}

/// Key -> accumulator mapping that remembers the order keys were first seen in.
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    index: HashMap<String, usize>,
    entries: Vec<GroupEntry>,
}

impl GroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<T: Aggregatable + ?Sized>(&mut self, key: GroupKey, record: &T) {
        let slot = match self.index.get(&key.key) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.index.insert(key.key.clone(), slot);
                self.entries.push(GroupEntry {
                    key: key.key,
                    label: key.label,
                    totals: GroupAccumulator::default(),
                });
                slot
            }
        };
        self.entries[slot].totals.add(record);
    }

    pub fn get(&self, key: &str) -> Option<&GroupEntry> {
        self.index.get(key).map(|&slot| &self.entries[slot])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<GroupEntry> {
        self.entries
    }

    /// Number of records folded into the table.
    pub fn record_count(&self) -> i64 {
        self.entries.iter().map(|e| e.totals.count).sum()
    }
}

/// Fold records left to right into per-key totals.
/// Records for which `key_of` returns `None` are skipped.
pub fn group_by<'a, T, I, F>(records: I, key_of: F) -> GroupTable
where
    T: Aggregatable + 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Option<GroupKey>,
{
    let mut table = GroupTable::new();
    for record in records {
        if let Some(key) = key_of(record) {
            table.add(key, record);
        }
    }
    table
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupDimension {
    Client,
    Professional,
    Service,
    PaymentMethod,
}

impl GroupDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupDimension::Client => "client",
            GroupDimension::Professional => "professional",
            GroupDimension::Service => "service",
            GroupDimension::PaymentMethod => "payment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "client" | "clients" => Some(GroupDimension::Client),
            "professional" | "professionals" => Some(GroupDimension::Professional),
            "service" | "services" => Some(GroupDimension::Service),
            "payment" | "payments" | "payment-method" => Some(GroupDimension::PaymentMethod),
            _ => None,
        }
    }

    pub fn key_of(&self, appointment: &Appointment) -> Option<GroupKey> {
        match self {
            GroupDimension::Client => Some(GroupKey::new(
                appointment.client_id.to_string(),
                appointment.client_name.clone(),
            )),
            GroupDimension::Professional => Some(GroupKey::named(appointment.professional.clone())),
            GroupDimension::Service => Some(GroupKey::named(appointment.service.clone())),
            GroupDimension::PaymentMethod => appointment
                .payment_method
                .map(|method| GroupKey::named(method.as_str())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseDimension {
    Category,
    PaymentMethod,
}

impl ExpenseDimension {
    pub fn key_of(&self, expense: &Expense) -> Option<GroupKey> {
        match self {
            ExpenseDimension::Category => Some(GroupKey::named(expense.category.as_str())),
            ExpenseDimension::PaymentMethod => expense
                .payment_method
                .map(|method| GroupKey::named(method.as_str())),
        }
    }
}

pub fn group_appointments<'a, I>(records: I, dimension: GroupDimension) -> GroupTable
where
    I: IntoIterator<Item = &'a Appointment>,
{
    group_by(records, |a: &Appointment| dimension.key_of(a))
}

pub fn group_expenses<'a, I>(records: I, dimension: ExpenseDimension) -> GroupTable
where
    I: IntoIterator<Item = &'a Expense>,
{
    group_by(records, |e: &Expense| dimension.key_of(e))
}

/// Each client's most completed service. A tie goes to the service the client
/// completed first.
pub fn favorite_services<'a, I>(records: I) -> HashMap<ClientId, String>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    let mut per_client: HashMap<ClientId, Vec<(&'a str, i64)>> = HashMap::new();

    for appointment in records.into_iter().filter(|a| a.is_completed()) {
        let services = per_client.entry(appointment.client_id).or_default();
        match services
            .iter_mut()
            .find(|(name, _)| *name == appointment.service)
        {
            Some((_, count)) => *count += 1,
            None => services.push((appointment.service.as_str(), 1)),
        }
    }

    per_client
        .into_iter()
        .filter_map(|(client, services)| {
            let mut best: Option<(&str, i64)> = None;
            for (name, count) in services {
                if best.is_none_or(|(_, best_count)| count > best_count) {
                    best = Some((name, count));
                }
            }
            best.map(|(name, _)| (client, name.to_string()))
        })
        .collect()
}
