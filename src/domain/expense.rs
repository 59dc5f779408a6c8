use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Cents, PaymentMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Rent,
    Utilities,
    Supplies,
    Salaries,
    Marketing,
    Maintenance,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Rent => "rent",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Supplies => "supplies",
            ExpenseCategory::Salaries => "salaries",
            ExpenseCategory::Marketing => "marketing",
            ExpenseCategory::Maintenance => "maintenance",
            ExpenseCategory::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rent" | "aluguel" => Some(ExpenseCategory::Rent),
            "utilities" | "contas" => Some(ExpenseCategory::Utilities),
            "supplies" | "produtos" => Some(ExpenseCategory::Supplies),
            "salaries" | "salarios" | "salários" => Some(ExpenseCategory::Salaries),
            "marketing" => Some(ExpenseCategory::Marketing),
            "maintenance" | "manutencao" | "manutenção" => Some(ExpenseCategory::Maintenance),
            "other" | "outros" => Some(ExpenseCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An operating cost of the business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount_cents: Cents,
    pub date: NaiveDateTime,
    pub payment_method: Option<PaymentMethod>,
    pub is_paid: bool,
    pub recurring: bool,
}
