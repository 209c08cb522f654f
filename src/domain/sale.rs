use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, EmployeeId};

pub type SaleId = Uuid;

/// Where a sale is stored. The live partition only ever holds the current
/// day; closing the day moves its sales into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Live,
    Archived,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Live => "live",
            Partition::Archived => "archived",
        }
    }

    /// Backing table for this partition.
    pub fn table(&self) -> &'static str {
        match self {
            Partition::Live => "sales_live",
            Partition::Archived => "sales_archived",
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A completed service sale. Sales are immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    /// Full price charged to the client
    pub price: Amount,
    /// Share earned by the employee who did the service
    pub employee_amount: Amount,
    /// Share kept by the shop
    pub shop_amount: Amount,
    pub created_at: DateTime<Utc>,
    /// Employee who did the service; `None` when nobody was attributed
    pub employee_id: Option<EmployeeId>,
}

impl Sale {
    /// Create a sale splitting `price` between the employee and the shop.
    pub fn new(
        employee_id: Option<EmployeeId>,
        price: Amount,
        employee_amount: Amount,
        created_at: DateTime<Utc>,
    ) -> Self {
        assert!(
            (0..=price).contains(&employee_amount),
            "Employee amount must be between 0 and the price"
        );
        Self {
            id: Uuid::new_v4(),
            price,
            employee_amount,
            shop_amount: price - employee_amount,
            created_at,
            employee_id,
        }
    }
}
