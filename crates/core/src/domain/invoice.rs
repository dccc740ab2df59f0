use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{parse_status, PurchaseOrderId, RecordStatus};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvoiceId(pub String);

impl InvoiceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Processing,
    Paid,
}

impl RecordStatus for InvoiceStatus {
    const ALL: &'static [Self] = &[Self::Processing, Self::Paid];

    fn key(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Paid => "paid",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Paid => "Paid",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_status(value)
    }
}

/// Placeholder pay date written on freshly issued invoices.
pub const PENDING_PAY_DATE: &str = "Pending approval";

/// Billing record raised from a confirmed purchase order. `pay_date` is free
/// text: either an estimate or the actual settlement date.
///
/// Invoices are never advanced by the portal; `Paid` only appears on records
/// settled upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub purchase_order_id: PurchaseOrderId,
    pub amount: u64,
    pub status: InvoiceStatus,
    pub issued_on: NaiveDate,
    pub pay_date: String,
}

impl Invoice {
    pub fn is_settled(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}
