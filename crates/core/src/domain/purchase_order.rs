use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{parse_status, AgreementId, RecordStatus};
use crate::errors::{DomainError, EntityKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PurchaseOrderId(pub String);

impl PurchaseOrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    New,
    Confirmed,
    Completed,
}

impl RecordStatus for PurchaseOrderStatus {
    const ALL: &'static [Self] = &[Self::New, Self::Confirmed, Self::Completed];

    fn key(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
        }
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_status(value)
    }
}

/// Delivery stepper shown beside each order row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Released,
    VendorConfirmed,
    GoodsReceived,
    ReadyForPayment,
}

impl WorkflowStep {
    pub const ALL: [Self; 4] =
        [Self::Released, Self::VendorConfirmed, Self::GoodsReceived, Self::ReadyForPayment];

    pub fn label(self) -> &'static str {
        match self {
            Self::Released => "PO Released",
            Self::VendorConfirmed => "Vendor Confirmed",
            Self::GoodsReceived => "Goods Received",
            Self::ReadyForPayment => "Ready for Payment",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A delivery request issued under an agreement. The agreement reference is
/// informational; nothing checks that it resolves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub agreement_id: AgreementId,
    pub item: String,
    pub amount: u64,
    pub status: PurchaseOrderStatus,
    pub issued_on: NaiveDate,
}

impl PurchaseOrder {
    pub fn can_transition_to(&self, next: PurchaseOrderStatus) -> bool {
        matches!(
            (self.status, next),
            (PurchaseOrderStatus::New, PurchaseOrderStatus::Confirmed)
                | (PurchaseOrderStatus::Confirmed, PurchaseOrderStatus::Completed)
        )
    }

    pub fn transition_to(&mut self, next: PurchaseOrderStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidTransition {
            entity: EntityKind::PurchaseOrder,
            id: self.id.0.clone(),
            from: self.status.label(),
            to: next.label(),
        })
    }

    /// Current position in the delivery stepper. Completed orders sit on
    /// goods receipt; payment readiness is tracked on the invoice.
    pub fn workflow_step(&self) -> WorkflowStep {
        match self.status {
            PurchaseOrderStatus::New => WorkflowStep::Released,
            PurchaseOrderStatus::Confirmed => WorkflowStep::VendorConfirmed,
            PurchaseOrderStatus::Completed => WorkflowStep::GoodsReceived,
        }
    }
}
