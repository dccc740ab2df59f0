use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{parse_status, RecordStatus};
use crate::errors::{DomainError, EntityKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgreementId(pub String);

impl AgreementId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgreementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    Active,
    AwaitingVendorSignature,
    Expired,
}

impl RecordStatus for AgreementStatus {
    const ALL: &'static [Self] = &[Self::Active, Self::AwaitingVendorSignature, Self::Expired];
    const ALIASES: &'static [(&'static str, Self)] =
        &[("awaiting_signature", Self::AwaitingVendorSignature)];

    fn key(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::AwaitingVendorSignature => "awaiting_vendor_signature",
            Self::Expired => "expired",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::AwaitingVendorSignature => "Awaiting Vendor Signature",
            Self::Expired => "Expired",
        }
    }
}

impl FromStr for AgreementStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_status(value)
    }
}

/// A master contract between the buyer and this vendor. `value` is in the
/// smallest currency unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    pub id: AgreementId,
    pub title: String,
    pub end_date: NaiveDate,
    pub status: AgreementStatus,
    pub value: u64,
}

impl Agreement {
    pub fn can_transition_to(&self, next: AgreementStatus) -> bool {
        matches!(
            (self.status, next),
            (AgreementStatus::AwaitingVendorSignature, AgreementStatus::Active)
        )
    }

    pub fn transition_to(&mut self, next: AgreementStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidTransition {
            entity: EntityKind::Agreement,
            id: self.id.0.clone(),
            from: self.status.label(),
            to: next.label(),
        })
    }

    pub fn awaits_signature(&self) -> bool {
        self.status == AgreementStatus::AwaitingVendorSignature
    }
}
