//! Vendor-facing records and their status state machines.
//!
//! Each record carries a small enumerated `status`. Transitions are guarded
//! per record type; the store is the only caller that mutates a status.

pub mod agreement;
pub mod invoice;
pub mod purchase_order;

use crate::errors::DomainError;

pub use agreement::{Agreement, AgreementId, AgreementStatus};
pub use invoice::{Invoice, InvoiceId, InvoiceStatus};
pub use purchase_order::{PurchaseOrder, PurchaseOrderId, PurchaseOrderStatus, WorkflowStep};

/// Closed set of status values for one record type.
pub trait RecordStatus: Copy + Eq + 'static {
    /// Option set offered by the status dropdown, in display order.
    const ALL: &'static [Self];

    /// Extra spellings accepted on input, already in normalized form.
    const ALIASES: &'static [(&'static str, Self)] = &[];

    fn key(self) -> &'static str;
    fn label(self) -> &'static str;
}

/// Accepts the snake-case key, the display label or an alias,
/// case-insensitively. Spaces, dashes and camel-case humps all read as
/// underscores.
pub fn parse_status<S: RecordStatus>(raw: &str) -> Result<S, DomainError> {
    let wanted = normalize_key(raw);
    S::ALL
        .iter()
        .copied()
        .find(|status| status.key() == wanted || normalize_key(status.label()) == wanted)
        .or_else(|| {
            S::ALIASES.iter().find(|(alias, _)| *alias == wanted).map(|(_, status)| *status)
        })
        .ok_or_else(|| {
            let expected = S::ALL.iter().map(|status| status.key()).collect::<Vec<_>>().join("|");
            DomainError::InvariantViolation(format!(
                "unknown status `{}` (expected {expected})",
                raw.trim()
            ))
        })
}

fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut previous_lower = false;
    for ch in raw.trim().chars() {
        if ch == ' ' || ch == '-' {
            key.push('_');
        } else {
            if ch.is_ascii_uppercase() && previous_lower {
                key.push('_');
            }
            key.push(ch.to_ascii_lowercase());
        }
        previous_lower = ch.is_ascii_lowercase();
    }
    key
}
