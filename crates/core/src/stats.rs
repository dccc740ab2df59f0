use serde::{Deserialize, Serialize};

use crate::domain::{AgreementStatus, InvoiceStatus, PurchaseOrderStatus};
use crate::store::PortalStore;

/// Dashboard counters. Plain counts over the current store; the "this month"
/// captions on the cards are cosmetic and not derived from dates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalStats {
    pub active_agreements: usize,
    pub new_orders: usize,
    pub processing_invoices: usize,
    pub paid_invoices: usize,
}

impl PortalStats {
    pub fn compute(store: &PortalStore) -> Self {
        Self {
            active_agreements: store
                .agreements()
                .iter()
                .filter(|agreement| agreement.status == AgreementStatus::Active)
                .count(),
            new_orders: store
                .purchase_orders()
                .iter()
                .filter(|order| order.status == PurchaseOrderStatus::New)
                .count(),
            processing_invoices: store
                .invoices()
                .iter()
                .filter(|invoice| invoice.status == InvoiceStatus::Processing)
                .count(),
            paid_invoices: store.invoices().iter().filter(|invoice| invoice.is_settled()).count(),
        }
    }
}
