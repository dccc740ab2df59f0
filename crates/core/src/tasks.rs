use serde::{Deserialize, Serialize};

use crate::domain::PurchaseOrderStatus;
use crate::store::PortalStore;
use crate::view::Page;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    SignAgreement,
    ConfirmOrder,
}

impl TaskKind {
    /// Badge shown next to the task in the quick-action list.
    pub fn badge(self) -> &'static str {
        match self {
            Self::SignAgreement => "signature",
            Self::ConfirmOrder => "inbox",
        }
    }
}

/// Something the vendor still has to act on. Rebuilt from the store on every
/// read; nothing about a task is stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTask {
    pub id: String,
    pub label: String,
    pub kind: TaskKind,
    pub target: Page,
    pub record_id: String,
}

/// Agreements awaiting signature first, then new orders, each in store order.
pub fn derive_tasks(store: &PortalStore) -> Vec<PendingTask> {
    let agreements = store.agreements().iter().filter(|a| a.awaits_signature()).map(|agreement| {
        PendingTask {
            id: format!("t-a-{}", agreement.id),
            label: format!("Confirm contract: {}", agreement.title),
            kind: TaskKind::SignAgreement,
            target: Page::Agreements,
            record_id: agreement.id.0.clone(),
        }
    });

    let orders = store
        .purchase_orders()
        .iter()
        .filter(|order| order.status == PurchaseOrderStatus::New)
        .map(|order| PendingTask {
            id: format!("t-p-{}", order.id),
            label: format!("Confirm new PO: {}", order.id),
            kind: TaskKind::ConfirmOrder,
            target: Page::Orders,
            record_id: order.id.0.clone(),
        });

    agreements.chain(orders).collect()
}
