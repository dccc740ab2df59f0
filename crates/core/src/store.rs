//! In-memory entity store and the transition actions that mutate it.
//!
//! The store is the single writer for agreements, purchase orders and
//! invoices. Every transition checks the record's current status first and
//! leaves the store untouched when the check fails.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::activity::{ActivityEntry, ActivityOutcome, ActivitySink, InMemoryActivitySink};
use crate::domain::invoice::PENDING_PAY_DATE;
use crate::domain::{
    Agreement, AgreementStatus, Invoice, InvoiceId, InvoiceStatus, PurchaseOrder,
    PurchaseOrderStatus, RecordStatus,
};
use crate::errors::{DomainError, EntityKind};
use crate::fixtures;

pub const DEFAULT_INVOICE_PREFIX: &str = "INV-24";

const INVOICE_NUMBER_SPACE: u16 = 1000;
const RANDOM_NUMBER_ATTEMPTS: usize = 32;

/// Hands out `<prefix>-<nnn>` invoice numbers that are not yet taken.
#[derive(Clone, Debug)]
pub struct InvoiceNumbering {
    prefix: String,
    rng: StdRng,
}

impl InvoiceNumbering {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), rng: StdRng::from_entropy() }
    }

    pub fn seeded(prefix: impl Into<String>, seed: u64) -> Self {
        Self { prefix: prefix.into(), rng: StdRng::seed_from_u64(seed) }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn format(&self, number: u16) -> InvoiceId {
        InvoiceId(format!("{}-{number:03}", self.prefix))
    }

    /// Random draw first; once the space gets crowded fall back to the
    /// lowest free number so the call never loops forever.
    pub fn next(&mut self, existing: &[Invoice]) -> Result<InvoiceId, DomainError> {
        let taken: HashSet<&str> = existing.iter().map(|invoice| invoice.id.as_str()).collect();

        for _ in 0..RANDOM_NUMBER_ATTEMPTS {
            let number = self.rng.gen_range(0..INVOICE_NUMBER_SPACE);
            let candidate = self.format(number);
            if !taken.contains(candidate.as_str()) {
                return Ok(candidate);
            }
        }

        (0..INVOICE_NUMBER_SPACE)
            .map(|number| self.format(number))
            .find(|candidate| !taken.contains(candidate.as_str()))
            .ok_or_else(|| {
                DomainError::InvariantViolation(format!(
                    "invoice numbers under prefix `{}` are exhausted",
                    self.prefix
                ))
            })
    }
}

impl Default for InvoiceNumbering {
    fn default() -> Self {
        Self::new(DEFAULT_INVOICE_PREFIX)
    }
}

#[derive(Clone)]
pub struct PortalStore {
    agreements: Vec<Agreement>,
    purchase_orders: Vec<PurchaseOrder>,
    invoices: Vec<Invoice>,
    numbering: InvoiceNumbering,
    activity: Arc<dyn ActivitySink>,
    operations: u64,
}

impl PortalStore {
    /// Builds a store from explicit collections. Identifiers must be unique
    /// per collection and every invoice must point at a known order.
    pub fn new(
        agreements: Vec<Agreement>,
        purchase_orders: Vec<PurchaseOrder>,
        invoices: Vec<Invoice>,
    ) -> Result<Self, DomainError> {
        ensure_unique(EntityKind::Agreement, agreements.iter().map(|a| a.id.as_str()))?;
        ensure_unique(EntityKind::PurchaseOrder, purchase_orders.iter().map(|o| o.id.as_str()))?;
        ensure_unique(EntityKind::Invoice, invoices.iter().map(|i| i.id.as_str()))?;

        if let Some(orphan) = invoices
            .iter()
            .find(|invoice| !purchase_orders.iter().any(|o| o.id == invoice.purchase_order_id))
        {
            return Err(DomainError::InvariantViolation(format!(
                "invoice {} references unknown purchase order {}",
                orphan.id, orphan.purchase_order_id
            )));
        }

        Ok(Self::from_parts(agreements, purchase_orders, invoices))
    }

    pub fn seeded() -> Self {
        Self::from_parts(
            fixtures::seed_agreements(),
            fixtures::seed_purchase_orders(),
            fixtures::seed_invoices(),
        )
    }

    fn from_parts(
        agreements: Vec<Agreement>,
        purchase_orders: Vec<PurchaseOrder>,
        invoices: Vec<Invoice>,
    ) -> Self {
        Self {
            agreements,
            purchase_orders,
            invoices,
            numbering: InvoiceNumbering::default(),
            activity: Arc::new(InMemoryActivitySink::default()),
            operations: 0,
        }
    }

    pub fn with_numbering(mut self, numbering: InvoiceNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn with_activity_sink(mut self, sink: Arc<dyn ActivitySink>) -> Self {
        self.activity = sink;
        self
    }

    pub fn agreements(&self) -> &[Agreement] {
        &self.agreements
    }

    pub fn purchase_orders(&self) -> &[PurchaseOrder] {
        &self.purchase_orders
    }

    /// Newest first: freshly issued invoices are prepended.
    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn agreement(&self, id: &str) -> Option<&Agreement> {
        self.agreements.iter().find(|agreement| agreement.id.as_str() == id)
    }

    pub fn purchase_order(&self, id: &str) -> Option<&PurchaseOrder> {
        self.purchase_orders.iter().find(|order| order.id.as_str() == id)
    }

    pub fn invoice(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|invoice| invoice.id.as_str() == id)
    }

    pub fn invoices_for_order(&self, id: &str) -> Vec<&Invoice> {
        self.invoices.iter().filter(|invoice| invoice.purchase_order_id.as_str() == id).collect()
    }

    /// Activity log, newest first.
    pub fn activity(&self) -> Vec<ActivityEntry> {
        let mut entries = self.activity.entries();
        entries.reverse();
        entries
    }

    pub fn confirm_order(&mut self, id: &str) -> Result<&PurchaseOrder, DomainError> {
        let correlation_id = self.next_correlation_id();
        let outcome = self.order_index(id).and_then(|index| {
            let order = &mut self.purchase_orders[index];
            order.transition_to(PurchaseOrderStatus::Confirmed).map(|()| index)
        });

        match outcome {
            Ok(index) => {
                self.applied(
                    id,
                    &correlation_id,
                    "portal.order.confirmed",
                    format!("PO {id} confirmed."),
                    PurchaseOrderStatus::New.label(),
                    PurchaseOrderStatus::Confirmed.label(),
                );
                Ok(&self.purchase_orders[index])
            }
            Err(error) => {
                self.rejected(id, &correlation_id, "portal.order.confirm_rejected", &error);
                Err(error)
            }
        }
    }

    /// Raises an invoice for a confirmed order and completes the order.
    /// Anything other than a confirmed order is rejected, so an order is
    /// never billed twice.
    pub fn issue_invoice(
        &mut self,
        id: &str,
        issued_on: NaiveDate,
    ) -> Result<&Invoice, DomainError> {
        let correlation_id = self.next_correlation_id();

        match self.raise_invoice(id, issued_on) {
            Ok(invoice_id) => {
                self.applied(
                    id,
                    &correlation_id,
                    "portal.order.invoiced",
                    format!("Invoice {invoice_id} issued for PO {id}."),
                    PurchaseOrderStatus::Confirmed.label(),
                    PurchaseOrderStatus::Completed.label(),
                );
                Ok(&self.invoices[0])
            }
            Err(error) => {
                self.rejected(id, &correlation_id, "portal.order.invoice_rejected", &error);
                Err(error)
            }
        }
    }

    fn raise_invoice(&mut self, id: &str, issued_on: NaiveDate) -> Result<InvoiceId, DomainError> {
        let index = self.order_index(id)?;
        let order = &self.purchase_orders[index];
        if !order.can_transition_to(PurchaseOrderStatus::Completed) {
            return Err(DomainError::InvalidTransition {
                entity: EntityKind::PurchaseOrder,
                id: order.id.0.clone(),
                from: order.status.label(),
                to: PurchaseOrderStatus::Completed.label(),
            });
        }

        let invoice = Invoice {
            id: self.numbering.next(&self.invoices)?,
            purchase_order_id: order.id.clone(),
            amount: order.amount,
            status: InvoiceStatus::Processing,
            issued_on,
            pay_date: PENDING_PAY_DATE.to_string(),
        };
        let invoice_id = invoice.id.clone();

        self.purchase_orders[index].transition_to(PurchaseOrderStatus::Completed)?;
        self.invoices.insert(0, invoice);
        Ok(invoice_id)
    }

    pub fn sign_agreement(&mut self, id: &str) -> Result<&Agreement, DomainError> {
        let correlation_id = self.next_correlation_id();
        let outcome = self.agreement_index(id).and_then(|index| {
            let agreement = &mut self.agreements[index];
            agreement.transition_to(AgreementStatus::Active).map(|()| index)
        });

        match outcome {
            Ok(index) => {
                self.applied(
                    id,
                    &correlation_id,
                    "portal.agreement.signed",
                    format!("Agreement {id} signed and active."),
                    AgreementStatus::AwaitingVendorSignature.label(),
                    AgreementStatus::Active.label(),
                );
                Ok(&self.agreements[index])
            }
            Err(error) => {
                self.rejected(id, &correlation_id, "portal.agreement.sign_rejected", &error);
                Err(error)
            }
        }
    }

    fn order_index(&self, id: &str) -> Result<usize, DomainError> {
        self.purchase_orders.iter().position(|order| order.id.as_str() == id).ok_or_else(|| {
            DomainError::RecordNotFound { entity: EntityKind::PurchaseOrder, id: id.to_string() }
        })
    }

    fn agreement_index(&self, id: &str) -> Result<usize, DomainError> {
        self.agreements.iter().position(|agreement| agreement.id.as_str() == id).ok_or_else(|| {
            DomainError::RecordNotFound { entity: EntityKind::Agreement, id: id.to_string() }
        })
    }

    fn next_correlation_id(&mut self) -> String {
        self.operations += 1;
        format!("op-{:06}", self.operations)
    }

    fn applied(
        &self,
        record_id: &str,
        correlation_id: &str,
        event_type: &'static str,
        message: String,
        from: &'static str,
        to: &'static str,
    ) {
        info!(
            event_name = event_type,
            record_id,
            correlation_id,
            from,
            to,
            "{message}"
        );
        self.activity.emit(
            ActivityEntry::new(
                record_id,
                correlation_id,
                event_type,
                ActivityOutcome::Success,
                message,
            )
            .with_metadata("from", from)
            .with_metadata("to", to),
        );
    }

    fn rejected(
        &self,
        record_id: &str,
        correlation_id: &str,
        event_type: &'static str,
        error: &DomainError,
    ) {
        warn!(
            event_name = event_type,
            record_id,
            correlation_id,
            error = %error,
            "transition rejected"
        );
        self.activity.emit(ActivityEntry::new(
            record_id,
            correlation_id,
            event_type,
            ActivityOutcome::Rejected,
            error.to_string(),
        ));
    }
}

fn ensure_unique<'a, I, T>(entity: EntityKind, ids: I) -> Result<(), DomainError>
where
    I: IntoIterator<Item = &'a T>,
    T: Eq + Hash + std::fmt::Display + ?Sized + 'a,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(DomainError::InvariantViolation(format!("duplicate {entity} id {id}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::{InvoiceNumbering, PortalStore};
    use crate::activity::{ActivityOutcome, ActivitySink, InMemoryActivitySink};
    use crate::domain::{AgreementStatus, InvoiceStatus, PurchaseOrderStatus};
    use crate::errors::{DomainError, EntityKind};
    use crate::fixtures;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date")
    }

    fn store() -> PortalStore {
        PortalStore::seeded().with_numbering(InvoiceNumbering::seeded("INV-24", 7))
    }

    #[test]
    fn confirm_moves_a_new_order_and_leaves_the_rest_alone() {
        let mut store = store();
        let before = store.clone();

        let order = store.confirm_order("PO-2024-001").expect("new order can be confirmed");
        assert_eq!(order.status, PurchaseOrderStatus::Confirmed);

        for (after, before) in store.purchase_orders().iter().zip(before.purchase_orders()) {
            if after.id.as_str() != "PO-2024-001" {
                assert_eq!(after, before);
            }
        }
        assert_eq!(store.agreements(), before.agreements());
        assert_eq!(store.invoices(), before.invoices());
    }

    #[test]
    fn confirm_rejects_orders_that_are_not_new() {
        let mut store = store();
        let error = store.confirm_order("PO-2024-002").expect_err("completed order");

        assert_eq!(
            error,
            DomainError::InvalidTransition {
                entity: EntityKind::PurchaseOrder,
                id: "PO-2024-002".to_string(),
                from: "Completed",
                to: "Confirmed",
            }
        );
        assert_eq!(
            store.purchase_order("PO-2024-002").map(|order| order.status),
            Some(PurchaseOrderStatus::Completed)
        );
    }

    #[test]
    fn unknown_order_is_reported_as_missing() {
        let mut store = store();
        let error = store.confirm_order("PO-1999-999").expect_err("unknown id");
        assert!(matches!(
            error,
            DomainError::RecordNotFound { entity: EntityKind::PurchaseOrder, .. }
        ));
    }

    #[test]
    fn issue_invoice_creates_one_processing_invoice_and_completes_the_order() {
        let mut store = store();
        let invoice_count = store.invoices().len();

        let invoice = store.issue_invoice("PO-2024-003", today()).expect("confirmed order").clone();

        assert_eq!(invoice.purchase_order_id.as_str(), "PO-2024-003");
        assert_eq!(invoice.amount, 45_000_000);
        assert_eq!(invoice.status, InvoiceStatus::Processing);
        assert_eq!(invoice.pay_date, "Pending approval");
        assert_eq!(invoice.issued_on, today());
        assert!(invoice.id.as_str().starts_with("INV-24-"));
        assert_eq!(store.invoices().len(), invoice_count + 1);
        assert_eq!(store.invoices()[0], invoice);
        assert_eq!(
            store.purchase_order("PO-2024-003").map(|order| order.status),
            Some(PurchaseOrderStatus::Completed)
        );
    }

    #[test]
    fn second_invoice_for_the_same_order_is_rejected() {
        let mut store = store();
        store.issue_invoice("PO-2024-003", today()).expect("first invoice");
        let count = store.invoices().len();

        let error = store.issue_invoice("PO-2024-003", today()).expect_err("already completed");

        assert!(matches!(error, DomainError::InvalidTransition { from: "Completed", .. }));
        assert_eq!(store.invoices().len(), count);
    }

    #[test]
    fn issue_invoice_requires_vendor_confirmation_first() {
        let mut store = store();
        let error = store.issue_invoice("PO-2024-001", today()).expect_err("still new");

        assert!(matches!(error, DomainError::InvalidTransition { from: "New", .. }));
        assert_eq!(store.invoices_for_order("PO-2024-001").len(), 0);
    }

    #[test]
    fn example_scenario_confirm_then_invoice() {
        let mut store = store();

        store.confirm_order("PO-2024-001").expect("confirm");
        assert_eq!(
            store.purchase_order("PO-2024-001").map(|order| order.status),
            Some(PurchaseOrderStatus::Confirmed)
        );

        let invoice = store.issue_invoice("PO-2024-001", today()).expect("invoice").clone();
        assert!(invoice.id.as_str().starts_with("INV-24-"));
        assert_eq!(invoice.id.as_str().len(), "INV-24-000".len());
        assert_eq!(invoice.amount, 125_000_000);
        assert_eq!(invoice.status, InvoiceStatus::Processing);
        assert_eq!(
            store.purchase_order("PO-2024-001").map(|order| order.status),
            Some(PurchaseOrderStatus::Completed)
        );
        assert_eq!(store.invoices_for_order("PO-2024-001").len(), 1);
    }

    #[test]
    fn sign_activates_awaiting_agreements_only() {
        let mut store = store();
        let agreement = store.sign_agreement("AGR-SW-005").expect("awaiting signature");
        assert_eq!(agreement.status, AgreementStatus::Active);

        let error = store.sign_agreement("AGR-MN-099").expect_err("expired");
        assert!(matches!(
            error,
            DomainError::InvalidTransition { entity: EntityKind::Agreement, .. }
        ));
    }

    #[test]
    fn transitions_are_recorded_in_the_activity_log() {
        let sink = Arc::new(InMemoryActivitySink::default());
        let mut store = store().with_activity_sink(sink.clone());

        store.confirm_order("PO-2024-004").expect("confirm");
        let _ = store.confirm_order("PO-2024-004");

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event_type, "portal.order.confirmed");
        assert_eq!(entries[0].outcome, ActivityOutcome::Success);
        assert_eq!(entries[1].outcome, ActivityOutcome::Rejected);
        assert_ne!(entries[0].correlation_id, entries[1].correlation_id);
        assert_eq!(store.activity()[0].outcome, ActivityOutcome::Rejected);
    }

    #[test]
    fn seeded_numbering_draws_repeatable_three_digit_ids() {
        let existing = fixtures::seed_invoices();
        let mut first = InvoiceNumbering::seeded("INV-24", 42);
        let mut second = InvoiceNumbering::seeded("INV-24", 42);

        let drawn = first.next(&existing).expect("free number");
        assert_eq!(drawn, second.next(&existing).expect("free number"));

        let suffix = drawn.as_str().strip_prefix("INV-24-").expect("prefixed id");
        assert_eq!(suffix.len(), 3);
        assert!(suffix.chars().all(|ch| ch.is_ascii_digit()));
        assert!(existing.iter().all(|invoice| invoice.id != drawn));
    }

    #[test]
    fn numbering_skips_taken_numbers_and_reports_exhaustion() {
        let mut numbering = InvoiceNumbering::seeded("INV-24", 1);
        let mut issued = fixtures::seed_invoices();
        let template = issued[0].clone();
        issued.clear();

        for _ in 0..1000 {
            let id = numbering.next(&issued).expect("space not exhausted yet");
            assert!(issued.iter().all(|invoice| invoice.id != id));
            let mut invoice = template.clone();
            invoice.id = id;
            issued.push(invoice);
        }

        let error = numbering.next(&issued).expect_err("all 1000 numbers used");
        assert!(matches!(error, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn new_rejects_duplicate_identifiers_and_orphan_invoices() {
        let mut agreements = fixtures::seed_agreements();
        agreements.push(agreements[0].clone());
        let error = PortalStore::new(
            agreements,
            fixtures::seed_purchase_orders(),
            fixtures::seed_invoices(),
        )
        .err()
        .expect("duplicate agreement id");
        assert!(error.to_string().contains("duplicate agreement id AGR-CPO-001"));

        let error =
            PortalStore::new(fixtures::seed_agreements(), Vec::new(), fixtures::seed_invoices())
                .err()
                .expect("invoices without orders");
        assert!(error.to_string().contains("references unknown purchase order"));
    }
}
