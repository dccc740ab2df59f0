//! Vendor session: the entity store plus everything the user has selected
//! (page, search, filter, sort, open dialog) and the toast queue.
//!
//! Every user intent is one method. Outcomes, including rejections, are
//! reported back through the notification queue.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::activity::ActivityEntry;
use crate::config::AppConfig;
use crate::domain::{AgreementId, InvoiceId, PurchaseOrderStatus, RecordStatus};
use crate::errors::{DomainError, EntityKind};
use crate::format::{format_currency, format_short_date, Locale};
use crate::notifications::{Clock, NotificationId, NotificationQueue, Tone};
use crate::stats::PortalStats;
use crate::store::{InvoiceNumbering, PortalStore};
use crate::tasks::{derive_tasks, PendingTask};
use crate::view::{derive_view, Page, RecordRow, SortKey, SortSpec, StatusFilter, ViewQuery};

pub const OPENING_DOCUMENT: &str = "Opening document...";
pub const INVOICE_SENT: &str = "Invoice sent.";
pub const CONTRACT_ACTIVE: &str = "Contract is now active.";
pub const DOWNLOADING_DOCUMENT: &str = "Downloading document...";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub vendor_name: String,
    pub currency: String,
    pub locale: Locale,
    pub notification_ttl_ms: u64,
    pub default_page: Page,
    pub invoice_prefix: String,
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            vendor_name: config.portal.vendor_name.clone(),
            currency: config.portal.currency.clone(),
            locale: config.portal.locale,
            notification_ttl_ms: config.notifications.ttl_ms,
            default_page: config.portal.default_page,
            invoice_prefix: config.portal.invoice_prefix.clone(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// The confirm/cancel dialogs. Only one can be open at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Modal {
    #[default]
    Closed,
    Profile,
    IssueInvoice { order_id: String, acknowledged: bool },
    SignAgreement { agreement_id: String },
}

impl Modal {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Closed => "",
            Self::Profile => "VENDOR PROFILE & SETTINGS",
            Self::IssueInvoice { .. } => "DIGITAL INVOICE ISSUANCE",
            Self::SignAgreement { .. } => "ELECTRONIC SIGNATURE",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModalOutcome {
    Closed,
    InvoiceIssued { invoice_id: InvoiceId },
    AgreementSigned { agreement_id: AgreementId },
}

pub struct PortalSession {
    store: PortalStore,
    notifications: NotificationQueue,
    settings: SessionSettings,
    page: Page,
    query: ViewQuery,
    modal: Modal,
}

impl PortalSession {
    pub fn new(store: PortalStore, clock: Arc<dyn Clock>, settings: SessionSettings) -> Self {
        Self {
            store,
            notifications: NotificationQueue::new(clock, settings.notification_ttl_ms),
            page: settings.default_page,
            settings,
            query: ViewQuery::default(),
            modal: Modal::Closed,
        }
    }

    /// Seeded session wired from configuration.
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let settings = SessionSettings::from(config);
        let store = PortalStore::seeded()
            .with_numbering(InvoiceNumbering::new(settings.invoice_prefix.clone()));
        Self::new(store, clock, settings)
    }

    pub fn store(&self) -> &PortalStore {
        &self.store
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    /// Switching sections clears the search box and the status filter; a
    /// filter chosen for one collection means nothing for another.
    pub fn navigate(&mut self, page: Page) {
        self.page = page;
        self.query.text.clear();
        self.query.status = StatusFilter::All;
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query.text = text.into();
    }

    pub fn set_status_filter(&mut self, raw: &str) -> Result<StatusFilter, DomainError> {
        let filter = StatusFilter::parse(self.page, raw)?;
        self.query.status = filter;
        Ok(filter)
    }

    pub fn select_sort(&mut self, key: SortKey) -> SortSpec {
        self.query.sort = self.query.sort.select(key);
        self.query.sort
    }

    pub fn rows(&self) -> Vec<RecordRow<'_>> {
        derive_view(&self.store, self.page, &self.query)
    }

    pub fn stats(&self) -> PortalStats {
        PortalStats::compute(&self.store)
    }

    pub fn tasks(&self) -> Vec<PendingTask> {
        derive_tasks(&self.store)
    }

    /// Transition log of this session, newest first.
    pub fn activity(&self) -> Vec<ActivityEntry> {
        self.store.activity()
    }

    pub fn money(&self, amount: u64) -> String {
        format_currency(amount, &self.settings.currency, self.settings.locale)
    }

    pub fn short_date(&self, date: NaiveDate) -> String {
        format_short_date(date, self.settings.locale)
    }

    /// Jumps to the section that owns the task's record.
    pub fn open_task(&mut self, task_id: &str) -> Result<Page, DomainError> {
        let Some(task) = self.tasks().into_iter().find(|task| task.id == task_id) else {
            let error =
                DomainError::InvariantViolation(format!("no pending task with id `{task_id}`"));
            self.notify_error(&error);
            return Err(error);
        };

        self.navigate(task.target);
        self.notifications.push(OPENING_DOCUMENT, Tone::Info);
        Ok(task.target)
    }

    /// Row action on a new order. Takes effect immediately, no dialog.
    pub fn confirm_order(&mut self, order_id: &str) -> Result<(), DomainError> {
        match self.store.confirm_order(order_id) {
            Ok(order) => {
                let message = format!("PO {} confirmed.", order.id);
                self.notifications.push(message, Tone::Success);
                Ok(())
            }
            Err(error) => {
                self.notify_error(&error);
                Err(error)
            }
        }
    }

    /// Download row action. Looks the record up in the current section's
    /// collection; nothing is fetched, the vendor just gets a toast.
    pub fn download(&mut self, record_id: &str) -> Result<(), DomainError> {
        let entity = match self.page {
            Page::Dashboard => {
                let error = DomainError::InvariantViolation(
                    "the dashboard has no documents to download".to_string(),
                );
                self.notify_error(&error);
                return Err(error);
            }
            Page::Agreements => EntityKind::Agreement,
            Page::Orders => EntityKind::PurchaseOrder,
            Page::Invoices => EntityKind::Invoice,
        };
        let exists = match entity {
            EntityKind::Agreement => self.store.agreement(record_id).is_some(),
            EntityKind::PurchaseOrder => self.store.purchase_order(record_id).is_some(),
            EntityKind::Invoice => self.store.invoice(record_id).is_some(),
        };

        if !exists {
            let error = DomainError::RecordNotFound { entity, id: record_id.to_string() };
            self.notify_error(&error);
            return Err(error);
        }

        tracing::debug!(
            event_name = "portal.document.download",
            record_id = %record_id,
            "document download requested"
        );
        self.notifications.push(DOWNLOADING_DOCUMENT, Tone::Info);
        Ok(())
    }

    pub fn open_profile(&mut self) {
        self.modal = Modal::Profile;
    }

    /// Opens the invoice dialog for a confirmed order.
    pub fn request_invoice(&mut self, order_id: &str) -> Result<(), DomainError> {
        let check = match self.store.purchase_order(order_id) {
            None => Err(DomainError::RecordNotFound {
                entity: EntityKind::PurchaseOrder,
                id: order_id.to_string(),
            }),
            Some(order) if order.status != PurchaseOrderStatus::Confirmed => {
                Err(DomainError::InvalidTransition {
                    entity: EntityKind::PurchaseOrder,
                    id: order.id.0.clone(),
                    from: order.status.label(),
                    to: PurchaseOrderStatus::Completed.label(),
                })
            }
            Some(_) => Ok(()),
        };

        match check {
            Ok(()) => {
                self.modal =
                    Modal::IssueInvoice { order_id: order_id.to_string(), acknowledged: false };
                Ok(())
            }
            Err(error) => {
                self.notify_error(&error);
                Err(error)
            }
        }
    }

    /// Opens the signature dialog for an agreement awaiting the vendor.
    pub fn request_signature(&mut self, agreement_id: &str) -> Result<(), DomainError> {
        let check = match self.store.agreement(agreement_id) {
            None => Err(DomainError::RecordNotFound {
                entity: EntityKind::Agreement,
                id: agreement_id.to_string(),
            }),
            Some(agreement) if !agreement.awaits_signature() => {
                Err(DomainError::InvalidTransition {
                    entity: EntityKind::Agreement,
                    id: agreement.id.0.clone(),
                    from: agreement.status.label(),
                    to: crate::domain::AgreementStatus::Active.label(),
                })
            }
            Some(_) => Ok(()),
        };

        match check {
            Ok(()) => {
                self.modal = Modal::SignAgreement { agreement_id: agreement_id.to_string() };
                Ok(())
            }
            Err(error) => {
                self.notify_error(&error);
                Err(error)
            }
        }
    }

    /// Ticks or clears the invoice dialog's acknowledgement checkbox.
    pub fn acknowledge(&mut self, checked: bool) -> Result<(), DomainError> {
        match &mut self.modal {
            Modal::IssueInvoice { acknowledged, .. } => {
                *acknowledged = checked;
                Ok(())
            }
            _ => Err(DomainError::InvariantViolation(
                "only the invoice dialog has an acknowledgement".to_string(),
            )),
        }
    }

    pub fn cancel_modal(&mut self) {
        self.modal = Modal::Closed;
    }

    /// Confirms the open dialog. The invoice dialog stays open until its
    /// acknowledgement is ticked; a store rejection closes the dialog and is
    /// reported as an error toast.
    pub fn submit_modal(&mut self, today: NaiveDate) -> Result<ModalOutcome, DomainError> {
        match self.modal.clone() {
            Modal::Closed => {
                Err(DomainError::InvariantViolation("no dialog is open".to_string()))
            }
            Modal::Profile => {
                self.modal = Modal::Closed;
                Ok(ModalOutcome::Closed)
            }
            Modal::IssueInvoice { acknowledged: false, .. } => {
                let error = DomainError::InvariantViolation(
                    "tick the acknowledgement before issuing the invoice".to_string(),
                );
                self.notify_error(&error);
                Err(error)
            }
            Modal::IssueInvoice { order_id, acknowledged: true } => {
                self.modal = Modal::Closed;
                match self.store.issue_invoice(&order_id, today) {
                    Ok(invoice) => {
                        let invoice_id = invoice.id.clone();
                        self.notifications.push(INVOICE_SENT, Tone::Success);
                        Ok(ModalOutcome::InvoiceIssued { invoice_id })
                    }
                    Err(error) => {
                        self.notify_error(&error);
                        Err(error)
                    }
                }
            }
            Modal::SignAgreement { agreement_id } => {
                self.modal = Modal::Closed;
                match self.store.sign_agreement(&agreement_id) {
                    Ok(agreement) => {
                        let agreement_id = agreement.id.clone();
                        self.notifications.push(CONTRACT_ACTIVE, Tone::Success);
                        Ok(ModalOutcome::AgreementSigned { agreement_id })
                    }
                    Err(error) => {
                        self.notify_error(&error);
                        Err(error)
                    }
                }
            }
        }
    }

    /// Fires every notification timer due at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Vec<NotificationId> {
        self.notifications.expire_due(now_ms)
    }

    pub fn tick_now(&mut self) -> Vec<NotificationId> {
        self.notifications.expire_now()
    }

    fn notify_error(&mut self, error: &DomainError) {
        self.notifications.push(error.to_string(), Tone::Error);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::{
        Modal, ModalOutcome, PortalSession, SessionSettings, CONTRACT_ACTIVE,
        DOWNLOADING_DOCUMENT, INVOICE_SENT, OPENING_DOCUMENT,
    };
    use crate::domain::{AgreementStatus, InvoiceStatus, PurchaseOrderStatus};
    use crate::errors::{DomainError, EntityKind};
    use crate::notifications::{ManualClock, Tone};
    use crate::store::{InvoiceNumbering, PortalStore};
    use crate::view::{Page, SortDirection, SortKey, StatusFilter};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date")
    }

    fn session(clock: &ManualClock) -> PortalSession {
        let store = PortalStore::seeded().with_numbering(InvoiceNumbering::seeded("INV-24", 3));
        PortalSession::new(store, Arc::new(clock.clone()), SessionSettings::default())
    }

    #[test]
    fn starts_on_the_configured_page_with_default_sort() {
        let clock = ManualClock::at(0);
        let session = session(&clock);
        assert_eq!(session.page(), Page::Dashboard);
        assert_eq!(session.query().sort.key, SortKey::Date);
        assert_eq!(session.query().sort.direction, SortDirection::Descending);
        assert!(session.rows().is_empty());
        assert_eq!(session.stats().new_orders, 2);
    }

    #[test]
    fn navigation_clears_search_and_status_filter() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);
        session.navigate(Page::Orders);
        session.set_query("truck");
        session.set_status_filter("confirmed").expect("valid for orders");
        assert_eq!(session.rows().len(), 1);

        session.navigate(Page::Agreements);
        assert!(session.query().text.is_empty());
        assert_eq!(session.query().status, StatusFilter::All);
        assert_eq!(session.rows().len(), 5);
    }

    #[test]
    fn status_filter_is_validated_against_the_active_page() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);
        session.navigate(Page::Invoices);
        assert!(session.set_status_filter("new").is_err());
        assert_eq!(session.query().status, StatusFilter::All);
    }

    #[test]
    fn example_scenario_through_the_session() {
        let clock = ManualClock::at(10_000);
        let mut session = session(&clock);
        session.navigate(Page::Orders);

        session.confirm_order("PO-2024-001").expect("confirm new order");
        assert_eq!(
            session.store().purchase_order("PO-2024-001").map(|order| order.status),
            Some(PurchaseOrderStatus::Confirmed)
        );

        session.request_invoice("PO-2024-001").expect("order is confirmed");
        assert!(matches!(session.modal(), Modal::IssueInvoice { acknowledged: false, .. }));
        session.acknowledge(true).expect("invoice dialog is open");

        let outcome = session.submit_modal(today()).expect("issue invoice");
        let invoice_id = match outcome {
            ModalOutcome::InvoiceIssued { invoice_id } => invoice_id,
            other => panic!("expected an issued invoice, got {other:?}"),
        };
        let invoice = session.store().invoice(invoice_id.as_str()).expect("invoice stored");
        assert_eq!(invoice.amount, 125_000_000);
        assert_eq!(invoice.status, InvoiceStatus::Processing);
        assert_eq!(
            session.store().purchase_order("PO-2024-001").map(|order| order.status),
            Some(PurchaseOrderStatus::Completed)
        );
        assert!(!session.modal().is_open());

        let messages: Vec<_> =
            session.notifications().visible_now().iter().map(|n| n.message.clone()).collect();
        assert_eq!(
            messages,
            vec![INVOICE_SENT.to_string(), "PO PO-2024-001 confirmed.".to_string()]
        );
    }

    #[test]
    fn invoice_dialog_requires_the_acknowledgement() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);
        session.request_invoice("PO-2024-003").expect("confirmed order");

        let error = session.submit_modal(today()).expect_err("not acknowledged");
        assert!(matches!(error, DomainError::InvariantViolation(_)));
        assert!(session.modal().is_open());
        assert_eq!(
            session.store().purchase_order("PO-2024-003").map(|order| order.status),
            Some(PurchaseOrderStatus::Confirmed)
        );
    }

    #[test]
    fn invoice_dialog_is_refused_for_orders_that_are_not_confirmed() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);

        assert!(session.request_invoice("PO-2024-002").is_err());
        assert!(session.request_invoice("PO-9999").is_err());
        assert!(!session.modal().is_open());

        let tones: Vec<_> = session.notifications().visible_now().iter().map(|n| n.tone).collect();
        assert_eq!(tones, vec![Tone::Error, Tone::Error]);
    }

    #[test]
    fn rejected_confirmation_is_surfaced_as_an_error_toast() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);
        session.confirm_order("PO-2024-005").expect_err("completed order");

        let visible = session.notifications().visible_now();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].tone, Tone::Error);
        assert!(visible[0].message.contains("PO-2024-005"));
    }

    #[test]
    fn signing_through_the_dialog_activates_the_agreement() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);
        session.request_signature("AGR-SW-005").expect("awaiting signature");
        assert_eq!(session.modal().title(), "ELECTRONIC SIGNATURE");
        assert!(session.acknowledge(true).is_err());

        let outcome = session.submit_modal(today()).expect("sign");
        assert!(matches!(outcome, ModalOutcome::AgreementSigned { .. }));
        assert_eq!(
            session.store().agreement("AGR-SW-005").map(|agreement| agreement.status),
            Some(AgreementStatus::Active)
        );

        let visible = session.notifications().visible_now();
        assert_eq!(visible[0].message, CONTRACT_ACTIVE);
        assert_eq!(visible[0].tone, Tone::Success);
        assert!(session.request_signature("AGR-SW-005").is_err());
    }

    #[test]
    fn download_looks_up_the_record_in_the_current_section() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);
        let error = session.download("PO-2024-001").expect_err("dashboard has no rows");
        assert!(matches!(error, DomainError::InvariantViolation(_)));

        session.navigate(Page::Orders);
        session.download("PO-2024-002").expect("completed orders can be downloaded");
        let visible = session.notifications().visible_now();
        assert_eq!(visible[0].message, DOWNLOADING_DOCUMENT);
        assert_eq!(visible[0].tone, Tone::Info);

        session.navigate(Page::Invoices);
        assert_eq!(
            session.download("PO-2024-002"),
            Err(DomainError::RecordNotFound {
                entity: EntityKind::Invoice,
                id: "PO-2024-002".to_string(),
            })
        );
        assert_eq!(session.notifications().visible_now()[0].tone, Tone::Error);
    }

    #[test]
    fn cancelling_a_dialog_changes_nothing() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);
        session.request_signature("AGR-SW-005").expect("awaiting signature");
        session.cancel_modal();

        assert!(!session.modal().is_open());
        assert!(session.submit_modal(today()).is_err());
        assert_eq!(
            session.store().agreement("AGR-SW-005").map(|agreement| agreement.status),
            Some(AgreementStatus::AwaitingVendorSignature)
        );
    }

    #[test]
    fn profile_dialog_just_closes() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);
        session.open_profile();
        assert_eq!(session.submit_modal(today()), Ok(ModalOutcome::Closed));
    }

    #[test]
    fn opening_a_task_navigates_to_its_record_page() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);

        assert_eq!(session.open_task("t-p-PO-2024-004"), Ok(Page::Orders));
        assert_eq!(session.page(), Page::Orders);
        assert_eq!(session.open_task("t-a-AGR-SW-005"), Ok(Page::Agreements));
        assert!(session.open_task("t-x-missing").is_err());

        let messages: Vec<_> =
            session.notifications().visible_now().iter().map(|n| n.message.clone()).collect();
        assert_eq!(messages[1], OPENING_DOCUMENT);
    }

    #[test]
    fn toasts_expire_on_tick_independently() {
        let clock = ManualClock::at(0);
        let mut session = session(&clock);
        session.confirm_order("PO-2024-001").expect("confirm");
        clock.advance(2_000);
        session.confirm_order("PO-2024-004").expect("confirm");

        clock.advance(2_001);
        assert_eq!(session.tick_now().len(), 1);
        assert_eq!(session.notifications().len(), 1);
        assert_eq!(session.tick(8_000).len(), 1);
        assert!(session.notifications().is_empty());
    }

    #[test]
    fn money_and_dates_use_the_configured_locale() {
        let clock = ManualClock::at(0);
        let session = session(&clock);
        assert_eq!(session.money(125_000_000), "Rp 125.000.000");
        assert_eq!(
            session.short_date(NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")),
            "1 Jan 2025"
        );
    }
}
