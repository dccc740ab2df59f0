//! Derived list view: the filtered, sorted projection of one collection.
//!
//! Nothing here is cached. `derive_view` is a pure function of the store and
//! the current selection and is simply called again after every change.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Agreement, AgreementStatus, Invoice, InvoiceStatus, PurchaseOrder, PurchaseOrderStatus,
    RecordStatus,
};
use crate::errors::DomainError;
use crate::store::PortalStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Agreements,
    Orders,
    Invoices,
}

impl Page {
    pub const ALL: [Self; 4] = [Self::Dashboard, Self::Agreements, Self::Orders, Self::Invoices];

    pub fn key(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Agreements => "agreements",
            Self::Orders => "orders",
            Self::Invoices => "invoices",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Home",
            Self::Agreements => "Agreements",
            Self::Orders => "Orders",
            Self::Invoices => "Invoices",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Self::Dashboard => "Vendor Dashboard",
            Self::Agreements => "Master Agreements",
            Self::Orders => "Purchase Orders",
            Self::Invoices => "Financial Ledger",
        }
    }

    pub fn is_list(self) -> bool {
        !matches!(self, Self::Dashboard)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Page {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dashboard" | "home" => Ok(Self::Dashboard),
            "agreements" | "agreement" | "contracts" => Ok(Self::Agreements),
            "orders" | "order" | "po" | "purchase_orders" => Ok(Self::Orders),
            "invoices" | "invoice" | "finance" => Ok(Self::Invoices),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown page `{other}` (expected dashboard|agreements|orders|invoices)"
            ))),
        }
    }
}

/// Status dropdown selection. `All` is the sentinel that disables filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Agreement(AgreementStatus),
    Order(PurchaseOrderStatus),
    Invoice(InvoiceStatus),
}

impl StatusFilter {
    /// Parses a dropdown value against the option set of `page`.
    pub fn parse(page: Page, raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        match page {
            Page::Agreements => trimmed.parse().map(Self::Agreement),
            Page::Orders => trimmed.parse().map(Self::Order),
            Page::Invoices => trimmed.parse().map(Self::Invoice),
            Page::Dashboard => Err(DomainError::InvariantViolation(
                "the dashboard has no status filter".to_string(),
            )),
        }
    }

    /// Dropdown options for `page` as `(key, label)`, without the `all` entry.
    pub fn options(page: Page) -> Vec<(&'static str, &'static str)> {
        fn pairs<S: RecordStatus>() -> Vec<(&'static str, &'static str)> {
            S::ALL.iter().map(|status| (status.key(), status.label())).collect()
        }

        match page {
            Page::Dashboard => Vec::new(),
            Page::Agreements => pairs::<AgreementStatus>(),
            Page::Orders => pairs::<PurchaseOrderStatus>(),
            Page::Invoices => pairs::<InvoiceStatus>(),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Agreement(status) => status.key(),
            Self::Order(status) => status.key(),
            Self::Invoice(status) => status.key(),
        }
    }

    fn admits(self, row: &RecordRow<'_>) -> bool {
        match (self, row) {
            (Self::All, _) => true,
            (Self::Agreement(status), RecordRow::Agreement(agreement)) => {
                agreement.status == status
            }
            (Self::Order(status), RecordRow::Order(order)) => order.status == status,
            (Self::Invoice(status), RecordRow::Invoice(invoice)) => invoice.status == status,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    Title,
    Date,
    Amount,
    Status,
}

impl SortKey {
    pub fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Status => "status",
        }
    }
}

impl FromStr for SortKey {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "title" | "item" => Ok(Self::Title),
            "date" => Ok(Self::Date),
            "amount" | "value" => Ok(Self::Amount),
            "status" => Ok(Self::Status),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown sort key `{other}` (expected id|title|date|amount|status)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self { key: SortKey::Date, direction: SortDirection::Descending }
    }
}

impl SortSpec {
    /// Header click: the same key flips direction, a new key starts ascending.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self { key, direction: self.direction.flipped() }
        } else {
            Self { key, direction: SortDirection::Ascending }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Confirm,
    IssueInvoice,
    Sign,
    Download,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Confirm => "CONFIRM",
            Self::IssueInvoice => "BILL",
            Self::Sign => "E-SIGN",
            Self::Download => "DOWNLOAD",
        }
    }
}

/// One row of the list view, borrowing the record it shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordRow<'a> {
    Agreement(&'a Agreement),
    Order(&'a PurchaseOrder),
    Invoice(&'a Invoice),
}

impl<'a> RecordRow<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            Self::Agreement(agreement) => agreement.id.as_str(),
            Self::Order(order) => order.id.as_str(),
            Self::Invoice(invoice) => invoice.id.as_str(),
        }
    }

    /// Agreement title, order item, or the order an invoice bills.
    pub fn title(&self) -> &'a str {
        match self {
            Self::Agreement(agreement) => &agreement.title,
            Self::Order(order) => &order.item,
            Self::Invoice(invoice) => invoice.purchase_order_id.as_str(),
        }
    }

    /// Text the search box matches against. Invoices carry no title, so only
    /// their id is searchable.
    pub fn search_text(&self) -> String {
        match self {
            Self::Agreement(agreement) => format!("{}{}", agreement.id, agreement.title),
            Self::Order(order) => format!("{}{}", order.id, order.item),
            Self::Invoice(invoice) => invoice.id.0.clone(),
        }
    }

    pub fn status_key(&self) -> &'static str {
        match self {
            Self::Agreement(agreement) => agreement.status.key(),
            Self::Order(order) => order.status.key(),
            Self::Invoice(invoice) => invoice.status.key(),
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Agreement(agreement) => agreement.status.label(),
            Self::Order(order) => order.status.label(),
            Self::Invoice(invoice) => invoice.status.label(),
        }
    }

    pub fn amount(&self) -> u64 {
        match self {
            Self::Agreement(agreement) => agreement.value,
            Self::Order(order) => order.amount,
            Self::Invoice(invoice) => invoice.amount,
        }
    }

    /// End date for agreements, issue date otherwise.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Agreement(agreement) => agreement.end_date,
            Self::Order(order) => order.issued_on,
            Self::Invoice(invoice) => invoice.issued_on,
        }
    }

    /// Status-driven actions first; every row can be downloaded.
    pub fn actions(&self) -> Vec<RowAction> {
        let mut actions = match self {
            Self::Order(order) => match order.status {
                PurchaseOrderStatus::New => vec![RowAction::Confirm],
                PurchaseOrderStatus::Confirmed => vec![RowAction::IssueInvoice],
                PurchaseOrderStatus::Completed => Vec::new(),
            },
            Self::Agreement(agreement) if agreement.awaits_signature() => vec![RowAction::Sign],
            Self::Agreement(_) | Self::Invoice(_) => Vec::new(),
        };
        actions.push(RowAction::Download);
        actions
    }

    fn compare(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::Id => self.id().cmp(other.id()),
            SortKey::Title => self.title().cmp(other.title()),
            SortKey::Date => self.date().cmp(&other.date()),
            SortKey::Amount => self.amount().cmp(&other.amount()),
            SortKey::Status => self.status_label().cmp(other.status_label()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    pub text: String,
    pub status: StatusFilter,
    pub sort: SortSpec,
}

/// Rows of the collection behind `page`, filtered by text and status and
/// stably sorted. The dashboard has no collection and yields nothing.
pub fn derive_view<'a>(
    store: &'a PortalStore,
    page: Page,
    query: &ViewQuery,
) -> Vec<RecordRow<'a>> {
    let source: Vec<RecordRow<'a>> = match page {
        Page::Dashboard => return Vec::new(),
        Page::Agreements => store.agreements().iter().map(RecordRow::Agreement).collect(),
        Page::Orders => store.purchase_orders().iter().map(RecordRow::Order).collect(),
        Page::Invoices => store.invoices().iter().map(RecordRow::Invoice).collect(),
    };

    let needle = query.text.to_lowercase();
    let mut rows: Vec<RecordRow<'a>> = source
        .into_iter()
        .filter(|row| needle.is_empty() || row.search_text().to_lowercase().contains(&needle))
        .filter(|row| query.status.admits(row))
        .collect();

    let SortSpec { key, direction } = query.sort;
    rows.sort_by(|left, right| {
        let ordering = left.compare(right, key);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    rows
}

#[cfg(test)]
mod tests {
    use super::{
        derive_view, Page, RecordRow, RowAction, SortDirection, SortKey, SortSpec, StatusFilter,
        ViewQuery,
    };
    use crate::domain::{AgreementStatus, PurchaseOrderStatus};
    use crate::store::PortalStore;

    fn ids(rows: &[RecordRow<'_>]) -> Vec<String> {
        rows.iter().map(|row| row.id().to_string()).collect()
    }

    fn query(text: &str, status: StatusFilter, sort: SortSpec) -> ViewQuery {
        ViewQuery { text: text.to_string(), status, sort }
    }

    fn ascending(key: SortKey) -> SortSpec {
        SortSpec { key, direction: SortDirection::Ascending }
    }

    #[test]
    fn text_filter_is_a_case_insensitive_substring_of_id_and_title() {
        let store = PortalStore::seeded();
        let queries = ["", "po-2024", "FERTILISER", "truck", "sei lala", "zzz", "4-00"];

        for page in [Page::Agreements, Page::Orders, Page::Invoices] {
            for text in queries {
                let rows =
                    derive_view(&store, page, &query(text, StatusFilter::All, SortSpec::default()));
                for row in &rows {
                    assert!(
                        row.search_text().to_lowercase().contains(&text.to_lowercase()),
                        "{} should not match `{text}`",
                        row.id()
                    );
                }
            }
        }
    }

    #[test]
    fn text_filter_matches_order_items() {
        let store = PortalStore::seeded();
        let rows = derive_view(
            &store,
            Page::Orders,
            &query("fertiliser", StatusFilter::All, ascending(SortKey::Id)),
        );
        assert_eq!(ids(&rows), vec!["PO-2024-002", "PO-2024-005"]);
    }

    #[test]
    fn invoices_are_searchable_by_id_only() {
        let store = PortalStore::seeded();
        let by_order_ref = derive_view(
            &store,
            Page::Invoices,
            &query("PO-2024-002", StatusFilter::All, SortSpec::default()),
        );
        assert!(by_order_ref.is_empty());

        let by_id = derive_view(
            &store,
            Page::Invoices,
            &query("inv-24-9", StatusFilter::All, SortSpec::default()),
        );
        assert_eq!(by_id.len(), 2);
    }

    #[test]
    fn status_filter_keeps_only_matching_rows() {
        let store = PortalStore::seeded();
        for (key, _) in StatusFilter::options(Page::Orders) {
            let filter = StatusFilter::parse(Page::Orders, key).expect("known option");
            let rows = derive_view(&store, Page::Orders, &query("", filter, SortSpec::default()));
            assert!(!rows.is_empty());
            assert!(rows.iter().all(|row| row.status_key() == key));
        }

        let awaiting = StatusFilter::Agreement(AgreementStatus::AwaitingVendorSignature);
        let rows = derive_view(&store, Page::Agreements, &query("", awaiting, SortSpec::default()));
        assert_eq!(ids(&rows), vec!["AGR-SW-005"]);
    }

    #[test]
    fn status_filter_parsing_depends_on_the_page() {
        assert_eq!(
            StatusFilter::parse(Page::Orders, "new"),
            Ok(StatusFilter::Order(PurchaseOrderStatus::New))
        );
        assert_eq!(
            StatusFilter::parse(Page::Agreements, "AwaitingSignature"),
            Ok(StatusFilter::Agreement(AgreementStatus::AwaitingVendorSignature))
        );
        assert_eq!(StatusFilter::parse(Page::Invoices, "ALL"), Ok(StatusFilter::All));
        assert!(StatusFilter::parse(Page::Invoices, "new").is_err());
        assert!(StatusFilter::parse(Page::Dashboard, "new").is_err());
        assert_eq!(
            StatusFilter::options(Page::Invoices),
            vec![("processing", "Processing"), ("paid", "Paid")]
        );
    }

    #[test]
    fn selecting_the_same_key_toggles_and_a_new_key_resets() {
        let spec = SortSpec::default();
        assert_eq!(spec.key, SortKey::Date);
        assert_eq!(spec.direction, SortDirection::Descending);

        let toggled = spec.select(SortKey::Date);
        assert_eq!(toggled.direction, SortDirection::Ascending);
        assert_eq!(toggled.select(SortKey::Date).direction, SortDirection::Descending);

        let fresh = toggled.select(SortKey::Amount);
        assert_eq!(fresh, SortSpec { key: SortKey::Amount, direction: SortDirection::Ascending });
        assert_eq!(fresh.select(SortKey::Amount).direction, SortDirection::Descending);
    }

    #[test]
    fn sorts_numbers_numerically_and_dates_chronologically() {
        let store = PortalStore::seeded();
        let by_amount = SortSpec::default().select(SortKey::Amount);
        let rows = derive_view(&store, Page::Orders, &query("", StatusFilter::All, by_amount));
        assert_eq!(
            ids(&rows),
            vec!["PO-2024-003", "PO-2024-001", "PO-2024-005", "PO-2024-004", "PO-2024-002"]
        );

        let rows =
            derive_view(&store, Page::Orders, &query("", StatusFilter::All, SortSpec::default()));
        assert_eq!(
            ids(&rows),
            vec!["PO-2024-004", "PO-2024-001", "PO-2024-003", "PO-2024-002", "PO-2024-005"]
        );
    }

    #[test]
    fn descending_sort_keeps_ties_in_source_order() {
        let store = PortalStore::seeded();
        let by_status = SortSpec { key: SortKey::Status, direction: SortDirection::Descending };
        let rows = derive_view(&store, Page::Agreements, &query("", StatusFilter::All, by_status));
        assert_eq!(
            ids(&rows),
            vec!["AGR-MN-099", "AGR-SW-005", "AGR-CPO-001", "AGR-PUP-012", "AGR-BIB-044"]
        );
    }

    #[test]
    fn dashboard_has_no_rows() {
        let store = PortalStore::seeded();
        assert!(derive_view(&store, Page::Dashboard, &ViewQuery::default()).is_empty());
    }

    #[test]
    fn row_actions_follow_record_status() {
        let store = PortalStore::seeded();
        let rows = derive_view(
            &store,
            Page::Orders,
            &query("", StatusFilter::All, ascending(SortKey::Id)),
        );
        let actions: Vec<_> = rows.iter().map(RecordRow::actions).collect();
        assert_eq!(actions[0], vec![RowAction::Confirm, RowAction::Download]);
        assert_eq!(actions[1], vec![RowAction::Download]);
        assert_eq!(actions[2], vec![RowAction::IssueInvoice, RowAction::Download]);

        let agreements = derive_view(&store, Page::Agreements, &ViewQuery::default());
        let signable: Vec<_> = agreements
            .iter()
            .filter(|row| row.actions().contains(&RowAction::Sign))
            .map(|row| row.id())
            .collect();
        assert_eq!(signable, vec!["AGR-SW-005"]);
    }

    #[test]
    fn every_row_offers_a_download() {
        let store = PortalStore::seeded();
        for page in [Page::Agreements, Page::Orders, Page::Invoices] {
            for row in derive_view(&store, page, &ViewQuery::default()) {
                assert_eq!(row.actions().last(), Some(&RowAction::Download), "{}", row.id());
            }
        }
        assert_eq!(RowAction::Download.label(), "DOWNLOAD");
    }
}
