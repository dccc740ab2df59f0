//! Text rendering for the terminal.
//!
//! Templates are compiled into the binary. Names end in `.txt`, so Tera does
//! not HTML-escape anything. The `money` and `short_date` filters are bound to
//! the configured currency and locale when the renderer is built.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tera::{Context, Tera};
use vendorly_core::fixtures::{seed_activity, SEED_HEAD_OFFICE, SEED_TAX_ID, SEED_VENDOR_ID};
use vendorly_core::{
    format_currency, format_short_date, ApplicationError, Locale, Modal, Page, PortalSession,
    PortalStats, RecordRow, SessionSettings, SortDirection, StatusFilter, Tone,
};

const DASHBOARD_TEMPLATE: &str = include_str!("../templates/dashboard.txt");
const LIST_TEMPLATE: &str = include_str!("../templates/list.txt");
const MODAL_TEMPLATE: &str = include_str!("../templates/modal.txt");
const NOTIFICATIONS_TEMPLATE: &str = include_str!("../templates/notifications.txt");

#[derive(Clone, Debug, Serialize)]
pub struct TaskView {
    pub id: String,
    pub label: String,
    pub badge: &'static str,
    pub target: &'static str,
    pub record_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActivityView {
    pub source: String,
    pub message: String,
    pub when: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct DashboardReport {
    pub vendor_name: String,
    pub vendor_id: &'static str,
    pub heading: &'static str,
    pub stats: PortalStats,
    pub tasks: Vec<TaskView>,
    pub activity: Vec<ActivityView>,
}

impl DashboardReport {
    /// Portal activity from this session (newest first), then the feed the
    /// portal booted with.
    pub fn from_session(session: &PortalSession) -> Self {
        let tasks = session
            .tasks()
            .into_iter()
            .map(|task| TaskView {
                badge: task.kind.badge(),
                target: task.target.key(),
                id: task.id,
                label: task.label,
                record_id: task.record_id,
            })
            .collect();

        let recorded = session.activity().into_iter().map(|entry| ActivityView {
            source: "Portal".to_string(),
            message: entry.message,
            when: entry.occurred_at.format("%H:%M:%S UTC").to_string(),
        });
        let seeded = seed_activity().into_iter().map(|entry| ActivityView {
            source: entry.source.to_string(),
            message: entry.message.to_string(),
            when: entry.when.to_string(),
        });

        Self {
            vendor_name: session.settings().vendor_name.clone(),
            vendor_id: SEED_VENDOR_ID,
            heading: Page::Dashboard.heading(),
            stats: session.stats(),
            tasks,
            activity: recorded.chain(seeded).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RowView {
    pub id: String,
    pub title: String,
    pub status: &'static str,
    pub status_key: &'static str,
    pub amount: u64,
    pub date: NaiveDate,
    pub actions: Vec<&'static str>,
    pub step: Option<&'static str>,
    pub pay_date: Option<String>,
}

impl From<RecordRow<'_>> for RowView {
    fn from(row: RecordRow<'_>) -> Self {
        let (step, pay_date) = match row {
            RecordRow::Order(order) => (Some(order.workflow_step().label()), None),
            RecordRow::Invoice(invoice) => (None, Some(invoice.pay_date.clone())),
            RecordRow::Agreement(_) => (None, None),
        };

        Self {
            id: row.id().to_string(),
            title: row.title().to_string(),
            status: row.status_label(),
            status_key: row.status_key(),
            amount: row.amount(),
            date: row.date(),
            actions: row.actions().into_iter().map(|action| action.label()).collect(),
            step,
            pay_date,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ListReport {
    pub page: &'static str,
    pub heading: &'static str,
    pub search: String,
    pub status: &'static str,
    pub status_options: Vec<&'static str>,
    pub sort_key: &'static str,
    pub sort_direction: &'static str,
    pub count: usize,
    pub total: usize,
    pub rows: Vec<RowView>,
}

impl ListReport {
    pub fn from_session(session: &PortalSession) -> Self {
        let page = session.page();
        let query = session.query();
        let rows: Vec<RowView> = session.rows().into_iter().map(RowView::from).collect();
        let total = match page {
            Page::Dashboard => 0,
            Page::Agreements => session.store().agreements().len(),
            Page::Orders => session.store().purchase_orders().len(),
            Page::Invoices => session.store().invoices().len(),
        };

        Self {
            page: page.key(),
            heading: page.heading(),
            search: query.text.clone(),
            status: query.status.key(),
            status_options: std::iter::once(StatusFilter::All.key())
                .chain(StatusFilter::options(page).into_iter().map(|(key, _)| key))
                .collect(),
            sort_key: query.sort.key.key(),
            sort_direction: match query.sort.direction {
                SortDirection::Ascending => "asc",
                SortDirection::Descending => "desc",
            },
            count: rows.len(),
            total,
            rows,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct NotificationView<'a> {
    tone: &'static str,
    message: &'a str,
}

pub struct Renderer {
    tera: Tera,
    settings: SessionSettings,
}

impl Renderer {
    pub fn new(settings: &SessionSettings) -> Result<Self, ApplicationError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("dashboard.txt", DASHBOARD_TEMPLATE),
            ("list.txt", LIST_TEMPLATE),
            ("modal.txt", MODAL_TEMPLATE),
            ("notifications.txt", NOTIFICATIONS_TEMPLATE),
        ])
        .map_err(rendering_error)?;
        register_template_filters(&mut tera, &settings.currency, settings.locale);

        Ok(Self { tera, settings: settings.clone() })
    }

    pub fn dashboard(&self, report: &DashboardReport) -> Result<String, ApplicationError> {
        self.render("dashboard.txt", report)
    }

    pub fn list(&self, report: &ListReport) -> Result<String, ApplicationError> {
        self.render("list.txt", report)
    }

    /// Whatever the active page shows: the dashboard or its list.
    pub fn page(&self, session: &PortalSession) -> Result<String, ApplicationError> {
        if session.page().is_list() {
            self.list(&ListReport::from_session(session))
        } else {
            self.dashboard(&DashboardReport::from_session(session))
        }
    }

    /// Open dialog, or an empty string when none is open.
    pub fn modal(&self, session: &PortalSession) -> Result<String, ApplicationError> {
        let mut context = Context::new();
        context.insert("title", session.modal().title());

        match session.modal() {
            Modal::Closed => return Ok(String::new()),
            Modal::Profile => {
                context.insert("kind", "profile");
                context.insert("vendor_name", &self.settings.vendor_name);
                context.insert("vendor_id", SEED_VENDOR_ID);
                context.insert("tax_id", SEED_TAX_ID);
                context.insert("head_office", SEED_HEAD_OFFICE);
                context.insert("locale", self.settings.locale.tag());
            }
            Modal::IssueInvoice { order_id, acknowledged } => {
                let amount =
                    session.store().purchase_order(order_id).map(|order| order.amount).unwrap_or(0);
                context.insert("kind", "issue_invoice");
                context.insert("order_id", order_id);
                context.insert("amount", &amount);
                context.insert("acknowledged", acknowledged);
            }
            Modal::SignAgreement { agreement_id } => {
                let title = session
                    .store()
                    .agreement(agreement_id)
                    .map(|agreement| agreement.title.as_str())
                    .unwrap_or_default();
                context.insert("kind", "sign_agreement");
                context.insert("agreement_id", agreement_id);
                context.insert("agreement_title", title);
            }
        }

        self.tera.render("modal.txt", &context).map_err(rendering_error)
    }

    pub fn notifications(&self, session: &PortalSession) -> Result<String, ApplicationError> {
        let visible = session.notifications().visible_now();
        let views: Vec<NotificationView<'_>> = visible
            .iter()
            .map(|note| NotificationView {
                tone: match note.tone {
                    Tone::Success => "ok",
                    Tone::Info => "info",
                    Tone::Error => "error",
                },
                message: &note.message,
            })
            .collect();

        let mut context = Context::new();
        context.insert("notifications", &views);
        self.tera.render("notifications.txt", &context).map_err(rendering_error)
    }

    fn render<T: Serialize>(&self, name: &str, report: &T) -> Result<String, ApplicationError> {
        let context = Context::from_serialize(report).map_err(rendering_error)?;
        self.tera.render(name, &context).map_err(rendering_error)
    }
}

/// Registers `money` and `short_date`, both bound to one currency and locale.
pub fn register_template_filters(tera: &mut Tera, currency: &str, locale: Locale) {
    let currency = currency.to_string();
    tera.register_filter(
        "money",
        move |value: &tera::Value,
              _: &HashMap<String, tera::Value>|
              -> tera::Result<tera::Value> {
            let amount = value
                .as_u64()
                .ok_or_else(|| tera::Error::msg("money filter expects a non-negative integer"))?;
            Ok(tera::Value::String(format_currency(amount, &currency, locale)))
        },
    );
    tera.register_filter(
        "short_date",
        move |value: &tera::Value,
              _: &HashMap<String, tera::Value>|
              -> tera::Result<tera::Value> {
            let raw = value
                .as_str()
                .ok_or_else(|| tera::Error::msg("short_date filter expects a date string"))?;
            let date = raw
                .parse::<NaiveDate>()
                .map_err(|error| tera::Error::msg(format!("invalid date `{raw}`: {error}")))?;
            Ok(tera::Value::String(format_short_date(date, locale)))
        },
    );
}

fn rendering_error(error: tera::Error) -> ApplicationError {
    ApplicationError::Rendering(error.to_string())
}
