use chrono::{Local, NaiveDate};
use serde::Serialize;
use vendorly_core::{DomainError, ModalOutcome, Page, PortalSession, PortalStats, RecordRow};

use super::{open_session, renderer, CommandResult};
use crate::render::RowView;

pub const DEMO_ORDER: &str = "PO-2024-001";

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub steps: Vec<String>,
    pub order: RowView,
    pub invoice: RowView,
    pub stats: PortalStats,
}

pub fn run(json: bool) -> CommandResult {
    let (_, mut session) = match open_session("demo") {
        Ok(opened) => opened,
        Err(failure) => return failure,
    };

    let report = match play(&mut session, Local::now().date_naive()) {
        Ok(report) => report,
        Err(error) => return CommandResult::domain_failure("demo", &error),
    };

    if json {
        return CommandResult::report("demo", &report);
    }

    let renderer = match renderer("demo", &session) {
        Ok(renderer) => renderer,
        Err(failure) => return failure,
    };
    let mut lines = report.steps.clone();
    session.navigate(Page::Invoices);
    session.set_query(report.invoice.id.as_str());
    match (renderer.page(&session), renderer.notifications(&session)) {
        (Ok(page), Ok(notes)) => {
            lines.push(String::new());
            lines.push(page);
            lines.push(String::new());
            lines.push(notes.trim_end().to_string());
            CommandResult::text(lines.join("\n"))
        }
        (Err(error), _) | (_, Err(error)) => CommandResult::application_failure("demo", error),
    }
}

/// Confirms the demo order, then issues and acknowledges its invoice.
pub fn play(session: &mut PortalSession, today: NaiveDate) -> Result<DemoReport, DomainError> {
    let mut steps = Vec::new();

    session.navigate(Page::Orders);
    session.confirm_order(DEMO_ORDER)?;
    steps.push(format!("confirmed {DEMO_ORDER}"));

    session.request_invoice(DEMO_ORDER)?;
    session.acknowledge(true)?;
    let invoice_id = match session.submit_modal(today)? {
        ModalOutcome::InvoiceIssued { invoice_id } => invoice_id,
        other => {
            return Err(DomainError::InvariantViolation(format!(
                "invoice dialog closed without issuing an invoice: {other:?}"
            )))
        }
    };
    steps.push(format!("issued {invoice_id} for {DEMO_ORDER}"));

    let store = session.store();
    let order: Option<RowView> =
        store.purchase_order(DEMO_ORDER).map(|order| RecordRow::Order(order).into());
    let invoice: Option<RowView> =
        store.invoice(invoice_id.as_str()).map(|invoice| RecordRow::Invoice(invoice).into());

    match (order, invoice) {
        (Some(order), Some(invoice)) => {
            Ok(DemoReport { steps, order, invoice, stats: session.stats() })
        }
        _ => Err(DomainError::InvariantViolation(format!(
            "{DEMO_ORDER} or {invoice_id} is missing after the scenario"
        ))),
    }
}
