use clap::Args;
use vendorly_core::{DomainError, Page, SortKey};

use super::{open_session, renderer, CommandResult};
use crate::render::ListReport;

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(help = "Collection to list: agreements, orders or invoices")]
    pub page: String,
    #[arg(long, help = "Case-insensitive substring matched against id and title")]
    pub search: Option<String>,
    #[arg(long, help = "Status key or label, or `all`")]
    pub status: Option<String>,
    #[arg(
        long,
        help = "Sort key (id, title, date, amount, status); repeat a key to flip direction"
    )]
    pub sort: Vec<String>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

pub fn run(args: &ListArgs) -> CommandResult {
    let (_, mut session) = match open_session("list") {
        Ok(opened) => opened,
        Err(failure) => return failure,
    };

    let page = match args.page.parse::<Page>() {
        Ok(page) if page.is_list() => page,
        Ok(page) => {
            let error = DomainError::InvariantViolation(format!(
                "`{page}` has no list; use `vendorly dashboard`"
            ));
            return CommandResult::domain_failure("list", &error);
        }
        Err(error) => return CommandResult::domain_failure("list", &error),
    };
    session.navigate(page);

    if let Some(search) = &args.search {
        session.set_query(search.as_str());
    }
    if let Some(status) = &args.status {
        if let Err(error) = session.set_status_filter(status) {
            return CommandResult::domain_failure("list", &error);
        }
    }
    for raw in &args.sort {
        match raw.parse::<SortKey>() {
            Ok(key) => {
                session.select_sort(key);
            }
            Err(error) => return CommandResult::domain_failure("list", &error),
        }
    }

    let report = ListReport::from_session(&session);
    tracing::debug!(
        event_name = "portal.view.listed",
        page = report.page,
        rows = report.count,
        "derived list view"
    );

    if args.json {
        return CommandResult::report("list", &report);
    }

    let renderer = match renderer("list", &session) {
        Ok(renderer) => renderer,
        Err(failure) => return failure,
    };
    match renderer.list(&report) {
        Ok(text) => CommandResult::text(text),
        Err(error) => CommandResult::application_failure("list", error),
    }
}

