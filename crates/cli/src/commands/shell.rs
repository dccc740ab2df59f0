//! Interactive portal session.
//!
//! One line per command on stdin. Between commands the loop also waits on the
//! earliest notification deadline, so toasts expire on time even when the
//! vendor is idle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use chrono::{Local, NaiveDate};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::Instant;
use vendorly_core::{
    ApplicationError, Clock, DomainError, ModalOutcome, Page, PortalSession, SortKey, SystemClock,
};

use super::{open_session_with_clock, renderer, CommandResult, EXIT_RUNTIME};
use crate::render::Renderer;

pub const HELP: &str = "\
commands:
  nav <dashboard|agreements|orders|invoices>   switch page (clears search and filter)
  search [text]                                filter rows by id/title; empty clears
  filter <status|all>                          status filter for the current page
  sort <id|title|date|amount|status>           same key again flips direction
  show                                         current page and open dialog
  confirm <po-id>                              confirm a new purchase order
  invoice <po-id>                              open the invoice dialog for a confirmed order
  sign <agreement-id>                          open the signature dialog
  download <id>                                download a document on the current page
  profile                                      open the vendor profile
  ack | unack                                  tick or clear the invoice confirmation
  submit | cancel                              confirm or close the open dialog
  open <task-id>                               jump to the document behind a task
  notes                                        visible notifications
  help | quit";

/// Wall-clock milliseconds that advance with tokio's clock. The epoch is read
/// once at construction; after that only tokio time moves it, so the
/// notification queue and the expiry timers share one time base.
#[derive(Clone, Copy, Debug)]
pub struct TokioClock {
    epoch_ms: u64,
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self { epoch_ms: SystemClock.now_ms(), origin: Instant::now() }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.epoch_ms.saturating_add(elapsed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub output: String,
    pub quit: bool,
}

impl Reply {
    fn say(output: impl Into<String>) -> Self {
        Self { output: output.into(), quit: false }
    }
}

pub fn run() -> CommandResult {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "shell",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            )
        }
    };

    runtime.block_on(async {
        let clock = Arc::new(TokioClock::new());
        let (_, mut session) = match open_session_with_clock("shell", clock) {
            Ok(opened) => opened,
            Err(failure) => return failure,
        };
        let renderer = match renderer("shell", &session) {
            Ok(renderer) => renderer,
            Err(failure) => return failure,
        };

        let reader = BufReader::new(tokio::io::stdin());
        let mut writer = tokio::io::stdout();
        match drive(&mut session, &renderer, reader, &mut writer).await {
            Ok(commands) => CommandResult::success(
                "shell",
                format!("session closed after {commands} commands"),
            ),
            Err(error) => {
                CommandResult::failure("shell", "io", format!("{error:#}"), EXIT_RUNTIME)
            }
        }
    })
}

/// Runs commands from `reader` until `quit` or end of input, expiring
/// notifications as their deadlines pass. Returns the number of commands run.
pub async fn drive<R, W>(
    session: &mut PortalSession,
    renderer: &Renderer,
    reader: R,
    writer: &mut W,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut commands = 0;

    let banner = renderer.page(session).context("rendering the start page")?;
    write_out(writer, &banner, session.page()).await?;

    loop {
        let wait = session.notifications().next_deadline().map(|deadline| {
            Duration::from_millis(deadline.saturating_sub(session.notifications().now_ms()))
        });

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading a command from stdin")? else {
                    break;
                };
                commands += 1;
                let reply = execute_line(session, renderer, &line, Local::now().date_naive());
                write_out(writer, &reply.output, session.page()).await?;
                if reply.quit {
                    break;
                }
            }
            () = sleep_for(wait) => {
                for id in session.tick_now() {
                    tracing::debug!(
                        event_name = "portal.notification.expired",
                        notification_id = id.0,
                        "notification expired"
                    );
                }
            }
        }
    }

    writer.flush().await.context("flushing shell output")?;
    Ok(commands)
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}

async fn write_out<W: AsyncWrite + Unpin>(
    writer: &mut W,
    output: &str,
    page: Page,
) -> anyhow::Result<()> {
    let mut text = output.trim_end().to_string();
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(&format!("{page}> "));
    writer.write_all(text.as_bytes()).await.context("writing shell output")?;
    writer.flush().await.context("flushing shell output")
}

/// Parses and applies one shell line. Failures are reported in the reply;
/// they never end the session.
pub fn execute_line(
    session: &mut PortalSession,
    renderer: &Renderer,
    line: &str,
    today: NaiveDate,
) -> Reply {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let verb = verb.to_ascii_lowercase();
    tracing::debug!(event_name = "portal.shell.command", verb = %verb, "shell command");

    let outcome = match verb.as_str() {
        "" => Ok(String::new()),
        "help" | "?" => Ok(HELP.to_string()),
        "quit" | "exit" => return Reply { output: "bye".to_string(), quit: true },
        "nav" | "go" => navigate(session, renderer, rest),
        "search" => {
            session.set_query(rest);
            render_page(session, renderer)
        }
        "filter" => required(rest, "filter <status|all>")
            .and_then(|raw| session.set_status_filter(raw).map_err(ApplicationError::from))
            .and_then(|_| render_page(session, renderer)),
        "sort" => required(rest, "sort <id|title|date|amount|status>")
            .and_then(|raw| raw.parse::<SortKey>().map_err(ApplicationError::from))
            .and_then(|key| {
                session.select_sort(key);
                render_page(session, renderer)
            }),
        "show" => show(session, renderer),
        "confirm" => required(rest, "confirm <po-id>")
            .and_then(|id| session.confirm_order(id).map_err(ApplicationError::from))
            .and_then(|()| render_notes(session, renderer)),
        "invoice" => required(rest, "invoice <po-id>")
            .and_then(|id| session.request_invoice(id).map_err(ApplicationError::from))
            .and_then(|()| renderer.modal(session)),
        "sign" => required(rest, "sign <agreement-id>")
            .and_then(|id| session.request_signature(id).map_err(ApplicationError::from))
            .and_then(|()| renderer.modal(session)),
        "download" => required(rest, "download <id>")
            .and_then(|id| session.download(id).map_err(ApplicationError::from))
            .and_then(|()| render_notes(session, renderer)),
        "profile" => {
            session.open_profile();
            renderer.modal(session)
        }
        "ack" | "unack" => session
            .acknowledge(verb == "ack")
            .map_err(ApplicationError::from)
            .and_then(|()| renderer.modal(session)),
        "submit" => submit(session, renderer, today),
        "cancel" => {
            session.cancel_modal();
            Ok("dialog closed".to_string())
        }
        "open" => open_task(session, renderer, rest),
        "notes" => render_notes(session, renderer),
        other => Err(ApplicationError::Domain(DomainError::InvariantViolation(format!(
            "unknown command `{other}`; type `help`"
        )))),
    };

    match outcome {
        Ok(output) => Reply::say(output),
        Err(error) => Reply::say(format!("error: {error}")),
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, ApplicationError> {
    if rest.is_empty() {
        return Err(DomainError::InvariantViolation(format!("usage: {usage}")).into());
    }
    Ok(rest)
}

fn navigate(
    session: &mut PortalSession,
    renderer: &Renderer,
    rest: &str,
) -> Result<String, ApplicationError> {
    let page = required(rest, "nav <page>")?.parse::<Page>()?;
    session.navigate(page);
    render_page(session, renderer)
}

fn open_task(
    session: &mut PortalSession,
    renderer: &Renderer,
    rest: &str,
) -> Result<String, ApplicationError> {
    session.open_task(required(rest, "open <task-id>")?)?;
    Ok(format!("{}\n{}", render_page(session, renderer)?, render_notes(session, renderer)?))
}

fn show(session: &PortalSession, renderer: &Renderer) -> Result<String, ApplicationError> {
    let page = renderer.page(session)?;
    let modal = renderer.modal(session)?;
    if modal.is_empty() {
        Ok(page)
    } else {
        Ok(format!("{page}\n\n{modal}"))
    }
}

fn submit(
    session: &mut PortalSession,
    renderer: &Renderer,
    today: NaiveDate,
) -> Result<String, ApplicationError> {
    let head = match session.submit_modal(today)? {
        ModalOutcome::Closed => "dialog closed".to_string(),
        ModalOutcome::InvoiceIssued { invoice_id } => format!("issued {invoice_id}"),
        ModalOutcome::AgreementSigned { agreement_id } => format!("signed {agreement_id}"),
    };
    Ok(format!("{head}\n{}", render_notes(session, renderer)?))
}

fn render_page(session: &PortalSession, renderer: &Renderer) -> Result<String, ApplicationError> {
    renderer.page(session)
}

fn render_notes(session: &PortalSession, renderer: &Renderer) -> Result<String, ApplicationError> {
    let notes = renderer.notifications(session)?;
    if notes.trim().is_empty() {
        Ok("no notifications".to_string())
    } else {
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::NaiveDate;
    use tokio::io::{AsyncWriteExt, BufReader};
    use vendorly_core::{
        Clock, ManualClock, Page, PortalSession, PortalStore, PurchaseOrderStatus,
        SessionSettings, SystemClock,
    };

    use super::{drive, execute_line, TokioClock};
    use crate::render::Renderer;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).expect("date")
    }

    fn manual_session() -> (PortalSession, Renderer) {
        let session = PortalSession::new(
            PortalStore::seeded(),
            Arc::new(ManualClock::at(10_000)),
            SessionSettings::default(),
        );
        let renderer = Renderer::new(session.settings()).expect("renderer");
        (session, renderer)
    }

    #[test]
    fn invoice_flow_through_shell_commands() {
        let (mut session, renderer) = manual_session();

        let reply = execute_line(&mut session, &renderer, "invoice PO-2024-003", today());
        assert!(reply.output.contains("DIGITAL INVOICE ISSUANCE"), "{}", reply.output);

        let reply = execute_line(&mut session, &renderer, "submit", today());
        assert!(reply.output.starts_with("error:"), "{}", reply.output);
        assert!(session.modal().is_open());

        execute_line(&mut session, &renderer, "ack", today());
        let reply = execute_line(&mut session, &renderer, "submit", today());
        assert!(reply.output.starts_with("issued INV-24-"), "{}", reply.output);
        assert!(reply.output.contains("(ok) Invoice sent."), "{}", reply.output);

        let order = session.store().purchase_order("PO-2024-003").expect("seeded");
        assert_eq!(order.status, PurchaseOrderStatus::Completed);
        assert!(!reply.quit);
    }

    #[test]
    fn navigation_search_filter_and_sort() {
        let (mut session, renderer) = manual_session();

        execute_line(&mut session, &renderer, "nav orders", today());
        assert_eq!(session.page(), Page::Orders);

        execute_line(&mut session, &renderer, "filter new", today());
        execute_line(&mut session, &renderer, "sort amount", today());
        let reply = execute_line(&mut session, &renderer, "sort amount", today());
        assert!(reply.output.contains("sort amount desc"), "{}", reply.output);
        let first_row = reply
            .output
            .lines()
            .find(|line| line.trim_start().starts_with("PO-"))
            .expect("a row");
        assert!(first_row.contains("PO-2024-004"), "{first_row}");

        execute_line(&mut session, &renderer, "nav invoices", today());
        let reply = execute_line(&mut session, &renderer, "search inv-24-905", today());
        assert!(reply.output.contains("1 of 2 shown"), "{}", reply.output);
    }

    #[test]
    fn rejected_commands_are_reported_not_fatal() {
        let (mut session, renderer) = manual_session();

        let reply = execute_line(&mut session, &renderer, "confirm PO-2024-002", today());
        assert!(reply.output.starts_with("error: invalid purchase order transition"));
        assert!(!reply.quit);

        let reply = execute_line(&mut session, &renderer, "confirm", today());
        assert_eq!(reply.output, "error: domain invariant violation: usage: confirm <po-id>");

        let reply = execute_line(&mut session, &renderer, "frobnicate", today());
        assert!(reply.output.contains("unknown command `frobnicate`"));

        assert!(execute_line(&mut session, &renderer, "quit", today()).quit);
    }

    #[test]
    fn open_task_goes_to_owning_page() {
        let (mut session, renderer) = manual_session();

        let reply = execute_line(&mut session, &renderer, "open t-a-AGR-SW-005", today());
        assert_eq!(session.page(), Page::Agreements);
        assert!(reply.output.contains("Master Agreements"));
        assert!(reply.output.contains("(info) Opening document..."), "{}", reply.output);
    }

    #[test]
    fn download_acknowledges_rows_of_the_current_page() {
        let (mut session, renderer) = manual_session();

        execute_line(&mut session, &renderer, "nav invoices", today());
        let reply = execute_line(&mut session, &renderer, "download INV-24-901", today());
        assert!(reply.output.contains("(info) Downloading document..."), "{}", reply.output);

        let reply = execute_line(&mut session, &renderer, "download PO-2024-001", today());
        assert_eq!(reply.output, "error: invoice PO-2024-001 was not found");
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_starts_at_wall_time_and_follows_tokio_time() {
        let before = SystemClock.now_ms();
        let clock = TokioClock::new();
        let start = clock.now_ms();
        assert!(start >= before, "{start} < {before}");

        tokio::time::advance(Duration::from_millis(1_500)).await;
        assert_eq!(clock.now_ms(), start + 1_500);
    }

    #[tokio::test(start_paused = true)]
    async fn notifications_expire_while_waiting_for_input() {
        let mut session = PortalSession::new(
            PortalStore::seeded(),
            Arc::new(TokioClock::new()),
            SessionSettings::default(),
        );
        let renderer = Renderer::new(session.settings()).expect("renderer");
        let (mut input, stdin) = tokio::io::duplex(1024);

        let typist = tokio::spawn(async move {
            input.write_all(b"confirm PO-2024-001\nnotes\n").await.expect("write");
            tokio::time::sleep(Duration::from_millis(4_500)).await;
            input.write_all(b"notes\nquit\n").await.expect("write");
        });

        let mut output = Vec::new();
        let commands = drive(&mut session, &renderer, BufReader::new(stdin), &mut output)
            .await
            .expect("shell runs");
        typist.await.expect("typist finished");

        let output = String::from_utf8(output).expect("utf8");
        assert_eq!(commands, 4);
        assert!(output.contains("(ok) PO PO-2024-001 confirmed."), "{output}");
        assert!(output.contains("no notifications"), "{output}");
        assert!(session.notifications().is_empty());
    }
}
