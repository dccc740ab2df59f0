use super::{open_session, renderer, CommandResult};
use crate::render::DashboardReport;

pub fn run(json: bool) -> CommandResult {
    let (_, session) = match open_session("dashboard") {
        Ok(opened) => opened,
        Err(failure) => return failure,
    };

    let report = DashboardReport::from_session(&session);
    if json {
        return CommandResult::report("dashboard", &report);
    }

    let renderer = match renderer("dashboard", &session) {
        Ok(renderer) => renderer,
        Err(failure) => return failure,
    };
    match renderer.dashboard(&report) {
        Ok(text) => CommandResult::text(text),
        Err(error) => CommandResult::application_failure("dashboard", error),
    }
}
