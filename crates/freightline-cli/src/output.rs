use std::io::Write;

use freightline_core::{ApiErrorResponse, RateError};
use serde::Serialize;

use crate::error::CliError;

pub fn render<T: Serialize>(body: &T, pretty: bool) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(body)?
    } else {
        serde_json::to_string(body)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}

pub fn render_error(error: &RateError, pretty: bool) -> Result<(), CliError> {
    render(&ApiErrorResponse::from(error), pretty)
}
