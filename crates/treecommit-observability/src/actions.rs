// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! GitHub Actions workflow-command event formatter.
//!
//! The Actions runner scans step output for lines of the form
//! `::error::message` and turns them into annotations. This formatter maps
//! tracing levels onto those commands so the binary's diagnostics show up
//! natively in the workflow UI:
//!
//! | level | output |
//! |-------|--------|
//! | ERROR | `::error::…` |
//! | WARN  | `::warning::…` |
//! | INFO  | plain line |
//! | DEBUG / TRACE | `::debug::…` (shown only with step debug logging) |

use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Event formatter emitting GitHub workflow commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowCommands;

impl<S, N> FormatEvent<S, N> for WorkflowCommands
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = String::new();
        ctx.field_format()
            .format_fields(format::Writer::new(&mut message), event)?;

        match command_for(event.metadata().level()) {
            Some(command) => writeln!(writer, "::{}::{}", command, escape_data(&message)),
            None => writeln!(writer, "{}", message),
        }
    }
}

/// Workflow command used for a level; `None` means a plain output line.
pub fn command_for(level: &Level) -> Option<&'static str> {
    match *level {
        Level::ERROR => Some("error"),
        Level::WARN => Some("warning"),
        Level::INFO => None,
        _ => Some("debug"),
    }
}

/// Escape command data so a multi-line message stays a single command.
pub fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
