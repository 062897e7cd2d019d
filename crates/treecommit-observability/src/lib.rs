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

//! treecommit observability
//!
//! Structured logging for the commit pipeline. Every crate in the workspace
//! logs through `tracing`; this crate decides where those events go.
//!
//! # Formats
//!
//! - **pretty**: multi-line, colored, for local runs
//! - **compact**: one line per event
//! - **json**: machine-readable, one object per line
//! - **actions**: GitHub workflow commands, so warnings and failures surface
//!   as annotations on the workflow run
//!
//! # Example
//!
//! ```ignore
//! use treecommit_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Pretty, None)?;
//! tracing::info!("Application started");
//! ```

pub mod actions;
pub mod config;
pub mod initialization;

pub use actions::WorkflowCommands;
pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};
