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

//! # treecommit Test Utilities
//!
//! Shared test utilities for treecommit crates providing:
//! - An in-memory object store with call recording and failure injection
//! - Temporary workspaces to commit files from
//! - CLI command helpers for testing the treecommit binary

pub mod cli;
pub mod memory;
pub mod workspace;

// Re-export commonly used items at crate root
pub use cli::{treecommit, treecommit_in};
pub use memory::{FailOn, MemoryObjectStore, StoreCall, StoredCommit};
pub use workspace::TestWorkspace;
