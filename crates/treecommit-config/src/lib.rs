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

//! Configuration for treecommit runs
//!
//! A run is described by a handful of inputs (which files, which
//! repository and reference, what commit message) plus transport and logging
//! settings. They can come from three places, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. an optional TOML, YAML or JSON file
//! 3. the environment, following GitHub Actions conventions
//!    (`INPUT_FILES`, `INPUT_COMMIT-MESSAGE`, `GITHUB_REPOSITORY`, ...)
//!
//! # Example
//!
//! ```no_run
//! use treecommit_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().load_with_overrides(None).await?;
//!     println!("Committing to {}", config.require_repository()?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{parse_input_bool, ConfigFormat, ConfigLoader};
pub use schema::*;
pub use validation::Validator;
