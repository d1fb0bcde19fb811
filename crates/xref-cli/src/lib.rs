//! # xref-cli — Command-Line Front End
//!
//! Provides the `xref` binary over the mapping and coverage engine.
//!
//! ## Subcommands
//!
//! - `xref index` / `xref detect`: embed a framework and find its
//!   cross-framework mappings.
//! - `xref pending` / `xref validate` / `xref link`: review queue,
//!   decisions and manually curated mappings.
//! - `xref answer` / `xref coverage` / `xref history` / `xref summary` /
//!   `xref compare`: audit answers and coverage reporting.
//! - `xref stats` / `xref equivalences`: mapping statistics.
//! - `xref prune-embeddings`: drop vectors of deleted requirements.
//!
//! ## State
//!
//! ```bash
//! xref --fixture state.json detect ISO27001   # JSON file, written back
//! DATABASE_URL=postgres://… xref detect ISO27001
//! xref detect ISO27001                        # in-memory, discarded
//! ```
//!
//! Output is JSON on stdout; logs go to stderr.

pub mod app;
pub mod commands;
pub mod fixture;
pub mod logging;
