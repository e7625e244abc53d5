//! # callscope
//!
//! Call-graph indexing and execution tracing for Python projects.
//!
//! Two analyses feed one query layer:
//!
//! - **Static**: parse a project's sources, extract declared functions and
//!   (caller, callee) edges, persist a queryable JSON index.
//! - **Dynamic**: run a script under instrumentation that records
//!   call/return events, attribute watchpoints, and module coverage.
//!
//! ## Library usage
//!
//! ```rust,no_run
//! use callscope::{index, query, resolve};
//! use std::path::Path;
//!
//! let idx = index::build_index(Path::new("."));
//! let maps = query::build_call_maps(&idx);
//! if let resolve::Resolution::Resolved(name) = resolve::resolve_symbol(&idx, "total") {
//!     let chains = query::caller_chains(&maps, &name, 64, 200);
//!     println!("{} chains", chains.len());
//! }
//! ```
//!
//! ## CLI usage
//!
//! ```bash
//! callscope index .                 # Write ./.callscope_index.json
//! callscope query callers total    # Who calls `total`, all the way up
//! callscope run --trace demo.py    # Trace one execution
//! callscope diff v1.json v2.json   # What changed between two runs
//! ```

/// Per-module AST analysis: declared functions and call edges.
pub mod analyzer;

/// Command-line argument parsing.
pub mod args;

/// CLI command handlers.
pub mod commands;

/// Error kinds surfaced by the core.
pub mod error;

/// Index building, persistence, and loading.
pub mod index;

/// Status output helpers.
pub mod progress;

/// Graph queries: callers, callees, path search.
pub mod query;

/// Short-name resolution against an index.
pub mod resolve;

/// Execution tracer (runner, session, watchpoints, bootstrap).
pub mod runner;

/// Project walking and module naming.
pub mod scan;

/// Event-log model, persistence, and trace analyzers.
pub mod trace;

pub use error::{Error, Result};
pub use index::{build_index, Index};
pub use query::{build_call_maps, CallMaps};
pub use resolve::{resolve_symbol, Resolution};
pub use runner::{run_script, RunConfig, RunSummary};
pub use trace::{diff_traces, Event, TraceDiff};
