//! Execution tracer: run a Python script under instrumentation.
//!
//! Three instruments combine freely: call/return tracing, attribute
//! watchpoints, module coverage. The script runs with `__main__` semantics
//! under the hook bootstrap; the raw stream it leaves behind is folded into
//! the event log by [`session::TraceSession`] once the interpreter exits.

pub mod bootstrap;
pub mod session;
pub mod watch;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde::Serialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::progress;
use crate::trace;

use session::{RawEvent, TraceSession};
use watch::{parse_watch_list, script_stem};

/// Default event-log file name, written to the current directory.
pub const DEFAULT_TRACE_FILE: &str = "callscope_trace.json";

/// Environment variable overriding the Python interpreter (default `python3`).
pub const PYTHON_ENV: &str = "CALLSCOPE_PYTHON";

/// What to run and which instruments to arm.
#[derive(Clone, Debug, Default)]
pub struct RunConfig {
    pub script: PathBuf,
    pub trace: bool,
    pub watch: Vec<String>,
    pub coverage: bool,
    pub output: Option<PathBuf>,
}

/// Post-run summary. Fields are present only when the matching instrument
/// was armed and its output materialized.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,
}

/// Run `config.script` under the requested instruments and write the event
/// log. Target exceptions are diagnosed by the bootstrap and never abort the
/// tracer; hook tear-down runs in its `finally` on every exit path.
pub fn run_script(config: &RunConfig) -> Result<RunSummary> {
    let script = fs::canonicalize(&config.script).unwrap_or_else(|_| config.script.clone());
    let specs = parse_watch_list(&config.watch);
    let stem = script_stem(&script);

    let staging = tempfile::tempdir().map_err(|e| Error::TraceIo {
        path: env::temp_dir(),
        source: e,
    })?;
    let bootstrap_path = staging.path().join("callscope_bootstrap.py");
    let events_path = staging.path().join("raw_events.jsonl");
    fs::write(&bootstrap_path, bootstrap::PYTHON_BOOTSTRAP).map_err(|e| Error::TraceIo {
        path: bootstrap_path.clone(),
        source: e,
    })?;

    let watch_table: Vec<serde_json::Value> = specs
        .iter()
        .map(|spec| {
            json!({
                "aliases": [spec.module],
                "class": spec.class_name,
                "attr": spec.attribute,
                "main_alias": spec.module == stem,
            })
        })
        .collect();
    let bootstrap_config = json!({
        "script": script.to_string_lossy(),
        "trace": config.trace,
        "coverage": config.coverage,
        "events": events_path.to_string_lossy(),
        "watches": watch_table,
    });

    let interpreter = env::var(PYTHON_ENV).unwrap_or_else(|_| "python3".to_string());
    let status = Command::new(&interpreter)
        .arg(&bootstrap_path)
        .env(bootstrap::CONFIG_ENV, bootstrap_config.to_string())
        .status()
        .map_err(|e| Error::Interpreter {
            interpreter: interpreter.clone(),
            source: e,
        })?;
    if !status.success() {
        progress::warn(&format!("target exited with {}", status));
    }

    let mut session = TraceSession::new(
        config.trace,
        config.coverage,
        specs.iter().map(|s| s.target()).collect(),
    );
    if let Ok(raw) = fs::read_to_string(&events_path) {
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            // A line cut short by an abnormal exit is dropped, not fatal.
            if let Ok(event) = serde_json::from_str::<RawEvent>(line) {
                session.observe(event);
            }
        }
    }
    let output = session.finish();

    let mut summary = RunSummary::default();
    if config.coverage {
        summary.modules = Some(output.modules);
    }
    if config.trace || !specs.is_empty() {
        let out_path = config
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRACE_FILE));
        match trace::save_events(&out_path, &output.events) {
            Ok(()) => {
                summary.trace_file = Some(out_path.to_string_lossy().to_string());
                summary.event_count = Some(output.events.len());
            }
            Err(err) => progress::fail(&err.to_string()),
        }
    }
    Ok(summary)
}
