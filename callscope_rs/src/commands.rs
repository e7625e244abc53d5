//! CLI command handlers: thin glue between parsed arguments and the core.
//!
//! Structured results print as pretty JSON (with or without `--json`, as the
//! original surface did); prose answers honor the flag.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use crate::args::Command;
use crate::index::{build_index, Index, DEFAULT_INDEX_FILE};
use crate::progress;
use crate::query;
use crate::resolve::{resolve_symbol, Resolution};
use crate::runner::{self, RunConfig, DEFAULT_TRACE_FILE};
use crate::trace;

pub fn dispatch(command: Command, json: bool) -> Result<()> {
    match command {
        Command::Index { path, output } => handle_index(&path, output, json),
        Command::Callers {
            function,
            index,
            project,
            max_depth,
            limit,
        } => handle_callers(&function, index.as_deref(), &project, max_depth, limit, json),
        Command::Callees {
            function,
            index,
            project,
            transitive,
        } => handle_callees(&function, index.as_deref(), &project, transitive, json),
        Command::FindPath {
            source,
            target,
            index,
            project,
            limit,
            max_depth,
        } => handle_find_path(
            &source,
            &target,
            index.as_deref(),
            &project,
            limit,
            max_depth,
            json,
        ),
        Command::History { target, file } => handle_history(&target, file, json),
        Command::TraceSearch {
            file,
            pattern,
            event_type,
        } => handle_trace_search(file, pattern.as_deref(), event_type.as_deref(), json),
        Command::Run {
            script,
            trace,
            watch,
            coverage,
            output,
        } => handle_run(script, trace, watch, coverage, output),
        Command::Diff { trace1, trace2 } => handle_diff(&trace1, &trace2),
        Command::Report {
            trace,
            coverage,
            top,
        } => handle_report(&trace, coverage, top),
        Command::LegacyCallers { function } => {
            handle_callers(&function, None, Path::new("."), 64, 200, false)
        }
        Command::LegacyCallees { function } => {
            handle_callees(&function, None, Path::new("."), false, false)
        }
        Command::LegacyFindPath { source, target } => {
            handle_find_path(&source, &target, None, Path::new("."), 1, 64, false)
        }
        Command::LegacyHistory { arg1, arg2 } => match arg2 {
            Some(target) => handle_history(&target, Some(PathBuf::from(arg1)), false),
            None => handle_history(&arg1, None, false),
        },
        // Help and Version are answered in main before dispatch.
        Command::Help | Command::Version => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(err) => progress::fail(&format!("could not render output: {}", err)),
    }
}

/// Try the hint, then the working directory's default index, then build one
/// in memory from the project root (without persisting).
fn load_or_build_index(hint: Option<&Path>, project: &Path) -> Result<Index> {
    if let Some(hint) = hint {
        if hint.is_file() {
            return Ok(Index::load(hint)?);
        }
    }
    let default = env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DEFAULT_INDEX_FILE);
    if default.is_file() {
        return Ok(Index::load(&default)?);
    }
    Ok(build_index(project))
}

/// Resolve a symbol, printing the ambiguity listing when there is one.
/// Returns `None` when the caller should stop.
fn resolve_or_report(index: &Index, input: &str, role: &str, json: bool) -> Option<String> {
    match resolve_symbol(index, input) {
        Resolution::Ambiguous(candidates) => {
            if json {
                print_json(&json!({
                    "error": "ambiguous",
                    "input": input,
                    "candidates": candidates,
                }));
            } else {
                println!("Ambiguous {} '{}'. Did you mean:", role, input);
                for candidate in &candidates {
                    println!(" - {}", candidate);
                }
            }
            None
        }
        Resolution::Resolved(name) | Resolution::Unknown(name) => Some(name),
    }
}

fn handle_index(path: &Path, output: Option<PathBuf>, json: bool) -> Result<()> {
    let output = output.unwrap_or_else(|| path.join(DEFAULT_INDEX_FILE));
    let status = if json {
        None
    } else {
        Some(progress::StatusLine::start(&format!(
            "Indexing {}",
            path.display()
        )))
    };
    let index = build_index(path);
    let saved = index.save(&output);
    if let Some(status) = status {
        match &saved {
            Ok(()) => status.done(&format!(
                "Indexed {} functions, {} edges",
                index.functions.len(),
                index.edges.len()
            )),
            Err(_) => status.discard(),
        }
    }
    saved?;

    print_json(&json!({
        "project": path.to_string_lossy(),
        "functions": index.functions.len(),
        "edges": index.edges.len(),
        "index_file": output.to_string_lossy(),
    }));
    Ok(())
}

fn handle_callers(
    function: &str,
    index_hint: Option<&Path>,
    project: &Path,
    max_depth: usize,
    limit: usize,
    json: bool,
) -> Result<()> {
    let index = load_or_build_index(index_hint, project)?;
    let target = match resolve_or_report(&index, function, "function", json) {
        Some(target) => target,
        None => return Ok(()),
    };

    let maps = query::build_call_maps(&index);
    let chains = query::caller_chains(&maps, &target, max_depth, limit);
    if json {
        print_json(&json!({
            "target": function,
            "resolved": target,
            "chains": chains,
        }));
        return Ok(());
    }
    if target != function {
        println!("(Resolved '{}' -> '{}')", function, target);
    }
    if chains.is_empty() {
        println!("No callers found for {}.", target);
    } else {
        println!("{} is called by:", target);
        for chain in &chains {
            println!(" - {}", chain.join(" -> "));
        }
    }
    Ok(())
}

fn handle_callees(
    function: &str,
    index_hint: Option<&Path>,
    project: &Path,
    transitive: bool,
    json: bool,
) -> Result<()> {
    let index = load_or_build_index(index_hint, project)?;
    let target = match resolve_or_report(&index, function, "function", json) {
        Some(target) => target,
        None => return Ok(()),
    };

    let maps = query::build_call_maps(&index);
    let callees = if transitive {
        query::transitive_callees(&maps, &target, 64)
    } else {
        query::direct_callees(&maps, &target)
    };
    if json {
        print_json(&json!({
            "target": function,
            "resolved": target,
            "callees": callees,
            "transitive": transitive,
        }));
        return Ok(());
    }
    if target != function {
        println!("(Resolved '{}' -> '{}')", function, target);
    }
    if callees.is_empty() {
        if transitive {
            println!("No transitive callees found for {}.", target);
        } else {
            println!("{} does not call any other functions directly.", target);
        }
    } else {
        let header = if transitive {
            "transitively calls"
        } else {
            "directly calls"
        };
        println!("{} {}:", target, header);
        for callee in &callees {
            println!(" - {}", callee);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_find_path(
    source: &str,
    target: &str,
    index_hint: Option<&Path>,
    project: &Path,
    limit: usize,
    max_depth: usize,
    json: bool,
) -> Result<()> {
    let index = load_or_build_index(index_hint, project)?;
    let src_res = resolve_symbol(&index, source);
    let dst_res = resolve_symbol(&index, target);
    let src_candidates = match &src_res {
        Resolution::Ambiguous(candidates) => Some(candidates.clone()),
        _ => None,
    };
    let dst_candidates = match &dst_res {
        Resolution::Ambiguous(candidates) => Some(candidates.clone()),
        _ => None,
    };
    if src_candidates.is_some() || dst_candidates.is_some() {
        if json {
            print_json(&json!({
                "error": "ambiguous",
                "from_input": source,
                "from_candidates": src_candidates,
                "to_input": target,
                "to_candidates": dst_candidates,
            }));
        } else {
            if let Some(candidates) = &src_candidates {
                println!("Ambiguous source '{}'. Did you mean:", source);
                for candidate in candidates {
                    println!(" - {}", candidate);
                }
            }
            if let Some(candidates) = &dst_candidates {
                println!("Ambiguous target '{}'. Did you mean:", target);
                for candidate in candidates {
                    println!(" - {}", candidate);
                }
            }
        }
        return Ok(());
    }
    let (src, dst) = match (src_res.name(), dst_res.name()) {
        (Some(src), Some(dst)) => (src.to_string(), dst.to_string()),
        _ => return Ok(()),
    };

    let maps = query::build_call_maps(&index);
    let paths = query::find_paths(&maps, &src, &dst, limit, max_depth);
    if json {
        print_json(&json!({
            "source": source,
            "source_resolved": src,
            "target": target,
            "target_resolved": dst,
            "paths": paths,
        }));
        return Ok(());
    }
    if src != source || dst != target {
        println!(
            "(Resolved '--from {}' -> '{}', '--to {}' -> '{}')",
            source, src, target, dst
        );
    }
    if paths.is_empty() {
        println!("No call path found from {} to {}.", src, dst);
    } else {
        println!("Found {} path(s):", paths.len());
        for path in &paths {
            println!(" - {}", path.join(" -> "));
        }
    }
    Ok(())
}

fn default_trace_path() -> PathBuf {
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DEFAULT_TRACE_FILE)
}

fn handle_history(target: &str, file: Option<PathBuf>, json: bool) -> Result<()> {
    let file = file.unwrap_or_else(default_trace_path);
    if !file.is_file() {
        println!("Trace file {} not found.", file.display());
        return Ok(());
    }
    let events = match trace::load_events(&file) {
        Ok(events) => events,
        Err(err) => {
            println!("Error reading trace: {}", err);
            return Ok(());
        }
    };
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let history = trace::watch_history(&events, target, &cwd);
    if json {
        print_json(&json!({ "target": target, "history": history }));
        return Ok(());
    }
    if history.is_empty() {
        println!("No assignments to {} were recorded in the trace.", target);
    } else {
        for entry in &history {
            let func_name = entry.func.rsplit('.').next().unwrap_or(&entry.func);
            println!(
                "{}:{} - {} set to {} (by {})",
                entry.file, entry.line, target, entry.value, func_name
            );
        }
    }
    Ok(())
}

fn handle_trace_search(
    file: Option<PathBuf>,
    pattern: Option<&str>,
    event_type: Option<&str>,
    json: bool,
) -> Result<()> {
    let file = file.unwrap_or_else(default_trace_path);
    if !file.is_file() {
        println!("Trace file {} not found.", file.display());
        return Ok(());
    }
    let pattern = match pattern {
        Some(pattern) => pattern,
        None => {
            println!("You must supply a search pattern via --contains or --event.");
            return Ok(());
        }
    };

    let events = trace::load_events(&file)?;
    let matches = trace::search_events(&events, pattern, event_type);
    if json {
        print_json(&json!({
            "file": file.to_string_lossy(),
            "pattern": pattern,
            "type": event_type,
            "matches": matches,
        }));
        return Ok(());
    }
    if matches.is_empty() {
        println!("No matching events found.");
    } else {
        println!("Found {} matching event(s):", matches.len());
        for m in &matches {
            let rendered = serde_json::to_string(&m.event).unwrap_or_default();
            println!("[{}] {}", m.index, rendered);
        }
    }
    Ok(())
}

fn handle_run(
    script: PathBuf,
    trace: bool,
    watch: Vec<String>,
    coverage: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = RunConfig {
        script,
        trace,
        watch,
        coverage,
        output,
    };
    let summary = runner::run_script(&config)?;
    print_json(&summary);
    Ok(())
}

fn handle_diff(trace1: &Path, trace2: &Path) -> Result<()> {
    let old = trace::load_events(trace1);
    let new = trace::load_events(trace2);
    let (old, new) = match (old, new) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(err), _) | (_, Err(err)) => {
            println!("Error diffing traces: {}", err);
            return Ok(());
        }
    };
    let diff = trace::diff_traces(&old, &new);
    print_json(&diff);
    Ok(())
}

fn handle_report(trace_file: &Path, coverage: bool, top: usize) -> Result<()> {
    if !trace_file.is_file() {
        println!("Trace file {} not found.", trace_file.display());
        return Ok(());
    }
    let events = trace::load_events(trace_file)?;
    if !coverage {
        print_json(&json!({ "info": "Use --coverage to list modules touched" }));
        return Ok(());
    }
    let ranked = trace::coverage_report(&events, top);
    print_json(&json!({ "modules_touched": ranked }));
    Ok(())
}
