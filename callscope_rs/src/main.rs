mod analyzer;
mod args;
mod commands;
mod error;
mod index;
mod progress;
mod query;
mod resolve;
mod runner;
mod scan;
mod trace;

use std::panic;

use args::{parse_args, Command};

fn install_broken_pipe_handler() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let is_broken = payload
            .downcast_ref::<&str>()
            .is_some_and(|s| s.contains("Broken pipe"))
            || payload
                .downcast_ref::<String>()
                .is_some_and(|s| s.contains("Broken pipe"));

        if is_broken {
            // Quietly exit when downstream closes the pipe (e.g. piping to `head`).
            std::process::exit(0);
        }

        default_hook(info);
    }));
}

fn format_usage() -> &'static str {
    "callscope - call-graph indexing and execution tracing for Python projects\n\n\
Usage: callscope [--json] <command> [options]\n\n\
Commands:\n  \
  index <path> [-o FILE]                 Build a static call-graph index\n  \
  query callers <fn> [opts]              Who calls <fn> (full chains to roots)\n  \
  query callees <fn> [--transitive]      What <fn> calls\n  \
  query find-path --from A --to B        Call paths between two functions\n  \
  query history <target> [--file F]      Watched-attribute assignment history\n  \
  query trace-search [F] --contains P    Search events in a trace\n  \
  run [--trace] [--watch M.C.attr]...\n      [--coverage] [-o FILE] <script>    Run a script under instrumentation\n  \
  diff <trace1> <trace2>                 Structural diff of two traces\n  \
  report <trace> --coverage [--top N]    Rank modules by call count\n\n\
Query options:\n  \
  --index FILE              Saved index (default: ./.callscope_index.json)\n  \
  --project PATH            Root to index in memory when none is saved\n  \
  --max-depth N             Depth bound for callers/find-path walks\n  \
  --limit N                 Cap on returned chains/paths\n\n\
Legacy synonyms:\n  \
  callers <fn> | callees <fn> | findpath <src> <dst> | history [file] <target>\n\n\
Common:\n  \
  --json                    JSON output where applicable\n  \
  --help, -h                Show this message\n  \
  --version, -V             Show version\n\n\
Examples:\n  \
  callscope index . -o .callscope_index.json\n  \
  callscope --json query callers billing.invoice.total\n  \
  callscope run --trace --watch demo.User.age -o trace.json lab/demo.py\n  \
  callscope diff trace_v1.json trace_v2.json\n"
}

fn main() {
    install_broken_pipe_handler();

    let parsed = match parse_args() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    match parsed.command {
        Command::Help => {
            println!("{}", format_usage());
        }
        Command::Version => {
            println!("callscope {}", env!("CARGO_PKG_VERSION"));
        }
        command => {
            if let Err(err) = commands::dispatch(command, parsed.json) {
                progress::fail(&err.to_string());
                std::process::exit(1);
            }
        }
    }
}
