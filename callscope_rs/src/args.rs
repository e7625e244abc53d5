//! Command-line argument parsing.
//!
//! Hand-rolled on purpose: the surface is small and the error messages stay
//! exact. `parse_from` is separated from `parse_args` so tests can drive it
//! without an OS process.

use std::path::PathBuf;

/// Everything the CLI can be asked to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `index <path> [-o FILE]`
    Index {
        path: PathBuf,
        output: Option<PathBuf>,
    },
    /// `query callers <function> [...]`
    Callers {
        function: String,
        index: Option<PathBuf>,
        project: PathBuf,
        max_depth: usize,
        limit: usize,
    },
    /// `query callees <function> [...]`
    Callees {
        function: String,
        index: Option<PathBuf>,
        project: PathBuf,
        transitive: bool,
    },
    /// `query find-path --from A --to B [...]`
    FindPath {
        source: String,
        target: String,
        index: Option<PathBuf>,
        project: PathBuf,
        limit: usize,
        max_depth: usize,
    },
    /// `query history <target> [--file FILE]`
    History {
        target: String,
        file: Option<PathBuf>,
    },
    /// `query trace-search [FILE] [--file FILE] [--contains PAT] [--event PAT] [--type T]`
    TraceSearch {
        file: Option<PathBuf>,
        pattern: Option<String>,
        event_type: Option<String>,
    },
    /// `run [--trace] [--watch SPEC]... [--coverage] [-o FILE] <script>`
    Run {
        script: PathBuf,
        trace: bool,
        watch: Vec<String>,
        coverage: bool,
        output: Option<PathBuf>,
    },
    /// `diff <trace1> <trace2>`
    Diff { trace1: PathBuf, trace2: PathBuf },
    /// `report <trace> [--coverage] [--top N]`
    Report {
        trace: PathBuf,
        coverage: bool,
        top: usize,
    },
    /// Legacy top-level synonyms, kept for muscle memory.
    LegacyCallers { function: String },
    LegacyCallees { function: String },
    LegacyFindPath { source: String, target: String },
    LegacyHistory { arg1: String, arg2: Option<String> },
    Help,
    Version,
}

#[derive(Clone, Debug)]
pub struct ParsedArgs {
    pub json: bool,
    pub command: Command,
}

pub fn parse_args() -> Result<ParsedArgs, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    parse_from(&args)
}

struct Tokens<'a> {
    items: &'a [String],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn next(&mut self) -> Option<&'a str> {
        let item = self.items.get(self.pos)?;
        self.pos += 1;
        Some(item.as_str())
    }

    fn value_for(&mut self, flag: &str) -> Result<String, String> {
        self.next()
            .map(str::to_string)
            .ok_or_else(|| format!("{} requires a value", flag))
    }
}

fn parse_count(flag: &str, raw: &str) -> Result<usize, String> {
    raw.parse::<usize>()
        .map_err(|_| format!("{} expects a number, got '{}'", flag, raw))
}

pub fn parse_from(args: &[String]) -> Result<ParsedArgs, String> {
    let mut tokens = Tokens {
        items: args,
        pos: 0,
    };
    let mut json = false;

    let command = loop {
        let token = match tokens.next() {
            Some(token) => token,
            None => break Command::Help,
        };
        match token {
            "--json" => json = true,
            "--help" | "-h" => break Command::Help,
            "--version" | "-V" => break Command::Version,
            "index" => break parse_index(&mut tokens)?,
            "query" => break parse_query(&mut tokens)?,
            "run" => break parse_run(&mut tokens)?,
            "diff" => break parse_diff(&mut tokens)?,
            "report" => break parse_report(&mut tokens)?,
            "callers" => {
                let function = tokens.value_for("callers")?;
                break Command::LegacyCallers { function };
            }
            "callees" => {
                let function = tokens.value_for("callees")?;
                break Command::LegacyCallees { function };
            }
            "findpath" => {
                let source = tokens.value_for("findpath")?;
                let target = tokens.value_for("findpath")?;
                break Command::LegacyFindPath { source, target };
            }
            "history" => {
                let arg1 = tokens.value_for("history")?;
                let arg2 = tokens.next().map(str::to_string);
                break Command::LegacyHistory { arg1, arg2 };
            }
            other => return Err(format!("Unknown command '{}'. Try --help.", other)),
        }
    };

    Ok(ParsedArgs { json, command })
}

fn parse_index(tokens: &mut Tokens) -> Result<Command, String> {
    let mut path: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    while let Some(token) = tokens.next() {
        match token {
            "-o" | "--output" => output = Some(PathBuf::from(tokens.value_for(token)?)),
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown index option '{}'", flag))
            }
            positional => path = Some(PathBuf::from(positional)),
        }
    }
    Ok(Command::Index {
        path: path.unwrap_or_else(|| PathBuf::from(".")),
        output,
    })
}

fn parse_query(tokens: &mut Tokens) -> Result<Command, String> {
    let sub = tokens
        .next()
        .ok_or_else(|| "query requires a sub-command".to_string())?;
    match sub {
        "callers" => {
            let mut function: Option<String> = None;
            let mut index: Option<PathBuf> = None;
            let mut project = PathBuf::from(".");
            let mut max_depth = 64usize;
            let mut limit = 200usize;
            while let Some(token) = tokens.next() {
                match token {
                    "--index" => index = Some(PathBuf::from(tokens.value_for(token)?)),
                    "--project" => project = PathBuf::from(tokens.value_for(token)?),
                    "--max-depth" => max_depth = parse_count(token, &tokens.value_for(token)?)?,
                    "--limit" => limit = parse_count(token, &tokens.value_for(token)?)?,
                    flag if flag.starts_with('-') => {
                        return Err(format!("Unknown callers option '{}'", flag))
                    }
                    positional => function = Some(positional.to_string()),
                }
            }
            let function = function.ok_or_else(|| "query callers requires a function".to_string())?;
            Ok(Command::Callers {
                function,
                index,
                project,
                max_depth,
                limit,
            })
        }
        "callees" => {
            let mut function: Option<String> = None;
            let mut index: Option<PathBuf> = None;
            let mut project = PathBuf::from(".");
            let mut transitive = false;
            while let Some(token) = tokens.next() {
                match token {
                    "--index" => index = Some(PathBuf::from(tokens.value_for(token)?)),
                    "--project" => project = PathBuf::from(tokens.value_for(token)?),
                    "--transitive" => transitive = true,
                    flag if flag.starts_with('-') => {
                        return Err(format!("Unknown callees option '{}'", flag))
                    }
                    positional => function = Some(positional.to_string()),
                }
            }
            let function = function.ok_or_else(|| "query callees requires a function".to_string())?;
            Ok(Command::Callees {
                function,
                index,
                project,
                transitive,
            })
        }
        "find-path" => {
            let mut source: Option<String> = None;
            let mut target: Option<String> = None;
            let mut index: Option<PathBuf> = None;
            let mut project = PathBuf::from(".");
            let mut limit = 50usize;
            let mut max_depth = 32usize;
            while let Some(token) = tokens.next() {
                match token {
                    "--from" => source = Some(tokens.value_for(token)?),
                    "--to" => target = Some(tokens.value_for(token)?),
                    "--index" => index = Some(PathBuf::from(tokens.value_for(token)?)),
                    "--project" => project = PathBuf::from(tokens.value_for(token)?),
                    "--limit" => limit = parse_count(token, &tokens.value_for(token)?)?,
                    "--max-depth" => max_depth = parse_count(token, &tokens.value_for(token)?)?,
                    other => return Err(format!("Unknown find-path option '{}'", other)),
                }
            }
            let source = source.ok_or_else(|| "find-path requires --from".to_string())?;
            let target = target.ok_or_else(|| "find-path requires --to".to_string())?;
            Ok(Command::FindPath {
                source,
                target,
                index,
                project,
                limit,
                max_depth,
            })
        }
        "history" => {
            let mut target: Option<String> = None;
            let mut file: Option<PathBuf> = None;
            while let Some(token) = tokens.next() {
                match token {
                    "--file" => file = Some(PathBuf::from(tokens.value_for(token)?)),
                    flag if flag.starts_with('-') => {
                        return Err(format!("Unknown history option '{}'", flag))
                    }
                    positional => target = Some(positional.to_string()),
                }
            }
            let target = target.ok_or_else(|| "query history requires a target".to_string())?;
            Ok(Command::History { target, file })
        }
        "trace-search" => {
            let mut file: Option<PathBuf> = None;
            let mut pattern: Option<String> = None;
            let mut event_type: Option<String> = None;
            while let Some(token) = tokens.next() {
                match token {
                    "--file" => file = Some(PathBuf::from(tokens.value_for(token)?)),
                    "--contains" | "--event" => pattern = Some(tokens.value_for(token)?),
                    "--type" => event_type = Some(tokens.value_for(token)?),
                    flag if flag.starts_with('-') => {
                        return Err(format!("Unknown trace-search option '{}'", flag))
                    }
                    positional => file = Some(PathBuf::from(positional)),
                }
            }
            Ok(Command::TraceSearch {
                file,
                pattern,
                event_type,
            })
        }
        other => Err(format!("Unknown query sub-command '{}'", other)),
    }
}

fn parse_run(tokens: &mut Tokens) -> Result<Command, String> {
    let mut script: Option<PathBuf> = None;
    let mut trace = false;
    let mut watch = Vec::new();
    let mut coverage = false;
    let mut output: Option<PathBuf> = None;
    while let Some(token) = tokens.next() {
        match token {
            "--trace" => trace = true,
            "--coverage" => coverage = true,
            "--watch" => watch.push(tokens.value_for(token)?),
            "-o" | "--output" => output = Some(PathBuf::from(tokens.value_for(token)?)),
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown run option '{}'", flag))
            }
            positional => script = Some(PathBuf::from(positional)),
        }
    }
    let script = script.ok_or_else(|| "run requires a script path".to_string())?;
    Ok(Command::Run {
        script,
        trace,
        watch,
        coverage,
        output,
    })
}

fn parse_diff(tokens: &mut Tokens) -> Result<Command, String> {
    let trace1 = PathBuf::from(tokens.value_for("diff")?);
    let trace2 = PathBuf::from(tokens.value_for("diff")?);
    Ok(Command::Diff { trace1, trace2 })
}

fn parse_report(tokens: &mut Tokens) -> Result<Command, String> {
    let mut trace: Option<PathBuf> = None;
    let mut coverage = false;
    let mut top = 0usize;
    while let Some(token) = tokens.next() {
        match token {
            "--coverage" => coverage = true,
            "--top" => top = parse_count(token, &tokens.value_for(token)?)?,
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown report option '{}'", flag))
            }
            positional => trace = Some(PathBuf::from(positional)),
        }
    }
    let trace = trace.ok_or_else(|| "report requires a trace file".to_string())?;
    Ok(Command::Report {
        trace,
        coverage,
        top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ParsedArgs {
        let owned: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        parse_from(&owned).expect("parse")
    }

    #[test]
    fn json_flag_is_global() {
        let parsed = parse(&["--json", "index", "proj"]);
        assert!(parsed.json);
        assert_eq!(
            parsed.command,
            Command::Index {
                path: PathBuf::from("proj"),
                output: None,
            }
        );
    }

    #[test]
    fn callers_defaults() {
        let parsed = parse(&["query", "callers", "pkg.a.a1"]);
        match parsed.command {
            Command::Callers {
                function,
                max_depth,
                limit,
                ..
            } => {
                assert_eq!(function, "pkg.a.a1");
                assert_eq!(max_depth, 64);
                assert_eq!(limit, 200);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn find_path_requires_endpoints() {
        let owned: Vec<String> = ["query", "find-path", "--from", "a"]
            .iter()
            .map(|a| a.to_string())
            .collect();
        assert!(parse_from(&owned).is_err());
    }

    #[test]
    fn run_accumulates_watches() {
        let parsed = parse(&[
            "run", "--trace", "--watch", "demo.User.age", "--watch", "demo.User.name", "-o",
            "t.json", "demo.py",
        ]);
        match parsed.command {
            Command::Run {
                script,
                trace,
                watch,
                coverage,
                output,
            } => {
                assert_eq!(script, PathBuf::from("demo.py"));
                assert!(trace);
                assert!(!coverage);
                assert_eq!(watch, vec!["demo.User.age", "demo.User.name"]);
                assert_eq!(output, Some(PathBuf::from("t.json")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn trace_search_accepts_positional_or_flag_file() {
        let positional = parse(&["query", "trace-search", "t.json", "--contains", "Person"]);
        let flagged = parse(&["query", "trace-search", "--file", "t.json", "--event", "Person"]);
        for parsed in [positional, flagged] {
            match parsed.command {
                Command::TraceSearch { file, pattern, .. } => {
                    assert_eq!(file, Some(PathBuf::from("t.json")));
                    assert_eq!(pattern.as_deref(), Some("Person"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn legacy_history_takes_one_or_two_args() {
        let one = parse(&["history", "demo.User.age"]);
        assert_eq!(
            one.command,
            Command::LegacyHistory {
                arg1: "demo.User.age".to_string(),
                arg2: None,
            }
        );
        let two = parse(&["history", "t.json", "demo.User.age"]);
        assert_eq!(
            two.command,
            Command::LegacyHistory {
                arg1: "t.json".to_string(),
                arg2: Some("demo.User.age".to_string()),
            }
        );
    }

    #[test]
    fn unknown_command_errors() {
        let owned = vec!["frobnicate".to_string()];
        assert!(parse_from(&owned).is_err());
    }
}
