//! End-to-end CLI tests over real temp projects and scripts.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

/// Get a command pointing to the callscope binary
fn callscope() -> Command {
    Command::cargo_bin("callscope").expect("callscope binary")
}

/// A tiny project with predictable call relationships.
///
/// Package: acmeproj
///   a.py: a1 -> b1, a2 -> b2, a3 -> helper_local
///   b.py: b1 -> c1, b2 (no calls)
///   c.py: c1()
///   f.py: shared()
///   g.py: shared()   (intentionally ambiguous symbol 'shared')
fn sample_project() -> TempDir {
    let tmp = TempDir::new().expect("tmp dir");
    let pkg = tmp.path().join("acmeproj");
    std::fs::create_dir_all(&pkg).expect("mkdir pkg");
    std::fs::write(pkg.join("__init__.py"), "# test package\n").expect("init");
    std::fs::write(pkg.join("c.py"), "def c1():\n    return 0\n").expect("c.py");
    std::fs::write(
        pkg.join("b.py"),
        "from .c import c1\ndef b1():\n    c1()\ndef b2():\n    pass\n",
    )
    .expect("b.py");
    std::fs::write(
        pkg.join("a.py"),
        "from .b import b1, b2\n\
         def a1():\n    b1()\n\
         def a2():\n    b2()\n\
         def helper_local():\n    return 42\n\
         def a3():\n    helper_local()\n",
    )
    .expect("a.py");
    std::fs::write(pkg.join("f.py"), "def shared():\n    pass\n").expect("f.py");
    std::fs::write(pkg.join("g.py"), "def shared():\n    return 1\n").expect("g.py");
    tmp
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("JSON stdout")
}

mod cli_basics {
    use super::*;

    #[test]
    fn shows_help() {
        callscope()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("callscope"))
            .stdout(predicate::str::contains("find-path"));
    }

    #[test]
    fn shows_version() {
        callscope()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn rejects_unknown_command() {
        callscope().arg("frobnicate").assert().failure();
    }
}

mod static_index {
    use super::*;

    #[test]
    fn index_and_queries_end_to_end() {
        let project = sample_project();
        let index_file = project.path().join("index.json");

        let output = callscope()
            .current_dir(project.path())
            .args(["--json", "index", "."])
            .arg("-o")
            .arg(&index_file)
            .output()
            .expect("run index");
        assert!(output.status.success());
        let out = stdout_json(&output.stdout);
        assert!(index_file.exists(), "index file not created");
        assert_eq!(out["functions"], 9);
        assert_eq!(out["edges"], 4);

        // Direct callees.
        let output = callscope()
            .current_dir(project.path())
            .args(["--json", "query", "callees", "acmeproj.a.a1", "--index"])
            .arg(&index_file)
            .output()
            .expect("run callees");
        let out = stdout_json(&output.stdout);
        assert_eq!(out["resolved"], "acmeproj.a.a1");
        let callees: Vec<String> =
            serde_json::from_value(out["callees"].clone()).expect("callees");
        assert!(callees.contains(&"acmeproj.b.b1".to_string()));

        // Transitive callees reach c1.
        let output = callscope()
            .current_dir(project.path())
            .args([
                "--json",
                "query",
                "callees",
                "acmeproj.a.a1",
                "--transitive",
                "--index",
            ])
            .arg(&index_file)
            .output()
            .expect("run transitive callees");
        let out = stdout_json(&output.stdout);
        let callees: Vec<String> =
            serde_json::from_value(out["callees"].clone()).expect("callees");
        assert!(callees.contains(&"acmeproj.b.b1".to_string()));
        assert!(callees.contains(&"acmeproj.c.c1".to_string()));

        // Caller chains end at the target.
        let output = callscope()
            .current_dir(project.path())
            .args(["--json", "query", "callers", "acmeproj.c.c1", "--index"])
            .arg(&index_file)
            .output()
            .expect("run callers");
        let out = stdout_json(&output.stdout);
        let chains: Vec<Vec<String>> =
            serde_json::from_value(out["chains"].clone()).expect("chains");
        assert!(chains.contains(&vec![
            "acmeproj.a.a1".to_string(),
            "acmeproj.b.b1".to_string(),
            "acmeproj.c.c1".to_string(),
        ]));

        // Path search with a suffix-resolved source.
        let output = callscope()
            .current_dir(project.path())
            .args([
                "--json",
                "query",
                "find-path",
                "--from",
                "a.a1",
                "--to",
                "acmeproj.c.c1",
                "--index",
            ])
            .arg(&index_file)
            .output()
            .expect("run find-path");
        let out = stdout_json(&output.stdout);
        assert_eq!(out["source_resolved"], "acmeproj.a.a1");
        let paths: Vec<Vec<String>> =
            serde_json::from_value(out["paths"].clone()).expect("paths");
        assert!(paths.contains(&vec![
            "acmeproj.a.a1".to_string(),
            "acmeproj.b.b1".to_string(),
            "acmeproj.c.c1".to_string(),
        ]));
    }

    #[test]
    fn ambiguous_symbol_lists_candidates() {
        let project = sample_project();
        let index_file = project.path().join("index.json");
        callscope()
            .current_dir(project.path())
            .args(["--json", "index", ".", "-o"])
            .arg(&index_file)
            .assert()
            .success();

        callscope()
            .current_dir(project.path())
            .args(["query", "callees", "shared", "--index"])
            .arg(&index_file)
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Ambiguous function 'shared'. Did you mean:",
            ))
            .stdout(predicate::str::contains(" - acmeproj.f.shared"))
            .stdout(predicate::str::contains(" - acmeproj.g.shared"));
    }

    #[test]
    fn legacy_callees_synonym_works() {
        let project = sample_project();
        callscope()
            .current_dir(project.path())
            .args(["--json", "index", "."])
            .assert()
            .success();

        callscope()
            .current_dir(project.path())
            .args(["callees", "acmeproj.a.a1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("directly calls"))
            .stdout(predicate::str::contains("acmeproj.b.b1"));
    }
}

mod dynamic_tracing {
    use super::*;

    fn python3_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Two runnable scripts: v1 does one birthday, v2 does two, so watch
    /// histories differ between the runs.
    fn demo_scripts() -> TempDir {
        let tmp = TempDir::new().expect("tmp dir");
        let body = |birthdays: &str| {
            format!(
                "class Person:\n\
                 \x20   def __init__(self, name):\n\
                 \x20       self.name = name\n\
                 \x20       self.age = 0\n\
                 \x20   def birthday(self):\n\
                 \x20       self.age += 1\n\
                 \n\
                 def run():\n\
                 \x20   p = Person('Al')\n\
                 {}\
                 \x20   return p.age\n\
                 \n\
                 if __name__ == '__main__':\n\
                 \x20   run()\n",
                birthdays
            )
        };
        std::fs::write(
            tmp.path().join("demoscript_v1.py"),
            body("    p.birthday()\n"),
        )
        .expect("v1");
        std::fs::write(
            tmp.path().join("demoscript_v2.py"),
            body("    p.birthday()\n    p.birthday()\n"),
        )
        .expect("v2");
        tmp
    }

    fn traced_run(root: &Path, script: &str, trace_name: &str, watch: &str) -> Value {
        let output = callscope()
            .current_dir(root)
            .args([
                "--json", "run", "--trace", "--coverage", "--watch", watch, "-o", trace_name,
                script,
            ])
            .output()
            .expect("run script");
        assert!(output.status.success(), "run failed: {:?}", output);
        stdout_json(&output.stdout)
    }

    #[test]
    fn run_trace_watch_history_search_report_and_diff() {
        if !python3_available() {
            eprintln!("python3 not found; skipping tracing e2e");
            return;
        }
        let scripts = demo_scripts();
        let root = scripts.path();

        let out1 = traced_run(
            root,
            "demoscript_v1.py",
            "trace_v1.json",
            "demoscript_v1.Person.age",
        );
        let tf1 = root.join("trace_v1.json");
        assert!(tf1.exists());
        assert!(out1["event_count"].as_u64().unwrap_or(0) > 0);
        let modules: Vec<String> =
            serde_json::from_value(out1["modules"].clone()).expect("modules");
        assert!(modules.contains(&"__main__".to_string()));

        let out2 = traced_run(
            root,
            "demoscript_v2.py",
            "trace_v2.json",
            "demoscript_v2.Person.age",
        );
        let tf2 = root.join("trace_v2.json");
        assert!(tf2.exists());
        assert!(out2["event_count"].as_u64().unwrap_or(0) > 0);

        // History via the legacy synonym: init assigns 0, birthday bumps to 1.
        callscope()
            .current_dir(root)
            .args(["history", "trace_v1.json", "demoscript_v1.Person.age"])
            .assert()
            .success()
            .stdout(predicate::str::contains("set to 0"))
            .stdout(predicate::str::contains("set to 1"));

        // Search narrows by substring and type.
        let output = callscope()
            .current_dir(root)
            .args([
                "--json",
                "query",
                "trace-search",
                "trace_v1.json",
                "--contains",
                "Person",
                "--type",
                "assign",
            ])
            .output()
            .expect("trace-search");
        let found = stdout_json(&output.stdout);
        let matches = found["matches"].as_array().expect("matches");
        assert!(matches.len() >= 2, "expected init + birthday assigns");

        // Coverage report suppresses the synthetic entry module.
        let output = callscope()
            .current_dir(root)
            .args(["--json", "report", "trace_v1.json", "--coverage"])
            .output()
            .expect("report");
        let report = stdout_json(&output.stdout);
        let touched = report["modules_touched"].as_array().expect("modules");
        let names: Vec<&str> = touched
            .iter()
            .filter_map(|m| m["module"].as_str())
            .collect();
        assert!(!names.contains(&"__main__"));
        assert!(names.iter().all(|m| !m.starts_with("callscope")));

        // Diff shows the extra birthday on the watched attribute.
        let output = callscope()
            .current_dir(root)
            .args(["--json", "diff", "trace_v1.json", "trace_v2.json"])
            .output()
            .expect("diff");
        let diff = stdout_json(&output.stdout);
        let watch_diffs = diff["watch_diffs"].as_object().expect("watch_diffs");
        assert!(
            watch_diffs.keys().any(|k| k.ends_with(".Person.age")),
            "no watch diff for Person.age: {watch_diffs:?}"
        );
    }

    #[test]
    fn watch_values_track_each_assignment() {
        if !python3_available() {
            eprintln!("python3 not found; skipping tracing e2e");
            return;
        }
        let tmp = TempDir::new().expect("tmp dir");
        std::fs::write(
            tmp.path().join("demo.py"),
            "class User:\n\
             \x20   def __init__(self):\n\
             \x20       self.age = 0\n\
             \n\
             def increment(u):\n\
             \x20   u.age += 2\n\
             \x20   return u.age\n\
             \n\
             if __name__ == '__main__':\n\
             \x20   u = User()\n\
             \x20   increment(u)\n\
             \x20   increment(u)\n",
        )
        .expect("demo.py");

        callscope()
            .current_dir(tmp.path())
            .args([
                "--json",
                "run",
                "--watch",
                "demo.User.age",
                "-o",
                "trace.json",
                "demo.py",
            ])
            .assert()
            .success();

        let output = callscope()
            .current_dir(tmp.path())
            .args([
                "--json",
                "query",
                "history",
                "demo.User.age",
                "--file",
                "trace.json",
            ])
            .output()
            .expect("history");
        let out = stdout_json(&output.stdout);
        let values: Vec<&str> = out["history"]
            .as_array()
            .expect("history")
            .iter()
            .filter_map(|h| h["value"].as_str())
            .collect();
        assert_eq!(values, vec!["0", "2", "4"]);
    }

    #[test]
    fn target_exceptions_still_emit_the_log() {
        if !python3_available() {
            eprintln!("python3 not found; skipping tracing e2e");
            return;
        }
        let tmp = TempDir::new().expect("tmp dir");
        std::fs::write(
            tmp.path().join("boom.py"),
            "def go():\n\
             \x20   raise RuntimeError('boom')\n\
             \n\
             if __name__ == '__main__':\n\
             \x20   go()\n",
        )
        .expect("boom.py");

        let output = callscope()
            .current_dir(tmp.path())
            .args(["--json", "run", "--trace", "-o", "trace.json", "boom.py"])
            .output()
            .expect("run boom");
        assert!(output.status.success());
        assert!(tmp.path().join("trace.json").exists());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Error during execution"));
    }
}
