use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

const COLORS: &str = "
sort Color = struct red | green | blue;
map  next: Color -> Color;
var  c: Color;
eqn  next(red) = green;  next(green) = blue;  next(blue) = red;
";

const DEADLOCKS: &str = "des (0, 2, 3)\n(0, \"a\", 1)\n(0, \"a\", 2)\n";
const TAU_PREFIX: &str = "des (0, 2, 3)\n(0, \"tau\", 1)\n(1, \"a\", 2)\n";
const A_PREFIX: &str = "des (0, 1, 2)\n(0, \"a\", 1)\n";

fn procalg(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_procalg"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute procalg")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "procalg failed with {:?}, stderr={}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn reduce_writes_the_quotient() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("in.aut"), DEADLOCKS).unwrap();
    stdout(&procalg(&["reduce", "in.aut", "-o", "out.aut"], dir.path()));
    let reduced = std::fs::read_to_string(dir.path().join("out.aut")).unwrap();
    let header = reduced.lines().next().unwrap_or_default();
    assert!(header.starts_with("des (") && header.ends_with(",1,2)"), "{reduced}");
}

#[test]
fn reduce_prints_to_stdout_without_output_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("in.aut"), TAU_PREFIX).unwrap();
    let text = stdout(&procalg(&["reduce", "in.aut", "-e", "branching"], dir.path()));
    let header = text.lines().next().unwrap_or_default();
    assert!(header.ends_with(",1,2)"), "{text}");
    assert!(!text.contains("tau"));
}

#[test]
fn compare_respects_the_equivalence() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.aut"), A_PREFIX).unwrap();
    std::fs::write(dir.path().join("tau.aut"), TAU_PREFIX).unwrap();
    let strong = stdout(&procalg(&["compare", "a.aut", "tau.aut"], dir.path()));
    assert!(strong.contains("not equivalent"), "{strong}");
    let branching = stdout(&procalg(&["compare", "a.aut", "tau.aut", "-e", "branching"], dir.path()));
    assert!(branching.contains("are equivalent"), "{branching}");
}

#[test]
fn info_reports_json() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("in.aut"), TAU_PREFIX).unwrap();
    let text = stdout(&procalg(&["info", "in.aut", "--json"], dir.path()));
    let summary: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(summary["states"], 3);
    assert_eq!(summary["transitions"], 2);
    assert_eq!(summary["tau_transitions"], 1);
}

#[test]
fn malformed_aut_fails_with_a_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.aut"), "des (0, 1, 1)\n(0, \"a\", 7)\n").unwrap();
    let output = procalg(&["info", "bad.aut"], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("procalg::lts::malformed"), "{stderr}");
}

#[test]
fn finite_distinguishes_enumerations_from_lists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("colors.spec"), COLORS).unwrap();
    let color = stdout(&procalg(&["finite", "colors.spec", "Color"], dir.path()));
    assert_eq!(color.trim(), "Color is finite");
    let list = stdout(&procalg(&["finite", "colors.spec", "List(Color)"], dir.path()));
    assert!(list.contains("not certainly finite"), "{list}");
}

#[test]
fn enumerate_lists_the_solutions() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("colors.spec"), COLORS).unwrap();
    let text = stdout(&procalg(
        &["enumerate", "colors.spec", "--var", "c: Color", "next(c) != green"],
        dir.path(),
    ));
    assert!(text.contains("c := green"), "{text}");
    assert!(text.contains("c := blue"), "{text}");
    assert!(!text.contains("c := red"), "{text}");
}

#[test]
fn normalise_prints_the_generated_mappings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("colors.spec"), COLORS).unwrap();
    let text = stdout(&procalg(&["normalise", "colors.spec"], dir.path()));
    assert!(text.contains("next"), "{text}");
    assert!(text.contains("Color"), "{text}");
}

#[test]
fn prove_reports_a_tautology_as_json() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("colors.spec"), COLORS).unwrap();
    let text = stdout(&procalg(
        &["prove", "colors.spec", "--var", "c: Color", "c == red || c != red", "--json"],
        dir.path(),
    ));
    let report: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(report["verdict"], "tautology");
    assert_eq!(report["truncated"], false);
    assert!(report.get("witness").is_none());
}

#[test]
fn prove_imports_list_functions_for_declared_variables() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("empty.spec"), "").unwrap();
    let text = stdout(&procalg(
        &[
            "prove",
            "empty.spec",
            "--var",
            "xs: List(Nat), d: Nat",
            "(xs <| d) != []",
            "--induction",
            "--json",
        ],
        dir.path(),
    ));
    let report: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(report["verdict"], "tautology");
}

#[test]
fn prove_gives_a_counter_example() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("empty.spec"), "").unwrap();
    let text = stdout(&procalg(
        &["prove", "empty.spec", "--var", "b, d: Bool", "b => d"],
        dir.path(),
    ));
    assert!(text.starts_with("undetermined"), "{text}");
    assert!(text.contains("Counter-example:"), "{text}");
    assert!(text.contains("Witness:"), "{text}");
}

#[test]
fn smtlib_prints_a_benchmark() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("empty.spec"), "").unwrap();
    let text = stdout(&procalg(
        &["smtlib", "empty.spec", "--var", "x, y: Nat", "x < y", "y < 3"],
        dir.path(),
    ));
    assert!(text.starts_with("(benchmark nameless"), "{text}");
    let script = stdout(&procalg(
        &["smtlib", "empty.spec", "--var", "x, y: Nat", "x < y", "--script"],
        dir.path(),
    ));
    assert!(script.starts_with("(set-logic ALL)"), "{script}");
    assert!(script.contains("(check-sat)"), "{script}");
}
