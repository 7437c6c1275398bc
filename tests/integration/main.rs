//! Integration tests for Puncover
//!
//! These tests run the built binary over toolchain output fixtures.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const SIZES: &str = "\
00000550 00000034 T main\t/src/app/build/../src/main.c:25
00000600 00000010 T helper\t/src/app/src/util.c:3
00000968 000000c8 D foo\t/src/app/src/main.c:15
0000059c D __dso_handle
";

const DISASSEMBLY: &str = "
firmware.elf:     file format elf32-littlearm


Disassembly of section .text:

00000550 <main>:
main():
 550:\tb508      \tpush\t{r3, lr}
 552:\tf000 f855 \tbl\t600 <helper>

00000600 <helper>:
helper():
 600:\t4770      \tbx\tlr

00000700 <__aeabi_dmul.part.0>:
 700:\tb570      \tpush\t{r4, r5, r6, lr}
 702:\tf7ff ff7d \tbl\t600
";

const STACK_USAGE: &str = "\
main.c:25:5:int main()\t16\tstatic
util.c:3:6:void helper()\t8\tstatic
";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sizes.txt"), SIZES).unwrap();
        std::fs::write(dir.path().join("disassembly.txt"), DISASSEMBLY).unwrap();
        std::fs::write(dir.path().join("main.su"), STACK_USAGE).unwrap();
        Fixture { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn inputs(&self) -> Vec<String> {
        vec![
            "--sizes".to_string(),
            arg(&self.path("sizes.txt")),
            "--disassembly".to_string(),
            arg(&self.path("disassembly.txt")),
            "--stack-usage".to_string(),
            arg(&self.path("main.su")),
        ]
    }
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn puncover(args: &[String]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_puncover"))
        .args(args)
        .output()
        .expect("Failed to execute puncover")
}

fn run(subcommand: &str, extra: &[&str], fixture: &Fixture) -> Output {
    let mut args = vec![subcommand.to_string()];
    args.extend(fixture.inputs());
    args.extend(extra.iter().map(|s| s.to_string()));
    puncover(&args)
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_invocation() {
    let output = puncover(&["--help".to_string()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("puncover"));
    assert!(stdout.contains("Code size and stack usage analysis"));
}

#[test]
fn test_version() {
    let output = puncover(&["version".to_string()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("puncover v{}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_report() {
    let fixture = Fixture::new();
    let output = run("report", &[], &fixture);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Symbols: 4 (3 functions, 1 variables)"));
    assert!(stdout.contains("      52  main  (main.c:25)"));
    assert!(stdout.contains("      24  main -> helper"));
    assert!(stdout.contains("src/app/src/"));
    assert!(stdout.contains("<libgcc>/"));
}

#[test]
fn test_report_top_limits_rankings() {
    let fixture = Fixture::new();
    let output = run("report", &["--top", "1"], &fixture);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  main  (main.c:25)"));
    assert!(!stdout.contains("  helper  (util.c:3)"));
}

#[test]
fn test_report_json() {
    let fixture = Fixture::new();
    let output = run("report", &["--json"], &fixture);
    assert!(output.status.success());

    let symbols: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let symbols = symbols.as_array().unwrap();
    assert_eq!(symbols.len(), 4);

    let dmul = symbols.iter().find(|s| s["address"] == 0x700).unwrap();
    assert_eq!(dmul["name"], "__aeabi_dmul");
    assert_eq!(dmul["size"], 6);
    assert_eq!(dmul["callees"], serde_json::json!([0x600]));

    let main = symbols.iter().find(|s| s["name"] == "main").unwrap();
    assert_eq!(main["kind"], "function");
    assert_eq!(main["stack_size"], 16);
    assert_eq!(main["path"], "/src/app/src/main.c");
}

#[test]
fn test_tree() {
    let fixture = Fixture::new();
    let output = run("tree", &[], &fixture);
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "<libgcc>/\n  <libgcc>\nsrc/app/src/\n  main.c\n  util.c\n"
    );
}

#[test]
fn test_stack() {
    let fixture = Fixture::new();
    let output = run("stack", &["main"], &fixture);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("main: 24 bytes worst case"));
    assert!(stdout.contains("      16  main"));
    assert!(stdout.contains("       8  helper"));

    let output = run("stack", &["600", "--callers"], &fixture);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("helper: 24 bytes worst case"));
}

#[test]
fn test_stack_unknown_symbol_fails() {
    let fixture = Fixture::new();
    let output = run("stack", &["no_such_function"], &fixture);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No symbol named or at no_such_function"));
}

#[test]
fn test_missing_input_fails() {
    let fixture = Fixture::new();
    let output = puncover(&[
        "report".to_string(),
        "--sizes".to_string(),
        arg(&fixture.path("nope.txt")),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}

#[test]
fn test_requires_some_input() {
    let output = puncover(&["report".to_string()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("need at least --sizes or --disassembly"));
}

#[test]
fn test_config_file() {
    let fixture = Fixture::new();
    std::fs::write(fixture.path("puncover.toml"), "unknown_origin = \"<rom>\"\n").unwrap();
    let config = arg(&fixture.path("puncover.toml"));
    let output = run("tree", &["--config", &config], &fixture);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<rom>/\n  <rom>\n"));
}
