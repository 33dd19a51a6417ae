use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const CONFIG: &str = r#"
layers = 1
outline_x = 100.0
outline_y = 100.0
tsv_pitch = 2.0
seed = 11

[schedule]
loop_limit = 12
"#;

const BLOCKS: &str = "\
NumHardRectilinearBlocks : 2
bk1 hardrectilinear 4 (0, 0) (0, 10) (10, 10) (10, 0)
bk2 hardrectilinear 4 (0, 0) (0, 10) (10, 10) (10, 0)
";

const NETS: &str = "NetDegree : 2\nbk1\nbk2\n";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn strata() -> Command {
    Command::cargo_bin("strata").unwrap()
}

fn base_args(dir: &Path, out: &Path) -> Vec<String> {
    vec![
        "--config".into(),
        dir.join("run.toml").display().to_string(),
        "--blocks".into(),
        dir.join("bench.blocks").display().to_string(),
        "--nets".into(),
        dir.join("bench.nets").display().to_string(),
        "--out".into(),
        out.display().to_string(),
        "--name".into(),
        "bench".into(),
    ]
}

fn setup(dir: &Path) {
    write(dir, "run.toml", CONFIG);
    write(dir, "bench.blocks", BLOCKS);
    write(dir, "bench.nets", NETS);
}

#[test]
fn happy_path_writes_outputs() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    setup(dir.path());
    write(dir.path(), "bench.power", "0.1\n0.2\n");

    let mut args = base_args(dir.path(), &out);
    args.push("--power".into());
    args.push(dir.path().join("bench.power").display().to_string());

    strata().args(&args).assert().success();

    assert!(out.join("bench.solution").exists());
    assert!(out.join("bench_schedule.tsv").exists());
    assert!(out.join("bench_0.gp").exists());
    assert!(out.join("bench_hotspot_0.flp").exists());
    assert!(out.join("bench_thermal.data").exists());

    let summary = fs::read_to_string(out.join("bench_summary.json")).unwrap();
    assert!(summary.contains("\"valid\": true"));
}

#[test]
fn malformed_blocks_file_exits_one() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    setup(dir.path());
    write(dir.path(), "bench.blocks", "bk1 dodecahedral 4 (0,0)\n");

    strata()
        .args(&base_args(dir.path(), &out))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ERROR"));
}

#[test]
fn missing_nets_file_exits_one() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    setup(dir.path());
    fs::remove_file(dir.path().join("bench.nets")).unwrap();

    strata().args(&base_args(dir.path(), &out)).assert().code(1);
}

#[test]
fn invalid_config_exits_one() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    setup(dir.path());
    write(
        dir.path(),
        "run.toml",
        "layers = 0\noutline_x = 100.0\noutline_y = 100.0\n",
    );

    strata().args(&base_args(dir.path(), &out)).assert().code(1);
}

#[test]
fn area_infeasible_benchmark_exits_one() {
    // three 10x10 blocks exceed a 15x15 single die by area: input error
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    setup(dir.path());
    write(
        dir.path(),
        "run.toml",
        "layers = 1\noutline_x = 15.0\noutline_y = 15.0\n[schedule]\nloop_limit = 8\n",
    );
    write(
        dir.path(),
        "bench.blocks",
        "bk1 hardrectilinear 4 (0,0) (0,10) (10,10) (10,0)\n\
         bk2 hardrectilinear 4 (0,0) (0,10) (10,10) (10,0)\n\
         bk3 hardrectilinear 4 (0,0) (0,10) (10,10) (10,0)\n",
    );
    write(dir.path(), "bench.nets", "NetDegree : 2\nbk1\nbk2\n");

    strata().args(&base_args(dir.path(), &out)).assert().code(1);
}

#[test]
fn strict_mode_exits_two_when_nothing_fits() {
    // two 10x10 blocks pass the area check against a 19x11 die but cannot
    // be packed into it in any arrangement
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    setup(dir.path());
    write(
        dir.path(),
        "run.toml",
        "layers = 1\noutline_x = 19.0\noutline_y = 11.0\nseed = 5\n[schedule]\nloop_limit = 8\n",
    );

    let mut args = base_args(dir.path(), &out);
    args.push("--strict".into());
    strata().args(&args).assert().code(2);

    // best effort is still reported, the solution file is suppressed
    assert!(!out.join("bench.solution").exists());
    let summary = fs::read_to_string(out.join("bench_summary.json")).unwrap();
    assert!(summary.contains("\"valid\": false"));
}

#[test]
fn fixed_seed_reproduces_solution_byte_for_byte() {
    let dir = tempdir().unwrap();
    setup(dir.path());

    let out_a = dir.path().join("a");
    let out_b = dir.path().join("b");
    strata().args(&base_args(dir.path(), &out_a)).assert().success();
    strata().args(&base_args(dir.path(), &out_b)).assert().success();

    let sol_a = fs::read(out_a.join("bench.solution")).unwrap();
    let sol_b = fs::read(out_b.join("bench.solution")).unwrap();
    assert_eq!(sol_a, sol_b);
}

#[test]
fn solution_replay_reproduces_layout() {
    let dir = tempdir().unwrap();
    setup(dir.path());

    let out = dir.path().join("out");
    strata().args(&base_args(dir.path(), &out)).assert().success();

    let replay_out = dir.path().join("replay");
    let mut args = base_args(dir.path(), &replay_out);
    args.push("--solution-in".into());
    args.push(out.join("bench.solution").display().to_string());
    strata().args(&args).assert().success();

    let original = fs::read(out.join("bench.solution")).unwrap();
    let replayed = fs::read(replay_out.join("bench.solution")).unwrap();
    assert_eq!(original, replayed);
}
