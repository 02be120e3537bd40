use std::{
    env, fs,
    path::PathBuf,
    process::Command,
};

const OSU_MAP: &str = "osu file format v14

[General]
AudioFilename: song.mp3
Mode: 3

[Metadata]
Title:CLI Test
Artist:Someone

[TimingPoints]
0,500,4,2,0,100,1,0

[HitObjects]
192,192,1500,1,0,0:0:0:0:
64,192,1000,1,0,0:0:0:0:
448,192,2000,128,0,2500:0:0:0:0:
";

fn norm_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("rhythm_cli_{name}_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn convert_writes_native_json_next_to_input() {
    let exe = env!("CARGO_BIN_EXE_rhythm_cli");
    let dir = scratch_dir("convert");
    let input = dir.join("map.osu");
    fs::write(&input, OSU_MAP).unwrap();

    let out = Command::new(exe)
        .args(["convert", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());

    let json = fs::read_to_string(dir.join("map.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["metadata"]["title"], "CLI Test");
    let objects = v["hit_objects"].as_array().unwrap();
    assert_eq!(objects.len(), 3);
    assert_eq!(objects[0]["time"], 1000);
    assert_eq!(objects[0]["lane"], 0);
    assert_eq!(objects[2]["type"], "hold");
    assert_eq!(objects[2]["duration"], 500);
}

#[test]
fn convert_missing_input_is_e2001() {
    let exe = env!("CARGO_BIN_EXE_rhythm_cli");
    let missing = env::temp_dir().join(format!("rhythm_cli_missing_{}.osu", std::process::id()));
    let _ = fs::remove_file(&missing);

    let out = Command::new(exe)
        .args(["convert", missing.to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("Error: parse failed: "));
    assert!(stderr.contains("Caused by:"));
    assert!(stderr.contains("E2001: failed to read beatmap:"));
}

#[test]
fn validate_reports_summary_and_exit_code() {
    let exe = env!("CARGO_BIN_EXE_rhythm_cli");
    let dir = scratch_dir("validate");

    let good = dir.join("good.osu");
    fs::write(&good, OSU_MAP).unwrap();
    let out = Command::new(exe)
        .args(["validate", good.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    assert!(stdout.contains("title: CLI Test"));
    assert!(stdout.contains("notes: 3 (1 holds)"));
    assert!(stdout.contains("bpm: 120"));
    assert!(stdout.ends_with("ok\n"));

    let bad = dir.join("bad.json");
    fs::write(&bad, r#"{"metadata": {"title": "No Audio"}, "hit_objects": [{"time": 100, "lane": 1}]}"#)
        .unwrap();
    let out = Command::new(exe)
        .args(["validate", bad.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    assert!(stdout.contains("invalid: beatmap names no audio file"));
}

#[test]
fn simulate_prints_final_result() {
    let exe = env!("CARGO_BIN_EXE_rhythm_cli");
    let dir = scratch_dir("simulate");
    let input = dir.join("map.osu");
    fs::write(&input, OSU_MAP).unwrap();

    let out = Command::new(exe)
        .args(["simulate", input.to_str().unwrap(), "--quiet"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let result: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["title"], "CLI Test");
    assert_eq!(result["stats"]["perfect"], 3);
    assert_eq!(result["final_score"], 930);

    let out = Command::new(exe)
        .args(["simulate", input.to_str().unwrap(), "--skip-every", "3"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    assert!(stdout.starts_with("{\"event\":\"song_started\""));
    assert!(stdout.contains("{\"event\":\"note_missed\",\"lane\":3}"));
    assert!(stdout.contains("\"event\":\"song_finished\""));
}

#[test]
fn simulate_reads_engine_config() {
    let exe = env!("CARGO_BIN_EXE_rhythm_cli");
    let dir = scratch_dir("config");
    let input = dir.join("map.osu");
    fs::write(&input, OSU_MAP).unwrap();
    let config = dir.join("engine.json");
    fs::write(&config, r#"{"hit_window_ms": 60}"#).unwrap();

    let out = Command::new(exe)
        .args([
            "simulate",
            input.to_str().unwrap(),
            "--quiet",
            "--jitter-ms",
            "80",
            "--config",
            config.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let result: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(result["stats"]["miss"], 3);
    assert_eq!(result["final_score"], 0);
}

#[test]
fn generate_writes_a_playable_beat_grid() {
    let exe = env!("CARGO_BIN_EXE_rhythm_cli");
    let dir = scratch_dir("generate");
    let output = dir.join("grid.json");

    let out = Command::new(exe)
        .args([
            "generate",
            "track.ogg",
            "--bpm",
            "60",
            "--duration",
            "2",
            "--difficulty",
            "1.0",
            "--lanes",
            "2",
            "-o",
            output.to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    assert!(stdout.contains("(6 notes)"));

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(v["metadata"]["title"], "track");
    assert_eq!(v["metadata"]["audio_filename"], "track.ogg");
    assert_eq!(v["metadata"]["difficulty"], "Hard");
    let times: Vec<_> = v["hit_objects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| (o["time"].as_i64().unwrap(), o["lane"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        times,
        vec![(0, 0), (400, 0), (800, 0), (1000, 1), (1400, 1), (1800, 1)]
    );

    let out = Command::new(exe)
        .args(["validate", output.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());

    let out = Command::new(exe)
        .args(["generate", "track.ogg", "--bpm", "0", "-o", output.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("bpm must be positive"));
}

#[test]
fn help_lists_subcommands() {
    let exe = env!("CARGO_BIN_EXE_rhythm_cli");
    let out = Command::new(exe).arg("--help").output().unwrap();
    assert!(out.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&out.stdout));
    for cmd in ["convert", "validate", "simulate", "generate"] {
        assert!(stdout.contains(cmd));
    }
}
