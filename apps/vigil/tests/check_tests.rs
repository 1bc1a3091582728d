//! End-to-end check runs: definition and observation files on disk, a
//! store directory, and the verdict the binary would print.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vigil::cli::{Target, cmd_baseline_delete, cmd_baseline_set, cmd_check, load_or_create_session};
use vigil_core::{BaselineStore, Number, Severity};

const ROOM: &str = r#"
name = "room-sensors"
description = "Environmental sensors of the server room"
begin = ["Room A"]

[[gauge]]
id = "temp"
label = "Temp"
warn_max = 80
crit_max = 90

[[gauge]]
id = "disk"
label = "Disk free"
policy = "baseline"
level = "CRITICAL"
trend = "decreased"

[[gauge]]
id = "fan"
warn_min = 1000
"#;

struct Fixture {
    dir: TempDir,
    definition: PathBuf,
}

impl Fixture {
    fn new(definition: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.toml");
        std::fs::write(&path, definition).unwrap();
        Self {
            dir,
            definition: path,
        }
    }

    fn target(&self, backend: &str) -> Target {
        Target {
            name: Some("web01".to_string()),
            ip: None,
            store_dir: self.dir.path().join("store"),
            backend: backend.to_string(),
        }
    }

    fn observations(&self, file: &str, json: &str) -> PathBuf {
        let path = self.dir.path().join(file);
        std::fs::write(&path, json).unwrap();
        path
    }
}

fn observed(temp: &str, disk: f64) -> String {
    format!(
        r#"{{
            "readings": {{
                "temp": "{}",
                "disk": {:?},
                "fan": [["Fan 1", 3000], ["Fan 2", 800]]
            }},
            "perf": ["temp={}"]
        }}"#,
        temp, disk, temp
    )
}

// =============================================================================
// CHECK RUNS
// =============================================================================

#[test]
fn test_warning_run() {
    let fx = Fixture::new(ROOM);
    let obs = fx.observations("obs.json", &observed("21", 42.0));

    let verdict = cmd_check(&fx.target("file"), &fx.definition, Some(&obs), false);

    assert_eq!(verdict.severity, Severity::Warning);
    assert_eq!(verdict.exit_code(), 1);
    assert!(
        verdict
            .output
            .starts_with("Fan 2 : 800 <= MIN WARNING (1000)|temp=21Room A")
    );
    assert!(verdict.output.contains("Fan 1 : 3000\nFan 2 : 800"));
    assert!(verdict.output.contains("Plugin name : room-sensors"));
    assert!(verdict.output.contains("Description : Environmental sensors of the server room"));
    assert!(verdict.output.contains("Exit code : 1 (WARNING), __sublevel__=0"));
}

#[test]
fn test_baseline_persists_between_runs() {
    let fx = Fixture::new(ROOM);
    let target = fx.target("file");

    let first = fx.observations("first.json", &observed("21", 42.0));
    let verdict = cmd_check(&target, &fx.definition, Some(&first), false);
    assert!(!verdict.output.contains("reference value"));

    let second = fx.observations("second.json", &observed("21", 30.0));
    let verdict = cmd_check(&target, &fx.definition, Some(&second), false);
    assert_eq!(verdict.severity, Severity::Critical);
    assert!(verdict.output.contains(
        "Disk free : actual value (30.0) is less than the reference value (42.0)"
    ));

    let session = load_or_create_session("web01", &target.store_dir, "file").unwrap();
    assert_eq!(session.get("disk_etalon").unwrap(), Some(Number::Float(30.0)));
}

#[test]
fn test_damaged_store_file_is_replaced() {
    let fx = Fixture::new(ROOM);
    let target = fx.target("file");
    std::fs::create_dir_all(&target.store_dir).unwrap();
    let store_file = target.store_dir.join("web01_persistent_data.json");
    std::fs::write(&store_file, r#"{"format_version": 1, "host": "web01", "val"#).unwrap();

    let obs = fx.observations("obs.json", &observed("21", 42.0));
    let verdict = cmd_check(&target, &fx.definition, Some(&obs), false);

    assert_eq!(verdict.severity, Severity::Warning);
    assert_eq!(verdict.sublevel, 0);
    let session = load_or_create_session("web01", &target.store_dir, "file").unwrap();
    assert_eq!(session.get("disk_etalon").unwrap(), Some(Number::Float(42.0)));
}

#[test]
fn test_redb_backend_run() {
    let fx = Fixture::new(ROOM);
    let target = fx.target("redb");

    let first = fx.observations("first.json", &observed("21", 42.0));
    let _ = cmd_check(&target, &fx.definition, Some(&first), false);
    let second = fx.observations("second.json", &observed("95 C", 41.0));
    let verdict = cmd_check(&target, &fx.definition, Some(&second), false);

    assert_eq!(verdict.severity, Severity::Critical);
    assert!(verdict.output.starts_with("STATUS : CRITICAL:2, WARNING:1|temp=95 C"));
}

#[test]
fn test_describe() {
    let fx = Fixture::new(ROOM);
    let verdict = cmd_check(&fx.target("memory"), &fx.definition, None, true);

    assert_eq!(verdict.output, "Environmental sensors of the server room");
    assert_eq!(verdict.exit_code(), 3);
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

#[test]
fn test_missing_observations_is_collect_failure() {
    let fx = Fixture::new(ROOM);
    let verdict = cmd_check(&fx.target("memory"), &fx.definition, None, false);

    assert_eq!(verdict.severity, Severity::Critical);
    assert_eq!(verdict.sublevel, 1);
    assert!(verdict.output.starts_with("Failed to collect equipment status : "));
    assert!(verdict.output.contains("Exit code : 2 (CRITICAL), __sublevel__=1"));
}

#[test]
fn test_missing_reading_is_collect_failure() {
    let fx = Fixture::new(ROOM);
    let obs = fx.observations("obs.json", r#"{"readings": {"temp": 20}}"#);
    let verdict = cmd_check(&fx.target("file"), &fx.definition, Some(&obs), false);

    assert_eq!(verdict.sublevel, 1);
    assert!(verdict.output.contains("No reading collected for gauge"));
    assert!(!fx.dir.path().join("store/web01_persistent_data.json").exists()
        || load_or_create_session("web01", &fx.dir.path().join("store"), "file")
            .unwrap()
            .entries()
            .unwrap()
            .is_empty());
}

#[test]
fn test_invalid_definition_is_internal_error() {
    let fx = Fixture::new("name = \"broken\"\n[[gauge]]\nid = \"a\"\npolicy = \"baseline\"\n");
    let obs = fx.observations("obs.json", "{}");
    let verdict = cmd_check(&fx.target("memory"), &fx.definition, Some(&obs), false);

    assert_eq!(verdict.severity, Severity::Critical);
    assert_eq!(verdict.sublevel, 3);
    assert!(verdict.output.starts_with("Plugin internal error : Configuration error: "));
    assert!(verdict.output.contains("Plugin name : room"));
}

#[test]
fn test_on_error_level_is_used() {
    let fx = Fixture::new("name = \"soft\"\non_error = \"UNKNOWN\"\n[[gauge]]\nid = \"a\"\n");
    let obs = fx.observations("obs.json", "not json");
    let verdict = cmd_check(&fx.target("memory"), &fx.definition, Some(&obs), false);

    assert_eq!(verdict.severity, Severity::Unknown);
    assert_eq!(verdict.exit_code(), 3);
}

// =============================================================================
// BASELINE COMMANDS
// =============================================================================

#[test]
fn test_baseline_set_and_delete() {
    let fx = Fixture::new(ROOM);
    let target = fx.target("file");
    let store_dir: &Path = &target.store_dir;

    cmd_baseline_set(&target, false, "disk", "42").unwrap();
    let session = load_or_create_session("web01", store_dir, "file").unwrap();
    assert_eq!(session.get("disk_etalon").unwrap(), Some(Number::Int(42)));

    cmd_baseline_delete(&target, true, "disk").unwrap();
    let session = load_or_create_session("web01", store_dir, "file").unwrap();
    assert_eq!(session.get("disk_etalon").unwrap(), None);

    assert!(cmd_baseline_set(&target, false, "disk", "a lot").is_err());
}
