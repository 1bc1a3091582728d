//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::check::{CheckContext, Failure, SUBLEVEL_INTERNAL_ERROR, error_response, run_check};
use crate::config::{CheckDefinition, Observations, read_limited};
use crate::host::{process_env, resolve_host};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use vigil_core::{
    BaselineStore, Conclusion, HostSession, Number, Severity, StatusReport, Verdict, VigilError,
    baseline_key, primitives::MAX_STORE_FILE_SIZE, store_file_name, store_from_json,
    store_to_json,
};

/// Where the baselines of a host live.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: Option<String>,
    pub ip: Option<String>,
    pub store_dir: PathBuf,
    /// "file", "redb" or "memory"
    pub backend: String,
}

impl Target {
    /// Resolved host key, see [`resolve_host`].
    pub fn host(&self) -> Result<String, VigilError> {
        resolve_host(self.name.as_deref(), self.ip.as_deref(), process_env)
    }
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Run a check.
///
/// Never fails: every error becomes the error response of the run.
pub fn cmd_check(
    target: &Target,
    definition_path: &Path,
    observations_path: Option<&Path>,
    describe: bool,
) -> Verdict {
    let started = Instant::now();
    let fallback_ctx = CheckContext {
        plugin_name: plugin_name(definition_path),
        description: "no description.".to_string(),
        started,
    };

    let definition = match CheckDefinition::load(definition_path) {
        Ok(definition) => definition,
        Err(e) => {
            return finish(error_response(
                Severity::Critical,
                &e,
                Failure::Internal,
                None,
                &fallback_ctx,
            ));
        }
    };
    if describe {
        return Verdict {
            output: definition.description.trim().to_string(),
            severity: Severity::Unknown,
            sublevel: 0,
        };
    }

    let ctx = CheckContext {
        started,
        ..CheckContext::for_definition(&definition)
    };
    let on_error = definition.on_error;

    let host = match target.host() {
        Ok(host) => host,
        Err(e) => return finish(error_response(on_error, &e, Failure::Internal, None, &ctx)),
    };
    tracing::info!("Start plugin {} for {}", definition.name, host);

    let mut session = match load_or_create_session(&host, &target.store_dir, &target.backend) {
        Ok(session) => session,
        Err(e) => return finish(error_response(on_error, &e, Failure::Internal, None, &ctx)),
    };

    let observations = match observations_path {
        Some(path) => Observations::load(path),
        None => Err(VigilError::Io("No observations file given".to_string())),
    };
    let observations = match observations {
        Ok(observations) => observations,
        Err(e) => return finish(error_response(on_error, &e, Failure::Collect, None, &ctx)),
    };
    tracing::info!("Data are collected");
    tracing::debug!("Collected Data = {:?}", observations);

    let report = match run_check(&definition, &observations, &mut session, &ctx) {
        Ok(report) => report,
        Err(e) => error_response(on_error, &e, Failure::of(&e), Some(&observations), &ctx),
    };

    if let Err(e) = save_session(&session, &target.store_dir, &target.backend) {
        return finish(error_response(
            on_error,
            &e,
            Failure::Internal,
            Some(&observations),
            &ctx,
        ));
    }
    finish(report)
}

/// Plugin name shown when the definition cannot be read.
fn plugin_name(definition_path: &Path) -> String {
    definition_path
        .file_stem()
        .map_or_else(|| "vigil".to_string(), |s| s.to_string_lossy().into_owned())
}

/// Conclude a finished report.
fn finish(report: StatusReport) -> Verdict {
    match report.conclude(Conclusion::default()) {
        Ok(verdict) => verdict,
        Err(e) => Verdict {
            output: format!("Plugin internal error : {}", e),
            severity: Severity::Unknown,
            sublevel: SUBLEVEL_INTERNAL_ERROR,
        },
    }
}

// =============================================================================
// BASELINE COMMANDS
// =============================================================================

/// List the stored baselines of the host.
pub fn cmd_baseline_list(target: &Target, json_mode: bool) -> Result<(), VigilError> {
    let host = target.host()?;
    let session = load_or_create_session(&host, &target.store_dir, &target.backend)?;
    let entries = session.entries()?;

    if json_mode {
        let baselines: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(key, value)| {
                (
                    key.clone(),
                    serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();
        let output = serde_json::json!({
            "host": host,
            "backend": target.backend,
            "baselines": baselines,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Baselines of {}", host);
    println!("==================");
    println!("Backend: {}", target.backend);
    println!();
    if entries.is_empty() {
        println!("(none)");
    }
    for (key, value) in &entries {
        println!("{} = {}", key, value);
    }
    Ok(())
}

/// Overwrite the baseline of a gauge.
pub fn cmd_baseline_set(
    target: &Target,
    json_mode: bool,
    gauge_id: &str,
    value: &str,
) -> Result<(), VigilError> {
    let value = parse_number(value)?;
    let host = target.host()?;
    let mut session = load_or_create_session(&host, &target.store_dir, &target.backend)?;

    let key = baseline_key(gauge_id);
    let previous = session.get(&key)?;
    session.set(&key, value)?;
    save_session(&session, &target.store_dir, &target.backend)?;
    tracing::info!("Baseline {} of {} set to {}", key, host, value);

    if json_mode {
        let output = serde_json::json!({
            "host": host,
            "key": key,
            "value": value,
            "previous": previous,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        match previous {
            Some(previous) => println!("{} = {} (was {})", key, value, previous),
            None => println!("{} = {}", key, value),
        }
    }
    Ok(())
}

/// Forget the baseline of a gauge.
pub fn cmd_baseline_delete(
    target: &Target,
    json_mode: bool,
    gauge_id: &str,
) -> Result<(), VigilError> {
    let host = target.host()?;
    let mut session = load_or_create_session(&host, &target.store_dir, &target.backend)?;

    let key = baseline_key(gauge_id);
    let deleted = session.delete(&key)?;
    save_session(&session, &target.store_dir, &target.backend)?;

    if json_mode {
        let output = serde_json::json!({ "host": host, "key": key, "deleted": deleted });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else if deleted {
        println!("Deleted {}", key);
    } else {
        println!("No baseline stored under {}", key);
    }
    Ok(())
}

/// Parse a baseline value, keeping integers integral.
pub fn parse_number(text: &str) -> Result<Number, VigilError> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Ok(Number::Int(value));
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Number::Float(value)),
        _ => Err(VigilError::Config(format!(
            "Baseline value '{}' is not a number",
            text
        ))),
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// File name of the redb database of `host`.
fn redb_file_name(host: &str) -> String {
    format!("{}.redb", store_file_name(host).trim_end_matches(".json"))
}

fn ensure_dir(dir: &Path) -> Result<(), VigilError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        VigilError::Io(format!("Cannot create store directory '{}': {}", dir.display(), e))
    })
}

/// Load or create the session of `host` with the specified backend.
pub fn load_or_create_session(
    host: &str,
    store_dir: &Path,
    backend: &str,
) -> Result<HostSession, VigilError> {
    match backend {
        "file" => {
            let path = store_dir.join(store_file_name(host));
            if !path.exists() {
                tracing::debug!("No persisted data at {}", path.display());
                return Ok(HostSession::new(host));
            }
            let loaded = read_limited(&path, MAX_STORE_FILE_SIZE as u64)
                .and_then(|bytes| store_from_json(&bytes));
            let (stored_host, store) = match loaded {
                Ok(loaded) => loaded,
                Err(e) => {
                    tracing::warn!(
                        "Ignoring unreadable store file {}: {}",
                        path.display(),
                        e
                    );
                    return Ok(HostSession::new(host));
                }
            };
            if stored_host != host {
                tracing::warn!(
                    "Store file {} belongs to host '{}', loading it for '{}'",
                    path.display(),
                    stored_host,
                    host
                );
            }
            tracing::debug!("Loaded {} baselines from {}", store.len(), path.display());
            Ok(HostSession::with_store(host, store))
        }
        "redb" => {
            ensure_dir(store_dir)?;
            HostSession::with_redb(host, store_dir.join(redb_file_name(host)))
        }
        "memory" => Ok(HostSession::new(host)),
        other => Err(VigilError::Config(format!(
            "Unknown storage backend '{}' (expected file, redb or memory)",
            other
        ))),
    }
}

/// Save a session with the specified backend.
///
/// Only the file backend has anything to write: redb commits on every
/// change and the memory backend is meant to be discarded. The document is
/// written to a temporary file in `store_dir` and renamed into place.
pub fn save_session(session: &HostSession, store_dir: &Path, backend: &str) -> Result<(), VigilError> {
    match (backend, session.memory()) {
        ("file", Some(store)) => {
            ensure_dir(store_dir)?;
            let path = store_dir.join(store_file_name(session.host()));
            let data = store_to_json(session.host(), store)?;
            let write_err = |e: std::io::Error| {
                VigilError::Io(format!("Cannot write '{}': {}", path.display(), e))
            };
            let mut file = tempfile::NamedTempFile::new_in(store_dir).map_err(write_err)?;
            file.write_all(&data).map_err(write_err)?;
            file.persist(&path).map_err(|e| write_err(e.error))?;
            tracing::debug!("Saved {} baselines to {}", store.len(), path.display());
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_keep_their_kind() {
        assert_eq!(parse_number("42").ok(), Some(Number::Int(42)));
        assert_eq!(parse_number(" -3.5 ").ok(), Some(Number::Float(-3.5)));
        assert!(matches!(parse_number("inf"), Err(VigilError::Config(_))));
        assert!(matches!(parse_number("lots"), Err(VigilError::Config(_))));
    }

    #[test]
    fn file_backend_roundtrip() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = temp.path().join("store");

        let mut session = load_or_create_session("web01", &dir, "file").expect("create");
        session.set("disk_etalon", Number::Float(42.0)).expect("set");
        save_session(&session, &dir, "file").expect("save");
        assert!(dir.join("web01_persistent_data.json").is_file());

        let session = load_or_create_session("web01", &dir, "file").expect("load");
        assert_eq!(session.get("disk_etalon").expect("get"), Some(Number::Float(42.0)));
    }

    #[test]
    fn damaged_store_file_starts_empty() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("web01_persistent_data.json");
        std::fs::write(&path, r#"{"format_version": 1, "host": "web01", "val"#).expect("write");

        let mut session = load_or_create_session("web01", temp.path(), "file").expect("load");
        assert!(session.entries().expect("entries").is_empty());

        session.set("disk_etalon", Number::Int(42)).expect("set");
        save_session(&session, temp.path(), "file").expect("save");
        let session = load_or_create_session("web01", temp.path(), "file").expect("reload");
        assert_eq!(session.get("disk_etalon").expect("get"), Some(Number::Int(42)));
    }

    #[test]
    fn unsupported_store_version_starts_empty() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("web01_persistent_data.json");
        std::fs::write(&path, r#"{"format_version": 99, "host": "web01", "values": {}}"#)
            .expect("write");

        let session = load_or_create_session("web01", temp.path(), "file").expect("load");
        assert!(session.entries().expect("entries").is_empty());
    }

    #[test]
    fn save_leaves_no_temporary_files() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut session = load_or_create_session("web01", temp.path(), "file").expect("create");
        session.set("disk_etalon", Number::Int(1)).expect("set");
        save_session(&session, temp.path(), "file").expect("save");
        save_session(&session, temp.path(), "file").expect("save again");

        let names: Vec<String> = std::fs::read_dir(temp.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["web01_persistent_data.json"]);
    }

    #[test]
    fn redb_backend_uses_host_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        {
            let mut session = load_or_create_session("web01", temp.path(), "redb").expect("open");
            session.set("disk_etalon", Number::Int(7)).expect("set");
            save_session(&session, temp.path(), "redb").expect("save");
        }
        assert!(temp.path().join("web01_persistent_data.redb").is_file());

        let session = load_or_create_session("web01", temp.path(), "redb").expect("reopen");
        assert_eq!(session.get("disk_etalon").expect("get"), Some(Number::Int(7)));
    }

    #[test]
    fn unknown_backend_rejected() {
        let temp = tempfile::tempdir().expect("temp dir");
        assert!(matches!(
            load_or_create_session("web01", temp.path(), "sqlite"),
            Err(VigilError::Config(_))
        ));
    }

    #[test]
    fn plugin_name_from_definition_file() {
        assert_eq!(plugin_name(Path::new("/etc/vigil/room.toml")), "room");
    }
}
