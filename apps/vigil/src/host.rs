//! # Host Resolution
//!
//! Which host a check run is about.
//!
//! Command line options have priority over the environment variables a
//! Nagios-compatible scheduler exports to its plugins.

use vigil_core::VigilError;

/// Host fields of which at least one must be known.
pub const REQUIRED_FIELDS: [&str; 2] = ["name", "ip"];

/// Environment variable holding the host name.
pub const ENV_HOSTNAME: &str = "NAGIOS_HOSTNAME";

/// Environment variable holding the host address.
pub const ENV_HOSTADDRESS: &str = "NAGIOS_HOSTADDRESS";

/// Resolve the host key from options and environment.
///
/// Tried in order: `name`, `NAGIOS_HOSTNAME`, `ip`, `NAGIOS_HOSTADDRESS`.
/// Blank values count as missing. `env` looks a variable up, usually
/// [`process_env`].
pub fn resolve_host<F>(name: Option<&str>, ip: Option<&str>, env: F) -> Result<String, VigilError>
where
    F: Fn(&str) -> Option<String>,
{
    let candidates = [
        name.map(str::to_string),
        env(ENV_HOSTNAME),
        ip.map(str::to_string),
        env(ENV_HOSTADDRESS),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or_else(|| VigilError::MissingHostParameter(REQUIRED_FIELDS[0].to_string()))
}

/// Environment lookup of the running process.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Detail body of the missing parameter response.
pub fn required_fields_message() -> String {
    format!("Required fields are : {}", REQUIRED_FIELDS.join(","))
}
