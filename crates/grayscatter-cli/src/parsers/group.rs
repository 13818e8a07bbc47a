//! Process group and remainder options.

use grayscatter_core::RemainderPolicy;

use crate::launch::Backend;

/// Parse remainder policy: "drop" or "root"
pub fn parse_remainder_policy(policy_str: &str) -> Result<RemainderPolicy, String> {
    match policy_str.trim().to_lowercase().as_str() {
        "drop" => Ok(RemainderPolicy::Drop),
        "root" | "coordinator" => Ok(RemainderPolicy::Root),
        other => Err(format!(
            "Unknown remainder policy: {}. Use 'drop' or 'root'",
            other
        )),
    }
}

/// Parse backend: "local" or "mpi"
pub fn parse_backend(backend_str: &str) -> Result<Backend, String> {
    match backend_str.trim().to_lowercase().as_str() {
        "local" | "threads" => Ok(Backend::Local),
        "mpi" => Ok(Backend::Mpi),
        other => Err(format!("Unknown backend: {}. Use 'local' or 'mpi'", other)),
    }
}

/// Parse a process count, which must be at least 1.
pub fn parse_process_count(count_str: &str) -> Result<usize, String> {
    match count_str.trim().parse::<usize>() {
        Ok(0) => Err("Process count must be at least 1".to_string()),
        Ok(count) => Ok(count),
        Err(_) => Err(format!("Invalid process count: {}", count_str)),
    }
}
