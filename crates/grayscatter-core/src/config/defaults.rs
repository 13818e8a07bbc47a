//! Default run parameters and their sanitization.

use std::time::Duration;

use serde::Deserialize;

use crate::partition::RemainderPolicy;

/// Run defaults read from the `defaults:` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct RunDefaults {
    /// Ranks in the in-process group (None = available parallelism)
    pub processes: Option<usize>,
    /// Handling of pixels left over by equal partitioning
    pub remainder: RemainderPolicy,
    /// Give up on a silent peer after this many seconds (in-process group
    /// only; None = wait forever)
    pub collective_timeout_secs: Option<u64>,
    /// Suppress progress output
    pub silent: bool,
}

impl RunDefaults {
    /// Replace out-of-range values with defaults, returning one warning per fix.
    pub(crate) fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.processes == Some(0) {
            warnings.push("processes must be at least 1; ignoring 0".to_string());
            self.processes = None;
        }
        if self.collective_timeout_secs == Some(0) {
            warnings.push("collective_timeout_secs must be positive; ignoring 0".to_string());
            self.collective_timeout_secs = None;
        }
        warnings
    }

    pub fn collective_timeout(&self) -> Option<Duration> {
        self.collective_timeout_secs.map(Duration::from_secs)
    }
}
