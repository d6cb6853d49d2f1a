use std::fs;

use crate::error::CollectError;

/// Source of the real (non-synthetic) gauge values.
pub trait SystemProbe: Send + Sync {
    /// Resident memory of this process in megabytes.
    fn memory_mb(&self) -> Result<f64, CollectError>;
    /// One minute system load average.
    fn load_average(&self) -> Result<f64, CollectError>;
}

/// Reads `/proc`. On platforms without procfs every read fails and the
/// dependent gauges skip their tick.
#[derive(Clone, Debug, Default)]
pub struct ProcProbe;

impl SystemProbe for ProcProbe {
    fn memory_mb(&self) -> Result<f64, CollectError> {
        let status = read("/proc/self/status")?;
        parse_vm_rss_kb(&status)
            .map(|kb| kb / 1024.0)
            .ok_or_else(|| CollectError::Probe {
                source_name: "/proc/self/status",
                reason: "VmRSS line missing".into(),
            })
    }

    fn load_average(&self) -> Result<f64, CollectError> {
        let loadavg = read("/proc/loadavg")?;
        parse_load_average(&loadavg).ok_or_else(|| CollectError::Probe {
            source_name: "/proc/loadavg",
            reason: format!("unexpected contents '{}'", loadavg.trim()),
        })
    }
}

fn read(path: &'static str) -> Result<String, CollectError> {
    fs::read_to_string(path).map_err(|err| CollectError::Probe {
        source_name: path,
        reason: err.to_string(),
    })
}

fn parse_vm_rss_kb(status: &str) -> Option<f64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

fn parse_load_average(loadavg: &str) -> Option<f64> {
    loadavg.split_whitespace().next()?.parse().ok()
}

/// Probe returning constant values.
#[derive(Clone, Copy, Debug)]
pub struct FixedProbe {
    pub memory_mb: f64,
    pub load_average: f64,
}

impl SystemProbe for FixedProbe {
    fn memory_mb(&self) -> Result<f64, CollectError> {
        Ok(self.memory_mb)
    }

    fn load_average(&self) -> Result<f64, CollectError> {
        Ok(self.load_average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vm_rss() {
        let status = "Name:\tloadgen\nVmPeak:\t  20480 kB\nVmRSS:\t   10240 kB\nThreads:\t4\n";
        assert_eq!(parse_vm_rss_kb(status), Some(10240.0));
        assert_eq!(parse_vm_rss_kb("Name:\tx\n"), None);
    }

    #[test]
    fn parses_load_average() {
        assert_eq!(parse_load_average("0.52 0.58 0.59 1/389 12345\n"), Some(0.52));
        assert_eq!(parse_load_average(""), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn proc_probe_reads_live_values() {
        let probe = ProcProbe;
        assert!(probe.memory_mb().unwrap() > 0.0);
        assert!(probe.load_average().unwrap() >= 0.0);
    }
}
