//! Host diagnostics for the admin surface
//!
//! Snapshots CPU, memory, disk, and uptime figures via sysinfo. The
//! collector keeps one `System` alive between snapshots because sysinfo
//! needs two refreshes to produce meaningful CPU usage numbers.

use mbx_common::human_time::format_uptime;
use serde::Serialize;
use std::time::Instant;
use sysinfo::{Disks, System};

/// CPU figures
#[derive(Debug, Clone, Serialize)]
pub struct CpuStats {
    pub brand: String,
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub frequency_mhz: u64,
    /// Average usage across all logical cores, percent
    pub usage_percent: f32,
}

/// Memory figures, bytes
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub total: u64,
    pub used: u64,
    pub used_percent: f32,
}

/// Disk figures summed over all mounted disks, bytes
#[derive(Debug, Clone, Serialize)]
pub struct DiskStats {
    pub total: u64,
    pub used: u64,
    pub used_percent: f32,
}

/// One host diagnostics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct HostStats {
    pub os: String,
    pub os_version: String,
    pub host_name: String,
    pub arch: String,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub disk: DiskStats,
    /// Daemon uptime, formatted H:MM:SS (or Dd-H:MM:SS past a day)
    pub uptime: String,
}

/// Stateful diagnostics collector
pub struct StatsCollector {
    system: System,
    started: Instant,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
            started: Instant::now(),
        }
    }

    /// Take a fresh snapshot of the host
    pub fn collect(&mut self) -> HostStats {
        self.system.refresh_all();

        let cpus = self.system.cpus();
        let usage_percent = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };
        let cpu = CpuStats {
            brand: cpus
                .first()
                .map(|c| c.brand().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            physical_cores: self.system.physical_core_count(),
            logical_cores: cpus.len(),
            frequency_mhz: cpus.first().map(|c| c.frequency()).unwrap_or(0),
            usage_percent,
        };

        let total_memory = self.system.total_memory();
        let used_memory = self.system.used_memory();
        let memory = MemoryStats {
            total: total_memory,
            used: used_memory,
            used_percent: percent(used_memory, total_memory),
        };

        let disks = Disks::new_with_refreshed_list();
        let disk_total: u64 = disks.iter().map(|d| d.total_space()).sum();
        let disk_available: u64 = disks.iter().map(|d| d.available_space()).sum();
        let disk_used = disk_total.saturating_sub(disk_available);
        let disk = DiskStats {
            total: disk_total,
            used: disk_used,
            used_percent: percent(disk_used, disk_total),
        };

        HostStats {
            os: System::name().unwrap_or_else(|| "unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
            host_name: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            arch: std::env::consts::ARCH.to_string(),
            cpu,
            memory,
            disk,
            uptime: format_uptime(self.started.elapsed().as_secs()),
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}
