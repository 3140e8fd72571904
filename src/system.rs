//! Host inspection backed by `sysinfo`, with synthetic fallbacks where the host
//! exposes nothing useful (containers, sandboxes).

use rand::Rng;
use serde::Serialize;
use sysinfo::{Disks, Pid, System};

const GB: f64 = 1024.0 * 1024.0 * 1024.0;
const MB: f64 = 1024.0 * 1024.0;

/// Disk figures reported by the optimizer are simulated.
const SIMULATED_DISK_TOTAL_GB: u64 = 512;
const SIMULATED_DISK_USED_GB: u64 = 256;

#[derive(Debug, Clone, Serialize)]
pub struct CpuInfo {
  pub usage: f32,
  pub model: String,
  pub cores: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
  pub total: u64,
  pub used: u64,
  pub free: u64,
  pub usage_percent: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
  pub cpu: CpuInfo,
  pub memory: Usage,
  pub disk: Usage,
  pub platform: String,
  pub hostname: String,
  /// Hours since boot.
  pub uptime: u64,
}

fn refreshed() -> System {
  let mut sys = System::new_all();
  // cpu usage needs two samples
  std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
  sys.refresh_cpu();
  sys
}

fn percent(part: f64, total: f64) -> u64 {
  if total <= 0.0 { 0 } else { (part / total * 100.0).round() as u64 }
}

pub fn metrics() -> Metrics {
  let sys = refreshed();

  let usage = (sys.global_cpu_info().cpu_usage() * 10.0).round() / 10.0;
  let model = sys
    .cpus()
    .first()
    .map(|cpu| cpu.brand().trim().to_string())
    .filter(|brand| !brand.is_empty())
    .unwrap_or_else(|| "Unknown CPU".into());

  let total = sys.total_memory() as f64;
  let free = sys.available_memory() as f64;
  let used = total - free;

  let disk_free = SIMULATED_DISK_TOTAL_GB - SIMULATED_DISK_USED_GB;

  Metrics {
    cpu: CpuInfo { usage, model, cores: sys.cpus().len() },
    memory: Usage {
      total: (total / GB).round() as u64,
      used: (used / GB).round() as u64,
      free: (free / GB).round() as u64,
      usage_percent: percent(used, total),
    },
    disk: Usage {
      total: SIMULATED_DISK_TOTAL_GB,
      used: SIMULATED_DISK_USED_GB,
      free: disk_free,
      usage_percent: percent(
        SIMULATED_DISK_USED_GB as f64,
        SIMULATED_DISK_TOTAL_GB as f64,
      ),
    },
    platform: std::env::consts::OS.to_string(),
    hostname: System::host_name().unwrap_or_else(|| "localhost".into()),
    uptime: System::uptime() / 3600,
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Process {
  pub pid: u32,
  pub name: String,
  pub cpu: f32,
  /// Resident memory in MB.
  pub memory: f64,
  pub status: String,
}

const LIMIT: usize = 50;

pub fn processes() -> Vec<Process> {
  let sys = refreshed();

  let mut list: Vec<Process> = sys
    .processes()
    .values()
    .map(|p| Process {
      pid: p.pid().as_u32(),
      name: p.name().to_string(),
      cpu: p.cpu_usage(),
      memory: p.memory() as f64 / MB,
      status: p.status().to_string(),
    })
    .collect();

  if list.is_empty() {
    return mock_processes();
  }

  list.sort_by(|a, b| b.cpu.total_cmp(&a.cpu));
  list.truncate(LIMIT);
  list
}

fn mock_processes() -> Vec<Process> {
  const NAMES: &[&str] = &[
    "chrome.exe",
    "firefox.exe",
    "code.exe",
    "node.exe",
    "explorer.exe",
    "System",
    "svchost.exe",
    "MsMpEng.exe",
    "Discord.exe",
    "Spotify.exe",
    "Steam.exe",
    "nvidia-container.exe",
    "RuntimeBroker.exe",
    "SearchIndexer.exe",
    "dwm.exe",
    "csrss.exe",
    "winlogon.exe",
    "services.exe",
    "lsass.exe",
    "taskhostw.exe",
  ];

  let mut rng = rand::thread_rng();
  NAMES
    .iter()
    .enumerate()
    .map(|(i, name)| Process {
      pid: 1000 + i as u32 * 100 + rng.gen_range(0..50),
      name: name.to_string(),
      cpu: rng.gen_range(0.0..100.0),
      memory: rng.gen_range(0.0..1000.0),
      status: if rng.gen_bool(0.9) { "Running" } else { "Suspended" }.into(),
    })
    .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  pub cpu_usage: f32,
  pub memory_usage: f64,
  pub disk_usage: f64,
  pub process_count: usize,
}

pub fn summary() -> Summary {
  let sys = refreshed();

  let disks = Disks::new_with_refreshed_list();
  let (total, available) = disks.list().iter().fold((0u64, 0u64), |acc, d| {
    (acc.0 + d.total_space(), acc.1 + d.available_space())
  });
  let disk_usage = if total > 0 {
    (total - available) as f64 / total as f64 * 100.0
  } else {
    rand::thread_rng().gen_range(0.0..100.0)
  };

  let mem_total = sys.total_memory() as f64;
  let memory_usage = if mem_total > 0.0 {
    (mem_total - sys.available_memory() as f64) / mem_total * 100.0
  } else {
    0.0
  };

  Summary {
    cpu_usage: sys.global_cpu_info().cpu_usage(),
    memory_usage,
    disk_usage,
    process_count: sys.processes().len(),
  }
}

/// Sends a kill signal; `false` when the pid is unknown or the signal fails.
pub fn kill(pid: u32) -> bool {
  let sys = System::new_all();
  sys.process(Pid::from_u32(pid)).is_some_and(|p| p.kill())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn disk_is_simulated() {
    let metrics = metrics();
    assert_eq!(metrics.disk.total, 512);
    assert_eq!(metrics.disk.usage_percent, 50);
    assert!(metrics.cpu.cores >= 1 || metrics.cpu.model == "Unknown CPU");
  }

  #[test]
  fn process_list_is_bounded() {
    let list = processes();
    assert!(!list.is_empty());
    assert!(list.len() <= LIMIT);
  }

  #[test]
  fn unknown_pid_is_not_killed() {
    assert!(!kill(u32::MAX - 7));
  }
}
