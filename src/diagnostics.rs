//! Canned diagnostics served to the web dashboard. The desktop shell replaces
//! these with real measurements.

use json::{Value, json};

use crate::prelude::*;

pub fn system_overview() -> Value {
  json!({
    "cpu": { "usage": 45.2, "cores": 8, "model": "Intel Core i7-9700K" },
    "memory": { "total": 16384, "used": 8192, "free": 8192, "usagePercent": 50 },
    "disk": { "total": 512000, "used": 256000, "free": 256000, "usagePercent": 50 },
  })
}

pub fn startup_programs() -> Value {
  json!({
    "programs": [
      {
        "name": "Discord",
        "publisher": "Discord Inc.",
        "impact": "high",
        "enabled": true,
        "path": "C:\\Users\\User\\AppData\\Local\\Discord\\Update.exe",
      },
      {
        "name": "Spotify",
        "publisher": "Spotify AB",
        "impact": "medium",
        "enabled": true,
        "path": "C:\\Users\\User\\AppData\\Roaming\\Spotify\\Spotify.exe",
      },
      {
        "name": "Windows Security",
        "publisher": "Microsoft Corporation",
        "impact": "low",
        "enabled": true,
        "path": "C:\\Windows\\System32\\SecurityHealthSystray.exe",
      },
    ]
  })
}

pub fn running_processes() -> Value {
  json!({
    "processes": [
      { "name": "chrome.exe", "pid": 1234, "cpuUsage": 15.5, "memoryUsage": 1024, "status": "running" },
      { "name": "discord.exe", "pid": 5678, "cpuUsage": 8.2, "memoryUsage": 512, "status": "running" },
      { "name": "explorer.exe", "pid": 9012, "cpuUsage": 2.1, "memoryUsage": 256, "status": "running" },
    ],
    "totalProcesses": 156,
    "highCpuCount": 3,
    "highMemoryCount": 5,
  })
}

pub fn driver_status() -> Value {
  json!({
    "drivers": [
      {
        "name": "NVIDIA Graphics Driver",
        "currentVersion": "531.68",
        "latestVersion": "546.33",
        "status": "outdated",
        "category": "Display",
        "updateAvailable": true,
      },
      {
        "name": "Realtek Audio Driver",
        "currentVersion": "6.0.9088.1",
        "latestVersion": "6.0.9088.1",
        "status": "up-to-date",
        "category": "Audio",
        "updateAvailable": false,
      },
      {
        "name": "Intel Wi-Fi Driver",
        "currentVersion": "22.120.0",
        "latestVersion": "23.10.0",
        "status": "outdated",
        "category": "Network",
        "updateAvailable": true,
      },
    ],
    "totalDrivers": 15,
    "outdatedCount": 2,
  })
}

pub fn security_status() -> Value {
  let now = Utc::now();
  let last_scan = now - TimeDelta::hours(1);
  let last_checked = now - TimeDelta::days(1);

  json!({
    "firewall": { "enabled": true, "status": "protected" },
    "antivirus": {
      "enabled": true,
      "upToDate": true,
      "lastScan": last_scan.to_rfc3339(),
      "status": "protected",
    },
    "windowsUpdate": {
      "upToDate": false,
      "pendingUpdates": 3,
      "lastChecked": last_checked.to_rfc3339(),
      "status": "attention-needed",
    },
    "overallStatus": "good",
    "issues": [
      {
        "severity": "medium",
        "message": "3 Windows updates are pending installation",
        "action": "Install updates",
      }
    ],
  })
}

pub fn performance_bottlenecks() -> Value {
  json!({
    "bottlenecks": [
      {
        "category": "junk",
        "severity": "high",
        "issue": "Temporary files buildup",
        "description": "4.2GB of temporary files and cache taking up disk space",
        "recommendation": "Clean temporary files and system cache",
        "impact": "Free up 4.2GB of disk space",
      },
      {
        "category": "disk",
        "severity": "medium",
        "issue": "Disk fragmentation",
        "description": "System drive is 35% fragmented",
        "recommendation": "Run disk defragmentation",
        "impact": "File access speed could improve by 20%",
      },
      {
        "category": "junk",
        "severity": "low",
        "issue": "Browser cache overload",
        "description": "Browser cache contains 1.8GB of old data",
        "recommendation": "Clear browser cache and cookies",
        "impact": "Free up 1.8GB and improve browser speed",
      },
    ]
  })
}

pub const SCAN_ISSUES: i32 = 5;

pub fn scan_results() -> Value {
  json!({
    "systemOverview": {
      "cpu": { "usage": 45.2, "cores": 8 },
      "memory": { "usagePercent": 50 },
      "disk": { "usagePercent": 50 },
    },
    "issuesFound": SCAN_ISSUES,
    "recommendations": [
      "Disable 3 unnecessary startup programs",
      "Update 2 outdated drivers",
      "Install 3 pending Windows updates",
    ],
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fixtures_are_consistent() {
    assert_eq!(scan_results()["issuesFound"], SCAN_ISSUES);
    assert_eq!(driver_status()["drivers"].as_array().map(Vec::len), Some(3));
    assert_eq!(security_status()["windowsUpdate"]["pendingUpdates"], 3);
  }
}
