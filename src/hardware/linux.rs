//! Linux sysfs sensor sources
//!
//! Supports:
//! - Intel RAPL (Running Average Power Limit) via /sys/class/powercap for CPU package power
//! - AMD GPUs via the amdgpu driver's DRM/hwmon sysfs attributes

use crate::core::{Error, HardwareCategory, Result, SensorCategory, SensorRecord};
use crate::hardware::HardwareNode;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

// ===== RAPL =====

/// Energy counter of the first RAPL package domain
pub struct RaplCounter {
    energy_path: PathBuf,
    max_energy: u64,
    last_energy: u64,
    last_time: Instant,
}

impl RaplCounter {
    pub fn open() -> Result<Self> {
        let package_path = Path::new("/sys/class/powercap/intel-rapl/intel-rapl:0");
        if !package_path.exists() {
            return Err(Error::HardwareNotSupported("RAPL package not found".to_string()));
        }

        let energy_path = package_path.join("energy_uj");
        let max_energy = read_number::<u64>(&package_path.join("max_energy_range_uj"))
            .unwrap_or(u64::MAX);

        // energy_uj is root-only on recent kernels
        let last_energy = read_number::<u64>(&energy_path).ok_or_else(|| {
            Error::HardwareNotSupported(
                "Cannot read RAPL energy (try running with sudo or add CAP_SYS_RAWIO)".to_string(),
            )
        })?;

        Ok(Self {
            energy_path,
            max_energy,
            last_energy,
            last_time: Instant::now(),
        })
    }

    /// Average package power in watts since the previous sample
    pub fn sample(&mut self) -> Result<f64> {
        let current = read_number::<u64>(&self.energy_path)
            .ok_or_else(|| Error::Provider("Failed to read RAPL energy".to_string()))?;
        let now = Instant::now();

        let elapsed = now.duration_since(self.last_time).as_secs_f64();
        let delta = energy_delta(self.last_energy, current, self.max_energy);
        self.last_energy = current;
        self.last_time = now;

        Ok(if elapsed > 0.0 {
            delta as f64 / elapsed / 1_000_000.0
        } else {
            0.0
        })
    }
}

/// Microjoules consumed between two counter readings, accounting for wrap-around
fn energy_delta(last: u64, current: u64, max: u64) -> u64 {
    if current >= last {
        current - last
    } else {
        max.saturating_sub(last) + current
    }
}

// ===== AMD GPU =====

/// AMD graphics card exposed through the amdgpu driver
pub struct AmdGpuNode {
    name: String,
    device_path: PathBuf,
    hwmon_path: Option<PathBuf>,
    sensors: Vec<SensorRecord>,
}

/// Find every DRM card driven by amdgpu
pub fn discover_amd_gpus() -> Vec<AmdGpuNode> {
    let mut nodes = Vec::new();
    let Ok(entries) = fs::read_dir("/sys/class/drm") else {
        return nodes;
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        // Only cardN entries (not cardN-DP-1 etc.)
        if !name_str.starts_with("card") || name_str.contains('-') {
            continue;
        }

        let device_path = entry.path().join("device");
        if !device_path.join("gpu_busy_percent").exists() {
            continue;
        }

        let gpu_name = fs::read_to_string(device_path.join("product_name"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| format!("AMD GPU ({})", name_str));

        nodes.push(AmdGpuNode {
            name: gpu_name,
            hwmon_path: find_gpu_hwmon(&device_path),
            device_path,
            sensors: Vec::new(),
        });
    }

    nodes
}

/// Find the hwmon subdirectory under a DRM device
fn find_gpu_hwmon(device_path: &Path) -> Option<PathBuf> {
    fs::read_dir(device_path.join("hwmon"))
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.join("temp1_input").exists() || path.join("power1_average").exists())
}

/// Current clock from a pp_dpm_sclk/pp_dpm_mclk table (the line marked with `*`)
fn parse_dpm_clock(content: &str) -> Option<f32> {
    let line = content.lines().find(|line| line.contains('*'))?;
    // Format: "1: 1800Mhz *"
    line.split_whitespace().find_map(|word| {
        word.strip_suffix("Mhz")
            .or_else(|| word.strip_suffix("MHz"))
            .and_then(|mhz| mhz.parse::<f32>().ok())
    })
}

impl HardwareNode for AmdGpuNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> HardwareCategory {
        HardwareCategory::GpuAti
    }

    fn update(&mut self) -> Result<()> {
        if !self.device_path.exists() {
            return Err(Error::Provider(format!("{} disappeared", self.name)));
        }

        let hwmon = self.hwmon_path.as_deref();
        let temperature = hwmon
            .and_then(|p| read_number::<f32>(&p.join("temp1_input")))
            .map(|millideg| millideg / 1000.0);
        let power = hwmon
            .and_then(|p| read_number::<f32>(&p.join("power1_average")))
            .map(|uw| uw / 1_000_000.0);
        let usage = read_number::<f32>(&self.device_path.join("gpu_busy_percent"));
        let core_clock = fs::read_to_string(self.device_path.join("pp_dpm_sclk"))
            .ok()
            .and_then(|s| parse_dpm_clock(&s));
        let memory_clock = fs::read_to_string(self.device_path.join("pp_dpm_mclk"))
            .ok()
            .and_then(|s| parse_dpm_clock(&s));

        let gpu = |category, name: &str, value| {
            SensorRecord::new(HardwareCategory::GpuAti, category, name, value)
        };
        self.sensors = vec![
            gpu(SensorCategory::Temperature, "GPU Core", temperature),
            gpu(SensorCategory::Load, "GPU Core", usage),
            gpu(SensorCategory::Clock, "GPU Core", core_clock),
            gpu(SensorCategory::Clock, "GPU Memory", memory_clock),
            gpu(SensorCategory::Power, "GPU Power", power),
        ];
        Ok(())
    }

    fn sensors(&self) -> &[SensorRecord] {
        &self.sensors
    }
}

fn read_number<T: std::str::FromStr>(path: &Path) -> Option<T> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_delta() {
        assert_eq!(energy_delta(100, 250, 1000), 150);
        // Counter wrapped past max_energy_range_uj
        assert_eq!(energy_delta(900, 50, 1000), 150);
        assert_eq!(energy_delta(7, 7, 1000), 0);
    }

    #[test]
    fn test_parse_dpm_clock() {
        let sclk = "0: 500Mhz\n1: 1800Mhz *\n2: 2100Mhz\n";
        assert_eq!(parse_dpm_clock(sclk), Some(1800.0));

        let mclk = "0: 96MHz\n1: 1000MHz *\n";
        assert_eq!(parse_dpm_clock(mclk), Some(1000.0));

        assert_eq!(parse_dpm_clock("0: 500Mhz\n1: 800Mhz\n"), None);
        assert_eq!(parse_dpm_clock(""), None);
    }

    #[test]
    fn test_amd_node_reads_sysfs_layout() {
        let dir = tempfile::tempdir().unwrap();
        let device = dir.path().join("device");
        let hwmon = device.join("hwmon").join("hwmon4");
        fs::create_dir_all(&hwmon).unwrap();
        fs::write(device.join("gpu_busy_percent"), "37\n").unwrap();
        fs::write(device.join("pp_dpm_sclk"), "0: 500Mhz\n1: 2400Mhz *\n").unwrap();
        fs::write(device.join("pp_dpm_mclk"), "0: 96Mhz *\n").unwrap();
        fs::write(hwmon.join("temp1_input"), "61000\n").unwrap();
        fs::write(hwmon.join("power1_average"), "145000000\n").unwrap();

        let mut node = AmdGpuNode {
            name: "Test AMD".to_string(),
            hwmon_path: find_gpu_hwmon(&device),
            device_path: device,
            sensors: Vec::new(),
        };
        node.update().unwrap();

        let value = |category: SensorCategory, name: &str| {
            node.sensors()
                .iter()
                .find(|s| s.category == category && s.name == name)
                .and_then(|s| s.value)
        };
        assert_eq!(value(SensorCategory::Temperature, "GPU Core"), Some(61.0));
        assert_eq!(value(SensorCategory::Load, "GPU Core"), Some(37.0));
        assert_eq!(value(SensorCategory::Clock, "GPU Core"), Some(2400.0));
        assert_eq!(value(SensorCategory::Clock, "GPU Memory"), Some(96.0));
        assert_eq!(value(SensorCategory::Power, "GPU Power"), Some(145.0));
    }

    #[test]
    fn test_amd_node_fails_when_device_is_gone() {
        let mut node = AmdGpuNode {
            name: "Gone".to_string(),
            device_path: PathBuf::from("/nonexistent/drm/card9/device"),
            hwmon_path: None,
            sensors: Vec::new(),
        };
        assert!(matches!(node.update(), Err(Error::Provider(_))));
    }
}
