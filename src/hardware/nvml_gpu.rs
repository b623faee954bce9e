//! NVIDIA GPU sensors via NVML
//!
//! One hardware node per NVML device, all sharing a single library handle.

use crate::core::{Error, HardwareCategory, Result, SensorCategory, SensorRecord};
use crate::hardware::HardwareNode;
use nvml_wrapper::enum_wrappers::device::{Clock, TemperatureSensor};
use nvml_wrapper::Nvml;
use std::sync::Arc;

/// Initialize NVML.
/// Returns None if NVML is not available (no NVIDIA driver, no GPU, etc.)
pub fn init_nvml() -> Option<Arc<Nvml>> {
    match Nvml::init() {
        Ok(nvml) => Some(Arc::new(nvml)),
        Err(e) => {
            log::debug!("NVML init failed: {}", e);
            None
        }
    }
}

/// One node per NVIDIA device NVML can see
pub fn discover(nvml: Arc<Nvml>) -> Vec<NvidiaGpuNode> {
    let device_count = match nvml.device_count() {
        Ok(count) => count,
        Err(e) => {
            log::debug!("NVML device count failed: {}", e);
            return Vec::new();
        }
    };

    (0..device_count)
        .filter_map(|index| {
            let device = nvml.device_by_index(index).ok()?;
            let name = device.name().unwrap_or_else(|_| "NVIDIA GPU".to_string());
            Some(NvidiaGpuNode {
                nvml: Arc::clone(&nvml),
                index,
                name,
                sensors: Vec::new(),
            })
        })
        .collect()
}

pub struct NvidiaGpuNode {
    nvml: Arc<Nvml>,
    index: u32,
    name: String,
    sensors: Vec<SensorRecord>,
}

impl HardwareNode for NvidiaGpuNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> HardwareCategory {
        HardwareCategory::GpuNvidia
    }

    fn update(&mut self) -> Result<()> {
        let device = self
            .nvml
            .device_by_index(self.index)
            .map_err(|e| Error::Provider(format!("NVML device {}: {}", self.index, e)))?;

        let temperature = device
            .temperature(TemperatureSensor::Gpu)
            .ok()
            .map(|t| t as f32);
        let utilization = device.utilization_rates().ok();
        let core_clock = device.clock_info(Clock::Graphics).ok().map(|c| c as f32);
        let memory_clock = device.clock_info(Clock::Memory).ok().map(|c| c as f32);
        // milliwatts -> watts
        let power = device.power_usage().ok().map(|mw| mw as f32 / 1000.0);

        let gpu = |category, name: &str, value| {
            SensorRecord::new(HardwareCategory::GpuNvidia, category, name, value)
        };
        self.sensors = vec![
            gpu(SensorCategory::Temperature, "GPU Core", temperature),
            gpu(SensorCategory::Load, "GPU Core", utilization.as_ref().map(|u| u.gpu as f32)),
            gpu(
                SensorCategory::Load,
                "GPU Memory Controller",
                utilization.as_ref().map(|u| u.memory as f32),
            ),
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
