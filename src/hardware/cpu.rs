//! CPU sensors via sysinfo
//!
//! Exposes the processor the way the display's classifier expects it:
//! "CPU Total" load, "CPU Core #n" load and clock, "CPU Package" temperature,
//! and "CPU Package" power where an energy counter is readable.

use crate::core::{HardwareCategory, Result, SensorCategory, SensorRecord};
use crate::hardware::HardwareNode;
use sysinfo::{Components, System};

/// Component labels that carry the package/die temperature, in order of preference
const PACKAGE_TEMP_LABELS: &[&str] = &["Package id 0", "Tdie", "Tctl", "Package", "CPU"];

/// The host processor
pub struct CpuNode {
    name: String,
    sys: System,
    components: Components,
    #[cfg(target_os = "linux")]
    rapl: Option<super::linux::RaplCounter>,
    sensors: Vec<SensorRecord>,
}

impl CpuNode {
    pub fn new() -> Self {
        let mut sys = System::new();
        // Usage is a delta between two refreshes; prime the first sample
        sys.refresh_cpu_usage();
        sys.refresh_cpu_frequency();

        let name = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| "Unknown CPU".to_string());

        #[cfg(target_os = "linux")]
        let rapl = match super::linux::RaplCounter::open() {
            Ok(counter) => {
                log::info!("Using RAPL for CPU package power");
                Some(counter)
            }
            Err(e) => {
                log::debug!("RAPL unavailable: {}", e);
                None
            }
        };

        Self {
            name,
            sys,
            components: Components::new_with_refreshed_list(),
            #[cfg(target_os = "linux")]
            rapl,
            sensors: Vec::new(),
        }
    }

    fn package_temperature(&self) -> Option<f32> {
        let components = self.components.list();
        PACKAGE_TEMP_LABELS.iter().find_map(|wanted| {
            components
                .iter()
                .find(|c| c.label().contains(wanted))
                .map(|c| c.temperature())
                .filter(|t| t.is_finite() && *t > 0.0)
        })
    }

    #[cfg(target_os = "linux")]
    fn package_power(&mut self) -> Option<f32> {
        let rapl = self.rapl.as_mut()?;
        match rapl.sample() {
            Ok(watts) => Some(watts as f32),
            Err(e) => {
                log::debug!("RAPL read failed: {}", e);
                None
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn package_power(&mut self) -> Option<f32> {
        None
    }
}

impl Default for CpuNode {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareNode for CpuNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> HardwareCategory {
        HardwareCategory::Cpu
    }

    fn update(&mut self) -> Result<()> {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_cpu_frequency();
        self.components.refresh();

        let mut sensors = Vec::with_capacity(self.sys.cpus().len() * 2 + 3);
        let cpu = |category, name: String, value| {
            SensorRecord::new(HardwareCategory::Cpu, category, name, value)
        };

        sensors.push(cpu(
            SensorCategory::Load,
            "CPU Total".to_string(),
            Some(self.sys.global_cpu_info().cpu_usage()),
        ));

        for (i, core) in self.sys.cpus().iter().enumerate() {
            let label = format!("CPU Core #{}", i + 1);
            sensors.push(cpu(SensorCategory::Load, label.clone(), Some(core.cpu_usage())));
            sensors.push(cpu(SensorCategory::Clock, label, Some(core.frequency() as f32)));
        }

        sensors.push(cpu(
            SensorCategory::Temperature,
            "CPU Package".to_string(),
            self.package_temperature(),
        ));

        if let Some(watts) = self.package_power() {
            sensors.push(cpu(SensorCategory::Power, "CPU Package".to_string(), Some(watts)));
        }

        self.sensors = sensors;
        Ok(())
    }

    fn sensors(&self) -> &[SensorRecord] {
        &self.sensors
    }
}
