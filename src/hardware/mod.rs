//! Hardware sensor module
//!
//! Provides the sensor provider abstraction the collector reads from, plus the
//! host backends that implement it:
//! - CPU: sysinfo for load/clock/temperature, Intel RAPL for package power (Linux)
//! - NVIDIA GPU: NVML
//! - AMD GPU: amdgpu sysfs (Linux)

mod classifier;
mod collector;
mod cpu;
#[cfg(target_os = "linux")]
mod linux;
pub mod mock;
mod nvml_gpu;

pub use classifier::{classify, rules_for, Rule, CPU_RULES, GPU_RULES};
pub use collector::{refresh, Collector};

use crate::core::{Error, HardwareCategory, Result, SensorConfig, SensorRecord};

/// A node of the provider's hardware tree
pub trait HardwareNode: Send {
    /// Display name (e.g. the CPU brand string)
    fn name(&self) -> &str;

    fn category(&self) -> HardwareCategory;

    /// Re-sample the node; must be called before reading `sensors`
    fn update(&mut self) -> Result<()>;

    /// Sensor records as of the last `update`
    fn sensors(&self) -> &[SensorRecord];

    /// Nested hardware (e.g. a controller on a mainboard)
    fn sub_hardware(&mut self) -> Vec<&mut dyn HardwareNode> {
        Vec::new()
    }
}

/// Source of hardware nodes
pub trait SensorProvider: Send {
    /// Name of this provider
    fn name(&self) -> &str;

    /// Top-level hardware nodes currently present
    fn hardware(&mut self) -> Result<Vec<&mut dyn HardwareNode>>;
}

/// Sensor provider backed by the host's own hardware
pub struct SystemProvider {
    nodes: Vec<Box<dyn HardwareNode>>,
}

impl SystemProvider {
    /// Open every enabled hardware class that is present on this machine
    pub fn detect(config: &SensorConfig) -> Result<Self> {
        let mut nodes: Vec<Box<dyn HardwareNode>> = Vec::new();

        if config.cpu_enabled {
            let node = cpu::CpuNode::new();
            log::info!("Using sysinfo for CPU sensors ({})", node.name());
            nodes.push(Box::new(node));
        }

        if config.gpu_enabled {
            if let Some(nvml) = nvml_gpu::init_nvml() {
                for node in nvml_gpu::discover(nvml) {
                    log::info!("Using NVML for GPU sensors ({})", node.name());
                    nodes.push(Box::new(node));
                }
            }

            #[cfg(target_os = "linux")]
            for node in linux::discover_amd_gpus() {
                log::info!("Using amdgpu sysfs for GPU sensors ({})", node.name());
                nodes.push(Box::new(node));
            }
        }

        if nodes.is_empty() {
            log::warn!("No hardware sensors available");
            return Err(Error::HardwareNotSupported(
                "No enabled hardware sensors detected".to_string(),
            ));
        }

        Ok(Self { nodes })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl SensorProvider for SystemProvider {
    fn name(&self) -> &str {
        "system"
    }

    fn hardware(&mut self) -> Result<Vec<&mut dyn HardwareNode>> {
        Ok(self
            .nodes
            .iter_mut()
            .map(|node| node.as_mut() as &mut dyn HardwareNode)
            .collect())
    }
}
