//! Scripted sensor provider
//!
//! Used by the tests and by `espmon-demo --mock` to run the full pipeline on
//! machines without supported sensors.

use crate::core::{Error, HardwareCategory, Result, SensorCategory, SensorRecord};
use crate::hardware::{HardwareNode, SensorProvider};

/// Hardware node with a fixed list of sensors
pub struct MockNode {
    name: String,
    category: HardwareCategory,
    sensors: Vec<SensorRecord>,
    children: Vec<MockNode>,
    updates: usize,
    fail: bool,
}

impl MockNode {
    pub fn new(name: &str, category: HardwareCategory) -> Self {
        Self {
            name: name.to_string(),
            category,
            sensors: Vec::new(),
            children: Vec::new(),
            updates: 0,
            fail: false,
        }
    }

    pub fn with_sensor(mut self, sensor: SensorCategory, name: &str, value: Option<f32>) -> Self {
        self.sensors
            .push(SensorRecord::new(self.category, sensor, name, value));
        self
    }

    pub fn with_child(mut self, child: MockNode) -> Self {
        self.children.push(child);
        self
    }

    /// Make every `update` fail, like hardware that went away
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Change the value of every sensor called `name`
    pub fn set_value(&mut self, name: &str, value: Option<f32>) {
        for sensor in self.sensors.iter_mut().filter(|s| s.name == name) {
            sensor.value = value;
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates
    }
}

impl HardwareNode for MockNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> HardwareCategory {
        self.category
    }

    fn update(&mut self) -> Result<()> {
        self.updates += 1;
        if self.fail {
            return Err(Error::Provider(format!("{} is not accessible", self.name)));
        }
        Ok(())
    }

    fn sensors(&self) -> &[SensorRecord] {
        &self.sensors
    }

    fn sub_hardware(&mut self) -> Vec<&mut dyn HardwareNode> {
        self.children
            .iter_mut()
            .map(|child| child as &mut dyn HardwareNode)
            .collect()
    }
}

/// Provider over a fixed set of [`MockNode`]s
pub struct MockProvider {
    nodes: Vec<MockNode>,
}

impl MockProvider {
    pub fn new(nodes: Vec<MockNode>) -> Self {
        Self { nodes }
    }

    /// A desktop with one CPU and one NVIDIA card at typical idle readings
    pub fn desktop() -> Self {
        Self::new(vec![
            MockNode::new("Mock CPU", HardwareCategory::Cpu)
                .with_sensor(SensorCategory::Temperature, "CPU Package", Some(48.0))
                .with_sensor(SensorCategory::Load, "CPU Total", Some(7.5))
                .with_sensor(SensorCategory::Power, "CPU Package", Some(21.3))
                .with_sensor(SensorCategory::Clock, "CPU Core #1", Some(3600.0))
                .with_sensor(SensorCategory::Clock, "CPU Core #2", Some(3400.0)),
            MockNode::new("Mock GPU", HardwareCategory::GpuNvidia)
                .with_sensor(SensorCategory::Temperature, "GPU Core", Some(41.0))
                .with_sensor(SensorCategory::Load, "GPU Core", Some(3.0))
                .with_sensor(SensorCategory::Clock, "GPU Core", Some(210.0))
                .with_sensor(SensorCategory::Clock, "GPU Memory", Some(405.0))
                .with_sensor(SensorCategory::Power, "GPU Power", Some(14.2)),
        ])
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut MockNode> {
        self.nodes.get_mut(index)
    }

    /// `update` call count of every top-level node
    pub fn update_counts(&self) -> Vec<usize> {
        self.nodes.iter().map(MockNode::update_count).collect()
    }
}

impl SensorProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn hardware(&mut self) -> Result<Vec<&mut dyn HardwareNode>> {
        Ok(self
            .nodes
            .iter_mut()
            .map(|node| node as &mut dyn HardwareNode)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value() {
        let mut node = MockNode::new("CPU", HardwareCategory::Cpu)
            .with_sensor(SensorCategory::Load, "CPU Total", Some(1.0));

        node.set_value("CPU Total", Some(2.0));

        assert_eq!(node.sensors()[0].value, Some(2.0));
        assert_eq!(node.sensors()[0].hardware, HardwareCategory::Cpu);
    }

    #[test]
    fn test_failing_node_counts_update() {
        let mut node = MockNode::new("GPU", HardwareCategory::GpuAti).failing();

        assert!(node.update().is_err());
        assert_eq!(node.update_count(), 1);
    }
}
