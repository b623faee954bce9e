//! Collector: provider -> classifier -> metric store

use crate::core::{MetricSnapshot, MetricStore, Result};
use crate::hardware::{classify, HardwareNode, SensorProvider};
use std::sync::Arc;

/// Refresh every hardware node of `provider` and publish the classified values
///
/// The new snapshot starts from the currently published one, so metrics the
/// provider did not report this time keep their previous value. Nothing is
/// published if the provider fails.
pub fn refresh(provider: &mut dyn SensorProvider, store: &MetricStore) -> Result<()> {
    let mut next = (*store.snapshot()).clone();

    let mut applied = 0;
    for node in provider.hardware()? {
        applied += visit(node, &mut next)?;
    }

    next.mark_collected();
    store.publish(next);

    log::trace!("Refreshed {} metrics from {}", applied, provider.name());
    Ok(())
}

fn visit(node: &mut dyn HardwareNode, snapshot: &mut MetricSnapshot) -> Result<usize> {
    node.update()?;

    let mut applied = 0;
    for record in node.sensors() {
        if let Some((part, metric)) = classify(record) {
            snapshot.set(part, metric, record.value.unwrap_or(0.0));
            applied += 1;
        }
    }

    for child in node.sub_hardware() {
        applied += visit(child, snapshot)?;
    }

    Ok(applied)
}

/// Owns a provider and the store it feeds
pub struct Collector {
    provider: Box<dyn SensorProvider>,
    store: Arc<MetricStore>,
}

impl Collector {
    pub fn new(provider: Box<dyn SensorProvider>, store: Arc<MetricStore>) -> Self {
        Self { provider, store }
    }

    /// Run one collection tick
    pub fn refresh(&mut self) -> Result<()> {
        refresh(self.provider.as_mut(), &self.store)
    }

    pub fn store(&self) -> &Arc<MetricStore> {
        &self.store
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Error, HardwareCategory, MetricKind, Part, SensorCategory};
    use crate::hardware::mock::{MockNode, MockProvider};

    fn sample_provider() -> MockProvider {
        MockProvider::new(vec![
            MockNode::new("Test CPU", HardwareCategory::Cpu)
                .with_sensor(SensorCategory::Temperature, "CPU Package", Some(55.0))
                .with_sensor(SensorCategory::Temperature, "CPU Core #1", Some(70.0))
                .with_sensor(SensorCategory::Load, "CPU Total", Some(10.0))
                .with_sensor(SensorCategory::Power, "CPU Package", Some(35.5))
                .with_sensor(SensorCategory::Clock, "CPU Core #1", Some(4200.0)),
            MockNode::new("Test GPU", HardwareCategory::GpuNvidia)
                .with_sensor(SensorCategory::Temperature, "GPU Core", Some(65.0))
                .with_sensor(SensorCategory::Load, "GPU Core", Some(20.0))
                .with_sensor(SensorCategory::Clock, "GPU Core", Some(1800.0))
                .with_sensor(SensorCategory::Clock, "GPU Memory", Some(7000.0))
                .with_sensor(SensorCategory::Power, "GPU Power", Some(120.0)),
            MockNode::new("DIMM", HardwareCategory::Memory)
                .with_sensor(SensorCategory::Load, "Memory", Some(42.0)),
        ])
    }

    #[test]
    fn test_refresh_populates_store() {
        let store = MetricStore::new();
        let mut provider = sample_provider();

        refresh(&mut provider, &store).unwrap();

        assert_eq!(store.get(Part::Processor, MetricKind::Temperature), 55.0);
        assert_eq!(store.get(Part::Processor, MetricKind::UsagePercentage), 10.0);
        assert_eq!(store.get(Part::Processor, MetricKind::PowerDrawWatts), 35.5);
        assert_eq!(store.get(Part::Processor, MetricKind::FrequencyHz), 4200.0);
        assert_eq!(store.get(Part::GraphicsCard, MetricKind::Temperature), 65.0);
        assert_eq!(store.get(Part::GraphicsCard, MetricKind::UsagePercentage), 20.0);
        assert_eq!(store.get(Part::GraphicsCard, MetricKind::FrequencyHz), 1800.0);
        assert_eq!(store.get(Part::GraphicsCard, MetricKind::VideoMemoryFrequencyHz), 7000.0);
        assert_eq!(store.get(Part::GraphicsCard, MetricKind::PowerDrawWatts), 120.0);
        // Memory has no classification rule
        assert_eq!(store.get(Part::Memory, MetricKind::UsagePercentage), 0.0);
        assert!(store.snapshot().collected_at().is_some());
    }

    #[test]
    fn test_refresh_updates_every_node_once() {
        let store = MetricStore::new();
        let mut provider = sample_provider();

        refresh(&mut provider, &store).unwrap();
        refresh(&mut provider, &store).unwrap();

        assert_eq!(provider.update_counts(), vec![2, 2, 2]);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let store = MetricStore::new();
        let mut provider = sample_provider();

        refresh(&mut provider, &store).unwrap();
        let first = store.snapshot().metrics().clone();
        refresh(&mut provider, &store).unwrap();

        assert_eq!(store.snapshot().metrics(), &first);
    }

    #[test]
    fn test_absent_value_reads_as_zero() {
        let store = MetricStore::new();
        store.set(Part::Processor, MetricKind::Temperature, 80.0);
        let mut provider = MockProvider::new(vec![MockNode::new("CPU", HardwareCategory::Cpu)
            .with_sensor(SensorCategory::Temperature, "CPU Package", None)]);

        refresh(&mut provider, &store).unwrap();

        assert_eq!(store.get(Part::Processor, MetricKind::Temperature), 0.0);
    }

    #[test]
    fn test_unreported_metric_keeps_previous_value() {
        let store = MetricStore::new();
        store.set(Part::GraphicsCard, MetricKind::PowerDrawWatts, 90.0);
        let mut provider = MockProvider::new(vec![MockNode::new("GPU", HardwareCategory::GpuAti)
            .with_sensor(SensorCategory::Temperature, "GPU Core", Some(50.0))]);

        refresh(&mut provider, &store).unwrap();

        assert_eq!(store.get(Part::GraphicsCard, MetricKind::PowerDrawWatts), 90.0);
        assert_eq!(store.get(Part::GraphicsCard, MetricKind::Temperature), 50.0);
    }

    #[test]
    fn test_sub_hardware_is_visited() {
        let store = MetricStore::new();
        let mut provider = MockProvider::new(vec![MockNode::new("Board", HardwareCategory::Mainboard)
            .with_child(
                MockNode::new("CPU", HardwareCategory::Cpu)
                    .with_sensor(SensorCategory::Load, "CPU Total", Some(33.0)),
            )]);

        refresh(&mut provider, &store).unwrap();

        assert_eq!(store.get(Part::Processor, MetricKind::UsagePercentage), 33.0);
    }

    #[test]
    fn test_later_sensor_overwrites_earlier() {
        let store = MetricStore::new();
        let mut provider = MockProvider::new(vec![MockNode::new("GPU", HardwareCategory::GpuNvidia)
            .with_sensor(SensorCategory::Power, "GPU Package", Some(100.0))
            .with_sensor(SensorCategory::Power, "GPU Board", Some(150.0))]);

        refresh(&mut provider, &store).unwrap();

        assert_eq!(store.get(Part::GraphicsCard, MetricKind::PowerDrawWatts), 150.0);
    }

    #[test]
    fn test_provider_failure_propagates_and_keeps_store() {
        let store = MetricStore::new();
        store.set(Part::Processor, MetricKind::Temperature, 42.0);
        let mut provider = MockProvider::new(vec![MockNode::new("CPU", HardwareCategory::Cpu)
            .with_sensor(SensorCategory::Temperature, "CPU Package", Some(99.0))
            .failing()]);

        let result = refresh(&mut provider, &store);

        assert!(matches!(result, Err(Error::Provider(_))));
        assert_eq!(store.get(Part::Processor, MetricKind::Temperature), 42.0);
    }

    #[test]
    fn test_collector_wrapper() {
        let store = Arc::new(MetricStore::new());
        let mut collector = Collector::new(Box::new(sample_provider()), Arc::clone(&store));

        collector.refresh().unwrap();

        assert_eq!(collector.provider_name(), "mock");
        assert_eq!(store.get(Part::GraphicsCard, MetricKind::Temperature), 65.0);
    }
}
