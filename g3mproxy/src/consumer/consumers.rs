/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;

use super::{ConsumerMetricConfig, ConsumersConfig};
use crate::types::{ConsumerId, MetricId};

/// Lookup view of one generation of the merged consumer config.
#[derive(Debug, Default)]
pub struct MetricsConsumers {
    consumer_metrics: IndexMap<ConsumerId, Vec<ConsumerMetricConfig>>,
    consumers_by_metric: IndexMap<ConsumerMetricConfig, Vec<ConsumerId>>,
}

impl MetricsConsumers {
    pub fn new(config: &ConsumersConfig) -> Self {
        let mut consumer_metrics = IndexMap::with_capacity(config.consumer.len());
        let mut consumers_by_metric: IndexMap<ConsumerMetricConfig, Vec<ConsumerId>> =
            IndexMap::new();

        for consumer in &config.consumer {
            let id = ConsumerId::new(&consumer.name);
            for metric in &consumer.metric {
                let ids = consumers_by_metric.entry(metric.clone()).or_default();
                if !ids.contains(&id) {
                    ids.push(id.clone());
                }
            }
            consumer_metrics.insert(id, consumer.metric.clone());
        }

        MetricsConsumers {
            consumer_metrics,
            consumers_by_metric,
        }
    }

    pub fn metric_definitions(&self, consumer: &ConsumerId) -> &[ConsumerMetricConfig] {
        self.consumer_metrics
            .get(consumer)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    #[inline]
    pub fn consumers_by_metric(&self) -> &IndexMap<ConsumerMetricConfig, Vec<ConsumerId>> {
        &self.consumers_by_metric
    }

    pub fn all_consumers(&self) -> impl Iterator<Item = &ConsumerId> {
        self.consumer_metrics.keys()
    }

    #[inline]
    pub fn contains(&self, consumer: &ConsumerId) -> bool {
        self.consumer_metrics.contains_key(consumer)
    }

    /// Ids of all metrics that at least one consumer subscribes to
    pub fn whitelisted_metrics(&self) -> HashSet<MetricId> {
        self.consumers_by_metric
            .keys()
            .map(|m| MetricId::new(&m.name))
            .collect()
    }

    /// Mapping from metric id to all of its output names, over all consumers.
    ///
    /// Metrics that only have their id as output name are included.
    pub fn output_names_by_id(&self) -> IndexMap<MetricId, Vec<String>> {
        let mut output_names: IndexMap<MetricId, Vec<String>> = IndexMap::new();
        for metric in self.consumers_by_metric.keys() {
            let names = output_names.entry(MetricId::new(&metric.name)).or_default();
            let name = if metric.outputname.is_empty() {
                &metric.name
            } else {
                &metric.outputname
            };
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        output_names
    }
}

/// Shared handle to the current consumer generation.
///
/// A config reload stores a new generation, readers keep the one they loaded.
#[derive(Clone)]
pub struct ConsumersHandle {
    inner: Arc<ArcSwap<MetricsConsumers>>,
}

impl ConsumersHandle {
    pub fn new(consumers: MetricsConsumers) -> Self {
        ConsumersHandle {
            inner: Arc::new(ArcSwap::from_pointee(consumers)),
        }
    }

    #[inline]
    pub fn load(&self) -> Arc<MetricsConsumers> {
        self.inner.load_full()
    }

    pub fn store(&self, consumers: MetricsConsumers) {
        self.inner.store(Arc::new(consumers));
    }
}

impl From<&ConsumersConfig> for ConsumersHandle {
    fn from(config: &ConsumersConfig) -> Self {
        ConsumersHandle::new(MetricsConsumers::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::{ConsumerConfig, DimensionConfig};

    fn metric(name: &str, outputname: &str) -> ConsumerMetricConfig {
        ConsumerMetricConfig {
            name: name.to_string(),
            outputname: outputname.to_string(),
            description: String::new(),
            dimension: Vec::new(),
        }
    }

    fn config() -> ConsumersConfig {
        let mut dimensional = metric("c", "c");
        dimensional.dimension.push(DimensionConfig {
            key: "k".to_string(),
            value: "v".to_string(),
        });
        ConsumersConfig::from(vec![
            ConsumerConfig {
                name: "one".to_string(),
                metric: vec![metric("a", "a1"), metric("b", "b"), dimensional],
            },
            ConsumerConfig {
                name: "two".to_string(),
                metric: vec![metric("a", "a2"), metric("b", "b")],
            },
        ])
    }

    #[test]
    fn lookup() {
        let consumers = MetricsConsumers::new(&config());
        let all: Vec<&str> = consumers.all_consumers().map(|c| c.as_str()).collect();
        assert_eq!(all, ["one", "two"]);
        assert_eq!(consumers.metric_definitions(&ConsumerId::new("one")).len(), 3);
        assert!(
            consumers
                .metric_definitions(&ConsumerId::new("nobody"))
                .is_empty()
        );

        let b = consumers.consumers_by_metric().get(&metric("b", "b")).unwrap();
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn whitelist() {
        let consumers = MetricsConsumers::new(&config());
        let ids = consumers.whitelisted_metrics();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("a"));
        assert!(!ids.contains("a1"));
    }

    #[test]
    fn output_names() {
        let consumers = MetricsConsumers::new(&config());
        let names = consumers.output_names_by_id();
        assert_eq!(names.get("a").unwrap(), &["a1", "a2"]);
        assert_eq!(names.get("b").unwrap(), &["b"]);
        assert_eq!(names.get("c").unwrap(), &["c"]);
    }

    #[test]
    fn handle_swap() {
        let handle = ConsumersHandle::new(MetricsConsumers::default());
        let old = handle.load();
        handle.store(MetricsConsumers::new(&config()));
        assert_eq!(old.all_consumers().count(), 0);
        assert_eq!(handle.load().all_consumers().count(), 2);
    }
}
