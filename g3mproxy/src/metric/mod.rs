/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use indexmap::IndexMap;

use crate::types::{ConsumerId, DimensionId, MetricId};

mod packet;
pub use packet::{MetricsPacket, MetricsPacketBuilder};

/// A metric definition as configured for a consumer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metric {
    pub name: MetricId,
    pub output_name: String,
    pub description: String,
    pub dimensions: IndexMap<DimensionId, String>,
}

impl Metric {
    pub fn new(name: MetricId) -> Self {
        let output_name = name.as_str().to_string();
        Metric {
            name,
            output_name,
            description: String::new(),
            dimensions: IndexMap::new(),
        }
    }

    pub fn with_output_name(mut self, output_name: &str) -> Self {
        if !output_name.is_empty() {
            self.output_name = output_name.to_string();
        }
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_dimension(mut self, key: DimensionId, value: &str) -> Self {
        self.dimensions.insert(key, value.to_string());
        self
    }

    /// Returns a copy of this metric with the dimensions of `other` added,
    /// for all keys that this metric does not define itself.
    pub fn add_dimensions_from(&self, other: &Metric) -> Metric {
        let mut metric = self.clone();
        for (k, v) in &other.dimensions {
            if !metric.dimensions.contains_key(k) {
                metric.dimensions.insert(k.clone(), v.clone());
            }
        }
        metric
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricSet {
    id: String,
    metrics: IndexMap<MetricId, Metric>,
}

impl MetricSet {
    pub fn new<I>(id: &str, metrics: I) -> Self
    where
        I: IntoIterator<Item = Metric>,
    {
        let mut set = MetricSet {
            id: id.to_string(),
            metrics: IndexMap::new(),
        };
        for m in metrics {
            set.metrics.insert(m.name.clone(), m);
        }
        set
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn metrics(&self) -> &IndexMap<MetricId, Metric> {
        &self.metrics
    }

    #[inline]
    pub fn get(&self, id: &MetricId) -> Option<&Metric> {
        self.metrics.get(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricsConsumer {
    id: ConsumerId,
    metric_set: MetricSet,
}

impl MetricsConsumer {
    pub fn new(id: ConsumerId, metric_set: MetricSet) -> Self {
        MetricsConsumer { id, metric_set }
    }

    #[inline]
    pub fn id(&self) -> &ConsumerId {
        &self.id
    }

    #[inline]
    pub fn metric_set(&self) -> &MetricSet {
        &self.metric_set
    }

    #[inline]
    pub fn metrics(&self) -> &IndexMap<MetricId, Metric> {
        self.metric_set.metrics()
    }
}
