/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::types::{ConsumerId, DimensionId, MetricId, MetricValue, ServiceId};

/// An immutable bundle of metric values and dimensions for one service.
///
/// Packets are only created through [`MetricsPacketBuilder::build`].
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsPacket {
    status_code: u32,
    status_msg: String,
    timestamp: i64,
    service: ServiceId,
    metrics: IndexMap<MetricId, MetricValue>,
    dimensions: IndexMap<DimensionId, String>,
    consumers: IndexSet<ConsumerId>,
}

impl MetricsPacket {
    #[inline]
    pub fn status_code(&self) -> u32 {
        self.status_code
    }

    #[inline]
    pub fn status_msg(&self) -> &str {
        &self.status_msg
    }

    /// Epoch seconds, 0 if unknown
    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[inline]
    pub fn service(&self) -> &ServiceId {
        &self.service
    }

    #[inline]
    pub fn metrics(&self) -> &IndexMap<MetricId, MetricValue> {
        &self.metrics
    }

    #[inline]
    pub fn dimensions(&self) -> &IndexMap<DimensionId, String> {
        &self.dimensions
    }

    #[inline]
    pub fn consumers(&self) -> &IndexSet<ConsumerId> {
        &self.consumers
    }

    /// Get a builder pre-filled with the content of this packet
    pub fn to_builder(&self) -> MetricsPacketBuilder {
        MetricsPacketBuilder {
            status_code: self.status_code,
            status_msg: self.status_msg.clone(),
            timestamp: self.timestamp,
            service: self.service.clone(),
            metrics: self.metrics.clone(),
            dimensions: self.dimensions.clone(),
            consumers: self.consumers.clone(),
        }
    }
}

impl fmt::Display for MetricsPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{service: {}, timestamp: {}, status: {} {:?}, metrics: {{",
            self.service, self.timestamp, self.status_code, self.status_msg
        )?;
        for (i, (k, v)) in self.metrics.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}, dimensions: {")?;
        for (i, (k, v)) in self.dimensions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}}")
    }
}

#[derive(Clone, Debug, Default)]
pub struct MetricsPacketBuilder {
    status_code: u32,
    status_msg: String,
    timestamp: i64,
    service: ServiceId,
    metrics: IndexMap<MetricId, MetricValue>,
    dimensions: IndexMap<DimensionId, String>,
    consumers: IndexSet<ConsumerId>,
}

impl MetricsPacketBuilder {
    pub fn new(service: ServiceId) -> Self {
        MetricsPacketBuilder {
            service,
            ..Default::default()
        }
    }

    pub fn service(&mut self, service: ServiceId) -> &mut Self {
        self.service = service;
        self
    }

    pub fn status_code(&mut self, code: u32) -> &mut Self {
        self.status_code = code;
        self
    }

    pub fn status_msg(&mut self, msg: &str) -> &mut Self {
        self.status_msg = msg.to_string();
        self
    }

    pub fn timestamp(&mut self, timestamp: i64) -> &mut Self {
        self.timestamp = timestamp;
        self
    }

    #[inline]
    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn put_metric(&mut self, id: MetricId, value: MetricValue) -> &mut Self {
        self.metrics.insert(id, value);
        self
    }

    pub fn put_dimension(&mut self, id: DimensionId, value: &str) -> &mut Self {
        self.dimensions.insert(id, value.to_string());
        self
    }

    pub fn put_dimensions<'a, I>(&mut self, dimensions: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a DimensionId, &'a String)>,
    {
        for (k, v) in dimensions {
            self.dimensions.insert(k.clone(), v.clone());
        }
        self
    }

    /// Add the given dimensions, without replacing any value that is already set
    pub fn put_dimensions_if_absent<'a, I>(&mut self, dimensions: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a DimensionId, &'a String)>,
    {
        for (k, v) in dimensions {
            if !self.dimensions.contains_key(k) {
                self.dimensions.insert(k.clone(), v.clone());
            }
        }
        self
    }

    pub fn add_consumers<'a, I>(&mut self, consumers: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a ConsumerId>,
    {
        for c in consumers {
            self.consumers.insert(c.clone());
        }
        self
    }

    /// Drop all metrics whose id is not in `ids`
    pub fn retain_metrics(&mut self, ids: &HashSet<MetricId>) -> &mut Self {
        self.metrics.retain(|k, _| ids.contains(k));
        self
    }

    /// Replace every metric id by its configured output names.
    ///
    /// A metric with more than one output name is kept once per name with
    /// the same value, and metrics without an entry in `output_names` are
    /// dropped.
    pub fn apply_output_names(
        &mut self,
        output_names: &IndexMap<MetricId, Vec<String>>,
    ) -> &mut Self {
        let mut renamed = IndexMap::with_capacity(self.metrics.len());
        for (id, names) in output_names {
            let Some(value) = self.metrics.get(id) else {
                continue;
            };
            for name in names {
                renamed.insert(MetricId::new(name), *value);
            }
        }
        self.metrics = renamed;
        self
    }

    #[inline]
    pub fn dimensions(&self) -> &IndexMap<DimensionId, String> {
        &self.dimensions
    }

    pub fn build(self) -> MetricsPacket {
        MetricsPacket {
            status_code: self.status_code,
            status_msg: self.status_msg,
            timestamp: self.timestamp,
            service: self.service,
            metrics: self.metrics,
            dimensions: self.dimensions,
            consumers: self.consumers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> MetricsPacketBuilder {
        let mut b = MetricsPacketBuilder::new(ServiceId::new("foo"));
        b.timestamp(1000)
            .put_metric(MetricId::new("a"), MetricValue::Unsigned(1))
            .put_metric(MetricId::new("b"), MetricValue::Double(2.5))
            .put_metric(MetricId::new("c"), MetricValue::Signed(-3));
        b
    }

    #[test]
    fn retain() {
        let mut b = builder();
        let ids: HashSet<MetricId> = [MetricId::new("a"), MetricId::new("c")].into();
        b.retain_metrics(&ids);
        let p = b.build();
        assert_eq!(p.metrics().len(), 2);
        assert!(p.metrics().get("b").is_none());
    }

    #[test]
    fn output_names_fan_out() {
        let mut b = builder();
        let mut names = IndexMap::new();
        names.insert(MetricId::new("a"), vec!["a1".to_string(), "a2".to_string()]);
        names.insert(MetricId::new("b"), vec!["b".to_string()]);
        names.insert(MetricId::new("x"), vec!["x".to_string()]);
        b.apply_output_names(&names);
        let p = b.build();

        let keys: Vec<&str> = p.metrics().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["a1", "a2", "b"]);
        assert_eq!(p.metrics().get("a1"), Some(&MetricValue::Unsigned(1)));
        assert_eq!(p.metrics().get("a2"), Some(&MetricValue::Unsigned(1)));
    }

    #[test]
    fn dimensions_if_absent() {
        let mut b = builder();
        b.put_dimension(DimensionId::new("role"), "content");

        let mut extra = IndexMap::new();
        extra.insert(DimensionId::new("role"), "container".to_string());
        extra.insert(DimensionId::new("zone"), "prod".to_string());
        b.put_dimensions_if_absent(&extra);

        let p = b.build();
        assert_eq!(p.dimensions().get("role").unwrap(), "content");
        assert_eq!(p.dimensions().get("zone").unwrap(), "prod");
    }

    #[test]
    fn consumers_dedup() {
        let mut b = builder();
        let c = [ConsumerId::VESPA, ConsumerId::new("other"), ConsumerId::VESPA];
        b.add_consumers(&c);
        let p = b.build();
        assert_eq!(p.consumers().len(), 2);
        assert_eq!(p.to_builder().build(), p);
    }
}
