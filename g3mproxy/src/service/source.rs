/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use indexmap::IndexMap;

use crate::types::{DimensionId, MetricId, MetricValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    Up,
    Down,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Up => "up",
            HealthStatus::Down => "down",
            HealthStatus::Unknown => "unknown",
        }
    }

    /// Status code used in health packets, 0 for up
    pub fn code(&self) -> u32 {
        match self {
            HealthStatus::Up => 0,
            HealthStatus::Down | HealthStatus::Unknown => 1,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Health {
    pub status: HealthStatus,
    pub message: String,
}

impl Health {
    pub fn new(status: HealthStatus, message: &str) -> Self {
        Health {
            status,
            message: message.to_string(),
        }
    }

    pub fn up() -> Self {
        Health::new(HealthStatus::Up, "")
    }
}

/// One metric value as reported by a service, before any consumer filtering
#[derive(Clone, Debug, PartialEq)]
pub struct RawMetric {
    pub name: MetricId,
    pub value: MetricValue,
    pub dimensions: IndexMap<DimensionId, String>,
}

impl RawMetric {
    pub fn new(name: &str, value: MetricValue) -> Self {
        RawMetric {
            name: MetricId::new(name),
            value,
            dimensions: IndexMap::new(),
        }
    }

    pub fn with_dimension(mut self, key: &str, value: &str) -> Self {
        self.dimensions
            .insert(DimensionId::new(key), value.to_string());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceMetrics {
    /// Epoch seconds of the collection, 0 if unknown
    pub timestamp: i64,
    pub metrics: Vec<RawMetric>,
}

/// The collector of one monitored service.
///
/// Implementations may block, they are always called on the blocking pool.
pub trait MetricsSource {
    fn metrics(&self) -> anyhow::Result<ServiceMetrics>;
    fn health(&self) -> Health;
}

/// Source used for configured services until a collector is attached.
pub struct PlaceholderSource;

impl MetricsSource for PlaceholderSource {
    fn metrics(&self) -> anyhow::Result<ServiceMetrics> {
        Ok(ServiceMetrics::default())
    }

    fn health(&self) -> Health {
        Health::new(HealthStatus::Unknown, "no collector attached")
    }
}

/// A source that always reports the same values.
pub struct StaticSource {
    health: Health,
    metrics: ServiceMetrics,
}

impl StaticSource {
    pub fn new(health: Health, timestamp: i64, metrics: Vec<RawMetric>) -> Self {
        StaticSource {
            health,
            metrics: ServiceMetrics { timestamp, metrics },
        }
    }
}

impl MetricsSource for StaticSource {
    fn metrics(&self) -> anyhow::Result<ServiceMetrics> {
        Ok(self.metrics.clone())
    }

    fn health(&self) -> Health {
        self.health.clone()
    }
}
