/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use indexmap::IndexMap;

use crate::types::{DimensionId, ServiceId};

mod source;
pub use source::{
    Health, HealthStatus, MetricsSource, PlaceholderSource, RawMetric, ServiceMetrics,
    StaticSource,
};

pub const ALL_SERVICES: &str = "all";
pub const SYSTEM_SERVICES: &str = "system";

const MONITORING_PREFIX: &str = "vespa.";

pub type ArcMetricsSource = Arc<dyn MetricsSource + Send + Sync>;

/// A process on this node whose metrics are served.
pub struct MonitoredService {
    name: String,
    instance: String,
    config_id: String,
    monitoring_name: ServiceId,
    dimensions: IndexMap<DimensionId, String>,
    system_metrics: bool,
    source: ArcMetricsSource,
}

impl MonitoredService {
    pub fn new(name: &str, instance: &str, config_id: &str, source: ArcMetricsSource) -> Self {
        MonitoredService {
            name: name.to_string(),
            instance: instance.to_string(),
            config_id: config_id.to_string(),
            monitoring_name: ServiceId::from(format!("{MONITORING_PREFIX}{name}")),
            dimensions: IndexMap::new(),
            system_metrics: false,
            source,
        }
    }

    pub fn with_dimensions(mut self, dimensions: IndexMap<DimensionId, String>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_system_metrics(mut self, enable: bool) -> Self {
        self.system_metrics = enable;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    #[inline]
    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    /// The service id used in served packets, `vespa.<name>`
    #[inline]
    pub fn monitoring_name(&self) -> &ServiceId {
        &self.monitoring_name
    }

    #[inline]
    pub fn dimensions(&self) -> &IndexMap<DimensionId, String> {
        &self.dimensions
    }

    #[inline]
    pub fn has_system_metrics(&self) -> bool {
        self.system_metrics
    }

    #[inline]
    pub fn source(&self) -> &ArcMetricsSource {
        &self.source
    }
}

pub type ArcMonitoredService = Arc<MonitoredService>;

/// All services monitored on this node, fixed at startup.
#[derive(Default)]
pub struct ServiceRegistry {
    services: Vec<ArcMonitoredService>,
}

impl ServiceRegistry {
    pub fn new(services: Vec<MonitoredService>) -> Self {
        ServiceRegistry {
            services: services.into_iter().map(Arc::new).collect(),
        }
    }

    #[inline]
    pub fn all(&self) -> &[ArcMonitoredService] {
        &self.services
    }

    /// Resolve the service selector of the bulk RPC methods.
    ///
    /// `all` and `system` select groups, any other value is matched against
    /// both the monitoring name and the plain service name, ignoring case.
    pub fn monitoring_services(&self, selector: &str) -> Vec<ArcMonitoredService> {
        if selector.eq_ignore_ascii_case(ALL_SERVICES) {
            return self.services.clone();
        }
        if selector.eq_ignore_ascii_case(SYSTEM_SERVICES) {
            return self
                .services
                .iter()
                .filter(|s| s.has_system_metrics())
                .cloned()
                .collect();
        }
        self.services
            .iter()
            .filter(|s| {
                s.monitoring_name.as_str().eq_ignore_ascii_case(selector)
                    || s.name.eq_ignore_ascii_case(selector)
            })
            .cloned()
            .collect()
    }

    pub fn by_config_id(&self, config_id: &str) -> Vec<ArcMonitoredService> {
        self.services
            .iter()
            .filter(|s| s.config_id == config_id)
            .cloned()
            .collect()
    }

    /// Distinct service names, in configuration order
    pub fn service_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.services.len());
        for s in &self.services {
            if !names.contains(&s.name()) {
                names.push(s.name());
            }
        }
        names
    }
}
