/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::Write;
use std::sync::Arc;

use anyhow::Context;
use indexmap::IndexMap;
use log::debug;

use crate::consumer::{ConsumerMetricConfig, ConsumersHandle, MetricsConsumers};
use crate::external::{ExternalMetrics, extract_topology_dimensions};
use crate::metric::{MetricsPacket, MetricsPacketBuilder};
use crate::service::{ArcMonitoredService, ServiceMetrics, ServiceRegistry};
use crate::types::{ConsumerId, DimensionId, MetricId, MetricValue};

/// Packets with a timestamp this close to the request start get the start time
const TIMESTAMP_ADJUST_WINDOW_SECS: i64 = 60;

const METRIC_TYPE_STANDARD: &str = "standard";
const METRIC_TYPE_HEALTH: &str = "health";

/// Combines per-service collection with the externally pushed metrics.
pub struct MetricsManager {
    services: Arc<ServiceRegistry>,
    consumers: ConsumersHandle,
    external: Arc<ExternalMetrics>,
    global_dimensions: IndexMap<DimensionId, String>,
}

impl MetricsManager {
    pub fn new(
        services: Arc<ServiceRegistry>,
        consumers: ConsumersHandle,
        external: Arc<ExternalMetrics>,
    ) -> Self {
        MetricsManager {
            services,
            consumers,
            external,
            global_dimensions: IndexMap::new(),
        }
    }

    pub fn with_global_dimensions(mut self, dimensions: IndexMap<DimensionId, String>) -> Self {
        self.global_dimensions = dimensions;
        self
    }

    #[inline]
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Collect the packets of the given services, followed by the external
    /// packets that still carry metrics after consumer filtering.
    pub fn get_metrics(
        &self,
        services: &[ArcMonitoredService],
        start_time: i64,
    ) -> anyhow::Result<Vec<MetricsPacket>> {
        let consumers = self.consumers.load();

        let mut builders = Vec::new();
        for service in services {
            let collected = service
                .source()
                .metrics()
                .with_context(|| format!("failed to collect metrics for {}", service.name()))?;
            let health = service.source().health();

            let mut base = service_packet(service, collected.timestamp);
            base.status_code(health.status.code())
                .status_msg(&health.message);
            builders.extend(consumer_packets(&base, &collected, &consumers));
        }

        let external = self.external.get_metrics();
        let external = external
            .iter()
            .filter(|p| !p.metrics().is_empty())
            .collect::<Vec<_>>();
        let topology = extract_topology_dimensions(external.iter().copied());
        builders.extend(external.iter().map(|p| p.to_builder()));

        let packets = builders
            .into_iter()
            .map(|mut builder| {
                builder
                    .put_dimensions_if_absent(&self.global_dimensions)
                    .put_dimensions_if_absent(&topology);
                adjust_timestamp(&mut builder, start_time);
                builder.build()
            })
            .collect::<Vec<_>>();
        debug!("collected {} metrics packets", packets.len());
        Ok(packets)
    }

    /// One health packet per service
    pub fn get_health_metrics(&self, services: &[ArcMonitoredService]) -> Vec<MetricsPacket> {
        let now = chrono::Utc::now().timestamp();
        services
            .iter()
            .map(|service| {
                let health = service.source().health();
                let alive = if health.status.code() == 0 { 1 } else { 0 };

                let mut builder = MetricsPacketBuilder::new(service.monitoring_name().clone());
                builder
                    .timestamp(now)
                    .status_code(health.status.code())
                    .status_msg(&health.message)
                    .put_dimension(DimensionId::METRIC_TYPE, METRIC_TYPE_HEALTH)
                    .put_dimension(DimensionId::INSTANCE, service.instance())
                    .put_dimensions_if_absent(&self.global_dimensions)
                    .put_metric(MetricId::new("alive"), MetricValue::Unsigned(alive));
                builder.build()
            })
            .collect()
    }

    /// Names of the metrics of the given services that are forwarded to the
    /// consumer, one per line: `name=ON[;output-name=..][;description=..]`.
    pub fn get_metric_names_for_service_and_consumer(
        &self,
        service: &str,
        consumer: &ConsumerId,
    ) -> anyhow::Result<String> {
        let consumers = self.consumers.load();
        let definitions = consumers.metric_definitions(consumer);

        let mut seen: Vec<&ConsumerMetricConfig> = Vec::new();
        let mut s = String::new();
        for service in self.services.monitoring_services(service) {
            let collected = service
                .source()
                .metrics()
                .with_context(|| format!("failed to collect metrics for {}", service.name()))?;
            for raw in &collected.metrics {
                for def in definitions
                    .iter()
                    .filter(|d| d.name == raw.name.as_str())
                {
                    if seen.contains(&def) {
                        continue;
                    }
                    seen.push(def);

                    let _ = write!(s, "{}=ON", def.name);
                    if !def.outputname.is_empty() && def.outputname != def.name {
                        let _ = write!(s, ";output-name={}", def.outputname);
                    }
                    if !def.description.is_empty() {
                        let _ = write!(s, ";description={}", def.description);
                    }
                    s.push('\n');
                }
            }
        }
        Ok(s)
    }

    /// Raw metrics of the services with the given config id, one
    /// `<instance>.<name>=<value>` per line.
    pub fn get_metrics_by_config_id(&self, config_id: &str) -> anyhow::Result<String> {
        let mut s = String::new();
        for service in self.services.by_config_id(config_id) {
            let collected = service
                .source()
                .metrics()
                .with_context(|| format!("failed to collect metrics for {}", service.name()))?;
            for raw in &collected.metrics {
                let _ = writeln!(s, "{}.{}={}", service.instance(), raw.name, raw.value);
            }
        }
        Ok(s)
    }

    pub fn get_all_services(&self) -> String {
        self.services.service_names().join(" ")
    }

    pub fn set_extra_metrics(&self, packets: Vec<MetricsPacketBuilder>) {
        self.external.set_extra_metrics(packets);
    }
}

fn service_packet(service: &ArcMonitoredService, timestamp: i64) -> MetricsPacketBuilder {
    let mut builder = MetricsPacketBuilder::new(service.monitoring_name().clone());
    builder
        .timestamp(timestamp)
        .put_dimension(DimensionId::METRIC_TYPE, METRIC_TYPE_STANDARD)
        .put_dimension(DimensionId::INSTANCE, service.instance())
        .put_dimensions(service.dimensions());
    builder
}

/// Filter the collected metrics for every consumer, one packet per consumer
/// and distinct metric dimension set.
fn consumer_packets(
    base: &MetricsPacketBuilder,
    collected: &ServiceMetrics,
    consumers: &MetricsConsumers,
) -> Vec<MetricsPacketBuilder> {
    let mut packets = Vec::new();
    for consumer in consumers.all_consumers() {
        let definitions = consumers.metric_definitions(consumer);
        let mut groups: Vec<(IndexMap<DimensionId, String>, MetricsPacketBuilder)> = Vec::new();

        for raw in &collected.metrics {
            for def in definitions
                .iter()
                .filter(|d| d.name == raw.name.as_str())
            {
                let mut dimensions = raw.dimensions.clone();
                for d in &def.dimension {
                    dimensions.insert(DimensionId::new(&d.key), d.value.clone());
                }
                let output_name = if def.outputname.is_empty() {
                    &def.name
                } else {
                    &def.outputname
                };

                let idx = match groups.iter().position(|(k, _)| *k == dimensions) {
                    Some(idx) => idx,
                    None => {
                        let mut builder = base.clone();
                        builder
                            .put_dimensions(&dimensions)
                            .add_consumers([consumer]);
                        groups.push((dimensions, builder));
                        groups.len() - 1
                    }
                };
                groups[idx]
                    .1
                    .put_metric(MetricId::new(output_name), raw.value);
            }
        }

        packets.extend(groups.into_iter().map(|(_, b)| b));
    }
    packets
}

fn adjust_timestamp(builder: &mut MetricsPacketBuilder, start_time: i64) {
    if (builder.get_timestamp() - start_time).abs() < TIMESTAMP_ADJUST_WINDOW_SECS {
        builder.timestamp(start_time);
    }
}
