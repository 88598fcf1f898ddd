/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::metric::{Metric, MetricSet, MetricsConsumer};
use crate::types::{ConsumerId, MetricId};

pub const DEFAULT_METRIC_SET_ID: &str = "default";

// (name, description)
const DEFAULT_METRICS: &[(&str, &str)] = &[
    ("cpu.util", "cpu utilization of the node, in percent"),
    ("cpu.sys.util", "system cpu utilization of the node, in percent"),
    ("cpu.vcpus", "number of virtual cpus available to the node"),
    ("mem.limit", "memory limit of the node, in bytes"),
    ("mem.util", "memory utilization of the node, in percent"),
    ("disk.limit", "disk limit of the node, in bytes"),
    ("disk.util", "disk utilization of the node, in percent"),
    ("memory_virt", "virtual memory size of the service process"),
    ("memory_rss", "resident memory size of the service process"),
    ("cpu", "cpu usage of the service process, in percent"),
    ("queries.rate", "number of queries received per second"),
    ("query_latency.average", "average query latency, in milliseconds"),
    ("query_latency.max", "max query latency, in milliseconds"),
    ("hits_per_query.average", "average number of hits per query"),
    ("feed.operations.rate", "number of feed operations per second"),
    ("feed.latency.average", "average feed latency, in milliseconds"),
    (
        "content.proton.documentdb.documents.total.last",
        "total number of documents in a document db",
    ),
    (
        "content.proton.resource_usage.disk.average",
        "disk usage of the content node, as a fraction of the limit",
    ),
    (
        "content.proton.resource_usage.memory.average",
        "memory usage of the content node, as a fraction of the limit",
    ),
    ("serverActiveThreads.average", "number of active container threads"),
    ("http.status.4xx.rate", "number of 4xx http responses per second"),
    ("http.status.5xx.rate", "number of 5xx http responses per second"),
];

/// The built-in consumer served to the default monitoring system
pub fn default_consumer() -> MetricsConsumer {
    let metrics = DEFAULT_METRICS
        .iter()
        .map(|(name, desc)| Metric::new(MetricId::new(name)).with_description(desc));
    MetricsConsumer::new(
        ConsumerId::VESPA,
        MetricSet::new(DEFAULT_METRIC_SET_ID, metrics),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_names() {
        let consumer = default_consumer();
        assert_eq!(consumer.id(), &ConsumerId::VESPA);
        assert_eq!(consumer.metrics().len(), DEFAULT_METRICS.len());
        for m in consumer.metrics().values() {
            assert_eq!(m.output_name, m.name.as_str());
        }
    }
}
