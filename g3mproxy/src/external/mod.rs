/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::debug;

use crate::consumer::ConsumersHandle;
use crate::metric::{MetricsPacket, MetricsPacketBuilder};
use crate::types::{DimensionId, ServiceId};

const TOPOLOGY_DIMENSIONS: [DimensionId; 3] = [
    DimensionId::ROLE,
    DimensionId::STATE,
    DimensionId::ORCHESTRATOR_STATE,
];

/// Metrics pushed in from outside the per-service collection path.
///
/// Every push replaces the whole snapshot.
pub struct ExternalMetrics {
    consumers: ConsumersHandle,
    snapshot: ArcSwap<Vec<MetricsPacket>>,
}

impl ExternalMetrics {
    pub fn new(consumers: ConsumersHandle) -> Self {
        ExternalMetrics {
            consumers,
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn set_extra_metrics(&self, packets: Vec<MetricsPacketBuilder>) {
        debug!(
            "setting new external metrics with {} metrics packets",
            packets.len()
        );

        let consumers = self.consumers.load();
        let whitelist = consumers.whitelisted_metrics();
        let output_names = consumers.output_names_by_id();

        let packets = packets
            .into_iter()
            .map(|mut builder| {
                builder
                    .add_consumers(consumers.all_consumers())
                    .service(ServiceId::VESPA_NODE)
                    .retain_metrics(&whitelist)
                    .apply_output_names(&output_names);
                builder.build()
            })
            .collect::<Vec<_>>();
        self.snapshot.store(Arc::new(packets));
    }

    /// The current snapshot, which is never modified after it is published
    #[inline]
    pub fn get_metrics(&self) -> Arc<Vec<MetricsPacket>> {
        self.snapshot.load_full()
    }
}

/// Collect the node topology dimensions (role, state, orchestratorState)
/// found in the given packets.
///
/// If a dimension is present in more than one packet, the one seen last wins.
/// Callers should treat the result as unordered.
pub fn extract_topology_dimensions<'a, I>(packets: I) -> HashMap<DimensionId, String>
where
    I: IntoIterator<Item = &'a MetricsPacket>,
{
    let mut dimensions = HashMap::new();
    for packet in packets {
        for (k, v) in packet.dimensions() {
            if TOPOLOGY_DIMENSIONS.contains(k) {
                dimensions.insert(k.clone(), v.clone());
            }
        }
    }
    dimensions
}
