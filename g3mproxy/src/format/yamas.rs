/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde_json::{Map, Number, Value};

use crate::metric::MetricsPacket;

/// Metrics that are kept in health mode output
pub const HEALTH_METRICS: [&str; 2] = ["alive", "uptime"];

fn packet_to_json(packet: &MetricsPacket, health_only: bool) -> Value {
    let mut map = Map::with_capacity(7);
    map.insert(
        "service".to_string(),
        Value::String(packet.service().to_string()),
    );
    if packet.timestamp() != 0 {
        map.insert(
            "timestamp".to_string(),
            Value::Number(Number::from(packet.timestamp())),
        );
    }
    if health_only {
        map.insert(
            "status_code".to_string(),
            Value::Number(Number::from(packet.status_code())),
        );
        map.insert(
            "status_msg".to_string(),
            Value::String(packet.status_msg().to_string()),
        );
    }

    if !packet.dimensions().is_empty() {
        let mut dimensions = Map::with_capacity(packet.dimensions().len());
        for (k, v) in packet.dimensions() {
            dimensions.insert(k.to_string(), Value::String(v.clone()));
        }
        map.insert("dimensions".to_string(), Value::Object(dimensions));
    }

    let mut metrics = Map::with_capacity(packet.metrics().len());
    for (k, v) in packet.metrics() {
        if health_only && !HEALTH_METRICS.contains(&k.as_str()) {
            continue;
        }
        metrics.insert(k.to_string(), v.as_json_value());
    }
    if !metrics.is_empty() {
        map.insert("metrics".to_string(), Value::Object(metrics));
    }

    if !health_only && !packet.consumers().is_empty() {
        let routing = packet
            .consumers()
            .iter()
            .map(|c| Value::String(c.to_string()))
            .collect();
        map.insert("routing".to_string(), Value::Array(routing));
    }

    Value::Object(map)
}

pub fn to_yamas_array(packets: &[MetricsPacket], health_only: bool) -> Value {
    let array = packets
        .iter()
        .map(|p| packet_to_json(p, health_only))
        .collect();
    Value::Array(array)
}

pub fn to_yamas_string(packets: &[MetricsPacket], health_only: bool) -> String {
    to_yamas_array(packets, health_only).to_string()
}
