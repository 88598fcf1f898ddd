/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DimensionConfig {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConsumerMetricConfig {
    pub name: String,
    pub outputname: String,
    pub description: String,
    pub dimension: Vec<DimensionConfig>,
}

impl ConsumerMetricConfig {
    fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(4);
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert(
            "outputname".to_string(),
            Value::String(self.outputname.clone()),
        );
        map.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        let dimensions = self
            .dimension
            .iter()
            .map(|d| {
                let mut map = Map::with_capacity(2);
                map.insert("key".to_string(), Value::String(d.key.clone()));
                map.insert("value".to_string(), Value::String(d.value.clone()));
                Value::Object(map)
            })
            .collect();
        map.insert("dimension".to_string(), Value::Array(dimensions));
        Value::Object(map)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub name: String,
    pub metric: Vec<ConsumerMetricConfig>,
}

impl ConsumerConfig {
    fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(2);
        map.insert("name".to_string(), Value::String(self.name.clone()));
        let metrics = self.metric.iter().map(|m| m.to_json()).collect();
        map.insert("metric".to_string(), Value::Array(metrics));
        Value::Object(map)
    }
}

/// The merged consumer configuration, in the order the consumers were first seen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsumersConfig {
    pub consumer: Vec<ConsumerConfig>,
}

impl ConsumersConfig {
    pub fn to_json(&self) -> Value {
        let consumers = self.consumer.iter().map(|c| c.to_json()).collect();
        let mut map = Map::with_capacity(1);
        map.insert("consumer".to_string(), Value::Array(consumers));
        Value::Object(map)
    }
}

impl From<Vec<ConsumerConfig>> for ConsumersConfig {
    fn from(consumer: Vec<ConsumerConfig>) -> Self {
        ConsumersConfig { consumer }
    }
}
