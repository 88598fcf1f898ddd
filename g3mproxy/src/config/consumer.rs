/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use indexmap::IndexMap;
use yaml_rust::Yaml;

use super::yaml;
use crate::metric::{Metric, MetricSet, MetricsConsumer};
use crate::types::{ConsumerId, MetricId};

pub(super) fn parse_all(v: &Yaml) -> anyhow::Result<IndexMap<ConsumerId, MetricsConsumer>> {
    let Yaml::Array(seq) = v else {
        return Err(anyhow!("yaml value type for 'consumer' should be 'array'"));
    };

    let mut consumers = IndexMap::with_capacity(seq.len());
    for (i, v) in seq.iter().enumerate() {
        let consumer = parse_consumer(v).context(format!("invalid consumer #{i}"))?;
        let id = consumer.id().clone();
        if consumers.insert(id.clone(), consumer).is_some() {
            return Err(anyhow!("duplicate consumer {id}"));
        }
    }
    Ok(consumers)
}

fn parse_consumer(v: &Yaml) -> anyhow::Result<MetricsConsumer> {
    let Yaml::Hash(map) = v else {
        return Err(anyhow!("yaml value type for consumer should be 'map'"));
    };

    let mut name = None;
    let mut metrics = Vec::new();
    yaml::foreach_kv(map, |k, v| match yaml::normalize_key(k).as_str() {
        "name" | "id" => {
            name = Some(yaml::as_string(v)?);
            Ok(())
        }
        "metric" | "metrics" => {
            let Yaml::Array(seq) = v else {
                return Err(anyhow!("yaml value type for metrics should be 'array'"));
            };
            for (i, v) in seq.iter().enumerate() {
                let metric = parse_metric(v).context(format!("invalid metric #{i}"))?;
                metrics.push(metric);
            }
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k}")),
    })?;

    let name = name.ok_or_else(|| anyhow!("no consumer name set"))?;
    if name.is_empty() {
        return Err(anyhow!("empty consumer name"));
    }
    let metric_set = MetricSet::new(&name, metrics);
    Ok(MetricsConsumer::new(ConsumerId::from(name), metric_set))
}

fn parse_metric(v: &Yaml) -> anyhow::Result<Metric> {
    let Yaml::Hash(map) = v else {
        return Err(anyhow!("yaml value type for metric should be 'map'"));
    };

    let mut name = None;
    let mut output_name = String::new();
    let mut description = String::new();
    let mut dimensions = IndexMap::new();
    yaml::foreach_kv(map, |k, v| match yaml::normalize_key(k).as_str() {
        "name" => {
            name = Some(yaml::as_string(v)?);
            Ok(())
        }
        "output_name" | "outputname" => {
            output_name = yaml::as_string(v)?;
            Ok(())
        }
        "description" => {
            description = yaml::as_string(v)?;
            Ok(())
        }
        "dimension" | "dimensions" => {
            dimensions = yaml::as_dimensions(v)?;
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k}")),
    })?;

    let name = name.ok_or_else(|| anyhow!("no metric name set"))?;
    let mut metric = Metric::new(MetricId::from(name))
        .with_output_name(&output_name)
        .with_description(&description);
    metric.dimensions = dimensions;
    Ok(metric)
}
