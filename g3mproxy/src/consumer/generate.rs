/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use indexmap::IndexMap;

use super::{ConsumerConfig, ConsumerMetricConfig, DimensionConfig};
use crate::metric::{Metric, MetricSet, MetricsConsumer};
use crate::types::{ConsumerId, MetricId};

/// Build the consumer config records for the given user defined consumers,
/// with the built-in default consumer merged into the reserved default slot.
pub fn generate(user_consumers: &IndexMap<ConsumerId, MetricsConsumer>) -> Vec<ConsumerConfig> {
    generate_with_default(&super::default_consumer(), user_consumers)
}

/// Build the consumer config records, using `default` as the built-in definition
/// of the [`ConsumerId::VESPA`] consumer.
///
/// User consumers keep their insertion order. The default consumer keeps the
/// position of a user consumer with the same id, or is appended at the end.
pub fn generate_with_default(
    default: &MetricsConsumer,
    user_consumers: &IndexMap<ConsumerId, MetricsConsumer>,
) -> Vec<ConsumerConfig> {
    let mut all_consumers = user_consumers.clone();
    let combined = combine(default, all_consumers.get(&ConsumerId::VESPA));
    all_consumers.insert(ConsumerId::VESPA, combined);

    all_consumers.values().map(to_consumer_config).collect()
}

/// Combine two consumers, keeping the id of `original` and of its metric set.
///
/// If a metric exists in both, name, output name and description of the
/// `overriding` one are used, and dimensions from `original` are added for
/// all keys that `overriding` does not define.
pub fn combine(
    original: &MetricsConsumer,
    overriding: Option<&MetricsConsumer>,
) -> MetricsConsumer {
    let Some(overriding) = overriding else {
        return original.clone();
    };

    let mut combined: IndexMap<MetricId, Metric> = original.metrics().clone();
    for (id, new_metric) in overriding.metrics() {
        let metric = match original.metrics().get(id) {
            Some(old_metric) => new_metric.add_dimensions_from(old_metric),
            None => new_metric.clone(),
        };
        combined.insert(id.clone(), metric);
    }

    MetricsConsumer::new(
        original.id().clone(),
        MetricSet::new(original.metric_set().id(), combined.into_values()),
    )
}

fn to_consumer_config(consumer: &MetricsConsumer) -> ConsumerConfig {
    ConsumerConfig {
        name: consumer.id().to_string(),
        metric: consumer.metrics().values().map(to_metric_config).collect(),
    }
}

fn to_metric_config(metric: &Metric) -> ConsumerMetricConfig {
    ConsumerMetricConfig {
        name: metric.name.to_string(),
        outputname: metric.output_name.clone(),
        description: metric.description.clone(),
        dimension: metric
            .dimensions
            .iter()
            .map(|(k, v)| DimensionConfig {
                key: k.to_string(),
                value: v.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DimensionId;

    fn metric(name: &str, output_name: &str, dims: &[(&str, &str)]) -> Metric {
        let mut m = Metric::new(MetricId::new(name)).with_output_name(output_name);
        for (k, v) in dims {
            m = m.with_dimension(DimensionId::new(k), v);
        }
        m
    }

    fn consumer(id: &ConsumerId, metrics: Vec<Metric>) -> MetricsConsumer {
        MetricsConsumer::new(id.clone(), MetricSet::new("set", metrics))
    }

    fn default_for_test() -> MetricsConsumer {
        consumer(
            &ConsumerId::VESPA,
            vec![
                metric("m1", "default-m1", &[("d0", "v0"), ("d1", "v1")]),
                metric("m2", "m2", &[]),
            ],
        )
    }

    fn count_default(configs: &[ConsumerConfig]) -> usize {
        configs
            .iter()
            .filter(|c| c.name == ConsumerId::VESPA.as_str())
            .count()
    }

    #[test]
    fn combine_without_override() {
        let original = default_for_test();
        assert_eq!(combine(&original, None), original);
    }

    #[test]
    fn combine_with_override() {
        let original = default_for_test();
        let overriding = consumer(
            &ConsumerId::new("other"),
            vec![
                metric("m1", "user-m1", &[("d1", "new-v1"), ("d2", "v2")]),
                metric("m3", "m3", &[]),
            ],
        );

        let combined = combine(&original, Some(&overriding));
        assert_eq!(combined.id(), &ConsumerId::VESPA);
        assert_eq!(combined.metric_set().id(), "set");
        assert_eq!(combined.metrics().len(), 3);

        let m1 = combined.metrics().get("m1").unwrap();
        assert_eq!(m1.output_name, "user-m1");
        assert_eq!(m1.dimensions.get("d0").unwrap(), "v0");
        assert_eq!(m1.dimensions.get("d1").unwrap(), "new-v1");
        assert_eq!(m1.dimensions.get("d2").unwrap(), "v2");

        assert_eq!(combined.metrics().get("m2").unwrap(), &metric("m2", "m2", &[]));
        assert!(combined.metrics().contains_key("m3"));

        let keys: Vec<&str> = combined.metrics().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["m1", "m2", "m3"]);
    }

    #[test]
    fn default_only() {
        let configs = generate_with_default(&default_for_test(), &IndexMap::new());
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].name, "Vespa");
        assert_eq!(configs[0].metric.len(), 2);
        assert_eq!(configs[0].metric[0].outputname, "default-m1");
        assert_eq!(configs[0].metric[0].dimension.len(), 2);
    }

    #[test]
    fn default_appended_after_user_consumers() {
        let mut user = IndexMap::new();
        let a = ConsumerId::new("a");
        let b = ConsumerId::new("b");
        user.insert(a.clone(), consumer(&a, vec![metric("x", "x", &[])]));
        user.insert(b.clone(), consumer(&b, vec![metric("y", "y", &[])]));

        let configs = generate_with_default(&default_for_test(), &user);
        let names: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "Vespa"]);
        assert_eq!(count_default(&configs), 1);
    }

    #[test]
    fn user_defined_default_consumer() {
        let mut user = IndexMap::new();
        let a = ConsumerId::new("a");
        user.insert(
            ConsumerId::VESPA,
            consumer(
                &ConsumerId::VESPA,
                vec![metric("m1", "custom", &[("d0", "override")])],
            ),
        );
        user.insert(a.clone(), consumer(&a, vec![metric("x", "x", &[])]));

        let default = default_for_test();
        let configs = generate_with_default(&default, &user);
        let names: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Vespa", "a"]);
        assert_eq!(count_default(&configs), 1);

        let expected = to_consumer_config(&combine(&default, user.get(&ConsumerId::VESPA)));
        assert_eq!(configs[0], expected);

        let m1 = &configs[0].metric[0];
        assert_eq!(m1.outputname, "custom");
        let d0 = m1.dimension.iter().find(|d| d.key == "d0").unwrap();
        assert_eq!(d0.value, "override");
        assert!(m1.dimension.iter().any(|d| d.key == "d1" && d.value == "v1"));
    }

    #[test]
    fn builtin_default() {
        let configs = generate(&IndexMap::new());
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].name, "Vespa");
        assert!(!configs[0].metric.is_empty());
    }
}
