/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::Path;

use anyhow::anyhow;
use indexmap::IndexMap;
use yaml_rust::{Yaml, yaml as yaml_types};

use crate::consumer::{ConsumersConfig, MetricsConsumers, generate};
use crate::metric::MetricsConsumer;
use crate::types::{ConsumerId, DimensionId};

mod yaml;

mod runtime;
pub use runtime::RuntimeConfig;

mod server;
pub use server::RpcServerConfig;

mod consumer;
mod service;
pub use service::ServiceConfig;

/// Everything loaded from the main config file
#[derive(Debug, Default)]
pub struct ProxyConfig {
    pub runtime: RuntimeConfig,
    pub server: Option<RpcServerConfig>,
    pub global_dimensions: IndexMap<DimensionId, String>,
    pub consumers: IndexMap<ConsumerId, MetricsConsumer>,
    pub services: Vec<ServiceConfig>,
}

impl ProxyConfig {
    /// The merged consumer config, with the default consumer included
    pub fn consumers_config(&self) -> ConsumersConfig {
        ConsumersConfig::from(generate(&self.consumers))
    }

    pub fn metrics_consumers(&self) -> MetricsConsumers {
        MetricsConsumers::new(&self.consumers_config())
    }

    fn load_doc(&mut self, map: &yaml_types::Hash) -> anyhow::Result<()> {
        yaml::foreach_kv(map, |k, v| match yaml::normalize_key(k).as_str() {
            "runtime" => {
                self.runtime = RuntimeConfig::parse(v)?;
                Ok(())
            }
            "server" => {
                self.server = Some(RpcServerConfig::parse(v)?);
                Ok(())
            }
            "global_dimensions" => {
                self.global_dimensions = yaml::as_dimensions(v)?;
                Ok(())
            }
            "consumer" | "consumers" => {
                for (id, c) in consumer::parse_all(v)? {
                    if self.consumers.insert(id.clone(), c).is_some() {
                        return Err(anyhow!("duplicate consumer {id}"));
                    }
                }
                Ok(())
            }
            "service" | "services" => {
                self.services.extend(service::parse_all(v)?);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k} in main conf")),
        })
    }
}

/// Load the config file, all of its yaml docs are merged
pub fn load(path: &Path) -> anyhow::Result<ProxyConfig> {
    let mut config = ProxyConfig::default();
    yaml::foreach_doc(path, |_, doc| match doc {
        Yaml::Hash(map) => config.load_doc(map),
        _ => Err(anyhow!("yaml doc root should be hash")),
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(s: &str) -> anyhow::Result<ProxyConfig> {
        let mut config = ProxyConfig::default();
        let Yaml::Hash(map) = yaml::load_str(s) else {
            return Err(anyhow!("not a map"));
        };
        config.load_doc(&map)?;
        Ok(config)
    }

    #[test]
    fn full() {
        let config = load_str(
            r#"
runtime:
  thread_number: 2
server:
  listen: 127.0.0.1:19095
  log_spent_time_limit: 10s
  max_request_size: 1MiB
global_dimensions:
  zone: prod.us-east-1
consumer:
  - name: my-consumer
    metric:
      - name: cpu.util
        output_name: cpu
service:
  - name: searchnode
    config_id: search/0
"#,
        )
        .unwrap();

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.max_request_size, 1024 * 1024);
        assert_eq!(config.global_dimensions.get("zone").unwrap(), "prod.us-east-1");
        assert_eq!(config.services.len(), 1);

        let consumers = config.consumers_config();
        let names: Vec<&str> = consumers.consumer.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["my-consumer", "Vespa"]);

        let consumers = config.metrics_consumers();
        assert!(consumers.contains(&ConsumerId::VESPA));
        assert_eq!(
            consumers.output_names_by_id().get("cpu.util").unwrap(),
            &["cpu", "cpu.util"]
        );
    }

    #[test]
    fn invalid_key() {
        assert!(load_str("foo: 1").is_err());
    }

    #[test]
    fn empty() {
        let config = load_str("{}").unwrap();
        assert!(config.server.is_none());
        assert_eq!(config.metrics_consumers().all_consumers().count(), 1);
    }
}
