/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::{Context, anyhow};
use indexmap::IndexMap;
use yaml_rust::Yaml;

use super::yaml;
use crate::service::{MonitoredService, PlaceholderSource};
use crate::types::DimensionId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub name: String,
    pub instance: String,
    pub config_id: String,
    pub dimensions: IndexMap<DimensionId, String>,
    pub system_metrics: bool,
}

impl ServiceConfig {
    fn parse(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("yaml value type for service should be 'map'"));
        };

        let mut name = String::new();
        let mut instance = String::new();
        let mut config_id = String::new();
        let mut dimensions = IndexMap::new();
        let mut system_metrics = false;
        yaml::foreach_kv(map, |k, v| match yaml::normalize_key(k).as_str() {
            "name" => {
                name = yaml::as_string(v)?;
                Ok(())
            }
            "instance" => {
                instance = yaml::as_string(v)?;
                Ok(())
            }
            "config_id" => {
                config_id = yaml::as_string(v)?;
                Ok(())
            }
            "dimension" | "dimensions" => {
                dimensions = yaml::as_dimensions(v)?;
                Ok(())
            }
            "system_metrics" => {
                system_metrics = yaml::as_bool(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;

        if name.is_empty() {
            return Err(anyhow!("no service name set"));
        }
        if instance.is_empty() {
            instance.clone_from(&name);
        }
        Ok(ServiceConfig {
            name,
            instance,
            config_id,
            dimensions,
            system_metrics,
        })
    }

    /// Build the monitored service, with a placeholder metrics source
    pub fn build(&self) -> MonitoredService {
        MonitoredService::new(
            &self.name,
            &self.instance,
            &self.config_id,
            Arc::new(PlaceholderSource),
        )
        .with_dimensions(self.dimensions.clone())
        .with_system_metrics(self.system_metrics)
    }
}

pub(super) fn parse_all(v: &Yaml) -> anyhow::Result<Vec<ServiceConfig>> {
    let Yaml::Array(seq) = v else {
        return Err(anyhow!("yaml value type for 'service' should be 'array'"));
    };
    let mut services = Vec::with_capacity(seq.len());
    for (i, v) in seq.iter().enumerate() {
        let service = ServiceConfig::parse(v).context(format!("invalid service #{i}"))?;
        services.push(service);
    }
    Ok(services)
}
