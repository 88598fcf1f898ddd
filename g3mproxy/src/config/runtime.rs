/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use log::debug;
use tokio::runtime::{Builder, Runtime};
use yaml_rust::Yaml;

use super::yaml;

const THREAD_NAME: &str = "mproxy-main";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    thread_number: Option<usize>,
}

impl RuntimeConfig {
    pub(super) fn parse(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("yaml value type for 'runtime' should be 'map'"));
        };

        let mut config = RuntimeConfig::default();
        yaml::foreach_kv(map, |k, v| match yaml::normalize_key(k).as_str() {
            "thread_number" => {
                let n = yaml::as_usize(v)?;
                if n == 0 {
                    return Err(anyhow!("thread number should not be zero"));
                }
                config.thread_number = Some(n);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;
        Ok(config)
    }

    pub fn start(&self) -> anyhow::Result<Runtime> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(THREAD_NAME);
        if let Some(n) = self.thread_number {
            debug!("using {n} worker threads");
            builder.worker_threads(n);
        }
        builder.build().context("failed to build tokio runtime")
    }
}
