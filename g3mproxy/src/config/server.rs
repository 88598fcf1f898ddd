/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use yaml_rust::Yaml;

use super::yaml;
use crate::rpc::DEFAULT_LOG_SPENT_TIME_LIMIT;

const DEFAULT_MAX_REQUEST_SIZE: usize = 16 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcServerConfig {
    pub listen: SocketAddr,
    pub log_spent_time_limit: Duration,
    pub max_request_size: usize,
}

impl RpcServerConfig {
    pub fn new(listen: SocketAddr) -> Self {
        RpcServerConfig {
            listen,
            log_spent_time_limit: DEFAULT_LOG_SPENT_TIME_LIMIT,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }

    pub(super) fn parse(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("yaml value type for 'server' should be 'map'"));
        };

        let mut listen = None;
        let mut log_spent_time_limit = DEFAULT_LOG_SPENT_TIME_LIMIT;
        let mut max_request_size = DEFAULT_MAX_REQUEST_SIZE;
        yaml::foreach_kv(map, |k, v| match yaml::normalize_key(k).as_str() {
            "listen" => {
                let s = yaml::as_string(v)?;
                let addr = SocketAddr::from_str(&s)
                    .map_err(|e| anyhow!("invalid socket address {s}: {e}"))?;
                listen = Some(addr);
                Ok(())
            }
            "log_spent_time_limit" => {
                log_spent_time_limit = yaml::as_duration(v)?;
                Ok(())
            }
            "max_request_size" => {
                max_request_size = yaml::as_humanize_usize(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;

        let listen = listen.ok_or_else(|| anyhow!("no listen address set"))?;
        Ok(RpcServerConfig {
            listen,
            log_spent_time_limit,
            max_request_size,
        })
    }
}
