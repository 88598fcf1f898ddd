/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{Level, debug, log, log_enabled, warn};

use super::{RpcFailure, RpcMethod, RpcResponse};
use crate::format;
use crate::manager::MetricsManager;
use crate::types::ConsumerId;

pub const DEFAULT_LOG_SPENT_TIME_LIMIT: Duration = Duration::from_secs(10);

/// Runs the RPC methods against the metrics manager.
pub struct RpcHandler {
    manager: Arc<MetricsManager>,
    log_spent_time_limit: Duration,
}

impl RpcHandler {
    pub fn new(manager: Arc<MetricsManager>, log_spent_time_limit: Duration) -> Self {
        RpcHandler {
            manager,
            log_spent_time_limit,
        }
    }

    /// Run the method on the current thread, which may block.
    ///
    /// `start_time` is the epoch seconds at which the request was received.
    pub fn call(
        &self,
        method: RpcMethod,
        params: &[String],
        start_time: i64,
    ) -> Result<Option<String>, RpcFailure> {
        let param = |i: usize| {
            params
                .get(i)
                .map(|s| s.as_str())
                .ok_or(RpcFailure::WrongParams(method.name()))
        };

        match method {
            RpcMethod::GetMetricsById => self
                .manager
                .get_metrics_by_config_id(param(0)?)
                .map(Some)
                .map_err(|e| RpcFailure::internal("MetricsCollectError", e)),
            RpcMethod::GetServices => Ok(Some(self.manager.get_all_services())),
            RpcMethod::GetMetricsForYamas => {
                let service = param(0)?;
                debug!("getMetricsForYamas called at {start_time} with argument: {service}");
                let services = self.manager.services().monitoring_services(service);
                if services.is_empty() {
                    return Err(RpcFailure::NoService(service.to_string()));
                }
                if log_enabled!(Level::Debug) {
                    let names = services.iter().map(|s| s.instance()).collect::<Vec<_>>();
                    debug!("getting metrics for services: {names:?}");
                }
                let packets = self
                    .manager
                    .get_metrics(&services, start_time)
                    .map_err(|e| RpcFailure::internal("MetricsCollectError", e))?;
                Ok(Some(format::to_yamas_string(&packets, false)))
            }
            RpcMethod::GetHealthMetricsForYamas => {
                let service = param(0)?;
                let services = self.manager.services().monitoring_services(service);
                if services.is_empty() {
                    return Err(RpcFailure::NoService(service.to_string()));
                }
                let packets = self.manager.get_health_metrics(&services);
                Ok(Some(format::to_yamas_string(&packets, true)))
            }
            RpcMethod::GetAllMetricNamesForService => {
                let consumer = ConsumerId::new(param(1)?);
                self.manager
                    .get_metric_names_for_service_and_consumer(param(0)?, &consumer)
                    .map(Some)
                    .map_err(|e| RpcFailure::internal("MetricsCollectError", e))
            }
            RpcMethod::SetExtraMetrics => {
                let json = param(0)?;
                debug!("setExtraMetrics called with argument: {json}");
                let packets = format::parse_metrics_packets(json)
                    .map_err(|e| RpcFailure::internal(e.kind(), e))?;
                self.manager.set_extra_metrics(packets);
                Ok(None)
            }
        }
    }

    /// Run the method on the blocking pool and build the response.
    ///
    /// Any failure, including a panic inside the method, becomes an error
    /// response.
    pub(crate) async fn serve(
        self: &Arc<Self>,
        id: u64,
        method: RpcMethod,
        params: Vec<String>,
    ) -> RpcResponse {
        let time = Instant::now();
        let start_time = chrono::Utc::now().timestamp();

        let handler = Arc::clone(self);
        let r = match tokio::task::spawn_blocking(move || {
            let r = handler.call(method, &params, start_time);
            (r, params)
        })
        .await
        {
            Ok((r, params)) => {
                self.log_spent_time(method, &params, time.elapsed());
                r
            }
            Err(e) => Err(RpcFailure::internal("Panic", e)),
        };

        match r {
            Ok(v) => RpcResponse::with_value(id, v),
            Err(e) => {
                if let RpcFailure::Internal { .. } = e {
                    warn!("failed to run RPC command {method}: {e}");
                }
                // failed calls always carry an empty return string
                RpcResponse::with_failure(id, &e, true)
            }
        }
    }

    fn log_spent_time(&self, method: RpcMethod, params: &[String], spent: Duration) {
        log!(
            spent_time_level(spent, self.log_spent_time_limit),
            "RPC request '{method}' with parameters {params:?} took {} ms",
            spent.as_millis()
        );
    }
}

fn spent_time_level(spent: Duration, limit: Duration) -> Level {
    if spent > limit {
        Level::Info
    } else {
        Level::Debug
    }
}
