/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::RpcFailure;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcMethod {
    GetMetricsById,
    GetServices,
    GetMetricsForYamas,
    GetHealthMetricsForYamas,
    GetAllMetricNamesForService,
    SetExtraMetrics,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 6] = [
        RpcMethod::GetMetricsById,
        RpcMethod::GetServices,
        RpcMethod::GetMetricsForYamas,
        RpcMethod::GetHealthMetricsForYamas,
        RpcMethod::GetAllMetricNamesForService,
        RpcMethod::SetExtraMetrics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RpcMethod::GetMetricsById => "getMetricsById",
            RpcMethod::GetServices => "getServices",
            RpcMethod::GetMetricsForYamas => "getMetricsForYamas",
            RpcMethod::GetHealthMetricsForYamas => "getHealthMetricsForYamas",
            RpcMethod::GetAllMetricNamesForService => "getAllMetricNamesForService",
            RpcMethod::SetExtraMetrics => "setExtraMetrics",
        }
    }

    /// Names of the string parameters
    pub fn params(&self) -> &'static [&'static str] {
        match self {
            RpcMethod::GetMetricsById => &["id"],
            RpcMethod::GetServices => &[],
            RpcMethod::GetMetricsForYamas => &["service"],
            RpcMethod::GetHealthMetricsForYamas => &["service"],
            RpcMethod::GetAllMetricNamesForService => &["service", "consumer"],
            RpcMethod::SetExtraMetrics => &["metricsJson"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RpcMethod::GetMetricsById => "Get metrics for the services with the given config id",
            RpcMethod::GetServices => "Get services monitored by this metrics proxy",
            RpcMethod::GetMetricsForYamas => {
                "Get JSON formatted metrics for a given service name, 'all' or 'system'"
            }
            RpcMethod::GetHealthMetricsForYamas => {
                "Get JSON formatted health check for a given service name, 'all' or 'system'"
            }
            RpcMethod::GetAllMetricNamesForService => {
                "Get metric names known for service, one metric name per line"
            }
            RpcMethod::SetExtraMetrics => {
                "Set extra metrics that will be added to output from getMetricsForYamas"
            }
        }
    }

    /// Whether the method returns a string value
    pub fn has_ret(&self) -> bool {
        !matches!(self, RpcMethod::SetExtraMetrics)
    }

    /// Bulk methods are detached from the connection read loop
    pub fn is_detached(&self) -> bool {
        matches!(
            self,
            RpcMethod::GetMetricsForYamas | RpcMethod::GetHealthMetricsForYamas
        )
    }

    /// Check the parameter count and types against the method signature
    pub fn check_params(&self, params: &[Value]) -> Result<Vec<String>, RpcFailure> {
        if params.len() != self.params().len() {
            return Err(RpcFailure::WrongParams(self.name()));
        }
        params
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                _ => Err(RpcFailure::WrongParams(self.name())),
            })
            .collect()
    }
}

impl FromStr for RpcMethod {
    type Err = RpcFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RpcMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| RpcFailure::NoSuchMethod(s.to_string()))
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{NO_SUCH_METHOD, WRONG_PARAMS};

    #[test]
    fn lookup() {
        for m in RpcMethod::ALL {
            assert_eq!(RpcMethod::from_str(m.name()).unwrap(), m);
        }
        let e = RpcMethod::from_str("getFoo").unwrap_err();
        assert_eq!(e.code(), NO_SUCH_METHOD);
    }

    #[test]
    fn params() {
        let m = RpcMethod::GetAllMetricNamesForService;
        let params = [Value::String("a".to_string()), Value::String("b".to_string())];
        assert_eq!(m.check_params(&params).unwrap(), ["a", "b"]);

        let e = m.check_params(&params[..1]).unwrap_err();
        assert_eq!(e.code(), WRONG_PARAMS);

        let params = [Value::String("a".to_string()), Value::from(1)];
        assert!(m.check_params(&params).is_err());

        assert!(RpcMethod::GetServices.check_params(&[]).unwrap().is_empty());
    }
}
