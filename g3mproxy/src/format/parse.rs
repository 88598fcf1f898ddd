/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde_json::{Map, Value};
use thiserror::Error;

use crate::metric::MetricsPacketBuilder;
use crate::types::{ConsumerId, DimensionId, MetricId, MetricValue, ServiceId};

#[derive(Debug, Error)]
pub enum PacketParseError {
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("root value should be an array or an object with a 'metrics' array")]
    InvalidRoot,
    #[error("packet #{0} is not a json object")]
    InvalidPacket(usize),
    #[error("invalid value for key {0}")]
    InvalidField(&'static str),
    #[error("invalid value for metric {0}: {1}")]
    InvalidMetric(String, anyhow::Error),
}

impl PacketParseError {
    pub fn kind(&self) -> &'static str {
        match self {
            PacketParseError::InvalidJson(_) => "InvalidJson",
            PacketParseError::InvalidRoot => "InvalidRoot",
            PacketParseError::InvalidPacket(_) => "InvalidPacket",
            PacketParseError::InvalidField(_) => "InvalidField",
            PacketParseError::InvalidMetric(_, _) => "InvalidMetric",
        }
    }
}

/// Parse pushed metrics packets.
///
/// Both a bare array and an object with a `metrics` array are accepted.
pub fn parse_metrics_packets(s: &str) -> Result<Vec<MetricsPacketBuilder>, PacketParseError> {
    let root: Value = serde_json::from_str(s)?;
    let array = match &root {
        Value::Array(array) => array,
        Value::Object(map) => match map.get("metrics") {
            Some(Value::Array(array)) => array,
            _ => return Err(PacketParseError::InvalidRoot),
        },
        _ => return Err(PacketParseError::InvalidRoot),
    };

    let mut packets = Vec::with_capacity(array.len());
    for (i, v) in array.iter().enumerate() {
        let Value::Object(map) = v else {
            return Err(PacketParseError::InvalidPacket(i));
        };
        packets.push(parse_packet(map)?);
    }
    Ok(packets)
}

fn parse_packet(map: &Map<String, Value>) -> Result<MetricsPacketBuilder, PacketParseError> {
    let mut builder = MetricsPacketBuilder::default();

    for (k, v) in map {
        match k.as_str() {
            "service" | "application" => {
                let Value::String(s) = v else {
                    return Err(PacketParseError::InvalidField("service"));
                };
                builder.service(ServiceId::new(s));
            }
            "timestamp" => {
                let t = v
                    .as_i64()
                    .ok_or(PacketParseError::InvalidField("timestamp"))?;
                builder.timestamp(t);
            }
            "status_code" => {
                let code = v
                    .as_u64()
                    .and_then(|c| u32::try_from(c).ok())
                    .ok_or(PacketParseError::InvalidField("status_code"))?;
                builder.status_code(code);
            }
            "status_msg" => {
                let msg = v
                    .as_str()
                    .ok_or(PacketParseError::InvalidField("status_msg"))?;
                builder.status_msg(msg);
            }
            "dimensions" => {
                let Value::Object(dimensions) = v else {
                    return Err(PacketParseError::InvalidField("dimensions"));
                };
                for (k, v) in dimensions {
                    let v = v
                        .as_str()
                        .ok_or(PacketParseError::InvalidField("dimensions"))?;
                    builder.put_dimension(DimensionId::new(k), v);
                }
            }
            "metrics" => {
                let Value::Object(metrics) = v else {
                    return Err(PacketParseError::InvalidField("metrics"));
                };
                for (k, v) in metrics {
                    let value = MetricValue::try_from(v)
                        .map_err(|e| PacketParseError::InvalidMetric(k.to_string(), e))?;
                    builder.put_metric(MetricId::new(k), value);
                }
            }
            "routing" => {
                let Value::Array(consumers) = v else {
                    return Err(PacketParseError::InvalidField("routing"));
                };
                let mut ids = Vec::with_capacity(consumers.len());
                for c in consumers {
                    let c = c
                        .as_str()
                        .ok_or(PacketParseError::InvalidField("routing"))?;
                    ids.push(ConsumerId::new(c));
                }
                builder.add_consumers(&ids);
            }
            _ => {}
        }
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_array() {
        let packets = parse_metrics_packets(
            r#"[{"service":"x","timestamp":1000,"metrics":{"metric1":5},"dimensions":{}}]"#,
        )
        .unwrap();
        assert_eq!(packets.len(), 1);
        let p = packets.into_iter().next().unwrap().build();
        assert_eq!(p.service().as_str(), "x");
        assert_eq!(p.timestamp(), 1000);
        assert_eq!(p.metrics().get("metric1"), Some(&MetricValue::Unsigned(5)));
    }

    #[test]
    fn wrapped() {
        let packets = parse_metrics_packets(
            r#"{"metrics":[{"application":"host","status_code":1,"status_msg":"down",
                "dimensions":{"role":"content"},"metrics":{"a":-1,"b":"2.5"},"routing":["Vespa"]}]}"#,
        )
        .unwrap();
        let p = packets.into_iter().next().unwrap().build();
        assert_eq!(p.service().as_str(), "host");
        assert_eq!(p.status_code(), 1);
        assert_eq!(p.status_msg(), "down");
        assert_eq!(p.dimensions().get("role").unwrap(), "content");
        assert_eq!(p.metrics().get("a"), Some(&MetricValue::Signed(-1)));
        assert_eq!(p.metrics().get("b"), Some(&MetricValue::Double(2.5)));
        assert!(p.consumers().contains("Vespa"));
    }

    #[test]
    fn empty() {
        assert!(parse_metrics_packets("[]").unwrap().is_empty());
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            parse_metrics_packets("[{"),
            Err(PacketParseError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_metrics_packets(r#"{"foo":[]}"#),
            Err(PacketParseError::InvalidRoot)
        ));
        assert!(matches!(
            parse_metrics_packets("[1]"),
            Err(PacketParseError::InvalidPacket(0))
        ));
        assert!(matches!(
            parse_metrics_packets(r#"[{"metrics":{"a":true}}]"#),
            Err(PacketParseError::InvalidMetric(_, _))
        ));
        assert!(matches!(
            parse_metrics_packets(r#"[{"timestamp":"now"}]"#),
            Err(PacketParseError::InvalidField("timestamp"))
        ));
    }
}
