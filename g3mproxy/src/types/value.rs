/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use memchr::memchr2;
use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Double(f64),
    Signed(i64),
    Unsigned(u64),
}

impl MetricValue {
    /// NaN and infinite values have no json representation and map to null
    pub fn as_json_value(&self) -> Value {
        match self {
            MetricValue::Double(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            MetricValue::Signed(i) => Value::Number(Number::from(*i)),
            MetricValue::Unsigned(u) => Value::Number(Number::from(*u)),
        }
    }
}

impl TryFrom<&Number> for MetricValue {
    type Error = anyhow::Error;

    fn try_from(n: &Number) -> Result<Self, Self::Error> {
        if let Some(u) = n.as_u64() {
            Ok(MetricValue::Unsigned(u))
        } else if let Some(i) = n.as_i64() {
            Ok(MetricValue::Signed(i))
        } else if let Some(f) = n.as_f64() {
            Ok(MetricValue::Double(f))
        } else {
            Err(anyhow!("unsupported json number {n}"))
        }
    }
}

impl TryFrom<&Value> for MetricValue {
    type Error = anyhow::Error;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Number(n) => MetricValue::try_from(n),
            Value::String(s) => MetricValue::from_str(s),
            _ => Err(anyhow!(
                "json value type for 'metric value' should be 'number' or 'string'"
            )),
        }
    }
}

impl FromStr for MetricValue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(anyhow!("empty string"));
        }

        if memchr2(b'.', b'e', s.as_bytes()).is_some() {
            let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 string: {e}"))?;
            return Ok(MetricValue::Double(f));
        }

        if s.as_bytes()[0] == b'-' {
            let i = i64::from_str(s).map_err(|e| anyhow!("invalid i64 string: {e}"))?;
            Ok(MetricValue::Signed(i))
        } else {
            let u = u64::from_str(s).map_err(|e| anyhow!("invalid u64 string: {e}"))?;
            Ok(MetricValue::Unsigned(u))
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Unsigned(u) => itoa::Buffer::new().format(*u).fmt(f),
            MetricValue::Signed(i) => itoa::Buffer::new().format(*i).fmt(f),
            MetricValue::Double(v) => ryu::Buffer::new().format(*v).fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_str() {
        assert_eq!(MetricValue::from_str("5").unwrap(), MetricValue::Unsigned(5));
        assert_eq!(MetricValue::from_str("-5").unwrap(), MetricValue::Signed(-5));
        assert_eq!(
            MetricValue::from_str("1.5").unwrap(),
            MetricValue::Double(1.5)
        );
        assert_eq!(
            MetricValue::from_str("1e3").unwrap(),
            MetricValue::Double(1000.0)
        );
        assert!(MetricValue::from_str("").is_err());
        assert!(MetricValue::from_str("abc").is_err());
    }

    #[test]
    fn json() {
        let v: Value = serde_json::from_str("[5, -2, 0.25, \"7\", true]").unwrap();
        let a = v.as_array().unwrap();
        assert_eq!(MetricValue::try_from(&a[0]).unwrap(), MetricValue::Unsigned(5));
        assert_eq!(MetricValue::try_from(&a[1]).unwrap(), MetricValue::Signed(-2));
        assert_eq!(MetricValue::try_from(&a[2]).unwrap(), MetricValue::Double(0.25));
        assert_eq!(MetricValue::try_from(&a[3]).unwrap(), MetricValue::Unsigned(7));
        assert!(MetricValue::try_from(&a[4]).is_err());

        assert_eq!(MetricValue::Unsigned(5).as_json_value().to_string(), "5");
        assert_eq!(MetricValue::Double(f64::NAN).as_json_value(), Value::Null);
    }

    #[test]
    fn display() {
        assert_eq!(MetricValue::Unsigned(10).to_string(), "10");
        assert_eq!(MetricValue::Signed(-10).to_string(), "-10");
        assert_eq!(MetricValue::Double(1.0).to_string(), "1.0");
    }
}
