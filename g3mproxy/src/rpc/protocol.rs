/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::RpcFailure;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("frame should be a json object")]
    NotObject,
    #[error("no valid '{0}' field")]
    InvalidField(&'static str),
}

/// One request frame, a single line of json
#[derive(Clone, Debug, PartialEq)]
pub struct RpcRequest {
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: &str, params: &[&str]) -> Self {
        RpcRequest {
            id,
            method: method.to_string(),
            params: params.iter().map(|s| Value::String(s.to_string())).collect(),
        }
    }

    pub fn parse(buf: &[u8]) -> Result<Self, FrameError> {
        let v: Value = serde_json::from_slice(buf)?;
        let Value::Object(map) = v else {
            return Err(FrameError::NotObject);
        };
        let id = map
            .get("id")
            .and_then(|v| v.as_u64())
            .ok_or(FrameError::InvalidField("id"))?;
        let method = map
            .get("method")
            .and_then(|v| v.as_str())
            .ok_or(FrameError::InvalidField("method"))?;
        let params = match map.get("params") {
            Some(Value::Array(params)) => params.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(FrameError::InvalidField("params")),
        };
        Ok(RpcRequest {
            id,
            method: method.to_string(),
            params,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut map = Map::with_capacity(3);
        map.insert("id".to_string(), Value::Number(Number::from(self.id)));
        map.insert("method".to_string(), Value::String(self.method.clone()));
        map.insert("params".to_string(), Value::Array(self.params.clone()));
        encode_line(map)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcError {
    pub code: u32,
    pub message: String,
}

/// One response frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcResponse {
    pub id: u64,
    pub ret: Vec<String>,
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn with_value(id: u64, value: Option<String>) -> Self {
        RpcResponse {
            id,
            ret: value.into_iter().collect(),
            error: None,
        }
    }

    /// A failed call, which still carries an empty return value for methods
    /// that return one.
    pub fn with_failure(id: u64, failure: &RpcFailure, has_ret: bool) -> Self {
        let ret = if has_ret { vec![String::new()] } else { Vec::new() };
        RpcResponse {
            id,
            ret,
            error: Some(RpcError {
                code: failure.code(),
                message: failure.to_string(),
            }),
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn parse(buf: &[u8]) -> Result<Self, FrameError> {
        let v: Value = serde_json::from_slice(buf)?;
        let Value::Object(map) = v else {
            return Err(FrameError::NotObject);
        };
        let id = map
            .get("id")
            .and_then(|v| v.as_u64())
            .ok_or(FrameError::InvalidField("id"))?;

        let mut ret = Vec::new();
        match map.get("ret") {
            Some(Value::Array(values)) => {
                for v in values {
                    let s = v.as_str().ok_or(FrameError::InvalidField("ret"))?;
                    ret.push(s.to_string());
                }
            }
            None => {}
            Some(_) => return Err(FrameError::InvalidField("ret")),
        }

        let error = match map.get("error") {
            Some(Value::Object(e)) => {
                let code = e
                    .get("code")
                    .and_then(|v| v.as_u64())
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or(FrameError::InvalidField("error.code"))?;
                let message = e
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Some(RpcError { code, message })
            }
            Some(Value::Null) | None => None,
            Some(_) => return Err(FrameError::InvalidField("error")),
        };

        Ok(RpcResponse { id, ret, error })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut map = Map::with_capacity(3);
        map.insert("id".to_string(), Value::Number(Number::from(self.id)));
        let ret = self.ret.iter().map(|s| Value::String(s.clone())).collect();
        map.insert("ret".to_string(), Value::Array(ret));
        if let Some(e) = &self.error {
            let mut error = Map::with_capacity(2);
            error.insert("code".to_string(), Value::Number(Number::from(e.code)));
            error.insert("message".to_string(), Value::String(e.message.clone()));
            map.insert("error".to_string(), Value::Object(error));
        }
        encode_line(map)
    }
}

fn encode_line(map: Map<String, Value>) -> Vec<u8> {
    // serialized json strings never contain a raw newline
    let mut buf = Value::Object(map).to_string().into_bytes();
    buf.push(b'\n');
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request() {
        let req = RpcRequest::new(3, "getMetricsForYamas", &["all"]);
        let buf = req.encode();
        assert_eq!(
            buf,
            b"{\"id\":3,\"method\":\"getMetricsForYamas\",\"params\":[\"all\"]}\n"
        );
        assert_eq!(RpcRequest::parse(&buf[..buf.len() - 1]).unwrap(), req);

        let req = RpcRequest::parse(br#"{"id":1,"method":"getServices"}"#).unwrap();
        assert!(req.params.is_empty());
    }

    #[test]
    fn invalid_request() {
        assert!(matches!(
            RpcRequest::parse(b"{"),
            Err(FrameError::InvalidJson(_))
        ));
        assert!(matches!(
            RpcRequest::parse(b"[]"),
            Err(FrameError::NotObject)
        ));
        assert!(matches!(
            RpcRequest::parse(br#"{"method":"getServices"}"#),
            Err(FrameError::InvalidField("id"))
        ));
        assert!(matches!(
            RpcRequest::parse(br#"{"id":1,"method":"getServices","params":"x"}"#),
            Err(FrameError::InvalidField("params"))
        ));
    }

    #[test]
    fn response() {
        let rsp = RpcResponse::with_value(7, Some("a b".to_string()));
        let buf = rsp.encode();
        assert_eq!(buf, b"{\"id\":7,\"ret\":[\"a b\"]}\n");
        assert_eq!(RpcResponse::parse(&buf).unwrap(), rsp);

        let rsp = RpcResponse::with_value(8, None);
        assert_eq!(rsp.encode(), b"{\"id\":8,\"ret\":[]}\n");
    }

    #[test]
    fn failure() {
        let rsp = RpcResponse::with_failure(9, &RpcFailure::NoService("foo".to_string()), true);
        let buf = rsp.encode();
        assert_eq!(
            buf,
            b"{\"id\":9,\"ret\":[\"\"],\"error\":{\"code\":105,\"message\":\"No service with name 'foo'\"}}\n"
        );
        let parsed = RpcResponse::parse(&buf).unwrap();
        assert!(parsed.is_error());
        assert_eq!(parsed.ret, [""]);
        assert_eq!(parsed.error.unwrap().code, 105);
    }
}
