/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io;

use thiserror::Error;

pub const BAD_REQUEST: u32 = 105;
pub const NO_SUCH_METHOD: u32 = 106;
pub const WRONG_PARAMS: u32 = 107;
pub const METHOD_FAILED: u32 = 111;

/// Failure of one RPC call, reported to the client with an empty return value
#[derive(Debug, Error)]
pub enum RpcFailure {
    #[error("{0}")]
    BadRequest(String),
    #[error("No service with name '{0}'")]
    NoService(String),
    #[error("No such method '{0}'")]
    NoSuchMethod(String),
    #[error("Parameters in request do not match method '{0}'")]
    WrongParams(&'static str),
    #[error("Request failed due to internal error: {kind}: {message}")]
    Internal { kind: String, message: String },
}

impl RpcFailure {
    pub fn internal<E: fmt::Display>(kind: &str, e: E) -> Self {
        RpcFailure::Internal {
            kind: kind.to_string(),
            message: format!("{e:#}"),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            RpcFailure::BadRequest(_) | RpcFailure::NoService(_) => BAD_REQUEST,
            RpcFailure::NoSuchMethod(_) => NO_SUCH_METHOD,
            RpcFailure::WrongParams(_) => WRONG_PARAMS,
            RpcFailure::Internal { .. } => METHOD_FAILED,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ServerTaskError {
    #[error("write failed: {0:?}")]
    WriteFailed(io::Error),
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("connection closed in the middle of a request")]
    ClosedEarly,
    #[error("request size exceeds limit {0}")]
    RequestTooLarge(usize),
    #[error("server force quit")]
    ServerForceQuit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message() {
        let e = RpcFailure::NoService("nonexistent".to_string());
        assert_eq!(e.code(), BAD_REQUEST);
        assert_eq!(e.to_string(), "No service with name 'nonexistent'");

        let e = RpcFailure::internal("InvalidJson", "EOF while parsing");
        assert_eq!(e.code(), METHOD_FAILED);
        assert_eq!(
            e.to_string(),
            "Request failed due to internal error: InvalidJson: EOF while parsing"
        );
    }
}
