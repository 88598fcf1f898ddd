/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::{BAD_REQUEST, METHOD_FAILED, NO_SUCH_METHOD, RpcFailure, WRONG_PARAMS};
use error::ServerTaskError;

mod protocol;
pub use protocol::{FrameError, RpcError, RpcRequest, RpcResponse};

mod method;
pub use method::RpcMethod;

mod handler;
pub use handler::{DEFAULT_LOG_SPENT_TIME_LIMIT, RpcHandler};

mod task;
use task::RpcTask;

mod server;
use server::RpcServerCommand;
pub use server::RpcServer;

mod client;
pub use client::RpcClient;
