/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

pub mod build;
pub mod config;
pub mod consumer;
pub mod external;
pub mod format;
pub mod log;
pub mod manager;
pub mod metric;
pub mod opts;
pub mod rpc;
pub mod service;
pub mod signal;
pub mod types;
