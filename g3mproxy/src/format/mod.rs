/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod yamas;
pub use yamas::{HEALTH_METRICS, to_yamas_array, to_yamas_string};

mod parse;
pub use parse::{PacketParseError, parse_metrics_packets};
