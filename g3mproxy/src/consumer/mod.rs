/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod config;
pub use config::{ConsumerConfig, ConsumerMetricConfig, ConsumersConfig, DimensionConfig};

mod default;
pub use default::{DEFAULT_METRIC_SET_ID, default_consumer};

mod generate;
pub use generate::{combine, generate, generate_with_default};

mod consumers;
pub use consumers::{ConsumersHandle, MetricsConsumers};
