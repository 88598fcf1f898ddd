/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod id;
pub use id::{ConsumerId, DimensionId, MetricId, ServiceId};

mod value;
pub use value::MetricValue;
