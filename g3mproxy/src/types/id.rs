/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::borrow::Borrow;
use std::fmt;

use arcstr::ArcStr;

macro_rules! impl_id {
    ($t:ident) => {
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $t(ArcStr);

        impl $t {
            #[inline]
            pub fn new(s: &str) -> Self {
                $t(ArcStr::from(s))
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $t {
            fn from(s: &str) -> Self {
                $t::new(s)
            }
        }

        impl From<String> for $t {
            fn from(s: String) -> Self {
                $t(ArcStr::from(s))
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Borrow<str> for $t {
            fn borrow(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_id!(MetricId);
impl_id!(DimensionId);
impl_id!(ServiceId);
impl_id!(ConsumerId);

impl ConsumerId {
    /// The consumer that every proxy serves, even if no user config mentions it
    pub const VESPA: ConsumerId = ConsumerId(arcstr::literal!("Vespa"));
}

impl ServiceId {
    /// The synthetic service that owns externally pushed packets
    pub const VESPA_NODE: ServiceId = ServiceId(arcstr::literal!("vespa.node"));
}

impl DimensionId {
    pub const ROLE: DimensionId = DimensionId(arcstr::literal!("role"));
    pub const STATE: DimensionId = DimensionId(arcstr::literal!("state"));
    pub const ORCHESTRATOR_STATE: DimensionId =
        DimensionId(arcstr::literal!("orchestratorState"));

    pub const INSTANCE: DimensionId = DimensionId(arcstr::literal!("instance"));
    pub const METRIC_TYPE: DimensionId = DimensionId(arcstr::literal!("metrictype"));
}
