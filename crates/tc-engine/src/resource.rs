//! Conversion from raw concurrency to resource units ("tokens").

use serde::{Deserialize, Serialize};
use tc_common::{Error, Result};

/// Subjects covered by one resource unit unless configured otherwise.
pub const DEFAULT_UNITS_PER_RESOURCE: u32 = 3;

/// How many simultaneous subjects one resource unit covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceModel {
    units_per_resource: u32,
}

impl ResourceModel {
    /// Rejects a zero divisor with `InvalidParameter`.
    pub fn new(units_per_resource: u32) -> Result<Self> {
        if units_per_resource == 0 {
            return Err(Error::invalid_parameter(
                "units_per_resource",
                units_per_resource,
                "must be positive",
            ));
        }
        Ok(ResourceModel { units_per_resource })
    }

    pub fn units_per_resource(&self) -> u32 {
        self.units_per_resource
    }

    /// `ceil(active / units_per_resource)`.
    pub fn units_for(&self, active: usize) -> u64 {
        let per = u64::from(self.units_per_resource);
        (active as u64).div_ceil(per)
    }
}

impl Default for ResourceModel {
    fn default() -> Self {
        ResourceModel {
            units_per_resource: DEFAULT_UNITS_PER_RESOURCE,
        }
    }
}
