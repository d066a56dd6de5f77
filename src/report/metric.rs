//! Byte metrics attached to memory items.
//!
//! A `Metric` pairs the allocated byte count with an optional resident byte
//! count. Resident memory is not measurable for every source (estimated
//! graphics categories, the raw object table), so it is kept as an `Option`
//! and an unmeasured value never turns into a literal zero.
//!
//! Unmeasured resident absorbs under addition: a total that includes any
//! unmeasured part is itself unmeasured, never a partial sum.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Bytes per megabyte used for every size column.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Allocated/resident byte pair of a memory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub allocated: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident: Option<u64>,
}

impl Metric {
    /// Addition identity: nothing allocated, nothing resident.
    pub const ZERO: Metric = Metric {
        allocated: 0,
        resident: Some(0),
    };

    pub fn new(allocated: u64, resident: u64) -> Self {
        Self {
            allocated,
            resident: Some(resident),
        }
    }

    /// Metric for sources that only know the allocated size.
    pub fn allocated_only(allocated: u64) -> Self {
        Self {
            allocated,
            resident: None,
        }
    }

    pub fn has_allocation(&self) -> bool {
        self.allocated > 0
    }

    /// Resident larger than allocated. Upstream data is allowed to do this.
    pub fn is_inconsistent(&self) -> bool {
        self.resident.is_some_and(|r| r > self.allocated)
    }

    /// Resident bytes without any allocation; such items are not counted.
    pub fn is_resident_only(&self) -> bool {
        self.allocated == 0 && self.resident.is_some_and(|r| r > 0)
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::ZERO
    }
}

impl Add for Metric {
    type Output = Metric;

    fn add(self, rhs: Metric) -> Metric {
        let resident = match (self.resident, rhs.resident) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            _ => None,
        };
        Metric {
            allocated: self.allocated.saturating_add(rhs.allocated),
            resident,
        }
    }
}

impl AddAssign for Metric {
    fn add_assign(&mut self, rhs: Metric) {
        *self = *self + rhs;
    }
}

impl Sum for Metric {
    fn sum<I: Iterator<Item = Metric>>(iter: I) -> Metric {
        iter.fold(Metric::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Metric> for Metric {
    fn sum<I: Iterator<Item = &'a Metric>>(iter: I) -> Metric {
        iter.copied().sum()
    }
}

/// Formats a byte count as megabytes with exactly three decimals, e.g. `1.500 MB`.
///
/// The conversion is done in integer arithmetic and rounds half up on the
/// exact quotient, so the output does not depend on float formatting or locale.
pub fn format_megabytes(bytes: u64) -> String {
    let half = u128::from(BYTES_PER_MB / 2);
    let thousandths = (u128::from(bytes) * 1000 + half) / u128::from(BYTES_PER_MB);
    format!("{}.{:03} MB", thousandths / 1000, thousandths % 1000)
}
