use std::ops::RangeInclusive;

use crate::keys::Epsilon;

/// The pipeline checks 1% of cell pairs for path intersection, so sampled
/// geometric error counts scale by this factor to an expected full count.
pub const GEOM_ERROR_SCALE: f64 = 100.0;

/// Coverage thresholds (%) for the percentile-crossing table.
pub const COVERAGE_THRESHOLDS: [f64; 6] = [90.0, 95.0, 99.0, 99.9, 99.99, 99.999];

/// Reference line in the large-`d` WSPD size chart.
pub const WSPD_SIZE_REFERENCE: f64 = 60_000_000.0;

/// `d` for the single-run WSPD size chart.
pub const SMALL_D: u32 = 5;

/// `d` range for the aggregate chart variants.
pub const LARGE_D_RANGE: RangeInclusive<u32> = 8..=12;

/// ε left out of the aggregate charts (incomplete runs in the source data).
pub const EXCLUDED_EPS: Epsilon = Epsilon::from_thousandths(450);
