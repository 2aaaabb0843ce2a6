/**
 * Dashboard Statistics
 */

use serde::Serialize;

/// Change from `previous` to `current` in percent, two decimals.
///
/// A previous value of zero gives 100 when anything happened this period,
/// else 0.
pub fn percent_change(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    let change = (current - previous) as f64 / previous as f64 * 100.0;
    (change * 100.0).round() / 100.0
}

/// This month against last month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub current: i64,
    pub previous: i64,
    pub percent_change: f64,
}

impl Comparison {
    pub fn new(current: i64, previous: i64) -> Self {
        Self {
            current,
            previous,
            percent_change: percent_change(current, previous),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub fleets: i64,
    pub tour_packages: i64,
    pub members: i64,
    pub orders: Comparison,
    pub revenue: Comparison,
}
