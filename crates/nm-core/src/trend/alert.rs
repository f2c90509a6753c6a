//! Alert level assignment.

use super::analysis::{AlertLevel, TrendKind};

/// ETA bands for alerting, in days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    pub critical_days: f64,
    pub warning_days: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy {
            critical_days: 7.0,
            warning_days: 30.0,
        }
    }
}

impl AlertPolicy {
    /// Combine trend, ETA and limit proximity into a severity.
    ///
    /// Rules are evaluated top-down; the first match wins:
    /// 1. limit set and `current_value ≥ limit` → critical
    /// 2. ETA within `critical_days` → critical
    /// 3. ETA within `warning_days` → warning
    /// 4. accelerating growth or decline with no limit → warning
    /// 5. any other directional trend → info
    /// 6. stable or unknown → none
    pub fn assign(
        &self,
        trend: TrendKind,
        days_until_limit: Option<f64>,
        current_value: f64,
        limit: Option<f64>,
    ) -> AlertLevel {
        if let Some(limit) = limit {
            if current_value >= limit {
                return AlertLevel::Critical;
            }
        }
        if let Some(days) = days_until_limit {
            if days <= self.critical_days {
                return AlertLevel::Critical;
            }
            if days <= self.warning_days {
                return AlertLevel::Warning;
            }
        }
        match trend {
            TrendKind::AcceleratingGrowth | TrendKind::AcceleratingDecline if limit.is_none() => {
                AlertLevel::Warning
            }
            TrendKind::AcceleratingGrowth
            | TrendKind::AcceleratingDecline
            | TrendKind::IncreasingLinear
            | TrendKind::DecreasingLinear
            | TrendKind::DeceleratingGrowth
            | TrendKind::DeceleratingDecline => AlertLevel::Info,
            TrendKind::Stable | TrendKind::Unknown => AlertLevel::None,
        }
    }
}
