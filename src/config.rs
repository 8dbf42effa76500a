use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Engine-wide policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// days after the due date during which no late fee accrues
    pub grace_period_days: u32,
    /// late fee as percent of the EMI amount per chargeable day
    /// (e.g. 2.0 for 2%); zero disables late fees
    pub late_fee_percent_per_day: Decimal,
    /// window for "due soon" reminders
    pub reminder_days_ahead: u32,
}

impl EngineConfig {
    /// config with late fees disabled
    pub fn no_late_fees() -> Self {
        Self {
            late_fee_percent_per_day: Decimal::ZERO,
            ..Self::default()
        }
    }

    /// config with an explicit late fee policy
    pub fn with_late_fee(percent_per_day: Decimal, grace_period_days: u32) -> Self {
        Self {
            grace_period_days,
            late_fee_percent_per_day: percent_per_day,
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_period_days: 3,
            late_fee_percent_per_day: dec!(2.0),
            reminder_days_ahead: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_late_fees_zeroes_percentage() {
        let config = EngineConfig::no_late_fees();
        assert!(config.late_fee_percent_per_day.is_zero());
        assert_eq!(config.grace_period_days, 3);
    }

    #[test]
    fn test_with_late_fee() {
        let config = EngineConfig::with_late_fee(dec!(1.5), 5);
        assert_eq!(config.late_fee_percent_per_day, dec!(1.5));
        assert_eq!(config.grace_period_days, 5);
    }

    #[test]
    fn test_serde_round_trip_covers_every_field() {
        let config = EngineConfig::with_late_fee(dec!(1.5), 5);
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
