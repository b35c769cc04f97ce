//! Configuration types for the scheduling engine.

/// Tunables for the auto-scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Duration assigned to a task when the auto-scheduler computes its
    /// dates, in days.
    pub default_duration_days: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            default_duration_days: 3,
        }
    }
}

impl ScheduleConfig {
    pub fn with_default_duration(days: i64) -> Self {
        Self {
            default_duration_days: days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_duration_is_three_days() {
        assert_eq!(ScheduleConfig::default().default_duration_days, 3);
    }
}
