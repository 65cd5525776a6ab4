/// Capacity lost per charge cycle (0.1 per 200 cycles).
pub const DEFAULT_FADE_PER_CYCLE: f64 = 0.0005;

/// Linear battery wear model.
///
/// Capacity is not floored at zero: past `1 / fade_per_cycle` cycles the
/// fraction goes negative and the feasibility model reports a zero success
/// probability for that agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryModel {
    pub fade_per_cycle: f64,
}

impl Default for BatteryModel {
    fn default() -> Self {
        Self {
            fade_per_cycle: DEFAULT_FADE_PER_CYCLE,
        }
    }
}

impl BatteryModel {
    /// Fraction of nameplate capacity left after `cycles` charge cycles.
    #[inline]
    pub fn remaining_capacity(&self, cycles: f64) -> f64 {
        1.0 - self.fade_per_cycle * cycles
    }
}
