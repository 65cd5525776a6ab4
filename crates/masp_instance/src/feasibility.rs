//! Stochastic endurance model producing `p_ij`.
//!
//! An agent's true endurance is taken as Normal with mean equal to its
//! battery-degraded budget `s_m * capacity` and standard deviation
//! `budget * budget_error`. The success probability is the chance that this
//! endurance exceeds the time needed to fly out, work the task and fly home:
//!
//! ```text
//! required = d(agent, task) / v + d(task, home) / v + duration * s_m / s_h
//! p        = 1 - Phi((required - budget) / (budget * budget_error))
//! ```

use crate::battery::BatteryModel;
use crate::catalog::Archetype;
use crate::error::{GenError, Result};
use nalgebra::{distance, Point2};
use statrs::distribution::{ContinuousCDF, Normal};

/// Where an agent flies after finishing a task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnGeometry {
    /// All agents return to one shared depot.
    SharedDepot(Point2<f64>),
    /// Each agent returns to the base it launched near.
    OwnBase,
    /// Agents launch from the depot and return to it; the agent position is ignored.
    DepotRoundTrip(Point2<f64>),
}

impl Default for ReturnGeometry {
    fn default() -> Self {
        ReturnGeometry::SharedDepot(Point2::origin())
    }
}

impl ReturnGeometry {
    /// Legs of one sortie. `None` when [`OwnBase`](Self::OwnBase) is used for an
    /// agent without a base.
    pub fn sortie(
        &self,
        agent: &Point2<f64>,
        base: Option<&Point2<f64>>,
        task: &Point2<f64>,
        task_duration_s: f64,
    ) -> Option<Sortie> {
        let (outbound_m, return_m) = match self {
            ReturnGeometry::SharedDepot(depot) => (distance(agent, task), distance(task, depot)),
            ReturnGeometry::OwnBase => (distance(agent, task), distance(task, base?)),
            ReturnGeometry::DepotRoundTrip(depot) => {
                let leg = distance(depot, task);
                (leg, leg)
            }
        };
        Some(Sortie {
            outbound_m,
            return_m,
            task_duration_s,
        })
    }
}

/// Distances and on-task time of a single agent–task pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sortie {
    pub outbound_m: f64,
    pub return_m: f64,
    pub task_duration_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeasibilityModel {
    pub battery: BatteryModel,
    /// Standard deviation of endurance as a fraction of the budget.
    pub budget_error: f64,
}

impl FeasibilityModel {
    /// Fails with `InvalidParameter` unless `budget_error` is finite and non-negative.
    pub fn new(battery: BatteryModel, budget_error: f64) -> Result<Self> {
        if !(budget_error.is_finite() && budget_error >= 0.0) {
            return Err(GenError::invalid("budget_error", "must be non-negative and finite"));
        }
        Ok(Self {
            battery,
            budget_error,
        })
    }

    /// Mean endurance in seconds after battery wear.
    pub fn budget(&self, archetype: &Archetype, battery_cycles: f64) -> f64 {
        archetype.maintenance_budget_s * self.battery.remaining_capacity(battery_cycles)
    }

    /// Budget consumed by the sortie, in the same units as `s_m`.
    pub fn required_time(&self, archetype: &Archetype, sortie: &Sortie) -> f64 {
        let travel = (sortie.outbound_m + sortie.return_m) / archetype.max_speed_mps;
        travel + sortie.task_duration_s * archetype.duty_cycle_factor()
    }

    /// Probability in `[0, 1]` that the agent completes the sortie on one charge.
    ///
    /// A non-positive or non-finite budget yields 0. With a zero error
    /// coefficient the model is a deterministic threshold.
    pub fn success_probability(
        &self,
        archetype: &Archetype,
        battery_cycles: f64,
        sortie: &Sortie,
    ) -> f64 {
        let budget = self.budget(archetype, battery_cycles);
        if !(budget.is_finite() && budget > 0.0) {
            tracing::trace!(archetype = %archetype.name, battery_cycles, budget, "exhausted battery");
            return 0.0;
        }

        let required = self.required_time(archetype, sortie);
        if !required.is_finite() {
            return 0.0;
        }

        let sigma = budget * self.budget_error;
        if sigma == 0.0 {
            return if required < budget { 1.0 } else { 0.0 };
        }

        let Ok(normal) = Normal::new(budget, sigma) else {
            return 0.0;
        };
        (1.0 - normal.cdf(required)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn matrice() -> Archetype {
        Catalog::drone_fleet().unwrap().archetypes()[0].clone()
    }

    fn model() -> FeasibilityModel {
        FeasibilityModel::new(BatteryModel::default(), 0.25).unwrap()
    }

    const IDLE: Sortie = Sortie {
        outbound_m: 0.0,
        return_m: 0.0,
        task_duration_s: 0.0,
    };

    #[test]
    fn idle_sortie_on_fresh_battery_is_near_certain() {
        let archetype = matrice();
        assert_eq!(archetype.maintenance_budget_s, 740.0);
        assert_eq!(archetype.duty_cycle_reference_s, 1080.0);
        assert_eq!(archetype.max_speed_mps, 18.0);

        let model = model();
        assert_eq!(model.budget(&archetype, 0.0), 740.0);
        assert_eq!(model.required_time(&archetype, &IDLE), 0.0);

        // Phi(-4) ~= 3.2e-5
        let p = model.success_probability(&archetype, 0.0, &IDLE);
        assert!(p > 0.9999 && p <= 1.0, "p = {p}");
    }

    #[test]
    fn required_time_sums_legs_and_scaled_duration() {
        let archetype = matrice();
        let sortie = Sortie {
            outbound_m: 900.0,
            return_m: 360.0,
            task_duration_s: 540.0,
        };
        // 1260 m / 18 m/s + 540 s * 740/1080
        let expected = 70.0 + 370.0;
        assert!((model().required_time(&archetype, &sortie) - expected).abs() < 1e-9);
    }

    #[test]
    fn sortie_at_budget_is_a_coin_flip() {
        let archetype = matrice();
        let model = model();
        let sortie = Sortie {
            outbound_m: 740.0 * 18.0,
            return_m: 0.0,
            task_duration_s: 0.0,
        };
        let p = model.success_probability(&archetype, 0.0, &sortie);
        assert!((p - 0.5).abs() < 1e-9, "p = {p}");
    }

    #[test]
    fn worn_battery_lowers_probability() {
        let archetype = matrice();
        let model = model();
        let sortie = Sortie {
            outbound_m: 2_000.0,
            return_m: 2_000.0,
            task_duration_s: 600.0,
        };
        let fresh = model.success_probability(&archetype, 0.0, &sortie);
        let worn = model.success_probability(&archetype, 400.0, &sortie);
        assert!(worn < fresh);
    }

    #[test]
    fn exhausted_battery_yields_zero() {
        let archetype = matrice();
        let model = model();
        assert_eq!(model.success_probability(&archetype, 2_000.0, &IDLE), 0.0);
        assert_eq!(model.success_probability(&archetype, 5_000.0, &IDLE), 0.0);
    }

    #[test]
    fn zero_error_is_a_threshold() {
        let archetype = matrice();
        let model = FeasibilityModel::new(BatteryModel::default(), 0.0).unwrap();
        let short = Sortie {
            outbound_m: 18.0,
            return_m: 18.0,
            task_duration_s: 0.0,
        };
        let long = Sortie {
            outbound_m: 18.0 * 800.0,
            ..short
        };
        assert_eq!(model.success_probability(&archetype, 0.0, &short), 1.0);
        assert_eq!(model.success_probability(&archetype, 0.0, &long), 0.0);
    }

    #[test]
    fn negative_or_nan_error_is_rejected() {
        for error in [-0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                FeasibilityModel::new(BatteryModel::default(), error),
                Err(GenError::InvalidParameter { name: "budget_error", .. })
            ));
        }
    }

    #[test]
    fn geometry_variants_pick_the_return_leg() {
        let agent = Point2::new(0.0, 0.0);
        let task = Point2::new(300.0, 400.0);
        let base = Point2::new(300.0, 0.0);

        let shared = ReturnGeometry::default().sortie(&agent, None, &task, 10.0).unwrap();
        assert_eq!((shared.outbound_m, shared.return_m), (500.0, 500.0));

        let own = ReturnGeometry::OwnBase
            .sortie(&agent, Some(&base), &task, 10.0)
            .unwrap();
        assert_eq!((own.outbound_m, own.return_m), (500.0, 400.0));
        assert!(ReturnGeometry::OwnBase.sortie(&agent, None, &task, 10.0).is_none());

        let depot = Point2::new(300.0, 0.0);
        let round = ReturnGeometry::DepotRoundTrip(depot)
            .sortie(&Point2::new(-1e6, 1e6), None, &task, 10.0)
            .unwrap();
        assert_eq!((round.outbound_m, round.return_m), (400.0, 400.0));
    }
}
