use crate::assign::CapabilityAssigner;
use crate::battery::BatteryModel;
use crate::catalog::Catalog;
use crate::demand::{check_demand, generate_demand};
use crate::error::{GenError, Result};
use crate::feasibility::{FeasibilityModel, ReturnGeometry};
use crate::instance::{AgentSpec, Instance, Task};
use nalgebra::{Point2, Vector2};
use rand::Rng;

/// Everything that varies between generated instances.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceParams {
    pub agents: usize,
    pub tasks: usize,
    pub floaters: usize,
    /// Number of launch bases; 0 places agents anywhere in the box.
    pub bases: usize,
    pub geometry: ReturnGeometry,
    /// Locations are drawn in `[-half_extent_m, half_extent_m)` on both axes.
    pub half_extent_m: f64,
    /// Agents sit within this distance (per axis) of their base.
    pub base_spread_m: f64,
    pub min_task_duration_s: f64,
    pub max_task_duration_s: f64,
    pub max_battery_cycles: f64,
    pub budget_error: f64,
    pub battery: BatteryModel,
}

impl Default for InstanceParams {
    fn default() -> Self {
        Self {
            agents: 15,
            tasks: 4,
            floaters: 4,
            bases: 0,
            geometry: ReturnGeometry::default(),
            half_extent_m: 1500.0,
            base_spread_m: 50.0,
            min_task_duration_s: 300.0,
            max_task_duration_s: 900.0,
            max_battery_cycles: 400.0,
            budget_error: 0.25,
            battery: BatteryModel::default(),
        }
    }
}

impl InstanceParams {
    pub fn new(agents: usize, tasks: usize, floaters: usize) -> Self {
        Self {
            agents,
            tasks,
            floaters,
            ..Self::default()
        }
    }

    /// Clusters agents around `bases` launch sites and sends each one home to
    /// its own base.
    pub fn with_bases(mut self, bases: usize) -> Self {
        self.bases = bases;
        self.geometry = ReturnGeometry::OwnBase;
        self
    }

    pub fn with_geometry(mut self, geometry: ReturnGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_demand(self.agents, self.tasks, self.floaters)?;

        if !(self.half_extent_m.is_finite() && self.half_extent_m > 0.0) {
            return Err(GenError::invalid("half_extent_m", "must be positive and finite"));
        }
        if !(self.base_spread_m.is_finite() && self.base_spread_m >= 0.0) {
            return Err(GenError::invalid("base_spread_m", "must be non-negative and finite"));
        }
        if !(self.min_task_duration_s.is_finite() && self.min_task_duration_s >= 0.0) {
            return Err(GenError::invalid("min_task_duration_s", "must be non-negative and finite"));
        }
        if !(self.max_task_duration_s.is_finite()
            && self.max_task_duration_s >= self.min_task_duration_s)
        {
            return Err(GenError::invalid(
                "max_task_duration_s",
                format!("must be finite and at least {}", self.min_task_duration_s),
            ));
        }
        if !(self.max_battery_cycles.is_finite() && self.max_battery_cycles >= 0.0) {
            return Err(GenError::invalid("max_battery_cycles", "must be non-negative and finite"));
        }
        if !(self.budget_error.is_finite() && self.budget_error >= 0.0) {
            return Err(GenError::invalid("budget_error", "must be non-negative and finite"));
        }
        if self.geometry == ReturnGeometry::OwnBase && self.bases == 0 {
            return Err(GenError::invalid("bases", "own-base geometry needs at least one base"));
        }
        Ok(())
    }
}

/// Draws complete instances for one parameter set.
pub struct InstanceBuilder<'a> {
    catalog: &'a Catalog,
    params: InstanceParams,
    model: FeasibilityModel,
}

impl<'a> InstanceBuilder<'a> {
    pub fn new(catalog: &'a Catalog, params: InstanceParams) -> Result<Self> {
        params.validate()?;
        let model = FeasibilityModel::new(params.battery, params.budget_error)?;
        Ok(Self {
            catalog,
            params,
            model,
        })
    }

    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Instance> {
        let p = &self.params;

        let mut requirements = Vec::with_capacity(p.tasks);
        let mut drafts = Vec::with_capacity(p.tasks);
        for _ in 0..p.tasks {
            let requirement = self.catalog.random_requirement(rng);
            let duration_s = uniform(rng, p.min_task_duration_s, p.max_task_duration_s);
            let location = self.random_point(rng);
            requirements.push(requirement);
            drafts.push((requirement, duration_s, location));
        }

        let bases: Vec<Point2<f64>> = (0..p.bases).map(|_| self.random_point(rng)).collect();

        let demand = generate_demand(p.agents, p.tasks, p.floaters, rng)?;
        let assigner = CapabilityAssigner::new(self.catalog, &demand, &requirements)?;

        let mut agents = Vec::with_capacity(p.agents);
        for i in 0..p.agents {
            let (archetype, _) = assigner.assign(i, rng)?;
            let (location, base) = self.place_agent(&bases, rng);
            let battery_cycles = uniform(rng, 0.0, p.max_battery_cycles);
            agents.push(AgentSpec {
                archetype,
                location,
                battery_cycles,
                base,
            });
        }

        let tasks = drafts
            .into_iter()
            .zip(&demand)
            .map(|((requirement, duration_s, location), &demand)| Task {
                requirement,
                duration_s,
                location,
                demand,
            })
            .collect();

        let instance =
            Instance::assemble(self.catalog, &self.model, p.geometry, tasks, agents, bases)?;

        tracing::debug!(
            agents = instance.agent_count(),
            tasks = instance.task_count(),
            floaters = instance.floater_count(),
            bases = instance.bases.len(),
            "instance built"
        );
        Ok(instance)
    }

    fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Point2<f64> {
        let h = self.params.half_extent_m;
        Point2::new(uniform(rng, -h, h), uniform(rng, -h, h))
    }

    fn place_agent<R: Rng + ?Sized>(
        &self,
        bases: &[Point2<f64>],
        rng: &mut R,
    ) -> (Point2<f64>, Option<usize>) {
        if !bases.is_empty() {
            let b = rng.gen_range(0..bases.len());
            let s = self.params.base_spread_m;
            let offset = Vector2::new(uniform(rng, -s, s), uniform(rng, -s, s));
            return (bases[b] + offset, Some(b));
        }
        match self.params.geometry {
            ReturnGeometry::DepotRoundTrip(depot) => (depot, None),
            _ => (self.random_point(rng), None),
        }
    }
}

/// `lo + (hi - lo) * u` with `u` in `[0, 1)`; returns `lo` when the range is empty.
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.gen::<f64>()
}
