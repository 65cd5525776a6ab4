use crate::assign::{AgentSlot, SlotTable};
use crate::catalog::{CapabilitySet, Catalog, CAPABILITY_COUNT};
use crate::error::{GenError, Result};
use crate::feasibility::{FeasibilityModel, ReturnGeometry};
use nalgebra::Point2;

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub requirement: CapabilitySet,
    pub duration_s: f64,
    pub location: Point2<f64>,
    /// Minimum number of agents (`d_j`), at least 1.
    pub demand: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// Index into the catalog.
    pub archetype: usize,
    pub capabilities: CapabilitySet,
    pub location: Point2<f64>,
    pub battery_cycles: f64,
    pub base: Option<usize>,
    pub slot: AgentSlot,
}

/// Hand-authored agent, before slots and capabilities are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub archetype: usize,
    pub location: Point2<f64>,
    pub battery_cycles: f64,
    pub base: Option<usize>,
}

/// One complete problem instance: `N` agents, `M` tasks, `E` capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub agents: Vec<Agent>,
    pub tasks: Vec<Task>,
    pub bases: Vec<Point2<f64>>,
    /// `p_ij`, one row per agent.
    pub probabilities: Vec<Vec<f64>>,
    pub geometry: ReturnGeometry,
}

impl Instance {
    /// Resolves slots and capabilities for `agents`, checks them against the
    /// tasks' demand and computes the probability matrix.
    ///
    /// Agents are anchored in index order: the first `d_0` agents to task 0,
    /// the next `d_1` to task 1, and the remainder float.
    pub fn assemble(
        catalog: &Catalog,
        model: &FeasibilityModel,
        geometry: ReturnGeometry,
        tasks: Vec<Task>,
        agents: Vec<AgentSpec>,
        bases: Vec<Point2<f64>>,
    ) -> Result<Self> {
        if tasks.is_empty() {
            return Err(GenError::invalid("tasks", "at least one task is required"));
        }
        if let Some(j) = tasks.iter().position(|t| t.demand == 0) {
            return Err(GenError::invalid("demand", format!("task {j} has zero demand")));
        }

        let demand: Vec<u32> = tasks.iter().map(|t| t.demand).collect();
        let slots = SlotTable::new(&demand);
        if slots.anchored() > agents.len() {
            return Err(GenError::InfeasibleDemand {
                agents: agents.len(),
                tasks: tasks.len(),
                floaters: 0,
            });
        }

        let mut resolved = Vec::with_capacity(agents.len());
        for (i, spec) in agents.into_iter().enumerate() {
            let archetype = catalog.archetype(spec.archetype).ok_or_else(|| {
                GenError::invalid("archetype", format!("agent {i} uses unknown type {}", spec.archetype))
            })?;
            if let Some(b) = spec.base {
                if b >= bases.len() {
                    return Err(GenError::invalid(
                        "base",
                        format!("agent {i} refers to base {b} of {}", bases.len()),
                    ));
                }
            } else if geometry == ReturnGeometry::OwnBase {
                return Err(GenError::invalid(
                    "base",
                    format!("agent {i} has no base to return to"),
                ));
            }

            let slot = slots.slot(i);
            if let AgentSlot::Anchored(j) = slot {
                let required = tasks[j].requirement;
                if !archetype.capabilities.contains(required) {
                    return Err(GenError::AnchorMismatch {
                        agent: i,
                        task: j,
                        archetype: archetype.name.clone(),
                        required,
                    });
                }
            }

            resolved.push(Agent {
                archetype: spec.archetype,
                capabilities: archetype.capabilities,
                location: spec.location,
                battery_cycles: spec.battery_cycles,
                base: spec.base,
                slot,
            });
        }

        let mut instance = Self {
            agents: resolved,
            tasks,
            bases,
            probabilities: Vec::new(),
            geometry,
        };
        instance.probabilities = instance.probability_matrix(catalog, model)?;
        Ok(instance)
    }

    fn probability_matrix(&self, catalog: &Catalog, model: &FeasibilityModel) -> Result<Vec<Vec<f64>>> {
        let mut matrix = Vec::with_capacity(self.agents.len());
        for (i, agent) in self.agents.iter().enumerate() {
            let archetype = catalog
                .archetype(agent.archetype)
                .ok_or_else(|| GenError::invalid("archetype", format!("agent {i}")))?;
            let base = agent.base.and_then(|b| self.bases.get(b));
            let mut row = Vec::with_capacity(self.tasks.len());
            for task in &self.tasks {
                let sortie = self
                    .geometry
                    .sortie(&agent.location, base, &task.location, task.duration_s)
                    .ok_or_else(|| GenError::invalid("base", format!("agent {i} has no base")))?;
                row.push(model.success_probability(archetype, agent.battery_cycles, &sortie));
            }
            matrix.push(row);
        }
        Ok(matrix)
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn capability_count(&self) -> usize {
        CAPABILITY_COUNT
    }

    pub fn floater_count(&self) -> usize {
        self.agents.iter().filter(|a| a.slot.is_floating()).count()
    }

    /// `d_j` for every task.
    pub fn demand(&self) -> Vec<u32> {
        self.tasks.iter().map(|t| t.demand).collect()
    }

    /// `c_ik`, N x E.
    pub fn capability_matrix(&self) -> Vec<[u8; CAPABILITY_COUNT]> {
        self.agents.iter().map(|a| a.capabilities.flags_row()).collect()
    }

    /// `r_jk`, M x E.
    pub fn requirement_matrix(&self) -> Vec<[u8; CAPABILITY_COUNT]> {
        self.tasks.iter().map(|t| t.requirement.flags_row()).collect()
    }

    /// Checks every structural invariant of a finished instance.
    pub fn validate(&self) -> Result<()> {
        let n = self.agent_count();
        let m = self.task_count();
        let violation = |msg: String| Err(GenError::Invariant(msg));

        if m == 0 {
            return violation("instance has no tasks".into());
        }
        if let Some(j) = self.tasks.iter().position(|t| t.demand == 0) {
            return violation(format!("task {j} has zero demand"));
        }
        let anchored: usize = self.tasks.iter().map(|t| t.demand as usize).sum();
        if anchored + self.floater_count() != n {
            return violation(format!(
                "demand total {anchored} plus {} floaters != {n} agents",
                self.floater_count()
            ));
        }

        let slots = SlotTable::new(&self.demand());
        for (i, agent) in self.agents.iter().enumerate() {
            if agent.slot != slots.slot(i) {
                return violation(format!("agent {i} slot {:?} out of order", agent.slot));
            }
            if let AgentSlot::Anchored(j) = agent.slot {
                if !agent.capabilities.contains(self.tasks[j].requirement) {
                    return violation(format!("agent {i} cannot serve its anchor task {j}"));
                }
            }
            if let Some(b) = agent.base {
                if b >= self.bases.len() {
                    return violation(format!("agent {i} refers to missing base {b}"));
                }
            }
        }

        if self.probabilities.len() != n {
            return violation(format!("{} probability rows for {n} agents", self.probabilities.len()));
        }
        for (i, row) in self.probabilities.iter().enumerate() {
            if row.len() != m {
                return violation(format!("probability row {i} has {} entries", row.len()));
            }
            if let Some(p) = row.iter().find(|p| !(0.0..=1.0).contains(*p)) {
                return violation(format!("probability {p} in row {i} outside [0, 1]"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::BatteryModel;

    fn task(requirement: CapabilitySet, demand: u32) -> Task {
        Task {
            requirement,
            duration_s: 300.0,
            location: Point2::new(100.0, 0.0),
            demand,
        }
    }

    fn spec(archetype: usize) -> AgentSpec {
        AgentSpec {
            archetype,
            location: Point2::origin(),
            battery_cycles: 0.0,
            base: None,
        }
    }

    #[test]
    fn assemble_anchors_in_index_order() {
        let catalog = Catalog::drone_fleet().unwrap();
        let model = FeasibilityModel::new(BatteryModel::default(), 0.25).unwrap();
        let instance = Instance::assemble(
            &catalog,
            &model,
            ReturnGeometry::default(),
            vec![task(CapabilitySet::LIDAR, 2), task(CapabilitySet::UHD_4K, 1)],
            vec![spec(0), spec(4), spec(5), spec(3)],
            Vec::new(),
        )
        .unwrap();

        let slots: Vec<AgentSlot> = instance.agents.iter().map(|a| a.slot).collect();
        assert_eq!(
            slots,
            vec![
                AgentSlot::Anchored(0),
                AgentSlot::Anchored(0),
                AgentSlot::Anchored(1),
                AgentSlot::Floating
            ]
        );
        assert_eq!(instance.floater_count(), 1);
        assert_eq!(instance.capability_matrix()[0], [0, 1, 1, 0, 1]);
        assert_eq!(instance.requirement_matrix()[1], [0, 0, 0, 1, 0]);
        instance.validate().unwrap();
    }

    #[test]
    fn assemble_rejects_incapable_anchor() {
        let catalog = Catalog::drone_fleet().unwrap();
        let model = FeasibilityModel::new(BatteryModel::default(), 0.25).unwrap();
        let err = Instance::assemble(
            &catalog,
            &model,
            ReturnGeometry::default(),
            vec![task(CapabilitySet::THERMAL, 1)],
            vec![spec(1)],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, GenError::AnchorMismatch { agent: 0, task: 0, .. }));
    }

    #[test]
    fn own_base_geometry_requires_bases() {
        let catalog = Catalog::drone_fleet().unwrap();
        let model = FeasibilityModel::new(BatteryModel::default(), 0.25).unwrap();
        let err = Instance::assemble(
            &catalog,
            &model,
            ReturnGeometry::OwnBase,
            vec![task(CapabilitySet::HD, 1)],
            vec![spec(3)],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, GenError::InvalidParameter { name: "base", .. }));
    }

    #[test]
    fn validate_catches_out_of_range_probability() {
        let catalog = Catalog::drone_fleet().unwrap();
        let model = FeasibilityModel::new(BatteryModel::default(), 0.25).unwrap();
        let mut instance = Instance::assemble(
            &catalog,
            &model,
            ReturnGeometry::default(),
            vec![task(CapabilitySet::HD, 1)],
            vec![spec(3)],
            Vec::new(),
        )
        .unwrap();
        instance.probabilities[0][0] = 1.5;
        assert!(matches!(instance.validate(), Err(GenError::Invariant(_))));
    }
}
