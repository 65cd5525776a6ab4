//! Capability-consistent archetype assignment.
//!
//! Agent indices are laid out task by task: task 0 owns `[0, d_0)`, task 1
//! owns `[d_0, d_0 + d_1)` and so on. Indices past the demand total are
//! floaters. Floaters still draw an archetype that can serve *some* task,
//! picked by requirement of a uniformly random task.

use crate::catalog::{CapabilitySet, Catalog};
use crate::error::{GenError, Result};
use rand::Rng;

/// Whether an agent is reserved for a task's minimum team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentSlot {
    Anchored(usize),
    Floating,
}

impl AgentSlot {
    pub fn task(self) -> Option<usize> {
        match self {
            AgentSlot::Anchored(task) => Some(task),
            AgentSlot::Floating => None,
        }
    }

    pub fn is_floating(self) -> bool {
        matches!(self, AgentSlot::Floating)
    }
}

/// Maps agent indices to task slots for one demand vector.
#[derive(Debug, Clone)]
pub struct SlotTable {
    /// `ends[j]` is one past the last agent index anchored to task `j`.
    ends: Vec<usize>,
}

impl SlotTable {
    pub fn new(demand: &[u32]) -> Self {
        let ends = demand
            .iter()
            .scan(0usize, |total, &d| {
                *total += d as usize;
                Some(*total)
            })
            .collect();
        Self { ends }
    }

    /// Total number of anchored agents.
    pub fn anchored(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn slot(&self, agent: usize) -> AgentSlot {
        let task = self.ends.partition_point(|&end| end <= agent);
        if task < self.ends.len() {
            AgentSlot::Anchored(task)
        } else {
            AgentSlot::Floating
        }
    }
}

/// Draws archetypes for agent indices against one demand vector and one set
/// of task requirements.
pub struct CapabilityAssigner<'a> {
    catalog: &'a Catalog,
    requirements: &'a [CapabilitySet],
    slots: SlotTable,
}

impl<'a> CapabilityAssigner<'a> {
    pub fn new(
        catalog: &'a Catalog,
        demand: &[u32],
        requirements: &'a [CapabilitySet],
    ) -> Result<Self> {
        if demand.len() != requirements.len() {
            return Err(GenError::invalid(
                "requirements",
                format!(
                    "{} requirements for {} demand entries",
                    requirements.len(),
                    demand.len()
                ),
            ));
        }
        if requirements.is_empty() {
            return Err(GenError::invalid("tasks", "at least one task is required"));
        }
        for &requirement in requirements {
            catalog.qualifying(requirement)?;
        }

        Ok(Self {
            catalog,
            requirements,
            slots: SlotTable::new(demand),
        })
    }

    /// Archetype index and slot for agent `agent`.
    pub fn assign<R: Rng + ?Sized>(&self, agent: usize, rng: &mut R) -> Result<(usize, AgentSlot)> {
        let slot = self.slots.slot(agent);
        let requirement = match slot {
            AgentSlot::Anchored(task) => self.requirements[task],
            AgentSlot::Floating => self.requirements[rng.gen_range(0..self.requirements.len())],
        };
        let archetype = self.catalog.pick_archetype_for(requirement, rng)?;
        Ok((archetype, slot))
    }
}
