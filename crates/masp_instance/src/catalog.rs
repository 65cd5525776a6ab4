//! Static reference data: drone archetypes, their sensors and physical constants.
//!
//! Index into [`Catalog::archetypes`] is the *agent type* written to instance
//! files. The catalog is validated once at construction so that every
//! requirement it can hand out is carried by at least one archetype.

use crate::error::{GenError, Result};
use bitflags::bitflags;
use rand::Rng;
use std::borrow::Cow;
use std::collections::HashMap;

/// Number of capability columns (`E`) in the capability and requirement matrices.
pub const CAPABILITY_COUNT: usize = 5;

bitflags! {
    /// Sensor capabilities, in matrix column order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct CapabilitySet: u8 {
        const EO_IR   = 1 << 0;
        const THERMAL = 1 << 1;
        const HD      = 1 << 2;
        const UHD_4K  = 1 << 3;
        const LIDAR   = 1 << 4;
    }
}

impl CapabilitySet {
    /// One 0/1 flag per capability column.
    pub fn flags_row(self) -> [u8; CAPABILITY_COUNT] {
        let mut row = [0u8; CAPABILITY_COUNT];
        for (k, flag) in row.iter_mut().enumerate() {
            *flag = u8::from(self.bits() & (1 << k) != 0);
        }
        row
    }

    /// Inverse of [`flags_row`](Self::flags_row); any non-zero entry sets the bit.
    pub fn from_flags_row(row: &[u8]) -> Self {
        row.iter()
            .take(CAPABILITY_COUNT)
            .enumerate()
            .filter(|(_, flag)| **flag != 0)
            .fold(Self::empty(), |set, (k, _)| {
                set | Self::from_bits_truncate(1 << k)
            })
    }
}

/// Immutable drone profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Archetype {
    pub name: String,
    pub capabilities: CapabilitySet,
    /// Cruise speed in metres per second.
    pub max_speed_mps: f64,
    /// Endurance budget `s_m` in seconds of flight.
    pub maintenance_budget_s: f64,
    /// Wall-clock endurance `s_h` in seconds when duty-cycling.
    pub duty_cycle_reference_s: f64,
}

impl Archetype {
    pub fn new(
        name: impl Into<String>,
        capabilities: CapabilitySet,
        max_speed_mps: f64,
        maintenance_budget_s: f64,
        duty_cycle_reference_s: f64,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities,
            max_speed_mps,
            maintenance_budget_s,
            duty_cycle_reference_s,
        }
    }

    /// Budget consumed per second of on-task wall-clock time (`s_m / s_h`).
    #[inline]
    pub fn duty_cycle_factor(&self) -> f64 {
        self.maintenance_budget_s / self.duty_cycle_reference_s
    }

    fn check(&self) -> Result<()> {
        let reason = if self.capabilities.is_empty() {
            Some("carries no capabilities")
        } else if !(self.max_speed_mps.is_finite() && self.max_speed_mps > 0.0) {
            Some("max speed must be positive and finite")
        } else if !(self.maintenance_budget_s.is_finite() && self.maintenance_budget_s > 0.0) {
            Some("maintenance budget must be positive and finite")
        } else if !(self.duty_cycle_reference_s.is_finite() && self.duty_cycle_reference_s > 0.0)
        {
            Some("duty-cycle reference must be positive and finite")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(GenError::InvalidArchetype {
                name: self.name.clone(),
                reason: reason.into(),
            }),
            None => Ok(()),
        }
    }
}

/// Ordered archetype list plus the task-requirement universe it must satisfy.
#[derive(Debug, Clone)]
pub struct Catalog {
    archetypes: Vec<Archetype>,
    requirements: Vec<CapabilitySet>,
    drawable: Vec<CapabilitySet>,
    qualifying: HashMap<CapabilitySet, Vec<usize>>,
}

impl Catalog {
    /// Validates the archetypes and precomputes, for every requirement, the
    /// archetype indices whose capability set contains it.
    pub fn new(archetypes: Vec<Archetype>, requirements: Vec<CapabilitySet>) -> Result<Self> {
        if archetypes.is_empty() {
            return Err(GenError::EmptyCatalog);
        }
        for archetype in &archetypes {
            archetype.check()?;
        }
        if requirements.is_empty() {
            return Err(GenError::invalid("requirements", "requirement universe is empty"));
        }

        let mut qualifying = HashMap::with_capacity(requirements.len());
        for &requirement in &requirements {
            let indices = scan(&archetypes, requirement);
            if requirement.is_empty() || indices.is_empty() {
                return Err(GenError::UnsatisfiableCapability(requirement));
            }
            qualifying.insert(requirement, indices);
        }

        // Random task draws use single sensors; composites are for hand-authored tasks.
        let singles: Vec<CapabilitySet> = requirements
            .iter()
            .copied()
            .filter(|r| r.bits().count_ones() == 1)
            .collect();
        let drawable = if singles.is_empty() {
            requirements.clone()
        } else {
            singles
        };

        tracing::debug!(
            archetypes = archetypes.len(),
            requirements = requirements.len(),
            "catalog validated"
        );

        Ok(Self {
            archetypes,
            requirements,
            drawable,
            qualifying,
        })
    }

    /// The six-drone fleet with five sensor types used by the benchmark sweeps.
    pub fn drone_fleet() -> Result<Self> {
        use CapabilitySet as C;

        let archetypes = vec![
            Archetype::new("Matrice 600 PRO", C::THERMAL | C::HD | C::LIDAR, 18.0, 740.0, 1080.0),
            Archetype::new("Mavic PRO", C::EO_IR | C::HD | C::UHD_4K, 20.0, 990.0, 1740.0),
            Archetype::new("FireFLY6 PRO/S", C::THERMAL | C::HD | C::UHD_4K, 30.5, 2400.0, 1200.0),
            Archetype::new("3DR Solo Quad", C::HD, 25.5, 270.0, 1080.0),
            Archetype::new("Pulse Vapor 55TM", C::EO_IR | C::HD | C::LIDAR, 11.0, 1800.0, 2700.0),
            Archetype::new("Parrot Anafi", C::HD | C::UHD_4K, 15.0, 720.0, 1080.0),
        ];
        let requirements = vec![
            C::EO_IR,
            C::THERMAL,
            C::HD,
            C::UHD_4K,
            C::LIDAR,
            C::EO_IR | C::HD,
        ];

        Self::new(archetypes, requirements)
    }

    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    pub fn archetype(&self, index: usize) -> Option<&Archetype> {
        self.archetypes.get(index)
    }

    pub fn requirements(&self) -> &[CapabilitySet] {
        &self.requirements
    }

    /// Archetype indices able to serve `requirement`, in catalog order.
    pub fn qualifying(&self, requirement: CapabilitySet) -> Result<Cow<'_, [usize]>> {
        if let Some(indices) = self.qualifying.get(&requirement) {
            return Ok(Cow::Borrowed(indices));
        }
        let indices = scan(&self.archetypes, requirement);
        if requirement.is_empty() || indices.is_empty() {
            return Err(GenError::UnsatisfiableCapability(requirement));
        }
        Ok(Cow::Owned(indices))
    }

    /// Uniform draw among the archetypes that carry `requirement`.
    pub fn pick_archetype_for<R: Rng + ?Sized>(
        &self,
        requirement: CapabilitySet,
        rng: &mut R,
    ) -> Result<usize> {
        let candidates = self.qualifying(requirement)?;
        Ok(candidates[rng.gen_range(0..candidates.len())])
    }

    /// Uniform draw of a task requirement for randomly generated tasks.
    pub fn random_requirement<R: Rng + ?Sized>(&self, rng: &mut R) -> CapabilitySet {
        self.drawable[rng.gen_range(0..self.drawable.len())]
    }
}

fn scan(archetypes: &[Archetype], requirement: CapabilitySet) -> Vec<usize> {
    archetypes
        .iter()
        .enumerate()
        .filter(|(_, a)| a.capabilities.contains(requirement))
        .map(|(index, _)| index)
        .collect()
}
