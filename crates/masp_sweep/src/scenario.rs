use crate::config::Config;
use anyhow::Context;
use masp_instance::{
    format, AgentSpec, CapabilitySet, Catalog, FeasibilityModel, Instance, InstanceParams,
    ReturnGeometry, Task,
};
use nalgebra::Point2;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which family of instances a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Fleet size grows; tasks and floaters scale with it; shared depot at the origin.
    AgentSweep,
    /// Fixed fleet and tasks; the floater count grows.
    FloaterSweep,
    /// Agent sweep with agents clustered around bases they return to.
    LargeScale,
    /// Floater sweep where every sortie starts and ends at the origin depot.
    DepotRoundTrip,
    /// Agent sweep with the depot round-trip geometry.
    AgentRoundTrip,
    /// The single hand-authored two-launch-site scenario.
    CaseStudy,
}

#[derive(Debug, Error)]
#[error("unknown scenario '{0}' (expected agent-sweep, floater-sweep, large-scale, depot-round-trip, agent-round-trip or case-study)")]
pub struct UnknownScenario(String);

impl FromStr for ScenarioKind {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "agent-sweep" => Ok(Self::AgentSweep),
            "floater-sweep" => Ok(Self::FloaterSweep),
            "large-scale" => Ok(Self::LargeScale),
            "depot-round-trip" => Ok(Self::DepotRoundTrip),
            "agent-round-trip" => Ok(Self::AgentRoundTrip),
            "case-study" => Ok(Self::CaseStudy),
            _ => Err(UnknownScenario(s.to_owned())),
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AgentSweep => "agent-sweep",
            Self::FloaterSweep => "floater-sweep",
            Self::LargeScale => "large-scale",
            Self::DepotRoundTrip => "depot-round-trip",
            Self::AgentRoundTrip => "agent-round-trip",
            Self::CaseStudy => "case-study",
        })
    }
}

/// One instance to generate: sweep value, replica index and its parameters.
#[derive(Debug, Clone)]
pub struct Job {
    pub label: usize,
    pub replica: usize,
    pub params: InstanceParams,
}

impl Job {
    pub fn file_name(&self) -> String {
        format::plot_file_name(self.label, self.replica)
    }
}

/// `floor(count * ratio) + 1`, the scaling rule for derived counts.
fn scaled(count: usize, ratio: f64) -> usize {
    (count as f64 * ratio).floor() as usize + 1
}

/// Expands the configured sweep into jobs, validating every sweep point
/// before anything is generated.
pub fn plan(config: &Config) -> anyhow::Result<Vec<Job>> {
    let mut jobs = Vec::new();

    for label in config.sweep_values() {
        let params = match config.scenario {
            ScenarioKind::AgentSweep => InstanceParams::new(
                label,
                scaled(label, config.task_ratio),
                scaled(label, config.floater_ratio),
            ),
            ScenarioKind::LargeScale => InstanceParams::new(
                label,
                scaled(label, config.task_ratio),
                scaled(label, config.floater_ratio),
            )
            .with_bases(scaled(label, config.base_ratio)),
            ScenarioKind::AgentRoundTrip => InstanceParams::new(
                label,
                scaled(label, config.task_ratio),
                scaled(label, config.floater_ratio),
            )
            .with_geometry(ReturnGeometry::DepotRoundTrip(Point2::origin())),
            ScenarioKind::FloaterSweep => InstanceParams::new(config.agents, config.tasks, label),
            ScenarioKind::DepotRoundTrip => InstanceParams::new(config.agents, config.tasks, label)
                .with_geometry(ReturnGeometry::DepotRoundTrip(Point2::origin())),
            ScenarioKind::CaseStudy => {
                anyhow::bail!("case-study is a single fixed instance, not a sweep")
            }
        };
        let params = InstanceParams {
            budget_error: config.budget_error,
            half_extent_m: config.half_extent_m,
            ..params
        };
        params
            .validate()
            .with_context(|| format!("Invalid {} sweep point {label}", config.scenario))?;

        tracing::info!(
            label,
            agents = params.agents,
            tasks = params.tasks,
            floaters = params.floaters,
            bases = params.bases,
            "Planned sweep point"
        );

        jobs.extend((0..config.replicas).map(|replica| Job {
            label,
            replica,
            params: params.clone(),
        }));
    }

    Ok(jobs)
}

pub const CASE_STUDY_FILE: &str = "case_study.txt";

/// Fifteen drones from two launch sites serving four tasks, all returning to
/// one depot. Agents are ordered so that each task's minimum team is made of
/// drones carrying its sensor; the last five float.
pub fn case_study(catalog: &Catalog, budget_error: f64) -> masp_instance::Result<Instance> {
    const MATRICE: usize = 0;
    const MAVIC: usize = 1;
    const FIREFLY: usize = 2;
    const PULSE_VAPOR: usize = 4;
    const ANAFI: usize = 5;

    let launch_a = Point2::new(1480.0, 4890.0);
    let launch_b = Point2::new(1850.0, 2990.0);
    let depot = Point2::new(840.0, 2550.0);

    let task = |requirement, duration_s, x, y, demand| Task {
        requirement,
        duration_s,
        location: Point2::new(x, y),
        demand,
    };
    let tasks = vec![
        task(CapabilitySet::HD, 600.0, 1600.0, 4160.0, 2),
        task(CapabilitySet::LIDAR, 840.0, 2200.0, 3760.0, 4),
        task(CapabilitySet::HD, 600.0, 2590.0, 2960.0, 2),
        task(CapabilitySet::THERMAL, 480.0, 3910.0, 4350.0, 2),
    ];

    let agent = |archetype: usize| {
        let (location, battery_cycles) = match archetype {
            PULSE_VAPOR => (launch_a, 350.0),
            MATRICE => (launch_b, 10.0),
            MAVIC => (launch_b, 100.0),
            FIREFLY => (launch_b, 150.0),
            _ => (launch_b, 250.0),
        };
        AgentSpec {
            archetype,
            location,
            battery_cycles,
            base: None,
        }
    };
    let agents = [
        PULSE_VAPOR, PULSE_VAPOR, // HD
        PULSE_VAPOR, PULSE_VAPOR, PULSE_VAPOR, MATRICE, // lidar
        MATRICE, MATRICE, // HD
        MATRICE, FIREFLY, // thermal
        MAVIC, MAVIC, FIREFLY, ANAFI, ANAFI,
    ]
    .into_iter()
    .map(agent)
    .collect();

    let model = FeasibilityModel::new(Default::default(), budget_error)?;
    Instance::assemble(
        catalog,
        &model,
        ReturnGeometry::SharedDepot(depot),
        tasks,
        agents,
        Vec::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| map.get(key).cloned()).unwrap()
    }

    #[test]
    fn agent_sweep_scales_tasks_and_floaters() {
        let jobs = plan(&config(&[("MASP_REPLICAS", "2")])).unwrap();
        assert_eq!(jobs.len(), 11 * 2);

        let first = &jobs[0];
        assert_eq!((first.label, first.replica), (50, 0));
        assert_eq!(
            (first.params.agents, first.params.tasks, first.params.floaters),
            (50, 13, 13)
        );
        assert_eq!(first.file_name(), "plot_50_0.txt");

        let last = jobs.last().unwrap();
        assert_eq!((last.label, last.replica), (150, 1));
        assert_eq!((last.params.tasks, last.params.floaters), (38, 38));
        assert_eq!(last.params.bases, 0);
    }

    #[test]
    fn large_scale_adds_bases() {
        let jobs = plan(&config(&[("MASP_SCENARIO", "large-scale"), ("MASP_REPLICAS", "1")])).unwrap();
        assert_eq!(jobs[0].params.bases, 6);
        assert_eq!(jobs[0].params.geometry, ReturnGeometry::OwnBase);
        assert_eq!(jobs.last().unwrap().params.bases, 16);
    }

    #[test]
    fn floater_sweep_rejects_infeasible_points_before_generating() {
        // Fifteen agents and four tasks leave room for at most eleven floaters.
        let err = plan(&config(&[("MASP_SCENARIO", "floater-sweep")])).unwrap_err();
        assert!(format!("{err:#}").contains("infeasible demand"));

        let jobs = plan(&config(&[
            ("MASP_SCENARIO", "floater-sweep"),
            ("MASP_START", "1"),
            ("MASP_END", "11"),
            ("MASP_STEP", "5"),
            ("MASP_REPLICAS", "1"),
        ]))
        .unwrap();
        let floaters: Vec<usize> = jobs.iter().map(|j| j.params.floaters).collect();
        assert_eq!(floaters, vec![1, 6, 11]);
    }

    #[test]
    fn depot_round_trip_uses_the_origin() {
        let jobs = plan(&config(&[
            ("MASP_SCENARIO", "depot-round-trip"),
            ("MASP_AGENTS", "16"),
            ("MASP_TASKS", "5"),
            ("MASP_START", "4"),
            ("MASP_END", "4"),
            ("MASP_STEP", "1"),
            ("MASP_REPLICAS", "10"),
            ("MASP_HALF_EXTENT_M", "2500"),
        ]))
        .unwrap();
        assert_eq!(jobs.len(), 10);
        assert_eq!(
            jobs[0].params.geometry,
            ReturnGeometry::DepotRoundTrip(Point2::origin())
        );
        assert_eq!(jobs[0].params.half_extent_m, 2500.0);
    }

    #[test]
    fn agent_round_trip_scales_with_the_fleet() {
        let jobs = plan(&config(&[
            ("MASP_SCENARIO", "agent-round-trip"),
            ("MASP_START", "16"),
            ("MASP_END", "32"),
            ("MASP_STEP", "16"),
            ("MASP_REPLICAS", "1"),
        ]))
        .unwrap();
        let counts: Vec<(usize, usize, usize)> = jobs
            .iter()
            .map(|j| (j.params.agents, j.params.tasks, j.params.floaters))
            .collect();
        assert_eq!(counts, vec![(16, 5, 5), (32, 9, 9)]);
        for job in &jobs {
            assert_eq!(
                job.params.geometry,
                ReturnGeometry::DepotRoundTrip(Point2::origin())
            );
            assert_eq!(job.params.bases, 0);
        }
    }

    #[test]
    fn case_study_is_not_a_sweep() {
        assert!(plan(&config(&[("MASP_SCENARIO", "case-study")])).is_err());
    }

    #[test]
    fn case_study_is_consistent() {
        let catalog = Catalog::drone_fleet().unwrap();
        let instance = case_study(&catalog, 0.25).unwrap();
        instance.validate().unwrap();
        assert_eq!(instance.agent_count(), 15);
        assert_eq!(instance.demand(), vec![2, 4, 2, 2]);
        assert_eq!(instance.floater_count(), 5);
    }

    #[test]
    fn scenario_names_round_trip() {
        for kind in [
            ScenarioKind::AgentSweep,
            ScenarioKind::FloaterSweep,
            ScenarioKind::LargeScale,
            ScenarioKind::DepotRoundTrip,
            ScenarioKind::AgentRoundTrip,
            ScenarioKind::CaseStudy,
        ] {
            assert_eq!(kind.to_string().parse::<ScenarioKind>().unwrap(), kind);
        }
    }
}
