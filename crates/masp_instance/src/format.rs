//! Plain-text instance files consumed by the assignment solvers.
//!
//! Layout (whitespace separated, `#` lines are comments):
//!
//! ```text
//! # N agents, M tasks, E capabilities
//! N M E
//! # Agent Capabilities: c_ik - N x E
//! 0 1 1 0 1                      (N rows of E 0/1 flags)
//! # Task Requirements: r_jk - M x E
//! 0 0 1 0 0                      (M rows of E 0/1 flags)
//! # Probability agent i can complete task j: p_ij - N x M
//! 0.99996832875816688475 ...     (N rows of M probabilities)
//! # Minimum number of agents for each task: d_j
//! 2                              (M lines)
//! # Location of each task: M x 2
//! x y                            (M lines)
//! # Location of each drone: N x 2
//! x y                            (N lines)
//! # Location of each base: B x 2 (only when the instance has bases)
//! x y                            (B lines)
//! ```
//!
//! Probabilities carry 20 digits after the decimal point; readers rely on
//! that precision. Coordinates use the shortest decimal form that round-trips.

use crate::instance::Instance;
use nalgebra::Point2;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Digits after the decimal point for `p_ij`.
pub const PROBABILITY_DECIMALS: usize = 20;

pub fn write_instance<W: Write>(w: &mut W, instance: &Instance) -> io::Result<()> {
    let n = instance.agent_count();
    let m = instance.task_count();
    let e = instance.capability_count();

    writeln!(w, "# {n} agents, {m} tasks, {e} capabilities")?;
    writeln!(w, "{n} {m} {e}")?;

    writeln!(w, "# Agent Capabilities: c_ik - N x E")?;
    for row in instance.capability_matrix() {
        write_row(w, row.iter())?;
    }

    writeln!(w, "# Task Requirements: r_jk - M x E")?;
    for row in instance.requirement_matrix() {
        write_row(w, row.iter())?;
    }

    writeln!(w, "# Probability agent i can complete task j: p_ij - N x M")?;
    for row in &instance.probabilities {
        if row.len() != m {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "probability row length != task count",
            ));
        }
        write_row(
            w,
            row.iter()
                .map(|p| format!("{p:.prec$}", prec = PROBABILITY_DECIMALS)),
        )?;
    }

    writeln!(w, "# Minimum number of agents for each task: d_j")?;
    for task in &instance.tasks {
        writeln!(w, "{}", task.demand)?;
    }

    writeln!(w, "# Location of each task: M x 2")?;
    for task in &instance.tasks {
        write_point(w, &task.location)?;
    }

    writeln!(w, "# Location of each drone: N x 2")?;
    for agent in &instance.agents {
        write_point(w, &agent.location)?;
    }

    if !instance.bases.is_empty() {
        writeln!(w, "# Location of each base: B x 2")?;
        for base in &instance.bases {
            write_point(w, base)?;
        }
    }

    Ok(())
}

pub fn write_file<P: AsRef<Path>>(path: P, instance: &Instance) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_instance(&mut file, instance)?;
    file.flush()?;
    Ok(())
}

/// File name for replica `replica` of the sweep point `label`.
pub fn plot_file_name(label: usize, replica: usize) -> String {
    format!("plot_{label}_{replica}.txt")
}

#[inline]
fn write_row<W: Write, T: std::fmt::Display>(
    w: &mut W,
    mut values: impl Iterator<Item = T>,
) -> io::Result<()> {
    if let Some(first) = values.next() {
        write!(w, "{first}")?;
        for v in values {
            write!(w, " {v}")?;
        }
    }
    writeln!(w)
}

#[inline]
fn write_point<W: Write>(w: &mut W, p: &Point2<f64>) -> io::Result<()> {
    writeln!(w, "{} {}", p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::AgentSlot;
    use crate::catalog::CapabilitySet;
    use crate::feasibility::ReturnGeometry;
    use crate::instance::{Agent, Task};

    fn tiny() -> Instance {
        Instance {
            agents: vec![
                Agent {
                    archetype: 0,
                    capabilities: CapabilitySet::THERMAL | CapabilitySet::HD | CapabilitySet::LIDAR,
                    location: Point2::new(-12.5, 40.0),
                    battery_cycles: 10.0,
                    base: Some(0),
                    slot: AgentSlot::Anchored(0),
                },
                Agent {
                    archetype: 3,
                    capabilities: CapabilitySet::HD,
                    location: Point2::new(0.25, 1e-3),
                    battery_cycles: 0.0,
                    base: Some(0),
                    slot: AgentSlot::Floating,
                },
            ],
            tasks: vec![Task {
                requirement: CapabilitySet::LIDAR,
                duration_s: 300.0,
                location: Point2::new(1500.0, -750.5),
                demand: 1,
            }],
            bases: vec![Point2::new(3.0, 4.0)],
            probabilities: vec![vec![0.5], vec![1.0 / 3.0]],
            geometry: ReturnGeometry::OwnBase,
        }
    }

    fn render(instance: &Instance) -> String {
        let mut buf = Vec::new();
        write_instance(&mut buf, instance).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn writes_every_block_in_order() {
        let text = render(&tiny());
        let expected = "\
# 2 agents, 1 tasks, 5 capabilities
2 1 5
# Agent Capabilities: c_ik - N x E
0 1 1 0 1
0 0 1 0 0
# Task Requirements: r_jk - M x E
0 0 0 0 1
# Probability agent i can complete task j: p_ij - N x M
0.50000000000000000000
0.33333333333333331483
# Minimum number of agents for each task: d_j
1
# Location of each task: M x 2
1500 -750.5
# Location of each drone: N x 2
-12.5 40
0.25 0.001
# Location of each base: B x 2
3 4
";
        assert_eq!(text, expected);
    }

    #[test]
    fn base_block_is_omitted_without_bases() {
        let mut instance = tiny();
        instance.bases.clear();
        let text = render(&instance);
        assert!(!text.contains("base"));
        assert!(text.ends_with("0.25 0.001\n"));
    }

    #[test]
    fn ragged_probability_rows_are_rejected() {
        let mut instance = tiny();
        instance.probabilities[1].push(0.1);
        let mut buf = Vec::new();
        let err = write_instance(&mut buf, &instance).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn plot_names_encode_label_and_replica() {
        assert_eq!(plot_file_name(80, 3), "plot_80_3.txt");
    }
}
