use crate::error::{GenError, Result};
use rand::Rng;

/// Minimum team size per task.
///
/// Every task starts at one agent; the remaining `agents - floaters - tasks`
/// units are handed out one at a time to uniformly chosen tasks, so the
/// result is skewed rather than balanced. Only the length, positivity and
/// the total `agents - floaters` are guaranteed.
pub fn generate_demand<R: Rng + ?Sized>(
    agents: usize,
    tasks: usize,
    floaters: usize,
    rng: &mut R,
) -> Result<Vec<u32>> {
    check_demand(agents, tasks, floaters)?;

    let mut demand = vec![1u32; tasks];
    let extra = agents - floaters - tasks;
    for _ in 0..extra {
        demand[rng.gen_range(0..tasks)] += 1;
    }

    tracing::trace!(agents, tasks, floaters, ?demand, "demand generated");
    Ok(demand)
}

/// Rejects `(agents, tasks, floaters)` combinations that cannot give every
/// task at least one anchored agent.
pub fn check_demand(agents: usize, tasks: usize, floaters: usize) -> Result<()> {
    if tasks == 0 {
        return Err(GenError::invalid("tasks", "at least one task is required"));
    }
    match floaters.checked_add(tasks) {
        Some(needed) if needed <= agents => Ok(()),
        _ => Err(GenError::InfeasibleDemand {
            agents,
            tasks,
            floaters,
        }),
    }
}
