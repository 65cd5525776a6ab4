//! Synthetic benchmark instances for multi-agent stochastic task assignment.
//!
//! Heterogeneous drones with distinct speed, endurance and sensor payloads
//! are matched against tasks that need a sensor and a minimum team size. The
//! generator draws the demand vector, gives every agent an archetype that is
//! consistent with the tasks, and turns geometry, duty cycle and battery wear
//! into a probability-of-success matrix. Solving the assignment is left to
//! the consumer of the written files.
//!
//! ```no_run
//! use masp_instance::{format, rng, Catalog, InstanceBuilder, InstanceParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::drone_fleet()?;
//! let builder = InstanceBuilder::new(&catalog, InstanceParams::new(50, 13, 13))?;
//! let instance = builder.build(&mut rng::seeded_rng(7))?;
//! format::write_file("plot_50_0.txt", &instance)?;
//! # Ok(())
//! # }
//! ```

pub mod assign;
pub mod battery;
pub mod builder;
pub mod catalog;
pub mod demand;
pub mod error;
pub mod feasibility;
pub mod format;
pub mod instance;
pub mod rng;

pub use assign::{AgentSlot, CapabilityAssigner, SlotTable};
pub use battery::BatteryModel;
pub use builder::{InstanceBuilder, InstanceParams};
pub use catalog::{Archetype, CapabilitySet, Catalog, CAPABILITY_COUNT};
pub use demand::generate_demand;
pub use error::{GenError, Result};
pub use feasibility::{FeasibilityModel, ReturnGeometry, Sortie};
pub use instance::{Agent, AgentSpec, Instance, Task};
