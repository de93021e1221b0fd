//! Steady-state hydraulic solving for water networks.
//!
//! The scenario engine only sees the `HydraulicSolver` trait. Two
//! implementations ship with the crate: a frictionless supply-reachability
//! solver and a Hazen-Williams Newton solver on junction heads.

pub mod error;
pub mod hazen_williams;
pub mod hydrostatic;
pub mod model;
pub mod newton;
pub mod result;
pub mod solver;

pub use error::{BoundaryIssue, SolverError, SolverResult};
pub use hazen_williams::HazenWilliamsSolver;
pub use hydrostatic::HydrostaticSolver;
pub use model::{HydraulicModel, ModelOptions};
pub use newton::{NewtonConfig, NewtonResult};
pub use result::{NodeResult, PipeResult, SimulationResult};
pub use solver::{HydraulicSolver, SolverKind, SolverSettings, build_solver};
