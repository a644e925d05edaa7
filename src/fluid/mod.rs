//! Stable-fluids splat effect.
//!
//! Per frame: advect velocity and density, inject pointer splats, add
//! vorticity confinement, project out divergence with a fixed number of
//! Jacobi iterations and draw the density field to the canvas.

pub mod config;
pub mod pointer;
pub mod programs;
pub mod schedule;
pub mod shaders;
pub mod sim;
pub mod targets;

pub use config::FluidConfig;
pub use pointer::{PointerEvent, Touch};
pub use sim::{FieldStats, FluidSim};
pub use targets::{FieldFilter, FieldFormats, Resolution};
