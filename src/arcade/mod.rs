//! Side-scrolling arcade game: a bird under gravity, pipes sliding in from
//! the right, score on every pipe passed and game over on the first hit.
//!
//! Motion constants are per 1/60 s frame and scaled by the measured `dt`, so
//! the game plays the same at any frame rate.

pub mod autopilot;
pub mod config;
pub mod entities;
pub mod render;
pub mod spawner;
pub mod world;

pub use config::ArcadeConfig;
pub use entities::{Aabb, Bird, Pipe};
pub use world::{Crash, Status, World};
