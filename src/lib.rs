//! Headless hosts for two canvas demos: a stable-fluids splat effect driven
//! through wgpu render passes, and a side-scrolling arcade game.

pub mod arcade;
pub mod error;
pub mod fluid;
pub mod gpu;

pub use error::{DemoError, DemoResult};
