//! Rendering adapter: turns the physics debug-draw sink into output.
//!
//! # Invariants
//! - Renderers never mutate the simulation; they read the line buffer only.
//! - Output derives from the buffered lines and the view alone.

mod renderer;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};
