//! Time-animated fractal renderer built on a three-stage GPU pipeline.
//!
//! Every frame walks the same path over one shared canvas texture:
//!
//! ```text
//! generator (escape-time kernel)
//!     │  canvas commit
//!     ▼
//! filter (in-place box blur)
//!     │  canvas commit
//!     ▼
//! presenter (covering triangle → surface)
//! ```
//!
//! The canvas is a persistent storage texture both compute stages read and
//! write in place; the presenter samples it onto the window. Animation time
//! advances by a fixed step per displayed frame, so the picture sequence is
//! deterministic regardless of real frame duration.
//!
//! [`kernel`] holds a CPU reference of the per-pixel math the WGSL stages
//! implement; the shader tests pin the GPU sources to the same constants.

mod error;
mod gpu;
pub mod kernel;
mod runtime;
mod shaders;
mod types;
mod window;

pub use error::RendererError;
pub use runtime::FrameClock;
pub use types::{Palette, RendererConfig, Tuning};

/// Top-level handle owning the renderer configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Runs the window and render loop to completion. Returns when the
    /// window closes or Escape is pressed; fatal GPU conditions surface as
    /// errors.
    pub fn run(&mut self) -> anyhow::Result<()> {
        window::run(&self.config)
    }
}
