/// Three-color palette for the generator's two-segment escape-time ramp.
///
/// Escape counts in `[0, M/2-1]` blend `outer` toward `mid`; counts in
/// `[M/2, M]` blend `mid` toward `core`. Points that never escape therefore
/// land exactly on `core`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Color for points that escape immediately.
    pub outer: [f32; 3],
    /// Color at the segment boundary (escape count M/2).
    pub mid: [f32; 3],
    /// Color for points that never escape.
    pub core: [f32; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            outer: [0.2, 0.1, 0.4],
            mid: [0.0, 0.0, 0.8],
            core: [0.0, 0.0, 0.0],
        }
    }
}

/// Tunable kernel parameters baked into the stage programs at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    /// Escape-time iteration cap for the generator stage. Must be even and
    /// at least 4 so the two palette segments are well-formed.
    pub max_iterations: u32,
    /// Box-blur radius for the filter stage; the kernel averages the
    /// `(2R+1)²` square around each pixel.
    pub blur_radius: u32,
    /// Generator color ramp.
    pub palette: Palette,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_iterations: 128,
            blur_radius: 6,
            palette: Palette::default(),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// Mirrors CLI flags; the surface size fixes the canvas dimensions for the
/// lifetime of the run (no resize capability is offered).
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Window/surface size in physical pixels.
    pub surface_size: (u32, u32),
    /// Target frame rate; drives both pacing and the fixed-step animation
    /// clock.
    pub target_fps: f32,
    /// Kernel parameters for the three stages.
    pub tuning: Tuning,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            target_fps: 60.0,
            tuning: Tuning::default(),
        }
    }
}
