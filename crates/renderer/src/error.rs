use thiserror::Error;

/// Fatal failure classes for the pipeline.
///
/// None of these are recoverable in place: each terminates the run after a
/// diagnostic. Per-pixel kernels themselves have no failure path, so every
/// checked error here is a one-time startup condition or a device fault.
#[derive(Debug, Error)]
pub enum RendererError {
    /// The surface or GPU context could not be created, or the device lacks
    /// a capability the canvas requires.
    #[error("setup failure: {reason}")]
    SetupFailure { reason: String },

    /// A kernel failed WGSL validation. Carries the driver log and the
    /// offending source so the diagnostic is self-contained.
    #[error("kernel '{label}' failed to compile: {log}\n--- kernel source ---\n{source_text}")]
    CompileFailure {
        label: &'static str,
        log: String,
        source_text: String,
    },

    /// The device reported an error for an operation expected to succeed.
    #[error("device error during {operation}: {detail}")]
    DeviceError {
        operation: &'static str,
        detail: String,
    },
}
