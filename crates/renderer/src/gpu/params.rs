use bytemuck::{Pod, Zeroable};

/// Uniform block shared by all three stages; layout mirrors the
/// `KernelParams` struct in the WGSL sources. Width and height fix the
/// linear-index mapping `k ↦ (k mod W, k div W)`; `time` is the fixed-step
/// animation clock in seconds.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct KernelParams {
    pub width: u32,
    pub height: u32,
    pub time: f32,
    pub _pad: u32,
}

impl KernelParams {
    pub(crate) fn new(width: u32, height: u32, time: f32) -> Self {
        Self {
            width,
            height,
            time,
            _pad: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_block_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<KernelParams>(), 16);
    }
}
