use crate::error::RendererError;

/// Single-channel 32-bit format with guaranteed read-write storage access;
/// each texel carries the four 8-bit color channels packed via
/// `pack4x8unorm`.
pub(crate) const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;

/// The persistent off-screen canvas all three stages share.
///
/// Allocated once at startup, sized exactly to the surface, and never
/// reallocated: the generator overwrites every texel each frame, the filter
/// rewrites it in place, the presenter samples it. Contents persist across
/// frames but no stage depends on that.
pub(crate) struct Canvas {
    pub _texture: wgpu::Texture,
    /// Read-write storage view bound to the generator and filter kernels.
    pub storage_view: wgpu::TextureView,
    /// Sampled (load-only) view bound to the presenter's fragment stage.
    pub loaded_view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub(crate) fn allocate(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<Self, RendererError> {
        if width == 0 || height == 0 {
            return Err(RendererError::SetupFailure {
                reason: format!("canvas dimensions must be non-zero, got {width}x{height}"),
            });
        }

        // wgpu zero-initializes texture memory, so the first frame's filter
        // pass reads defined data even before the generator has run.
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("canvas"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CANVAS_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let storage_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("canvas storage view"),
            ..Default::default()
        });
        let loaded_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("canvas sampled view"),
            ..Default::default()
        });

        Ok(Self {
            _texture: texture,
            storage_view,
            loaded_view,
            width,
            height,
        })
    }
}
