use crate::error::RendererError;
use crate::shaders;
use crate::types::Tuning;

use super::canvas::CANVAS_FORMAT;

/// The three compiled stage programs plus the bind group layouts they
/// share. Built once at startup from the tuning-substituted WGSL sources;
/// a validation failure in any stage aborts the run with the driver log and
/// the offending source attached.
pub(crate) struct StagePipelines {
    pub generator: wgpu::ComputePipeline,
    pub filter: wgpu::ComputePipeline,
    pub presenter: wgpu::RenderPipeline,
    pub params_layout: wgpu::BindGroupLayout,
    pub storage_layout: wgpu::BindGroupLayout,
    pub loaded_layout: wgpu::BindGroupLayout,
}

impl StagePipelines {
    pub(crate) fn build(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        tuning: &Tuning,
    ) -> Result<Self, RendererError> {
        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kernel params layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let storage_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("canvas storage layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::ReadWrite,
                    format: CANVAS_FORMAT,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            }],
        });

        let loaded_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("canvas sampled layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Uint,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let compute_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("compute stage layout"),
            bind_group_layouts: &[&params_layout, &storage_layout],
            push_constant_ranges: &[],
        });
        let present_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("presenter stage layout"),
            bind_group_layouts: &[&params_layout, &loaded_layout],
            push_constant_ranges: &[],
        });

        let generator = Self::build_kernel(
            device,
            &compute_layout,
            "generator",
            shaders::generator_source(tuning),
        )?;
        let filter = Self::build_kernel(
            device,
            &compute_layout,
            "filter",
            shaders::filter_source(tuning),
        )?;
        let presenter =
            Self::build_presenter(device, &present_layout, surface_format)?;

        Ok(Self {
            generator,
            filter,
            presenter,
            params_layout,
            storage_layout,
            loaded_layout,
        })
    }

    fn build_kernel(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        label: &'static str,
        source: String,
    ) -> Result<wgpu::ComputePipeline, RendererError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });
        Self::finish_scope(device, label, source)?;
        Ok(pipeline)
    }

    fn build_presenter(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        surface_format: wgpu::TextureFormat,
    ) -> Result<wgpu::RenderPipeline, RendererError> {
        let source = shaders::presenter_source();
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("presenter"),
            source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
        });
        // Attribute-less draw: the covering triangle lives in a lookup table
        // indexed by the vertex id, so no vertex buffers are bound.
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("presenter"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        Self::finish_scope(device, "presenter", source)?;
        Ok(pipeline)
    }

    /// Pops the validation scope opened before building a stage and turns a
    /// reported error into a compile diagnostic.
    fn finish_scope(
        device: &wgpu::Device,
        label: &'static str,
        source: String,
    ) -> Result<(), RendererError> {
        match pollster::block_on(device.pop_error_scope()) {
            None => Ok(()),
            Some(error) => Err(RendererError::CompileFailure {
                label,
                log: error.to_string(),
                source_text: source,
            }),
        }
    }
}
