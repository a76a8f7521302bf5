use std::borrow::Cow;
use std::collections::HashMap;

use crate::kernel::KernelName;

const KERNELS_WGSL: &str = include_str!("../../shaders/kernels.wgsl");

/// Bind group layout shared by every kernel plus one compute pipeline per
/// entry point. Sharing the layout lets a single bind group serve all passes.
pub(crate) struct KernelPipelines {
    pub layout: wgpu::BindGroupLayout,
    pipelines: HashMap<KernelName, wgpu::ComputePipeline>,
}

impl KernelPipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("demo kernels"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(KERNELS_WGSL)),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kernel layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: super::target::TARGET_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kernel pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipelines = KernelName::ALL
            .into_iter()
            .map(|kernel| {
                let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(kernel.entry_point()),
                    layout: Some(&pipeline_layout),
                    module: &module,
                    entry_point: Some(kernel.entry_point()),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    cache: None,
                });
                (kernel, pipeline)
            })
            .collect();

        Self { layout, pipelines }
    }

    pub fn get(&self, kernel: KernelName) -> Option<&wgpu::ComputePipeline> {
        self.pipelines.get(&kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse() -> naga::Module {
        let module = naga::front::wgsl::parse_str(KERNELS_WGSL)
            .unwrap_or_else(|err| panic!("{}", err.emit_to_string(KERNELS_WGSL)));
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        );
        validator.validate(&module).expect("kernels validate");
        module
    }

    #[test]
    fn every_kernel_has_a_matching_entry_point() {
        let module = parse();
        for kernel in KernelName::ALL {
            let entry = module
                .entry_points
                .iter()
                .find(|entry| entry.name == kernel.entry_point())
                .unwrap_or_else(|| panic!("missing entry point {kernel}"));
            assert_eq!(entry.stage, naga::ShaderStage::Compute);
            assert_eq!(entry.workgroup_size, kernel.thread_group_size());
        }
    }

    #[test]
    fn split_screen_quadrants_start_at_half_resolution() {
        let module = parse();
        let entry = module
            .entry_points
            .iter()
            .find(|entry| entry.name == KernelName::SplitScreen.entry_point())
            .expect("SplitScreen entry point");
        let comparisons: Vec<_> = entry
            .function
            .expressions
            .iter()
            .filter_map(|(_, expr)| match expr {
                naga::Expression::Binary { op, .. } => Some(*op),
                _ => None,
            })
            .filter(|op| {
                matches!(
                    op,
                    naga::BinaryOperator::Greater | naga::BinaryOperator::GreaterEqual
                )
            })
            .collect();
        // Pixel `half` belongs to the right/top quadrant so every quadrant
        // spans exactly half the texture.
        assert_eq!(
            comparisons,
            vec![
                naga::BinaryOperator::GreaterEqual,
                naga::BinaryOperator::GreaterEqual
            ]
        );
    }

    #[test]
    fn wgsl_bubble_struct_is_twenty_bytes() {
        let module = parse();
        let span = module
            .types
            .iter()
            .find_map(|(_, ty)| match (&ty.name, &ty.inner) {
                (Some(name), naga::TypeInner::Struct { span, .. }) if name == "Bubble" => {
                    Some(*span)
                }
                _ => None,
            })
            .expect("Bubble struct declared");
        assert_eq!(span as usize, bubbles::BUBBLE_STRIDE);
    }

    #[test]
    fn wgsl_params_block_matches_host_uniforms() {
        let module = parse();
        let span = module
            .types
            .iter()
            .find_map(|(_, ty)| match (&ty.name, &ty.inner) {
                (Some(name), naga::TypeInner::Struct { span, .. }) if name == "Params" => {
                    Some(*span)
                }
                _ => None,
            })
            .expect("Params struct declared");
        assert_eq!(
            span as usize,
            std::mem::size_of::<crate::uniforms::KernelUniforms>()
        );
    }
}
