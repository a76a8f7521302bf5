//! Headless wgpu implementation of [`ComputeBackend`].
//!
//! ```text
//!   Dispatcher ──▶ GpuBackend ──▶ KernelUniforms ─▶ uniform buffer  (binding 0)
//!                      │        └▶ RenderTarget  ─▶ storage texture (binding 1)
//!                      │        └▶ bubbles       ─▶ storage buffer  (binding 2)
//!                      └──────▶ one compute pass + submit per dispatch
//! ```

mod context;
mod pipeline;
mod target;

use anyhow::Result;
use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::backend::{Bindings, ComputeBackend};
use crate::error::DispatchError;
use crate::kernel::{KernelHandle, KernelName};
use crate::types::{AdapterProfile, GpuConfig};
use crate::uniforms::{KernelUniforms, UniformValue};

use context::GpuContext;
use pipeline::KernelPipelines;
use target::RenderTarget;

pub struct GpuBackend {
    context: GpuContext,
    pipelines: KernelPipelines,
    target: RenderTarget,
    uniforms: KernelUniforms,
    uniforms_dirty: bool,
    uniform_buffer: wgpu::Buffer,
    bubble_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    bindings: Bindings,
    dispatch_count: u64,
}

impl GpuBackend {
    pub fn new(config: GpuConfig) -> Result<Self> {
        let context = GpuContext::new(config.power, config.texture_resolution)?;
        let device = &context.device;

        let pipelines = KernelPipelines::new(device);
        let target = RenderTarget::new(device, config.texture_resolution);
        let uniforms = KernelUniforms::default();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("kernel uniforms"),
            contents: uniforms.as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        // Binding 2 needs a buffer even for kernels that never read it.
        let bubble_buffer = create_bubble_buffer(device, &[0u8; bubbles::BUBBLE_STRIDE]);
        let bind_group = create_bind_group(
            device,
            &pipelines.layout,
            &uniform_buffer,
            &target.view,
            &bubble_buffer,
        );

        tracing::info!(
            adapter = %context.adapter_profile.name,
            resolution = config.texture_resolution,
            "GPU compute backend ready"
        );

        Ok(Self {
            context,
            pipelines,
            target,
            uniforms,
            uniforms_dirty: false,
            uniform_buffer,
            bubble_buffer,
            bind_group,
            bindings: Bindings::default(),
            dispatch_count: 0,
        })
    }

    pub fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    /// Waits for outstanding work and returns the render target contents.
    pub fn read_target(&self) -> Result<RgbaImage> {
        self.target.read(&self.context.device, &self.context.queue)
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), DispatchError> {
        self.uniforms.set(name, value)?;
        self.uniforms_dirty = true;
        Ok(())
    }

    fn flush_uniforms(&mut self) {
        if self.uniforms_dirty {
            self.context
                .queue
                .write_buffer(&self.uniform_buffer, 0, self.uniforms.as_bytes());
            self.uniforms_dirty = false;
        }
    }
}

impl ComputeBackend for GpuBackend {
    fn find_kernel(&mut self, name: &str) -> Result<KernelHandle, DispatchError> {
        let kernel: KernelName = name.parse()?;
        if self.pipelines.get(kernel).is_none() {
            return Err(DispatchError::UnknownKernel(name.to_string()));
        }
        Ok(KernelHandle::new(kernel))
    }

    fn texture_resolution(&self) -> u32 {
        self.target.resolution
    }

    fn set_texture(&mut self, kernel: KernelHandle, name: &str) -> Result<(), DispatchError> {
        self.bindings.bind_texture(kernel.kernel(), name)
    }

    fn set_int(&mut self, name: &str, value: i32) -> Result<(), DispatchError> {
        self.set_uniform(name, UniformValue::Int(value))
    }

    fn set_float(&mut self, name: &str, value: f32) -> Result<(), DispatchError> {
        self.set_uniform(name, UniformValue::Float(value))
    }

    fn set_vector(&mut self, name: &str, value: [f32; 4]) -> Result<(), DispatchError> {
        self.set_uniform(name, UniformValue::Vector(value))
    }

    fn set_buffer(
        &mut self,
        kernel: KernelHandle,
        name: &str,
        data: &[u8],
    ) -> Result<(), DispatchError> {
        self.bindings.bind_buffer(kernel.kernel(), name, data.len())?;
        if data.is_empty() {
            // Zero bubbles means zero thread groups; the placeholder stays bound.
            return Ok(());
        }

        let device = &self.context.device;
        self.bubble_buffer = create_bubble_buffer(device, data);
        self.bind_group = create_bind_group(
            device,
            &self.pipelines.layout,
            &self.uniform_buffer,
            &self.target.view,
            &self.bubble_buffer,
        );
        tracing::debug!(
            kernel = %kernel.kernel(),
            bytes = data.len(),
            records = data.len() / bubbles::BUBBLE_STRIDE,
            "uploaded bubble buffer"
        );
        Ok(())
    }

    fn dispatch(
        &mut self,
        kernel: KernelHandle,
        x: u32,
        y: u32,
        z: u32,
    ) -> Result<(), DispatchError> {
        let name = kernel.kernel();
        self.bindings.ensure_ready(name)?;
        self.flush_uniforms();

        let pipeline = self
            .pipelines
            .get(name)
            .ok_or_else(|| DispatchError::UnknownKernel(name.to_string()))?;

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("kernel dispatch"),
                });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(name.entry_point()),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(x, y, z);
        }
        self.context.queue.submit(Some(encoder.finish()));
        self.dispatch_count += 1;
        Ok(())
    }
}

fn create_bubble_buffer(device: &wgpu::Device, contents: &[u8]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("bubbles"),
        contents,
        usage: wgpu::BufferUsages::STORAGE,
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniforms: &wgpu::Buffer,
    target: &wgpu::TextureView,
    bubbles: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("kernel bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(target),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: bubbles.as_entire_binding(),
            },
        ],
    })
}
