use std::collections::HashSet;

use crate::error::DispatchError;
use crate::kernel::{KernelHandle, KernelName, BUBBLES_BUFFER, RESULT_TEXTURE};
use crate::uniforms::{KernelUniforms, UniformValue};

/// The slice of a GPU API the dispatcher drives: kernel lookup, named
/// uniform setters, resource binding, and fire-and-forget dispatch.
pub trait ComputeBackend {
    fn find_kernel(&mut self, name: &str) -> Result<KernelHandle, DispatchError>;

    fn kernel_thread_group_size(&self, kernel: KernelHandle) -> [u32; 3] {
        kernel.kernel().thread_group_size()
    }

    /// Edge length of the square render target owned by the backend.
    fn texture_resolution(&self) -> u32;

    /// Binds the backend's render target to `kernel` under `name`.
    fn set_texture(&mut self, kernel: KernelHandle, name: &str) -> Result<(), DispatchError>;

    fn set_int(&mut self, name: &str, value: i32) -> Result<(), DispatchError>;

    fn set_float(&mut self, name: &str, value: f32) -> Result<(), DispatchError>;

    fn set_vector(&mut self, name: &str, value: [f32; 4]) -> Result<(), DispatchError>;

    /// Uploads `data` and binds it to `kernel` under `name`.
    fn set_buffer(
        &mut self,
        kernel: KernelHandle,
        name: &str,
        data: &[u8],
    ) -> Result<(), DispatchError>;

    fn dispatch(&mut self, kernel: KernelHandle, x: u32, y: u32, z: u32)
        -> Result<(), DispatchError>;
}

/// Tracks which kernels have their resources bound.
#[derive(Debug, Default, Clone)]
pub(crate) struct Bindings {
    textures: HashSet<KernelName>,
    buffers: HashSet<KernelName>,
}

impl Bindings {
    pub fn bind_texture(&mut self, kernel: KernelName, name: &str) -> Result<(), DispatchError> {
        kernel.check_texture(name)?;
        self.textures.insert(kernel);
        Ok(())
    }

    pub fn bind_buffer(
        &mut self,
        kernel: KernelName,
        name: &str,
        len: usize,
    ) -> Result<(), DispatchError> {
        kernel.check_buffer(name, len)?;
        self.buffers.insert(kernel);
        Ok(())
    }

    pub fn ensure_ready(&self, kernel: KernelName) -> Result<(), DispatchError> {
        if !self.textures.contains(&kernel) {
            return Err(DispatchError::Unbound {
                kernel,
                name: RESULT_TEXTURE.to_string(),
            });
        }
        if kernel.reads_bubbles() && !self.buffers.contains(&kernel) {
            return Err(DispatchError::Unbound {
                kernel,
                name: BUBBLES_BUFFER.to_string(),
            });
        }
        Ok(())
    }
}

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    FindKernel { name: String },
    SetTexture { kernel: KernelName, name: String },
    SetUniform { name: String, value: UniformValue },
    SetBuffer { kernel: KernelName, name: String, len: usize },
    Dispatch { kernel: KernelName, groups: [u32; 3] },
}

/// GPU-less backend that validates calls the same way [`crate::GpuBackend`]
/// does and keeps an ordered log of them.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    resolution: u32,
    uniforms: KernelUniforms,
    bindings: Bindings,
    calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution,
            uniforms: KernelUniforms::default(),
            bindings: Bindings::default(),
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn uniforms(&self) -> &KernelUniforms {
        &self.uniforms
    }

    /// Thread-group triples passed to `dispatch`, in call order.
    pub fn dispatches(&self) -> Vec<(KernelName, [u32; 3])> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Dispatch { kernel, groups } => Some((*kernel, *groups)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), DispatchError> {
        self.uniforms.set(name, value)?;
        self.calls.push(BackendCall::SetUniform {
            name: name.to_string(),
            value,
        });
        Ok(())
    }
}

impl ComputeBackend for RecordingBackend {
    fn find_kernel(&mut self, name: &str) -> Result<KernelHandle, DispatchError> {
        let kernel: KernelName = name.parse()?;
        self.calls.push(BackendCall::FindKernel {
            name: name.to_string(),
        });
        Ok(KernelHandle::new(kernel))
    }

    fn texture_resolution(&self) -> u32 {
        self.resolution
    }

    fn set_texture(&mut self, kernel: KernelHandle, name: &str) -> Result<(), DispatchError> {
        self.bindings.bind_texture(kernel.kernel(), name)?;
        self.calls.push(BackendCall::SetTexture {
            kernel: kernel.kernel(),
            name: name.to_string(),
        });
        Ok(())
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
        self.calls.push(BackendCall::SetBuffer {
            kernel: kernel.kernel(),
            name: name.to_string(),
            len: data.len(),
        });
        Ok(())
    }

    fn dispatch(
        &mut self,
        kernel: KernelHandle,
        x: u32,
        y: u32,
        z: u32,
    ) -> Result<(), DispatchError> {
        self.bindings.ensure_ready(kernel.kernel())?;
        self.calls.push(BackendCall::Dispatch {
            kernel: kernel.kernel(),
            groups: [x, y, z],
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kernel_lookup_fails() {
        let mut backend = RecordingBackend::new(256);
        let err = backend.find_kernel("SolidBlue").unwrap_err();
        assert_eq!(err, DispatchError::UnknownKernel("SolidBlue".into()));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn dispatch_requires_bound_target() {
        let mut backend = RecordingBackend::new(256);
        let kernel = backend.find_kernel("SolidRed").unwrap();
        assert!(matches!(
            backend.dispatch(kernel, 1, 1, 1),
            Err(DispatchError::Unbound { .. })
        ));
        backend.set_texture(kernel, "Result").unwrap();
        backend.dispatch(kernel, 3, 4, 1).unwrap();
        assert_eq!(backend.dispatches(), vec![(KernelName::SolidRed, [3, 4, 1])]);
    }

    #[test]
    fn bubbles_kernel_requires_buffer() {
        let mut backend = RecordingBackend::new(256);
        let kernel = backend.find_kernel("MovingBubbles").unwrap();
        backend.set_texture(kernel, "Result").unwrap();
        let err = backend.dispatch(kernel, 1, 1, 1).unwrap_err();
        assert_eq!(
            err,
            DispatchError::Unbound {
                kernel: KernelName::MovingBubbles,
                name: BUBBLES_BUFFER.into(),
            }
        );
        backend
            .set_buffer(kernel, BUBBLES_BUFFER, &[0u8; 40])
            .unwrap();
        backend.dispatch(kernel, 1, 1, 1).unwrap();
    }

    #[test]
    fn rejected_uniform_is_not_recorded() {
        let mut backend = RecordingBackend::new(256);
        assert!(backend.set_float("Tme", 1.0).is_err());
        assert!(backend.calls().is_empty());
        backend.set_float("Time", 1.0).unwrap();
        assert_eq!(backend.uniforms().time, 1.0);
    }
}
