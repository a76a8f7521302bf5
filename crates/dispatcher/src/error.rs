use crate::kernel::KernelName;

/// Misconfiguration of the compute pipeline. None of these are recoverable:
/// the caller is expected to surface them and stop.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("kernel '{0}' not found")]
    UnknownKernel(String),
    #[error("uniform '{0}' is not declared by the kernels")]
    UnknownUniform(String),
    #[error("uniform '{name}' is declared as {expected}, not {actual}")]
    UniformType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("kernel '{kernel}' has no binding named '{name}'")]
    UnknownBinding { kernel: KernelName, name: String },
    #[error("buffer '{name}' payload of {len} bytes is not a whole number of {stride}-byte records")]
    BufferLayout {
        name: String,
        len: usize,
        stride: usize,
    },
    #[error("kernel '{kernel}' dispatched before '{name}' was bound")]
    Unbound { kernel: KernelName, name: String },
}
