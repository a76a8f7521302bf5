//! Compute-kernel dispatch for the bubbleshade demos.
//!
//! ```text
//!   DispatcherSettings
//!          │
//!          ▼
//!   Dispatcher::start ──▶ find_kernel / set_texture ("Result")
//!          │          ──▶ set_int / set_vector (named uniforms)
//!          │          ──▶ set_buffer ("BubblesBuffer", MovingBubbles only)
//!          ▼
//!   dispatch_all ──▶ ComputeBackend::dispatch(x, y, 1) per pass
//! ```
//!
//! [`ComputeBackend`] is the seam between the demo logic and the GPU API.
//! [`GpuBackend`] drives wgpu headlessly; [`RecordingBackend`] applies the
//! same validation but only logs calls, which is what tests and dry runs use.
//! Misconfiguration surfaces as [`DispatchError`] and is never retried.

mod backend;
mod dispatcher;
mod error;
mod gpu;
mod kernel;
mod types;
mod uniforms;

pub use backend::{BackendCall, ComputeBackend, RecordingBackend};
pub use dispatcher::{
    DispatchPass, Dispatcher, DispatcherSettings, ShapeUniforms, ThreadGroups,
    THREAD_GROUP_HINT_MAX,
};
pub use error::DispatchError;
pub use gpu::GpuBackend;
pub use kernel::{KernelHandle, KernelName, BUBBLES_BUFFER, RESULT_TEXTURE};
pub use types::{AdapterProfile, GpuConfig, GpuPowerPreference};
pub use uniforms::{KernelUniforms, UniformValue, UNIFORM_NAMES};
