/// Which class of GPU adapter to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    /// Prefer an integrated / low-power adapter.
    #[default]
    Low,
    /// Prefer a discrete / high-performance adapter.
    High,
}

/// Summary of the adapter wgpu selected, kept for logging.
#[derive(Debug, Clone)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    pub(crate) fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    /// CPU rasterisers (llvmpipe, WARP, SwiftShader) report as `Cpu`.
    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

/// Immutable configuration for [`crate::GpuBackend`].
#[derive(Debug, Clone, Copy)]
pub struct GpuConfig {
    /// Edge length of the square render target in pixels.
    pub texture_resolution: u32,
    pub power: GpuPowerPreference,
}

impl Default for GpuConfig {
    /// A 256x256 target on a low-power adapter.
    fn default() -> Self {
        Self {
            texture_resolution: 256,
            power: GpuPowerPreference::default(),
        }
    }
}
