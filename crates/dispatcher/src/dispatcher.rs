use bubbles::Bubble;

use crate::backend::ComputeBackend;
use crate::error::DispatchError;
use crate::kernel::{KernelHandle, KernelName, BUBBLES_BUFFER, RESULT_TEXTURE};

/// Upper bound of the thread-group range hint. Larger counts are dispatched
/// as given; they only earn a warning.
pub const THREAD_GROUP_HINT_MAX: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadGroups {
    pub x: u32,
    pub y: u32,
}

impl ThreadGroups {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Work is two dimensional, so z is always 1.
    pub fn triple(self) -> [u32; 3] {
        [self.x, self.y, 1]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchPass {
    pub kernel: String,
    pub groups: ThreadGroups,
}

impl DispatchPass {
    pub fn new(kernel: impl Into<String>, groups: ThreadGroups) -> Self {
        Self {
            kernel: kernel.into(),
            groups,
        }
    }
}

/// Shape and colour uniforms pushed before dispatching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeUniforms {
    pub circle_position_and_radius: [f32; 3],
    pub rect_position_and_size: [f32; 4],
    pub circle_color: [f32; 4],
    pub background_color: [f32; 4],
}

impl Default for ShapeUniforms {
    fn default() -> Self {
        Self {
            circle_position_and_radius: [0.0, 0.0, 64.0],
            rect_position_and_size: [0.0, 0.0, 64.0, 64.0],
            circle_color: [0.0, 1.0, 0.0, 1.0],
            background_color: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DispatcherSettings {
    /// Dispatched in order on every `dispatch_all`.
    pub passes: Vec<DispatchPass>,
    pub shapes: ShapeUniforms,
    pub bubble_seed: Option<u64>,
    pub dispatch_on_update: bool,
}

/// Drives one backend through the demo lifecycle: look up kernels, bind the
/// render target, push uniforms, upload bubbles, then dispatch every pass.
pub struct Dispatcher<B: ComputeBackend> {
    backend: B,
    settings: DispatcherSettings,
    kernels: Vec<KernelHandle>,
    bubbles: Vec<Bubble>,
    initialized: bool,
}

impl<B: ComputeBackend> Dispatcher<B> {
    pub fn new(backend: B, settings: DispatcherSettings) -> Self {
        Self {
            backend,
            settings,
            kernels: Vec::new(),
            bubbles: Vec::new(),
            initialized: false,
        }
    }

    /// Initialises every kernel and performs the first dispatch.
    pub fn start(&mut self) -> Result<(), DispatchError> {
        self.init_shader()?;
        self.dispatch_all()
    }

    fn init_shader(&mut self) -> Result<(), DispatchError> {
        // A failed lookup must not leave old handles paired with new passes.
        self.initialized = false;
        self.kernels.clear();

        let mut kernels = Vec::with_capacity(self.settings.passes.len());
        for pass in &self.settings.passes {
            let handle = self.backend.find_kernel(&pass.kernel)?;
            self.backend.set_texture(handle, RESULT_TEXTURE)?;
            kernels.push(handle);
        }
        self.kernels = kernels;

        let resolution = self.backend.texture_resolution();
        self.backend
            .set_int("TextureResolution", i32::try_from(resolution).unwrap_or(i32::MAX))?;
        self.push_shape_uniforms()?;
        self.init_bubbles_buffer()?;

        tracing::debug!(
            passes = self.kernels.len(),
            resolution,
            bubbles = self.bubbles.len(),
            "compute kernels initialised"
        );
        self.initialized = true;
        Ok(())
    }

    fn push_shape_uniforms(&mut self) -> Result<(), DispatchError> {
        let shapes = self.settings.shapes;
        let [cx, cy, radius] = shapes.circle_position_and_radius;
        self.backend
            .set_vector("CirclePositionAndRadius", [cx, cy, radius, 0.0])?;
        self.backend
            .set_vector("RectPositionAndSize", shapes.rect_position_and_size)?;
        self.backend.set_vector("CircleColor", shapes.circle_color)?;
        self.backend
            .set_vector("BackgroundColor", shapes.background_color)?;
        Ok(())
    }

    fn init_bubbles_buffer(&mut self) -> Result<(), DispatchError> {
        let Some((handle, groups)) = self
            .kernels
            .iter()
            .zip(&self.settings.passes)
            .find(|(handle, _)| handle.kernel() == KernelName::MovingBubbles)
            .map(|(handle, pass)| (*handle, pass.groups))
        else {
            self.bubbles.clear();
            return Ok(());
        };

        let [group_size_x, _, _] = self.backend.kernel_thread_group_size(handle);
        let amount = groups.x as usize * group_size_x as usize;
        let bounds = self.backend.texture_resolution() as f32;
        self.bubbles = bubbles::create_seeded(amount, bounds, bounds, self.settings.bubble_seed);

        self.backend
            .set_buffer(handle, BUBBLES_BUFFER, bubbles::as_gpu_bytes(&self.bubbles))?;
        Ok(())
    }

    /// Dispatches every pass with exactly its configured `(x, y, 1)` groups.
    pub fn dispatch_all(&mut self) -> Result<(), DispatchError> {
        for (handle, pass) in self.kernels.iter().zip(&self.settings.passes) {
            let [x, y, z] = pass.groups.triple();
            if x > THREAD_GROUP_HINT_MAX || y > THREAD_GROUP_HINT_MAX {
                tracing::warn!(
                    kernel = %handle.kernel(),
                    x,
                    y,
                    hint = THREAD_GROUP_HINT_MAX,
                    "thread group count outside the usual range; dispatching anyway"
                );
            }
            tracing::trace!(kernel = %handle.kernel(), x, y, z, "dispatch");
            self.backend.dispatch(*handle, x, y, z)?;
        }
        Ok(())
    }

    /// Per-frame hook. Pushes the clock and re-dispatches when
    /// `dispatch_on_update` is set; returns whether anything was dispatched.
    pub fn update(&mut self, time: f32, delta_time: f32) -> Result<bool, DispatchError> {
        if !self.initialized || !self.settings.dispatch_on_update {
            return Ok(false);
        }
        self.backend.set_float("Time", time)?;
        self.backend.set_float("DeltaTime", delta_time)?;
        self.dispatch_all()?;
        Ok(true)
    }

    /// Applies edited settings. An initialised dispatcher re-resolves its
    /// kernels, re-pushes uniforms and dispatches again; otherwise the new
    /// values are only stored for `start`.
    pub fn revalidate(&mut self, settings: DispatcherSettings) -> Result<(), DispatchError> {
        let reseed = settings.passes != self.settings.passes
            || settings.bubble_seed != self.settings.bubble_seed;
        self.settings = settings;
        if !self.initialized {
            return Ok(());
        }

        if reseed {
            self.init_shader()?;
        } else {
            self.push_shape_uniforms()?;
        }
        self.dispatch_all()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Host copy of the uploaded bubbles; never synchronised back from the GPU.
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
