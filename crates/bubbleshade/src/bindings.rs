use std::time::Duration;

use democonfig::{Animation, DemoConfig, UniformValues};
use dispatcher::{
    DispatchPass, DispatcherSettings, GpuConfig, GpuPowerPreference, ShapeUniforms, ThreadGroups,
};

pub fn dispatcher_settings(config: &DemoConfig, seed_override: Option<u64>) -> DispatcherSettings {
    let passes = config
        .resolved_passes()
        .into_iter()
        .map(|pass| {
            let [x, y] = pass.thread_groups;
            DispatchPass::new(pass.kernel, ThreadGroups::new(x, y))
        })
        .collect();

    DispatcherSettings {
        passes,
        shapes: map_shapes(&config.uniforms),
        bubble_seed: seed_override.or(config.bubbles.seed),
        dispatch_on_update: config.animation.dispatch_on_update,
    }
}

pub fn map_shapes(uniforms: &UniformValues) -> ShapeUniforms {
    ShapeUniforms {
        circle_position_and_radius: uniforms.circle_position_and_radius,
        rect_position_and_size: uniforms.rect_position_and_size,
        circle_color: uniforms.circle_color,
        background_color: uniforms.background_color,
    }
}

pub fn gpu_config(config: &DemoConfig, power: GpuPowerPreference) -> GpuConfig {
    GpuConfig {
        texture_resolution: config.texture_resolution,
        power,
    }
}

/// Frame count and interval after CLI overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    pub frames: u32,
    pub interval: Duration,
}

impl FramePlan {
    pub fn resolve(animation: &Animation, frames: Option<u32>, interval: Option<Duration>) -> Self {
        Self {
            frames: frames.unwrap_or(animation.frames),
            interval: interval.unwrap_or(animation.frame_interval),
        }
    }

    /// `(time, delta_time)` in seconds for each update after the first dispatch.
    pub fn clock(self) -> impl Iterator<Item = (f32, f32)> {
        let dt = self.interval.as_secs_f32();
        (1..=self.frames).map(move |frame| (frame as f32 * dt, dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bubbles_preset_maps_to_two_passes() {
        let config = DemoConfig::preset("bubbles").unwrap();
        let settings = dispatcher_settings(&config, Some(9));
        assert_eq!(
            settings.passes,
            vec![
                DispatchPass::new("Background", ThreadGroups::new(32, 32)),
                DispatchPass::new("MovingBubbles", ThreadGroups::new(4, 1)),
            ]
        );
        assert_eq!(settings.bubble_seed, Some(9));
        assert!(settings.dispatch_on_update);
        assert_eq!(settings.shapes.circle_color, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn config_seed_used_without_override() {
        let mut config = DemoConfig::preset("bubbles").unwrap();
        config.bubbles.seed = Some(3);
        assert_eq!(dispatcher_settings(&config, None).bubble_seed, Some(3));
    }

    #[test]
    fn frame_clock_advances_by_interval() {
        let plan = FramePlan::resolve(
            &Animation::default(),
            Some(3),
            Some(Duration::from_millis(500)),
        );
        let ticks: Vec<_> = plan.clock().collect();
        assert_eq!(ticks, vec![(0.5, 0.5), (1.0, 0.5), (1.5, 0.5)]);
    }

    #[test]
    fn frame_plan_falls_back_to_config() {
        let plan = FramePlan::resolve(&Animation::default(), None, None);
        assert_eq!(plan.frames, 1);
        assert_eq!(plan.interval, Duration::from_millis(16));
    }
}
