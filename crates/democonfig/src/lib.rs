use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    pub version: u32,
    #[serde(default = "default_resolution")]
    pub texture_resolution: u32,
    #[serde(default)]
    pub uniforms: UniformValues,
    #[serde(default)]
    pub bubbles: BubbleSettings,
    #[serde(default)]
    pub animation: Animation,
    #[serde(default)]
    pub passes: Vec<Pass>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UniformValues {
    #[serde(default = "default_circle")]
    pub circle_position_and_radius: [f32; 3],
    #[serde(default = "default_rect")]
    pub rect_position_and_size: [f32; 4],
    #[serde(default = "default_circle_color", deserialize_with = "deserialize_color")]
    pub circle_color: [f32; 4],
    #[serde(
        default = "default_background_color",
        deserialize_with = "deserialize_color"
    )]
    pub background_color: [f32; 4],
}

impl Default for UniformValues {
    fn default() -> Self {
        Self {
            circle_position_and_radius: default_circle(),
            rect_position_and_size: default_rect(),
            circle_color: default_circle_color(),
            background_color: default_background_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BubbleSettings {
    #[serde(default = "default_bubble_groups")]
    pub thread_groups: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for BubbleSettings {
    fn default() -> Self {
        Self {
            thread_groups: default_bubble_groups(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Animation {
    #[serde(default)]
    pub dispatch_on_update: bool,
    #[serde(default = "default_frames")]
    pub frames: u32,
    #[serde(
        default = "default_frame_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub frame_interval: Duration,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            dispatch_on_update: false,
            frames: default_frames(),
            frame_interval: default_frame_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pass {
    pub kernel: String,
    #[serde(default)]
    pub thread_groups: Option<[u32; 2]>,
}

/// A pass after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPass {
    pub kernel: String,
    pub thread_groups: [u32; 2],
}

fn default_resolution() -> u32 {
    256
}

fn default_circle() -> [f32; 3] {
    [0.0, 0.0, 64.0]
}

fn default_rect() -> [f32; 4] {
    [0.0, 0.0, 64.0, 64.0]
}

fn default_circle_color() -> [f32; 4] {
    [0.0, 1.0, 0.0, 1.0]
}

fn default_background_color() -> [f32; 4] {
    [0.0, 0.0, 1.0, 1.0]
}

fn default_bubble_groups() -> u32 {
    1
}

fn default_frames() -> u32 {
    1
}

fn default_frame_interval() -> Duration {
    Duration::from_millis(16)
}

fn default_pass_groups() -> [u32; 2] {
    [16, 16]
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn deserialize_color<'de, D>(deserializer: D) -> Result<[f32; 4], D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Hex(String),
        Rgb([f32; 3]),
        Rgba([f32; 4]),
    }

    match Helper::deserialize(deserializer)? {
        Helper::Hex(raw) => parse_hex_color(&raw).map_err(de::Error::custom),
        Helper::Rgb([r, g, b]) => Ok([r, g, b, 1.0]),
        Helper::Rgba(rgba) => Ok(rgba),
    }
}

/// Parses `#rrggbb` or `#rrggbbaa` (leading `#` optional) into unit floats.
pub fn parse_hex_color(raw: &str) -> Result<[f32; 4], String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !matches!(digits.len(), 6 | 8) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!(
            "invalid colour '{raw}'; expected #rrggbb or #rrggbbaa"
        ));
    }

    let mut channels = [1.0_f32; 4];
    for (index, slot) in channels.iter_mut().enumerate().take(digits.len() / 2) {
        let pair = &digits[index * 2..index * 2 + 2];
        let value = u8::from_str_radix(pair, 16)
            .map_err(|_| format!("invalid colour '{raw}'; '{pair}' is not hex"))?;
        *slot = f32::from(value) / 255.0;
    }
    Ok(channels)
}

const PRESET_ASSIGN_TEXTURE: &str = r#"
version = 1

[[passes]]
kernel = "SolidRed"
thread_groups = [16, 16]
"#;

const PRESET_SPLIT_SCREEN: &str = r#"
version = 1

[[passes]]
kernel = "SplitScreen"
thread_groups = [32, 32]
"#;

const PRESET_SIMPLE: &str = r#"
version = 1

[uniforms]
circle_position_and_radius = [128, 128, 64]
rect_position_and_size = [16, 16, 64, 64]

[[passes]]
kernel = "Circle"
thread_groups = [16, 16]
"#;

const PRESET_BUBBLES: &str = r##"
version = 1

[uniforms]
circle_color = "#00ff00"
background_color = "#0000ff"

[bubbles]
thread_groups = 4

[animation]
dispatch_on_update = true
frames = 60
frame_interval = "16ms"

[[passes]]
kernel = "Background"
thread_groups = [32, 32]

[[passes]]
kernel = "MovingBubbles"
"##;

/// Names accepted by [`DemoConfig::preset`].
pub const PRESET_NAMES: [&str; 4] = ["assign-texture", "split-screen", "simple", "bubbles"];

impl DemoConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: DemoConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Built-in configurations reproducing the stock demo scenes.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let source = match name {
            "assign-texture" => PRESET_ASSIGN_TEXTURE,
            "split-screen" => PRESET_SPLIT_SCREEN,
            "simple" => PRESET_SIMPLE,
            "bubbles" => PRESET_BUBBLES,
            other => return Err(ConfigError::UnknownPreset(other.to_string())),
        };
        Self::from_toml_str(source)
    }

    /// Passes with omitted thread groups filled in. `MovingBubbles` takes its
    /// x count from `[bubbles]`; every other kernel falls back to 16x16.
    pub fn resolved_passes(&self) -> Vec<ResolvedPass> {
        self.passes
            .iter()
            .map(|pass| {
                let thread_groups = pass.thread_groups.unwrap_or_else(|| {
                    if pass.kernel == "MovingBubbles" {
                        [self.bubbles.thread_groups, 1]
                    } else {
                        default_pass_groups()
                    }
                });
                ResolvedPass {
                    kernel: pass.kernel.clone(),
                    thread_groups,
                }
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.texture_resolution == 0 {
            return Err(ConfigError::Invalid(
                "texture_resolution must be greater than zero".into(),
            ));
        }

        if self.passes.is_empty() {
            return Err(ConfigError::Invalid(
                "config must define at least one pass".into(),
            ));
        }

        for (index, pass) in self.passes.iter().enumerate() {
            if pass.kernel.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "pass {index} has an empty kernel name"
                )));
            }
        }

        let uniforms = &self.uniforms;
        let vectors: [(&str, &[f32]); 4] = [
            (
                "circle_position_and_radius",
                uniforms.circle_position_and_radius.as_slice(),
            ),
            (
                "rect_position_and_size",
                uniforms.rect_position_and_size.as_slice(),
            ),
            ("circle_color", uniforms.circle_color.as_slice()),
            ("background_color", uniforms.background_color.as_slice()),
        ];
        for (name, values) in vectors {
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "uniforms.{name} must contain finite numbers"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1
texture_resolution = 512

[uniforms]
circle_position_and_radius = [128, 128, 32]
circle_color = "#ff000080"
background_color = [0.1, 0.2, 0.3]

[bubbles]
thread_groups = 8
seed = 11

[animation]
dispatch_on_update = true
frames = 30
frame_interval = "20ms"

[[passes]]
kernel = "Background"
thread_groups = [64, 64]

[[passes]]
kernel = "MovingBubbles"
"##;

    #[test]
    fn parses_sample_config() {
        let config = DemoConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.texture_resolution, 512);
        assert_eq!(config.uniforms.circle_position_and_radius, [128.0, 128.0, 32.0]);
        assert_eq!(config.uniforms.circle_color[0], 1.0);
        assert!((config.uniforms.circle_color[3] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(config.uniforms.background_color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(config.uniforms.rect_position_and_size, [0.0, 0.0, 64.0, 64.0]);
        assert_eq!(config.bubbles.seed, Some(11));
        assert!(config.animation.dispatch_on_update);
        assert_eq!(config.animation.frame_interval, Duration::from_millis(20));
    }

    #[test]
    fn bubble_pass_inherits_group_count() {
        let config = DemoConfig::from_toml_str(SAMPLE).unwrap();
        let passes = config.resolved_passes();
        assert_eq!(passes[0].thread_groups, [64, 64]);
        assert_eq!(passes[1].kernel, "MovingBubbles");
        assert_eq!(passes[1].thread_groups, [8, 1]);
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = DemoConfig::from_toml_str(
            r#"
version = 1

[[passes]]
kernel = "SolidYellow"
"#,
        )
        .unwrap();
        assert_eq!(config.texture_resolution, 256);
        assert_eq!(config.uniforms, UniformValues::default());
        assert_eq!(config.animation.frames, 1);
        assert!(!config.animation.dispatch_on_update);
        assert_eq!(config.resolved_passes()[0].thread_groups, [16, 16]);
    }

    #[test]
    fn rejects_wrong_version() {
        let err = DemoConfig::from_toml_str(
            r#"
version = 2

[[passes]]
kernel = "SolidRed"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_pass_list() {
        let err = DemoConfig::from_toml_str("version = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_resolution() {
        let err = DemoConfig::from_toml_str(
            r#"
version = 1
texture_resolution = 0

[[passes]]
kernel = "SolidRed"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_kernel_names_pass_validation() {
        let config = DemoConfig::from_toml_str(
            r#"
version = 1

[[passes]]
kernel = "DoesNotExist"
"#,
        )
        .unwrap();
        assert_eq!(config.passes[0].kernel, "DoesNotExist");
    }

    #[test]
    fn rejects_bad_hex_colour() {
        let err = DemoConfig::from_toml_str(
            r##"
version = 1

[uniforms]
circle_color = "#12345"

[[passes]]
kernel = "Circle"
"##,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn all_presets_parse() {
        for name in PRESET_NAMES {
            let config = DemoConfig::preset(name).expect(name);
            assert!(!config.passes.is_empty());
        }
        assert!(matches!(
            DemoConfig::preset("nope"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn hex_parser_handles_optional_hash() {
        assert_eq!(parse_hex_color("00ff00").unwrap(), [0.0, 1.0, 0.0, 1.0]);
        assert!(parse_hex_color("#zzzzzz").is_err());
    }

    #[test]
    fn hex_parser_rejects_signed_pairs() {
        assert!(parse_hex_color("#+f+f+f").is_err());
        assert!(parse_hex_color("+fffffff").is_err());
    }
}
