use bytemuck::{Pod, Zeroable};

use crate::error::DispatchError;

/// Named scalar/vector inputs, mirroring the `Params` uniform block in
/// `kernels.wgsl`. Field order and padding must match the WGSL struct.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct KernelUniforms {
    pub circle_position_and_radius: [f32; 4],
    pub rect_position_and_size: [f32; 4],
    pub circle_color: [f32; 4],
    pub background_color: [f32; 4],
    pub texture_resolution: i32,
    pub time: f32,
    pub delta_time: f32,
    pub padding: f32,
}

const _: () = assert!(std::mem::size_of::<KernelUniforms>() == 80);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vector([f32; 4]),
}

impl UniformValue {
    fn kind(&self) -> &'static str {
        match self {
            UniformValue::Int(_) => "int",
            UniformValue::Float(_) => "float",
            UniformValue::Vector(_) => "vector",
        }
    }
}

/// Uniform names understood by [`KernelUniforms::set`].
pub const UNIFORM_NAMES: [&str; 7] = [
    "TextureResolution",
    "Time",
    "DeltaTime",
    "CirclePositionAndRadius",
    "RectPositionAndSize",
    "CircleColor",
    "BackgroundColor",
];

impl Default for KernelUniforms {
    fn default() -> Self {
        Self {
            circle_position_and_radius: [0.0, 0.0, 64.0, 0.0],
            rect_position_and_size: [0.0, 0.0, 64.0, 64.0],
            circle_color: [0.0, 1.0, 0.0, 1.0],
            background_color: [0.0, 0.0, 1.0, 1.0],
            texture_resolution: 256,
            time: 0.0,
            delta_time: 0.0,
            padding: 0.0,
        }
    }
}

impl KernelUniforms {
    /// Writes `value` into the field declared as `name`.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), DispatchError> {
        let mismatch = |expected: &'static str| DispatchError::UniformType {
            name: name.to_string(),
            expected,
            actual: value.kind(),
        };

        match (name, value) {
            ("TextureResolution", UniformValue::Int(v)) => self.texture_resolution = v,
            ("TextureResolution", _) => return Err(mismatch("int")),
            ("Time", UniformValue::Float(v)) => self.time = v,
            ("DeltaTime", UniformValue::Float(v)) => self.delta_time = v,
            ("Time" | "DeltaTime", _) => return Err(mismatch("float")),
            ("CirclePositionAndRadius", UniformValue::Vector(v)) => {
                self.circle_position_and_radius = v
            }
            ("RectPositionAndSize", UniformValue::Vector(v)) => self.rect_position_and_size = v,
            ("CircleColor", UniformValue::Vector(v)) => self.circle_color = v,
            ("BackgroundColor", UniformValue::Vector(v)) => self.background_color = v,
            (
                "CirclePositionAndRadius" | "RectPositionAndSize" | "CircleColor"
                | "BackgroundColor",
                _,
            ) => return Err(mismatch("vector")),
            _ => return Err(DispatchError::UnknownUniform(name.to_string())),
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_every_declared_name() {
        let mut uniforms = KernelUniforms::default();
        uniforms.set("TextureResolution", UniformValue::Int(512)).unwrap();
        uniforms.set("Time", UniformValue::Float(1.5)).unwrap();
        uniforms.set("DeltaTime", UniformValue::Float(0.25)).unwrap();
        uniforms
            .set("CircleColor", UniformValue::Vector([1.0, 0.0, 0.0, 1.0]))
            .unwrap();
        uniforms
            .set("BackgroundColor", UniformValue::Vector([0.5; 4]))
            .unwrap();
        uniforms
            .set("RectPositionAndSize", UniformValue::Vector([1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        uniforms
            .set(
                "CirclePositionAndRadius",
                UniformValue::Vector([8.0, 8.0, 4.0, 0.0]),
            )
            .unwrap();

        assert_eq!(uniforms.texture_resolution, 512);
        assert_eq!(uniforms.time, 1.5);
        assert_eq!(uniforms.delta_time, 0.25);
        assert_eq!(uniforms.circle_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.rect_position_and_size, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(uniforms.circle_position_and_radius[2], 4.0);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut uniforms = KernelUniforms::default();
        let err = uniforms
            .set("CircleColour", UniformValue::Vector([0.0; 4]))
            .unwrap_err();
        assert_eq!(err, DispatchError::UnknownUniform("CircleColour".into()));
        assert_eq!(uniforms, KernelUniforms::default());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut uniforms = KernelUniforms::default();
        let err = uniforms.set("Time", UniformValue::Int(3)).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::UniformType {
                expected: "float",
                actual: "int",
                ..
            }
        ));
    }

    #[test]
    fn resolution_sits_after_the_four_vectors() {
        let uniforms = KernelUniforms {
            texture_resolution: 7,
            ..KernelUniforms::default()
        };
        let bytes = uniforms.as_bytes();
        assert_eq!(bytes.len(), 80);
        assert_eq!(&bytes[64..68], &7i32.to_ne_bytes());
    }

    #[test]
    fn every_listed_name_is_settable() {
        let mut uniforms = KernelUniforms::default();
        for name in UNIFORM_NAMES {
            let ok = [
                UniformValue::Int(1),
                UniformValue::Float(1.0),
                UniformValue::Vector([1.0; 4]),
            ]
            .into_iter()
            .any(|value| uniforms.set(name, value).is_ok());
            assert!(ok, "{name} rejected every value type");
        }
    }
}
