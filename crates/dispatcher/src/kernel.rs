use std::fmt;
use std::str::FromStr;

use crate::error::DispatchError;

/// Name every kernel binds its render target under.
pub const RESULT_TEXTURE: &str = "Result";
/// Name of the bubble storage buffer read by [`KernelName::MovingBubbles`].
pub const BUBBLES_BUFFER: &str = "BubblesBuffer";

/// Entry points compiled from `kernels.wgsl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KernelName {
    SolidRed,
    SolidYellow,
    SplitScreen,
    Background,
    Circle,
    Rectangle,
    MovingBubbles,
}

impl KernelName {
    pub const ALL: [KernelName; 7] = [
        KernelName::SolidRed,
        KernelName::SolidYellow,
        KernelName::SplitScreen,
        KernelName::Background,
        KernelName::Circle,
        KernelName::Rectangle,
        KernelName::MovingBubbles,
    ];

    /// WGSL entry point; identical to the display name.
    pub fn entry_point(self) -> &'static str {
        match self {
            KernelName::SolidRed => "SolidRed",
            KernelName::SolidYellow => "SolidYellow",
            KernelName::SplitScreen => "SplitScreen",
            KernelName::Background => "Background",
            KernelName::Circle => "Circle",
            KernelName::Rectangle => "Rectangle",
            KernelName::MovingBubbles => "MovingBubbles",
        }
    }

    /// `@workgroup_size` declared for the entry point.
    pub fn thread_group_size(self) -> [u32; 3] {
        match self {
            KernelName::MovingBubbles => [8, 1, 1],
            _ => [8, 8, 1],
        }
    }

    pub fn reads_bubbles(self) -> bool {
        matches!(self, KernelName::MovingBubbles)
    }

    pub(crate) fn check_texture(self, name: &str) -> Result<(), DispatchError> {
        if name == RESULT_TEXTURE {
            Ok(())
        } else {
            Err(DispatchError::UnknownBinding {
                kernel: self,
                name: name.to_string(),
            })
        }
    }

    pub(crate) fn check_buffer(self, name: &str, len: usize) -> Result<(), DispatchError> {
        if !self.reads_bubbles() || name != BUBBLES_BUFFER {
            return Err(DispatchError::UnknownBinding {
                kernel: self,
                name: name.to_string(),
            });
        }
        if len % bubbles::BUBBLE_STRIDE != 0 {
            return Err(DispatchError::BufferLayout {
                name: name.to_string(),
                len,
                stride: bubbles::BUBBLE_STRIDE,
            });
        }
        Ok(())
    }
}

impl fmt::Display for KernelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.entry_point())
    }
}

impl FromStr for KernelName {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KernelName::ALL
            .into_iter()
            .find(|kernel| kernel.entry_point() == s)
            .ok_or_else(|| DispatchError::UnknownKernel(s.to_string()))
    }
}

/// Opaque result of a successful kernel lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelHandle {
    kernel: KernelName,
}

impl KernelHandle {
    pub(crate) fn new(kernel: KernelName) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> KernelName {
        self.kernel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_strings() {
        for kernel in KernelName::ALL {
            assert_eq!(kernel.to_string().parse::<KernelName>().unwrap(), kernel);
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(
            "solidred".parse::<KernelName>(),
            Err(DispatchError::UnknownKernel("solidred".into()))
        );
    }

    #[test]
    fn only_bubbles_kernel_is_one_dimensional() {
        for kernel in KernelName::ALL {
            let expected = if kernel == KernelName::MovingBubbles {
                [8, 1, 1]
            } else {
                [8, 8, 1]
            };
            assert_eq!(kernel.thread_group_size(), expected);
        }
    }

    #[test]
    fn buffer_binding_is_restricted_to_bubbles() {
        assert!(KernelName::MovingBubbles.check_buffer(BUBBLES_BUFFER, 40).is_ok());
        assert!(matches!(
            KernelName::Background.check_buffer(BUBBLES_BUFFER, 40),
            Err(DispatchError::UnknownBinding { .. })
        ));
        assert!(matches!(
            KernelName::MovingBubbles.check_buffer(BUBBLES_BUFFER, 41),
            Err(DispatchError::BufferLayout { len: 41, .. })
        ));
        assert!(KernelName::Circle.check_texture("Result").is_ok());
        assert!(KernelName::Circle.check_texture("_MainTex").is_err());
    }
}
