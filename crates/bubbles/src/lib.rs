//! Bubble records shared between the host and the `MovingBubbles` kernel.
//!
//! A [`Bubble`] is uploaded verbatim into a storage buffer, so its memory
//! layout is part of the GPU contract: five tightly packed `f32` values in the
//! order `position.x, position.y, velocity.x, velocity.y, radius`.

use bytemuck::{Pod, Zeroable};
use rand::prelude::*;

/// Size in bytes of one encoded bubble; matches `struct Bubble` in the WGSL.
pub const BUBBLE_STRIDE: usize = 5 * std::mem::size_of::<f32>();

/// Full width of the velocity range; components land in `[-50, 50)`.
pub const VELOCITY_RANGE: f32 = 100.0;
pub const HALF_VELOCITY: f32 = VELOCITY_RANGE / 2.0;
pub const MIN_RADIUS: f32 = 5.0;
pub const MAX_RADIUS: f32 = 20.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Bubble {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub radius: f32,
}

const _: () = assert!(std::mem::size_of::<Bubble>() == BUBBLE_STRIDE);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("bubble payload of {0} bytes is not a multiple of {BUBBLE_STRIDE}")]
    Misaligned(usize),
}

impl Bubble {
    pub fn new(position: [f32; 2], velocity: [f32; 2], radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
        }
    }

    /// All fields finite and a strictly positive radius.
    pub fn is_valid(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.velocity.iter().all(|v| v.is_finite())
            && self.radius.is_finite()
            && self.radius > 0.0
    }

    pub fn to_le_bytes(&self) -> [u8; BUBBLE_STRIDE] {
        let fields = [
            self.position[0],
            self.position[1],
            self.velocity[0],
            self.velocity[1],
            self.radius,
        ];
        let mut out = [0u8; BUBBLE_STRIDE];
        for (chunk, value) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    pub fn from_le_bytes(bytes: &[u8; BUBBLE_STRIDE]) -> Self {
        let mut fields = [0f32; 5];
        for (value, chunk) in fields.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self {
            position: [fields[0], fields[1]],
            velocity: [fields[2], fields[3]],
            radius: fields[4],
        }
    }
}

/// Serialises a bubble set into the little-endian wire form.
pub fn encode(bubbles: &[Bubble]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bubbles.len() * BUBBLE_STRIDE);
    for bubble in bubbles {
        out.extend_from_slice(&bubble.to_le_bytes());
    }
    out
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Bubble>, LayoutError> {
    if bytes.len() % BUBBLE_STRIDE != 0 {
        return Err(LayoutError::Misaligned(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(BUBBLE_STRIDE)
        .map(|chunk| {
            let mut record = [0u8; BUBBLE_STRIDE];
            record.copy_from_slice(chunk);
            Bubble::from_le_bytes(&record)
        })
        .collect())
}

/// Zero-copy view used when uploading into a GPU buffer.
pub fn as_gpu_bytes(bubbles: &[Bubble]) -> &[u8] {
    bytemuck::cast_slice(bubbles)
}

/// Produces `amount` bubbles with independently randomised fields.
///
/// Positions are uniform within `[0, bounds_x) x [0, bounds_y)`. An axis whose
/// bound is not a positive finite number collapses to `0.0`.
pub fn create_bubbles<R>(rng: &mut R, amount: usize, bounds_x: f32, bounds_y: f32) -> Vec<Bubble>
where
    R: Rng + ?Sized,
{
    (0..amount)
        .map(|_| Bubble {
            position: [axis(rng, bounds_x), axis(rng, bounds_y)],
            velocity: [
                rng.gen_range(-HALF_VELOCITY..HALF_VELOCITY),
                rng.gen_range(-HALF_VELOCITY..HALF_VELOCITY),
            ],
            radius: rng.gen_range(MIN_RADIUS..MAX_RADIUS),
        })
        .collect()
}

/// Reproducible variant of [`create_bubbles`]; `None` draws from OS entropy.
pub fn create_seeded(amount: usize, bounds_x: f32, bounds_y: f32, seed: Option<u64>) -> Vec<Bubble> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    create_bubbles(&mut rng, amount, bounds_x, bounds_y)
}

fn axis<R>(rng: &mut R, bound: f32) -> f32
where
    R: Rng + ?Sized,
{
    if bound.is_finite() && bound > 0.0 {
        rng.gen_range(0.0..bound)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_bubbles_respect_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        let bubbles = create_bubbles(&mut rng, 512, 256.0, 128.0);
        assert_eq!(bubbles.len(), 512);
        for bubble in &bubbles {
            assert!(bubble.is_valid(), "{bubble:?}");
            assert!((MIN_RADIUS..MAX_RADIUS).contains(&bubble.radius));
            for component in bubble.velocity {
                assert!((-HALF_VELOCITY..HALF_VELOCITY).contains(&component));
            }
            assert!((0.0..256.0).contains(&bubble.position[0]));
            assert!((0.0..128.0).contains(&bubble.position[1]));
        }
    }

    #[test]
    fn zero_amount_yields_empty_set() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(create_bubbles(&mut rng, 0, 256.0, 256.0).is_empty());
    }

    #[test]
    fn degenerate_bounds_pin_position_to_origin() {
        let bubbles = create_seeded(16, 0.0, f32::NAN, Some(3));
        assert!(bubbles.iter().all(|b| b.position == [0.0, 0.0]));
        assert!(bubbles.iter().all(Bubble::is_valid));
    }

    #[test]
    fn same_seed_reproduces_set() {
        let first = create_seeded(32, 256.0, 256.0, Some(9));
        let second = create_seeded(32, 256.0, 256.0, Some(9));
        assert_eq!(first, second);
        let other = create_seeded(32, 256.0, 256.0, Some(10));
        assert_ne!(first, other);
    }

    #[test]
    fn record_is_twenty_bytes_in_field_order() {
        let bubble = Bubble::new([1.0, 2.0], [-3.5, 4.25], 12.0);
        let bytes = bubble.to_le_bytes();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(-3.5f32).to_le_bytes());
        assert_eq!(&bytes[16..20], &12.0f32.to_le_bytes());
        assert_eq!(Bubble::from_le_bytes(&bytes), bubble);
    }

    #[test]
    fn gpu_view_matches_wire_encoding() {
        let bubbles = create_seeded(8, 64.0, 64.0, Some(5));
        let encoded = encode(&bubbles);
        assert_eq!(encoded.len(), 8 * BUBBLE_STRIDE);
        if cfg!(target_endian = "little") {
            assert_eq!(as_gpu_bytes(&bubbles), encoded.as_slice());
        }
        assert_eq!(decode(&encoded).unwrap(), bubbles);
    }

    #[test]
    fn decode_rejects_partial_records() {
        let err = decode(&[0u8; 21]).unwrap_err();
        assert_eq!(err, LayoutError::Misaligned(21));
    }
}
