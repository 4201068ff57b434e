use std::f64::consts::PI;

use super::types::{CycleKey, ScenarioKey};

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;
const WEYL_INCREMENT: u32 = 0x6D2B_79F5;

/// State 0 is the only post-increment state in the full 2^32 cycle whose
/// output is zero, so a stream redraws at most once per cycle.
const MAX_ZERO_REDRAWS: u64 = 1;

/// Distinct Weyl states available to one call, shared by all its paths.
pub const STREAM_CAPACITY: u64 = 1 << 32;

/// Mulberry32 stream. One word of state, reproducible, not cryptographic.
#[derive(Debug, Clone)]
pub struct RandomStream {
    state: u32,
}

impl RandomStream {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(WEYL_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = 4_294_967_296.0;
        f64::from(self.next_u32()) / DENOM
    }

    /// Uniform in (0, 1); exact zeros are discarded and redrawn.
    fn next_open_f64(&mut self) -> f64 {
        loop {
            let u = self.next_f64();
            if u > 0.0 {
                return u;
            }
        }
    }

    /// Box-Muller, cosine branch only: one normal per pair of uniforms.
    pub fn standard_normal(&mut self) -> f64 {
        let u = self.next_open_f64();
        let v = self.next_open_f64();
        (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
    }
}

pub fn fnv1a(input: &str) -> u32 {
    input.chars().fold(FNV_OFFSET_BASIS, |hash, c| {
        (hash ^ c as u32).wrapping_mul(FNV_PRIME)
    })
}

/// Base seed for one simulation call. `rounded_score` is the clamped
/// environment score rounded to the nearest integer.
pub fn derive_seed(
    subject_key: &str,
    cycle: CycleKey,
    scenario: ScenarioKey,
    rounded_score: u32,
) -> u32 {
    fnv1a(&format!(
        "{subject_key}|{}|{}|{rounded_score}",
        cycle.as_str(),
        scenario.as_str()
    ))
}

/// Weyl steps reserved per path: two uniforms per period plus the one
/// possible zero redraw.
pub fn path_stride(period_count: usize) -> u64 {
    (period_count as u64)
        .saturating_mul(2)
        .saturating_add(MAX_ZERO_REDRAWS)
}

/// Start state of path `path_index`. Path `i` owns Weyl steps
/// `i * stride + 1 ..= (i + 1) * stride` of the base seed's sequence, so
/// substreams are disjoint while `path_count * stride <= STREAM_CAPACITY`.
/// Depends only on the base seed and the index, never on which worker runs
/// the path.
pub fn path_seed(base_seed: u32, path_index: u64, stride: u64) -> u32 {
    let offset = path_index.wrapping_mul(stride) as u32;
    base_seed.wrapping_add(offset.wrapping_mul(WEYL_INCREMENT))
}
