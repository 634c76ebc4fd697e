//! Buffer-level reductions
//!
//! These combine an already computed buffer of products into one `f32`.
//! They back the segmented and tree strategies and double as ready-made
//! [`ReduceCallback`](crate::accelerator::ReduceCallback)s for the
//! accelerator harness, which is why they all take `&mut [f32]`.

use crate::constants::MAX_LANES;
use tracing::trace;

/// Adds the buffer term by term in index order
pub fn reduce_sequential(buf: &mut [f32]) -> f32 {
    let mut sum = 0.0f32;
    for &x in buf.iter() {
        sum += x;
    }
    sum
}

/// Pairwise tree reduction, performed in place
///
/// Each level sums adjacent pairs `buf[2i] + buf[2i+1]` into `buf[i]`.
/// When a level has an odd number of elements the last one is carried
/// forward unpaired into the next level, so `[a, b, c]` reduces to
/// `(a + b) + c` and `[a, b, c, d, e]` to `((a + b) + (c + d)) + e`.
/// The buffer contents are clobbered.
pub fn reduce_tree(buf: &mut [f32]) -> f32 {
    let mut active = buf.len();
    if active == 0 {
        return 0.0;
    }

    let mut level = 0usize;
    while active > 1 {
        let pairs = active / 2;
        for i in 0..pairs {
            buf[i] = buf[2 * i] + buf[2 * i + 1];
        }
        if active % 2 == 1 {
            buf[pairs] = buf[active - 1];
        }
        active = pairs + active % 2;
        level += 1;
        trace!(level, active, "tree level reduced");
    }

    buf[0]
}

/// Wide-lane reduction with the default lane count of 8
pub fn reduce_lanes(buf: &mut [f32]) -> f32 {
    reduce_lanes_with(buf, 8)
}

/// Wide-lane reduction with `lanes` independent accumulators
///
/// Full chunks of `lanes` elements are accumulated lane-wise, the lane sums
/// are combined pairwise, and the `len % lanes` remainder is added
/// sequentially at the end. `lanes` is clamped to `1..=MAX_LANES`.
pub fn reduce_lanes_with(buf: &mut [f32], lanes: usize) -> f32 {
    match lanes.clamp(1, MAX_LANES) {
        1 => reduce_sequential(buf),
        2 => lane_sum::<2>(buf),
        4 => lane_sum::<4>(buf),
        8 => lane_sum::<8>(buf),
        16 => lane_sum::<16>(buf),
        n => lane_sum_dyn(buf, n),
    }
}

// Fixed lane counts keep the accumulators in registers.
fn lane_sum<const L: usize>(buf: &[f32]) -> f32 {
    let mut acc = [0.0f32; L];
    let mut chunks = buf.chunks_exact(L);
    for chunk in &mut chunks {
        for (lane, &x) in acc.iter_mut().zip(chunk) {
            *lane += x;
        }
    }
    let mut sum = reduce_tree(&mut acc);
    for &x in chunks.remainder() {
        sum += x;
    }
    sum
}

fn lane_sum_dyn(buf: &[f32], lanes: usize) -> f32 {
    let mut acc = vec![0.0f32; lanes];
    let mut chunks = buf.chunks_exact(lanes);
    for chunk in &mut chunks {
        for (lane, &x) in acc.iter_mut().zip(chunk) {
            *lane += x;
        }
    }
    let mut sum = reduce_tree(&mut acc);
    for &x in chunks.remainder() {
        sum += x;
    }
    sum
}
