//! Undoing MT19937's tempering, which turns any 624 consecutive outputs into a working copy of the
//! generator.

use log::debug;

use super::{
    params::{B, C, D, L, N, S, T, U},
    Mt19937,
};

/// Bits `lo..hi` set.
fn window(lo: u32, hi: u32) -> u32 {
    let width = hi - lo;
    if width >= u32::BITS {
        u32::MAX
    } else {
        ((1 << width) - 1) << lo
    }
}

/// Invert `y = x ^ ((x << shift) & mask)`.
///
/// The lowest `shift` bits of `x` equal those of `y`, since the shifted term is zero there. Every
/// following `shift` bit window of `x` only depends on the window below it, so the windows are
/// resolved from the low end upwards.
pub fn undo_left_shift(y: u32, shift: u32, mask: u32) -> u32 {
    assert!((1..u32::BITS).contains(&shift), "shift of {shift}");

    let mut x = 0;
    let mut lo = 0;
    while lo < u32::BITS {
        let hi = (lo + shift).min(u32::BITS);
        x |= (y ^ ((x << shift) & mask)) & window(lo, hi);
        lo = hi;
    }
    x
}

/// Invert `y = x ^ ((x >> shift) & mask)`, resolving `shift` bit windows from the high end
/// downwards.
pub fn undo_right_shift(y: u32, shift: u32, mask: u32) -> u32 {
    assert!((1..u32::BITS).contains(&shift), "shift of {shift}");

    let mut x = 0;
    let mut hi = u32::BITS;
    while hi > 0 {
        let lo = hi.saturating_sub(shift);
        x |= (y ^ ((x >> shift) & mask)) & window(lo, hi);
        hi = lo;
    }
    x
}

/// Recover the state word that [`super::temper`] turned into `y`.
pub fn untemper(y: u32) -> u32 {
    let y = undo_right_shift(y, L, u32::MAX);
    let y = undo_left_shift(y, T, C);
    let y = undo_left_shift(y, S, B);
    undo_right_shift(y, U, D)
}

/// Build a generator that continues from where `outputs` left off.
///
/// The outputs don't need to line up with a twist: the twist only depends on the untempered words,
/// and applying it in place to any 624 consecutive words yields the 624 that follow.
pub fn clone_from_outputs(outputs: &[u32; N]) -> Mt19937 {
    debug!("cloning generator from {N} outputs");
    Mt19937 {
        mt: outputs.map(untemper),
        index: N,
    }
}
