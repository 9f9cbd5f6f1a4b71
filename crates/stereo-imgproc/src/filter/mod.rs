mod kernels;
pub use kernels::*;

mod ops;
pub use ops::*;

/// Map an index outside of `[0, len)` back inside mirroring around the border
/// pixel without repeating it (`gfedcb|abcdefgh|gfedcba`).
pub(crate) fn reflect_101(i: isize, len: usize) -> usize {
    let n = len as isize;
    if n <= 1 {
        return 0;
    }

    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * (n - 1) - i;
        } else {
            return i as usize;
        }
    }
}
