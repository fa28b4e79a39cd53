//! Random host data for sample inputs.
//!
//! All fills write every `inc`-th element starting at index 0 and leave the
//! rest untouched. An increment of 0 is treated as 1.

use anyhow::{Context, Result};
use num_complex::Complex;
use num_traits::{NumCast, Zero};
use rand::distr::uniform::SampleUniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};
use tracing::debug;

/// Generator used for every fill.
pub type HostRng = ChaCha8Rng;

/// Seeded generator when `seed` is given, otherwise seeded from the OS.
pub fn host_rng(seed: Option<u64>) -> HostRng {
    match seed {
        Some(seed) => {
            debug!(seed, "using fixed RNG seed");
            ChaCha8Rng::seed_from_u64(seed)
        }
        None => ChaCha8Rng::from_os_rng(),
    }
}

fn strided<T>(v: &mut [T], inc: usize) -> impl Iterator<Item = &mut T> {
    v.iter_mut().step_by(inc.max(1))
}

/// Standard normal values, `N(0, 1)`.
pub fn fill_normal<T, R>(rng: &mut R, v: &mut [T], inc: usize)
where
    R: Rng,
    StandardNormal: Distribution<T>,
{
    for x in strided(v, inc) {
        *x = StandardNormal.sample(rng);
    }
}

/// Integers drawn uniformly from `[-range, range]`, converted to `T`.
pub fn fill_uniform_int<T, R>(rng: &mut R, v: &mut [T], inc: usize, range: i32)
where
    T: NumCast + Zero,
    R: Rng,
{
    let range = range.abs();
    for x in strided(v, inc) {
        let draw = rng.random_range(-range..=range);
        *x = T::from(draw).unwrap_or_else(T::zero);
    }
}

/// Complex values whose real and imaginary parts are independent integer draws
/// from `[-range, range]`.
pub fn fill_uniform_int_complex<T, R>(rng: &mut R, v: &mut [Complex<T>], inc: usize, range: i32)
where
    T: NumCast + Zero + Clone,
    R: Rng,
{
    let range = range.abs();
    for x in strided(v, inc) {
        let re = rng.random_range(-range..=range);
        let im = rng.random_range(-range..=range);
        *x = Complex::new(T::from(re).unwrap_or_else(T::zero), T::from(im).unwrap_or_else(T::zero));
    }
}

/// Complex values with both parts drawn uniformly from `[low, high)`.
pub fn fill_uniform_real_complex<T, R>(
    rng: &mut R,
    v: &mut [Complex<T>],
    inc: usize,
    low: T,
    high: T,
) -> Result<()>
where
    T: SampleUniform,
    R: Rng,
{
    let dist = Uniform::new(low, high).context("invalid uniform range")?;
    for x in strided(v, inc) {
        *x = Complex::new(dist.sample(rng), dist.sample(rng));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_same_data() {
        let mut a = vec![0.0f32; 16];
        let mut b = vec![0.0f32; 16];
        fill_normal(&mut host_rng(Some(7)), &mut a, 1);
        fill_normal(&mut host_rng(Some(7)), &mut b, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn increment_skips_untouched_elements() {
        let mut v = vec![100i32; 9];
        fill_uniform_int(&mut host_rng(Some(1)), &mut v, 3, 3);
        for (i, &x) in v.iter().enumerate() {
            if i % 3 == 0 {
                assert!((-3..=3).contains(&x), "index {i} = {x}");
            } else {
                assert_eq!(x, 100);
            }
        }
    }

    #[test]
    fn zero_increment_fills_everything() {
        let mut v = vec![10.0f64; 4];
        fill_uniform_int(&mut host_rng(Some(2)), &mut v, 0, 1);
        assert!(v.iter().all(|x| x.abs() <= 1.0));
    }

    #[test]
    fn complex_int_parts_are_integers_in_range() {
        let mut v = vec![Complex::new(0.0f32, 0.0); 32];
        fill_uniform_int_complex(&mut host_rng(Some(3)), &mut v, 1, 3);
        for z in v {
            assert_eq!(z.re.fract(), 0.0);
            assert_eq!(z.im.fract(), 0.0);
            assert!(z.re.abs() <= 3.0 && z.im.abs() <= 3.0);
        }
    }

    #[test]
    fn uniform_real_respects_bounds() {
        let mut v = vec![Complex::new(0.0f32, 0.0); 64];
        fill_uniform_real_complex(&mut host_rng(Some(4)), &mut v, 1, 100.0, 300.0).unwrap();
        assert!(v.iter().all(|z| (100.0..300.0).contains(&z.re) && (100.0..300.0).contains(&z.im)));
        let mut empty_range = vec![Complex::new(0.0f64, 0.0); 4];
        let filled = fill_uniform_real_complex(&mut host_rng(Some(4)), &mut empty_range, 1, 1.0, 1.0);
        assert!(filled.is_err());
    }
}
