//! SIMD-accelerated vector kernels for the CG solvers
//!
//! When the `simd` feature is enabled these use 256-bit lanes (f64x4), which
//! lower to SSE/AVX/NEON natively and to paired 128-bit ops under WASM SIMD.
//! The vectorized reductions accumulate four partial sums and combine them at
//! the end, so results can differ from the scalar path in the last bits.
//!
//! All operations have scalar fallbacks when SIMD is disabled. The scalar
//! reductions accumulate strictly left to right.

#[cfg(feature = "simd")]
use wide::f64x4;

/// SIMD lane width (4 for f64x4)
#[cfg(feature = "simd")]
pub const SIMD_WIDTH: usize = 4;

#[cfg(not(feature = "simd"))]
pub const SIMD_WIDTH: usize = 1;

#[cfg(feature = "simd")]
#[inline]
fn load(a: &[f64], idx: usize) -> f64x4 {
    f64x4::new([a[idx], a[idx + 1], a[idx + 2], a[idx + 3]])
}

// ============================================================================
// Reductions
// ============================================================================

/// Compute dot product: sum(a[i] * b[i])
#[cfg(feature = "simd")]
#[inline]
pub fn dot_product_f64(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len();
    let chunks = n / SIMD_WIDTH;
    let remainder = n % SIMD_WIDTH;

    let mut sum = f64x4::ZERO;

    for i in 0..chunks {
        let idx = i * SIMD_WIDTH;
        sum += load(a, idx) * load(b, idx);
    }

    let mut result = sum.reduce_add();

    let start = chunks * SIMD_WIDTH;
    for i in 0..remainder {
        result += a[start + i] * b[start + i];
    }

    result
}

#[cfg(not(feature = "simd"))]
#[inline]
pub fn dot_product_f64(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut result = 0.0;
    for (&ai, &bi) in a.iter().zip(b.iter()) {
        result += ai * bi;
    }
    result
}

/// Compute squared norm: sum(a[i]^2)
#[inline]
pub fn norm_squared_f64(a: &[f64]) -> f64 {
    dot_product_f64(a, a)
}

// ============================================================================
// Fused Multiply-Add Operations
// ============================================================================

/// Compute a[i] = a[i] + alpha * b[i] (axpy operation)
#[cfg(feature = "simd")]
#[inline]
pub fn axpy_f64(a: &mut [f64], alpha: f64, b: &[f64]) {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len();
    let chunks = n / SIMD_WIDTH;
    let remainder = n % SIMD_WIDTH;

    let valpha = f64x4::splat(alpha);

    for i in 0..chunks {
        let idx = i * SIMD_WIDTH;
        let result = load(a, idx) + valpha * load(b, idx);
        a[idx..idx + SIMD_WIDTH].copy_from_slice(result.as_array_ref());
    }

    let start = chunks * SIMD_WIDTH;
    for i in 0..remainder {
        a[start + i] += alpha * b[start + i];
    }
}

#[cfg(not(feature = "simd"))]
#[inline]
pub fn axpy_f64(a: &mut [f64], alpha: f64, b: &[f64]) {
    debug_assert_eq!(a.len(), b.len());
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        *ai += alpha * bi;
    }
}

/// Compute a[i] = b[i] + beta * a[i] (search direction update)
#[cfg(feature = "simd")]
#[inline]
pub fn xpby_f64(a: &mut [f64], b: &[f64], beta: f64) {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len();
    let chunks = n / SIMD_WIDTH;
    let remainder = n % SIMD_WIDTH;

    let vbeta = f64x4::splat(beta);

    for i in 0..chunks {
        let idx = i * SIMD_WIDTH;
        let result = load(b, idx) + vbeta * load(a, idx);
        a[idx..idx + SIMD_WIDTH].copy_from_slice(result.as_array_ref());
    }

    let start = chunks * SIMD_WIDTH;
    for i in 0..remainder {
        a[start + i] = b[start + i] + beta * a[start + i];
    }
}

#[cfg(not(feature = "simd"))]
#[inline]
pub fn xpby_f64(a: &mut [f64], b: &[f64], beta: f64) {
    debug_assert_eq!(a.len(), b.len());
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        *ai = bi + beta * *ai;
    }
}
