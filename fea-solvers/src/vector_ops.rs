//! Dense vector kernels shared by the Krylov solvers and the block builders

use crate::traits::ComplexField;
use ndarray::Array1;
use num_traits::{Float, Zero};

/// Compute inner product (x, y) = Σ conj(x_i) * y_i
#[inline]
pub fn inner_product<T: ComplexField>(x: &Array1<T>, y: &Array1<T>) -> T {
    assert_eq!(
        x.len(),
        y.len(),
        "Vector lengths must match for inner product"
    );
    x.iter()
        .zip(y.iter())
        .fold(T::zero(), |acc, (xi, yi)| acc + xi.conj() * *yi)
}

/// Compute vector 2-norm: ||x||_2 = sqrt(Σ |x_i|^2)
#[inline]
pub fn vector_norm<T: ComplexField>(x: &Array1<T>) -> T::Real {
    vector_norm_sqr(x).sqrt()
}

/// Compute vector norm squared: ||x||_2^2 = Σ |x_i|^2
#[inline]
pub fn vector_norm_sqr<T: ComplexField>(x: &Array1<T>) -> T::Real {
    x.iter()
        .fold(T::Real::zero(), |acc, xi| acc + xi.norm_sqr())
}

/// Euclidean norm of the concatenation {a; b} without allocating it
#[inline]
pub fn stacked_norm<T: ComplexField>(a: &Array1<T>, b: &Array1<T>) -> T::Real {
    (vector_norm_sqr(a) + vector_norm_sqr(b)).sqrt()
}

/// Compute axpy: y = α * x + y
#[inline]
pub fn axpy<T: ComplexField>(alpha: T, x: &Array1<T>, y: &mut Array1<T>) {
    assert_eq!(x.len(), y.len(), "Vector lengths must match for axpy");
    for (xi, yi) in x.iter().zip(y.iter_mut()) {
        *yi += alpha * *xi;
    }
}

/// Compute vector scale in-place: x = α * x
#[inline]
pub fn scale_inplace<T: ComplexField>(x: &mut Array1<T>, alpha: T) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

/// Largest absolute entry, 0 for an empty vector
pub fn max_abs(x: &Array1<f64>) -> f64 {
    x.iter().fold(0.0, |m, v| Float::max(m, v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_inner_product_conjugates_left() {
        let x = array![Complex64::new(0.0, 1.0)];
        let y = array![Complex64::new(0.0, 1.0)];
        let ip = inner_product(&x, &y);
        assert_relative_eq!(ip.re, 1.0);
        assert_relative_eq!(ip.im, 0.0);
    }

    #[test]
    fn test_stacked_norm_matches_concatenation() {
        let a = array![3.0_f64, 0.0];
        let b = array![0.0_f64, 4.0, 0.0];
        assert_relative_eq!(stacked_norm(&a, &b), 5.0);
    }

    #[test]
    fn test_axpy_and_scale() {
        let x = array![1.0_f64, 2.0];
        let mut y = array![1.0_f64, 1.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, array![3.0, 5.0]);
        scale_inplace(&mut y, -1.0);
        assert_eq!(y, array![-3.0, -5.0]);
        assert_relative_eq!(max_abs(&y), 5.0);
    }
}
