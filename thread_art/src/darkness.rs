use crate::Float;

/// Consumption strategy applied to a pixel's residual weight after a chord
/// through it is accepted.
pub trait Darkness<S>: Send + Sync {
    fn compute(&self, weight: S) -> S;
}

/// Consumes the pixel entirely. The reference strategy: fastest
/// convergence, drawn chords never overlap on darkness they already spent.
#[derive(Clone, Copy)]
pub struct FullDarkness;

impl<T: Float> Darkness<T> for FullDarkness {
    fn compute(&self, _: T) -> T {
        T::ZERO
    }
}

/// Subtracts a fixed step, clamped at zero. Leaves residual darkness for
/// later chords to pick up, giving smoother overlap accumulation.
#[derive(Clone, Copy)]
pub struct FlatDarkness<S>(pub S);

impl<T: Float> Darkness<T> for FlatDarkness<T> {
    fn compute(&self, weight: T) -> T {
        (weight - self.0).max(T::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_darkness_zeroes() {
        assert_eq!(FullDarkness.compute(200.0f32), 0.0);
        assert_eq!(FullDarkness.compute(0.0f32), 0.0);
    }

    #[test]
    fn flat_darkness_decrements_and_clamps() {
        let darkness = FlatDarkness(15.0f64);
        assert_eq!(darkness.compute(100.0), 85.0);
        assert_eq!(darkness.compute(10.0), 0.0);
    }
}
