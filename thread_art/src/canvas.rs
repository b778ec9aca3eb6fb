use image::{imageops::FilterType, DynamicImage, GrayImage};
use num_traits::{AsPrimitive, ToPrimitive};

use crate::{darkness::Darkness, geometry::Segment, Float, Grid};

/// Scales and inverts a source image for a circular frame of the given
/// radius: center-fill to the 2r square, grayscale, invert. Bright values
/// in the result mean ink still to be placed.
pub fn prepare(image: &DynamicImage, radius: u32) -> GrayImage {
    let size = 2 * radius;
    let mut luma = image
        .resize_to_fill(size, size, FilterType::Lanczos3)
        .to_luma8();
    image::imageops::invert(&mut luma);
    luma
}

/// Mutable residual-darkness buffer the scheduler scores against and
/// consumes. Weights stay on the 0..=255 scale of the source image.
pub struct Canvas<S> {
    weights: Vec<S>,
    grid: Grid,
}

impl<S: Float> Canvas<S> {
    /// Builds the canvas from an inverted grayscale image, zeroing every
    /// pixel outside the circular mask so chords only score the frame.
    pub fn from_luma(luma: &GrayImage, radius: u32) -> Result<Self, Error>
    where
        u8: AsPrimitive<S>,
        u32: AsPrimitive<S>,
    {
        let grid = Grid::square(radius as usize);
        if (luma.width() as usize, luma.height() as usize) != (grid.width, grid.height) {
            return Err(Error::Dimensions {
                expected: 2 * radius,
                width: luma.width(),
                height: luma.height(),
            });
        }
        let r: S = radius.as_();
        let sq_radius = r * r;
        let weights = luma
            .enumerate_pixels()
            .map(|(x, y, pixel)| {
                let dx: S = x.as_() - r;
                let dy: S = y.as_() - r;
                if dx * dx + dy * dy <= sq_radius {
                    pixel.0[0].as_()
                } else {
                    S::ZERO
                }
            })
            .collect();
        Ok(Self { weights, grid })
    }

    pub fn from_weights(weights: Vec<S>, grid: Grid) -> Result<Self, Error> {
        if weights.len() != grid.len() {
            return Err(Error::Dimensions {
                expected: grid.width as u32,
                width: grid.width as u32,
                height: (weights.len() / grid.width.max(1)) as u32,
            });
        }
        Ok(Self { weights, grid })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn weights(&self) -> &[S] {
        &self.weights
    }

    /// Summed residual darkness along the chord. Read-only: candidate
    /// scoring never mutates the canvas.
    pub fn score_segment(&self, seg: &Segment<S>) -> S
    where
        usize: AsPrimitive<S>,
        S: AsPrimitive<i64>,
    {
        let mut sum = S::ZERO;
        for idx in self.grid.indexes_in_segment(seg) {
            // Grid::index_of already bounds-checked idx.
            sum += unsafe { *self.weights.get_unchecked(idx) };
        }
        sum
    }

    /// Consumes darkness along an accepted chord with the injected
    /// strategy.
    pub fn erase_segment(&mut self, seg: &Segment<S>, darkness: &impl Darkness<S>)
    where
        usize: AsPrimitive<S>,
        S: AsPrimitive<i64>,
    {
        for idx in self.grid.indexes_in_segment(seg) {
            let weight = unsafe { self.weights.get_unchecked_mut(idx) };
            *weight = darkness.compute(*weight);
        }
    }

    /// Residual darkness as a grayscale snapshot.
    pub fn to_luma(&self) -> GrayImage {
        let pixels = self
            .weights
            .iter()
            .map(|weight| weight.round().to_u8().unwrap_or(u8::MAX))
            .collect();
        GrayImage::from_vec(self.grid.width as u32, self.grid.height as u32, pixels)
            .unwrap_or_else(|| GrayImage::new(self.grid.width as u32, self.grid.height as u32))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Expected a {expected}x{expected} image, got {width}x{height}")]
    Dimensions {
        expected: u32,
        width: u32,
        height: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::darkness::{FlatDarkness, FullDarkness};
    use crate::geometry::Point;

    fn uniform(radius: usize, value: f64) -> Canvas<f64> {
        let grid = Grid::square(radius);
        Canvas::from_weights(vec![value; grid.len()], grid).unwrap()
    }

    #[test]
    fn from_weights_checks_dimensions() {
        let grid = Grid::square(4);
        assert!(Canvas::from_weights(vec![0.0f64; 3], grid).is_err());
        assert!(Canvas::from_weights(vec![0.0f64; grid.len()], grid).is_ok());
    }

    #[test]
    fn mask_zeroes_outside_the_circle() {
        let radius = 8u32;
        let luma = GrayImage::from_pixel(16, 16, image::Luma([200u8]));
        let canvas: Canvas<f64> = Canvas::from_luma(&luma, radius).unwrap();
        // Corner is outside the circle, center is inside.
        assert_eq!(canvas.weights()[0], 0.0);
        let center = canvas.grid().index_of(Point::new(8, 8)).unwrap();
        assert_eq!(canvas.weights()[center], 200.0);
    }

    #[test]
    fn from_luma_rejects_mismatched_sizes() {
        let luma = GrayImage::new(10, 10);
        assert!(Canvas::<f64>::from_luma(&luma, 8).is_err());
    }

    #[test]
    fn score_sums_touched_pixels() {
        let canvas = uniform(10, 3.0);
        let seg = Segment::new(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        // 10 samples, all in range, all weight 3.
        assert_eq!(canvas.score_segment(&seg), 30.0);
    }

    #[test]
    fn erase_full_zeroes_the_chord() {
        let mut canvas = uniform(10, 3.0);
        let seg = Segment::new(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        canvas.erase_segment(&seg, &FullDarkness);
        assert_eq!(canvas.score_segment(&seg), 0.0);
    }

    #[test]
    fn erase_flat_decrements_the_chord() {
        let mut canvas = uniform(10, 20.0);
        let seg = Segment::new(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        canvas.erase_segment(&seg, &FlatDarkness(15.0));
        assert_eq!(canvas.score_segment(&seg), 50.0);
        canvas.erase_segment(&seg, &FlatDarkness(15.0));
        assert_eq!(canvas.score_segment(&seg), 0.0);
    }
}
