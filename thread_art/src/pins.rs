use num_traits::AsPrimitive;

use crate::{
    geometry::{Point, Segment},
    verboser::{self, Message},
    Float,
};

/// Evenly spaced pins on a circle of the given radius, centered at
/// (radius, radius) so the circle fills the 2r square raster.
#[derive(Clone)]
pub struct PinTable<S> {
    pins: Vec<Point<S>>,
    radius: S,
}

impl<S: Float> PinTable<S> {
    pub fn circular(
        radius: S,
        pin_count: usize,
        verboser: &mut impl verboser::Verboser,
    ) -> Result<Self, Error>
    where
        usize: AsPrimitive<S>,
    {
        if radius <= S::ZERO {
            return Err(Error::Radius);
        }
        if pin_count < 2 {
            return Err(Error::PinCount);
        }
        let pins = (0..pin_count)
            .map(|i| {
                verboser.verbose(Message::CreatingPin(i));
                // Sampling pin_count + 1 angles over the closed [0, 2π] and
                // dropping the duplicate endpoint leaves 2π·i/pin_count.
                let theta: S = S::TWO * S::PI * i.as_() / pin_count.as_();
                Point {
                    x: radius + radius * theta.cos(),
                    y: radius + radius * theta.sin(),
                }
            })
            .collect();
        verboser.verbose(Message::CreatingPin(pin_count));
        Ok(Self { pins, radius })
    }

    pub fn pins(&self) -> &[Point<S>] {
        &self.pins
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn radius(&self) -> S {
        self.radius
    }

    /// The chord between two pins, directed from → to.
    pub fn segment(&self, from: usize, to: usize) -> Segment<S> {
        Segment::new(self.pins[from], self.pins[to])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Radius must be positive")]
    Radius,
    #[error("Pin count must be at least 2")]
    PinCount,
}
