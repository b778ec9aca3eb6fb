use std::fmt;
use std::iter::FusedIterator;

use num_traits::AsPrimitive;

use super::Point;
use crate::Float;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment<T> {
    pub start: Point<T>,
    pub end: Point<T>,
}

impl<T> Segment<T> {
    pub fn new(start: Point<T>, end: Point<T>) -> Self {
        Self { start, end }
    }
}

impl<T: fmt::Display> fmt::Display for Segment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:2}, {:2}]", self.start, self.end)
    }
}

impl<T: Float> Segment<T> {
    pub fn length(&self) -> T {
        self.start.distance(&self.end)
    }

    /// Shifts the segment sideways, perpendicular to its own direction.
    /// Used to thicken strokes by drawing parallel passes.
    pub fn parallel_at_distance(&self, distance: T) -> Self {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let length = num_traits::Float::sqrt(dx * dx + dy * dy);
        let offset = Point {
            x: -dy / length * distance,
            y: dx / length * distance,
        };
        Segment::new(self.start + offset, self.end + offset)
    }
}

impl<S: Float> Segment<S>
where
    usize: AsPrimitive<S>,
    S: AsPrimitive<i64>,
{
    /// Rasterizes the segment into the pixels it touches.
    ///
    /// The sample count is the rounded euclidean length; segments shorter
    /// than two pixels touch nothing. Both coordinates are interpolated
    /// linearly and independently over evenly spaced steps from start to
    /// end inclusive, each sample truncated to its pixel. A single-axis
    /// stepping scheme would undercount diagonal chords, and the chord
    /// scores depend on this density being proportional to length.
    pub fn pixels(&self) -> Pixels<S> {
        let len = match self.length().round().to_usize() {
            Some(len) if len >= 2 => len,
            _ => 0,
        };
        Pixels {
            start: self.start,
            diff: self.end - self.start,
            denom: len.saturating_sub(1).as_(),
            index: 0,
            len,
        }
    }
}

pub struct Pixels<S> {
    start: Point<S>,
    diff: Point<S>,
    denom: S,
    index: usize,
    len: usize,
}

impl<S: Float> Iterator for Pixels<S>
where
    usize: AsPrimitive<S>,
    S: AsPrimitive<i64>,
{
    type Item = Point<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let t = self.index.as_() / self.denom;
        self.index += 1;
        Some((self.start + self.diff * t).trunc().as_())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<S: Float> ExactSizeIterator for Pixels<S>
where
    usize: AsPrimitive<S>,
    S: AsPrimitive<i64>,
{
}

impl<S: Float> FusedIterator for Pixels<S>
where
    usize: AsPrimitive<S>,
    S: AsPrimitive<i64>,
{
}
