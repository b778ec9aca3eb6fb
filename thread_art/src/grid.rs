use num_traits::AsPrimitive;

use crate::{
    geometry::{Point, Segment},
    Float,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    pub height: usize,
    pub width: usize,
}

impl Grid {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// The square raster for a circular frame of the given radius.
    pub fn square(radius: usize) -> Self {
        Self {
            height: 2 * radius,
            width: 2 * radius,
        }
    }

    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_of(&self, point: Point<usize>) -> Option<usize> {
        if point.x < self.width && point.y < self.height {
            Some(point.y * self.width + point.x)
        } else {
            None
        }
    }

    /// Flat buffer indices of every pixel the segment touches.
    ///
    /// Samples landing outside the raster are dropped: the pin at angle
    /// zero sits at x = 2·radius, one column past the buffer, and parallel
    /// stroke passes may leave it on any side.
    pub fn indexes_in_segment<'a, S: Float>(
        &'a self,
        seg: &Segment<S>,
    ) -> impl Iterator<Item = usize> + 'a
    where
        usize: AsPrimitive<S>,
        S: AsPrimitive<i64>,
    {
        seg.pixels()
            .filter_map(|point| point.cast::<usize>())
            .filter_map(|point| self.index_of(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_of_rejects_out_of_range() {
        let grid = Grid::new(4, 8);
        assert_eq!(grid.index_of(Point::new(0, 0)), Some(0));
        assert_eq!(grid.index_of(Point::new(7, 3)), Some(31));
        assert_eq!(grid.index_of(Point::new(8, 0)), None);
        assert_eq!(grid.index_of(Point::new(0, 4)), None);
    }

    #[test]
    fn segment_indexes_skip_outside_samples() {
        let grid = Grid::new(4, 4);
        let seg = Segment::new(Point::new(-3.0f64, 1.0), Point::new(7.0, 1.0));
        let indexes: Vec<_> = grid.indexes_in_segment(&seg).collect();
        assert!(!indexes.is_empty());
        for idx in indexes {
            assert!(idx < grid.len());
        }
    }
}
