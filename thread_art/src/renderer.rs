use image::GrayImage;
use num_traits::{AsPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{algorithm::Step, geometry::Segment, Float, Grid};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Stroke<S> {
    /// Stroke width in pixels. Fractional widths render as lighter lines,
    /// widths above one add parallel passes.
    pub width: S,
    /// Gray level the stroke converges to, 0 is full black.
    pub depth: u8,
}

/// Everything a finished run leaves behind: the rendered plate, optional
/// per-step animation frames, and the visited pin sequence.
pub struct RenderedOutput {
    pub image: GrayImage,
    pub frames: Vec<GrayImage>,
    pub sequence: Vec<usize>,
}

/// Accumulates the scheduler's decisions onto a white 2r square surface.
/// Pure output sink: it never sees scores or the darkness canvas, only the
/// accepted chords.
pub struct Renderer<S> {
    surface: Vec<u8>,
    grid: Grid,
    stroke: Stroke<S>,
    sequence: Vec<usize>,
    frames: Vec<GrayImage>,
}

impl<S: Float> Renderer<S> {
    pub fn new(radius: usize, stroke: Stroke<S>, start_pin: usize) -> Self {
        let grid = Grid::square(radius);
        Self {
            surface: vec![u8::MAX; grid.len()],
            grid,
            stroke,
            sequence: vec![start_pin],
            frames: Vec::new(),
        }
    }
}

impl<S: Float> Renderer<S>
where
    usize: AsPrimitive<S>,
    u8: AsPrimitive<S>,
    S: AsPrimitive<i64>,
{
    fn blend(&mut self, seg: &Segment<S>, coverage: S) {
        let grid = self.grid;
        let depth: S = self.stroke.depth.as_();
        for idx in grid.indexes_in_segment(seg) {
            let old: S = self.surface[idx].as_();
            if old > depth {
                // Strokes only ever darken; coverage is in (0, 1].
                let new = old - (old - depth) * coverage;
                self.surface[idx] = new.round().to_u8().unwrap_or(0);
            }
        }
    }

    /// Draws one accepted chord and records the pin it leads to.
    pub fn draw(&mut self, step: &Step<S>) {
        let core = self.stroke.width.min(S::ONE);
        if core > S::ZERO {
            self.blend(&step.segment, core);
        }
        let mut extra = self.stroke.width - S::ONE;
        let mut offset = S::ONE;
        while extra > S::ZERO {
            let coverage = (extra * S::HALF).min(S::ONE);
            self.blend(&step.segment.parallel_at_distance(offset), coverage);
            self.blend(&step.segment.parallel_at_distance(-offset), coverage);
            extra -= S::TWO;
            offset += S::ONE;
        }
        self.sequence.push(step.to);
    }

    /// Captures the current surface as one animation frame.
    pub fn snapshot(&mut self) {
        self.frames.push(self.to_luma());
    }

    fn to_luma(&self) -> GrayImage {
        GrayImage::from_vec(
            self.grid.width as u32,
            self.grid.height as u32,
            self.surface.clone(),
        )
        .unwrap_or_else(|| GrayImage::new(self.grid.width as u32, self.grid.height as u32))
    }

    pub fn finalize(self) -> RenderedOutput {
        RenderedOutput {
            image: GrayImage::from_vec(
                self.grid.width as u32,
                self.grid.height as u32,
                self.surface,
            )
            .unwrap_or_else(|| GrayImage::new(self.grid.width as u32, self.grid.height as u32)),
            frames: self.frames,
            sequence: self.sequence,
        }
    }
}
