use num_traits::AsPrimitive;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    canvas::Canvas,
    darkness::Darkness,
    geometry::Segment,
    pins::PinTable,
    recency::RecencyWindow,
    verboser::{Message, Verboser},
    Float,
};

/// One accepted chord, directed from the pin the thread came from to the
/// pin it was wound onto.
#[derive(Clone, Copy, Debug)]
pub struct Step<S> {
    pub from: usize,
    pub to: usize,
    pub segment: Segment<S>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Iteration budget: at most this many chords are drawn.
    pub line_count: usize,
    /// Pin the thread is tied to before the first chord.
    pub start_pin: usize,
    /// How many of the most recently visited pins are barred from
    /// candidacy. An empirical constant, not a derived one.
    pub window_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            line_count: 1000,
            start_pin: 0,
            window_size: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// No remaining legal chord offers any positive darkness reduction.
    Converged,
    /// The line budget ran out first.
    Exhausted,
}

/// The greedy selection loop. Owns the canvas and the pin table for the
/// lifetime of one run; rendering happens in the per-step observer, so the
/// scheduler stays free of output-format concerns.
pub struct Algorithm<S, D> {
    table: PinTable<S>,
    canvas: Canvas<S>,
    darkness: D,
    window: RecencyWindow,
    steps: Vec<Step<S>>,
    current: usize,
    start_pin: usize,
    line_count: usize,
}

impl<S: Float, D: Darkness<S>> Algorithm<S, D> {
    pub fn new(
        table: PinTable<S>,
        canvas: Canvas<S>,
        darkness: D,
        settings: Settings,
    ) -> Result<Self, Error> {
        if settings.line_count < 1 {
            return Err(Error::LineCount);
        }
        if settings.start_pin >= table.len() {
            return Err(Error::StartPin {
                start_pin: settings.start_pin,
                pin_count: table.len(),
            });
        }
        Ok(Self {
            table,
            canvas,
            darkness,
            window: RecencyWindow::new(settings.window_size),
            steps: Vec::with_capacity(settings.line_count),
            current: settings.start_pin,
            start_pin: settings.start_pin,
            line_count: settings.line_count,
        })
    }

    pub fn table(&self) -> &PinTable<S> {
        &self.table
    }

    pub fn canvas(&self) -> &Canvas<S> {
        &self.canvas
    }

    pub fn steps(&self) -> &[Step<S>] {
        &self.steps
    }

    /// The visited pin indices, starting pin included.
    pub fn sequence(&self) -> Vec<usize> {
        let mut sequence = Vec::with_capacity(self.steps.len() + 1);
        sequence.push(self.start_pin);
        sequence.extend(self.steps.iter().map(|step| step.to));
        sequence
    }
}

impl<S: Float, D: Darkness<S>> Algorithm<S, D>
where
    usize: AsPrimitive<S>,
    S: AsPrimitive<i64>,
{
    /// Runs the loop to termination, invoking `on_step` after every
    /// accepted chord. Deterministic: identical inputs always yield the
    /// identical pin sequence.
    pub fn compute(
        &mut self,
        verboser: &mut impl Verboser,
        mut on_step: impl FnMut(&Step<S>),
    ) -> Termination {
        while self.steps.len() < self.line_count {
            verboser.verbose(Message::Computing(self.steps.len()));
            let next = match self.best_candidate() {
                Some(pin) => pin,
                None => return Termination::Converged,
            };
            let segment = self.table.segment(self.current, next);
            self.canvas.erase_segment(&segment, &self.darkness);
            self.window.push(next);
            let step = Step {
                from: self.current,
                to: next,
                segment,
            };
            on_step(&step);
            self.steps.push(step);
            self.current = next;
        }
        Termination::Exhausted
    }

    /// Scores every legal candidate chord from the current pin and picks
    /// the darkest. Candidates are ranked as if scanned sequentially in
    /// increasing offset order from current + 1; the parallel reduction
    /// keeps that order for ties, so the first pin reaching the maximum
    /// wins no matter how the work is split.
    fn best_candidate(&self) -> Option<usize> {
        let pin_count = self.table.len();
        (1..pin_count)
            .into_par_iter()
            .filter_map(|offset| {
                let pin = (self.current + offset) % pin_count;
                if self.window.contains(pin) {
                    return None;
                }
                let score = self
                    .canvas
                    .score_segment(&self.table.segment(self.current, pin));
                if score > S::ZERO {
                    Some((offset, score))
                } else {
                    None
                }
            })
            .reduce_with(|best, other| {
                if other.1 > best.1 || (other.1 == best.1 && other.0 < best.0) {
                    other
                } else {
                    best
                }
            })
            .map(|(offset, _)| (self.current + offset) % pin_count)
    }

    /// Vector rendition of the accepted chords, pins drawn as dots.
    pub fn build_svg(&self, line_thickness: f32) -> svg::Document {
        let grid = self.canvas.grid();
        let mut doc = svg::Document::new()
            .set("viewBox", format!("0 0 {} {}", grid.width, grid.height));
        for pin in self.table.pins() {
            doc = doc.add(
                svg::node::element::Circle::new()
                    .set("cx", format!("{:.4}", pin.x))
                    .set("cy", format!("{:.4}", pin.y))
                    .set("r", format!("{:.4}", line_thickness.max(1.0)))
                    .set("fill", "black"),
            );
        }
        for step in self.steps.iter() {
            doc = doc.add(
                svg::node::element::Line::new()
                    .set("x1", format!("{:.4}", step.segment.start.x))
                    .set("y1", format!("{:.4}", step.segment.start.y))
                    .set("x2", format!("{:.4}", step.segment.end.x))
                    .set("y2", format!("{:.4}", step.segment.end.y))
                    .set("stroke", "black")
                    .set("stroke-width", format!("{:.4}", line_thickness)),
            );
        }
        doc
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Line budget must be at least 1")]
    LineCount,
    #[error("Starting pin {start_pin} is out of range for {pin_count} pins")]
    StartPin { start_pin: usize, pin_count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        darkness::{FlatDarkness, FullDarkness},
        verboser::Silent,
        Grid,
    };

    fn uniform_canvas(radius: usize, value: f64) -> Canvas<f64> {
        let grid = Grid::square(radius);
        Canvas::from_weights(vec![value; grid.len()], grid).unwrap()
    }

    fn scrambled_canvas(radius: usize) -> Canvas<f64> {
        let grid = Grid::square(radius);
        let weights = (0..grid.len())
            .map(|i| (i.wrapping_mul(2654435761) % 256) as f64)
            .collect();
        Canvas::from_weights(weights, grid).unwrap()
    }

    fn settings(line_count: usize) -> Settings {
        Settings {
            line_count,
            ..Settings::default()
        }
    }

    #[test]
    fn configuration_errors_surface_before_the_loop() {
        let table = PinTable::circular(10.0f64, 8, &mut Silent).unwrap();
        let canvas = uniform_canvas(10, 100.0);
        assert!(matches!(
            Algorithm::new(table.clone(), canvas, FullDarkness, settings(0)),
            Err(Error::LineCount)
        ));
        let canvas = uniform_canvas(10, 100.0);
        assert!(matches!(
            Algorithm::new(
                table,
                canvas,
                FullDarkness,
                Settings {
                    start_pin: 8,
                    ..settings(5)
                }
            ),
            Err(Error::StartPin { .. })
        ));
    }

    #[test]
    fn uniform_canvas_picks_the_diametric_pin_first() {
        // With every pixel equally dark the longest chord collects the
        // largest sum, and from pin 0 of 8 that is the diameter to pin 4.
        let table = PinTable::circular(50.0f64, 8, &mut Silent).unwrap();
        let canvas = uniform_canvas(50, 100.0);
        let mut algorithm =
            Algorithm::new(table, canvas, FullDarkness, settings(5)).unwrap();
        algorithm.compute(&mut Silent, |_| {});
        assert_eq!(algorithm.steps()[0].from, 0);
        assert_eq!(algorithm.steps()[0].to, 4);
    }

    #[test]
    fn empty_canvas_converges_without_steps() {
        let table = PinTable::circular(20.0f64, 16, &mut Silent).unwrap();
        let canvas = uniform_canvas(20, 0.0);
        let mut algorithm =
            Algorithm::new(table, canvas, FullDarkness, settings(100)).unwrap();
        assert_eq!(algorithm.compute(&mut Silent, |_| {}), Termination::Converged);
        assert!(algorithm.steps().is_empty());
        assert_eq!(algorithm.sequence(), vec![0]);
    }

    #[test]
    fn single_bright_pixel_selects_its_chord_then_converges() {
        let table = PinTable::circular(30.0f64, 12, &mut Silent).unwrap();
        let grid = Grid::square(30);
        // Put the only darkness on a mid-chord pixel of the diameter from
        // the starting pin.
        let chord = table.segment(0, 6);
        let pixels: Vec<_> = chord.pixels().collect();
        let target = pixels[pixels.len() / 2];
        let target_idx = grid
            .index_of(crate::geometry::Point::new(target.x as usize, target.y as usize))
            .unwrap();
        let mut weights = vec![0.0f64; grid.len()];
        weights[target_idx] = 100.0;
        let canvas = Canvas::from_weights(weights, grid).unwrap();

        let mut algorithm =
            Algorithm::new(table, canvas, FullDarkness, settings(10)).unwrap();
        let termination = algorithm.compute(&mut Silent, |_| {});
        assert_eq!(termination, Termination::Converged);
        assert_eq!(algorithm.steps().len(), 1);
        let chosen = algorithm.steps()[0].segment;
        assert!(chosen.pixels().any(|point| point == target));
    }

    #[test]
    fn terminates_converged_before_exhausting_a_generous_budget() {
        let table = PinTable::circular(20.0f64, 8, &mut Silent).unwrap();
        let canvas = uniform_canvas(20, 10.0);
        let mut algorithm =
            Algorithm::new(table, canvas, FullDarkness, settings(5000)).unwrap();
        assert_eq!(algorithm.compute(&mut Silent, |_| {}), Termination::Converged);
        assert!(algorithm.steps().len() < 5000);
    }

    #[test]
    fn rich_canvas_exhausts_a_small_budget() {
        let table = PinTable::circular(40.0f64, 32, &mut Silent).unwrap();
        let canvas = scrambled_canvas(40);
        let mut algorithm =
            Algorithm::new(table, canvas, FlatDarkness(15.0), settings(10)).unwrap();
        assert_eq!(algorithm.compute(&mut Silent, |_| {}), Termination::Exhausted);
        assert_eq!(algorithm.steps().len(), 10);
    }

    #[test]
    fn identical_inputs_give_identical_sequences() {
        let run = || {
            let table = PinTable::circular(40.0f64, 24, &mut Silent).unwrap();
            let canvas = scrambled_canvas(40);
            let mut algorithm =
                Algorithm::new(table, canvas, FlatDarkness(15.0), settings(80)).unwrap();
            algorithm.compute(&mut Silent, |_| {});
            algorithm.sequence()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn recency_window_bars_the_last_three_pins() {
        let table = PinTable::circular(40.0f64, 16, &mut Silent).unwrap();
        let canvas = scrambled_canvas(40);
        let mut algorithm =
            Algorithm::new(table, canvas, FlatDarkness(50.0), settings(60)).unwrap();
        algorithm.compute(&mut Silent, |_| {});
        let sequence = algorithm.sequence();
        assert!(sequence.len() > 4);
        // The window only ever holds selected pins, so compare each pick
        // against the previous three selections (indices >= 1).
        for i in 1..sequence.len() {
            for back in 1..=3usize {
                if i > back {
                    assert_ne!(
                        sequence[i],
                        sequence[i - back],
                        "pin {} repeated within the recency window",
                        sequence[i]
                    );
                }
            }
        }
    }

    #[test]
    fn observer_sees_every_accepted_step() {
        let table = PinTable::circular(30.0f64, 16, &mut Silent).unwrap();
        let canvas = scrambled_canvas(30);
        let mut algorithm =
            Algorithm::new(table, canvas, FullDarkness, settings(25)).unwrap();
        let mut seen = Vec::new();
        algorithm.compute(&mut Silent, |step| seen.push((step.from, step.to)));
        assert_eq!(seen.len(), algorithm.steps().len());
        for (step, (from, to)) in algorithm.steps().iter().zip(seen) {
            assert_eq!((step.from, step.to), (from, to));
        }
    }
}
