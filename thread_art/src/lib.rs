pub mod geometry {
    pub mod point;
    pub mod segment;

    pub use point::Point;
    pub use segment::{Pixels, Segment};
}

mod algorithm;
pub mod canvas;
pub mod darkness;
mod float;
pub mod grid;
pub mod pins;
pub mod recency;
pub mod renderer;
pub mod verboser;

pub use algorithm::*;
pub use canvas::Canvas;
pub use darkness::Darkness;
pub use float::Float;
pub use grid::Grid;
pub use pins::PinTable;
pub use renderer::{RenderedOutput, Renderer, Stroke};
