use std::{fmt, fs, fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use image::{
    codecs::gif::{GifEncoder, Repeat},
    Delay, DynamicImage, Frame, GrayImage,
};
use num_traits::AsPrimitive;
use thread_art::{
    canvas,
    darkness::{FlatDarkness, FullDarkness},
    verboser::{Message, Verboser},
    Algorithm, Canvas, Darkness, Float, PinTable, Settings, Step, Stroke, Termination,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image path.
    input: PathBuf,

    /// Output directory.
    #[arg(short, long)]
    output: PathBuf,

    /// Radius in pixels of the circular frame.
    #[arg(short, long, default_value_t = 500)]
    radius: u32,

    /// Number of pins surrounding the image.
    #[arg(short, long, default_value_t = 200)]
    pins: usize,

    /// Line budget.
    #[arg(short, long, default_value_t = 1000)]
    lines: usize,

    /// Stroke width in pixels; fractions render lighter lines.
    #[arg(short = 'w', long, default_value_t = 0.5)]
    line_width: f64,

    /// Stroke gray level (0-255), 0 is full black.
    #[arg(short = 'd', long, default_value_t = 0)]
    line_depth: u8,

    /// How consumed darkness is erased from the canvas.
    #[arg(long, default_value_t = DarknessMode::Full)]
    darkness_mode: DarknessMode,

    /// Decrement per pass when the darkness mode is flat.
    #[arg(long, default_value_t = 15.0)]
    darkness_value: f64,

    /// How many recently visited pins are barred from candidacy.
    #[arg(long, default_value_t = 3)]
    window: usize,

    /// Pin the thread starts from.
    #[arg(long, default_value_t = 0)]
    start_pin: usize,

    /// Precision of calculations (Single/Double).
    #[arg(long, default_value_t = Precision::Single)]
    precision: Precision,

    /// Save the inverted grayscale intermediate.
    #[arg(long)]
    inverted: bool,

    /// Save the circularly masked canvas intermediate.
    #[arg(long)]
    masked: bool,

    /// Assemble one GIF frame per drawn chord.
    #[arg(short, long)]
    gif: bool,

    /// Also write the pattern as an SVG document.
    #[arg(long)]
    svg: bool,

    /// Print the visited pin sequence.
    #[arg(long)]
    print_pins: bool,

    /// Write the visited pin sequence as JSON.
    #[arg(long)]
    pins_json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DarknessMode {
    /// Zero out consumed pixels entirely.
    Full,
    /// Subtract a fixed step per pass.
    Flat,
}

impl fmt::Display for DarknessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Full => "full",
            Self::Flat => "flat",
        })
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Precision {
    Single,
    Double,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single",
            Self::Double => "double",
        })
    }
}

struct Progress {
    total: usize,
}

impl Verboser for Progress {
    fn verbose(&mut self, message: Message) {
        match message {
            Message::Computing(step) if step % 100 == 0 => {
                eprintln!("computing line {}/{}", step, self.total)
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    match args.precision {
        Precision::Single => run::<f32>(&args),
        Precision::Double => run::<f64>(&args),
    }
}

fn run<S: Float>(args: &Args) -> Result<()>
where
    f64: AsPrimitive<S>,
    u32: AsPrimitive<S>,
    u8: AsPrimitive<S>,
    usize: AsPrimitive<S>,
    S: AsPrimitive<i64>,
{
    let src = image::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let inverted = canvas::prepare(&src, args.radius);
    if args.inverted {
        inverted
            .save(args.output.join("inverted.png"))
            .context("failed to save inverted intermediate")?;
    }

    let canvas: Canvas<S> = Canvas::from_luma(&inverted, args.radius)?;
    if args.masked {
        canvas
            .to_luma()
            .save(args.output.join("masked.png"))
            .context("failed to save masked intermediate")?;
    }

    let table = PinTable::circular(args.radius.as_(), args.pins, &mut Progress { total: 0 })?;
    let settings = Settings {
        line_count: args.lines,
        start_pin: args.start_pin,
        window_size: args.window,
    };
    let stroke = Stroke {
        width: args.line_width.as_(),
        depth: args.line_depth,
    };

    match args.darkness_mode {
        DarknessMode::Full => with_darkness(args, table, canvas, FullDarkness, settings, stroke),
        DarknessMode::Flat => with_darkness(
            args,
            table,
            canvas,
            FlatDarkness(args.darkness_value.as_()),
            settings,
            stroke,
        ),
    }
}

fn with_darkness<S: Float, D: Darkness<S>>(
    args: &Args,
    table: PinTable<S>,
    canvas: Canvas<S>,
    darkness: D,
    settings: Settings,
    stroke: Stroke<S>,
) -> Result<()>
where
    u8: AsPrimitive<S>,
    usize: AsPrimitive<S>,
    S: AsPrimitive<i64>,
{
    let mut algorithm = Algorithm::new(table, canvas, darkness, settings)?;
    let mut renderer = thread_art::Renderer::new(args.radius as usize, stroke, settings.start_pin);
    let capture = args.gif;
    let termination = algorithm.compute(&mut Progress { total: args.lines }, |step: &Step<S>| {
        renderer.draw(step);
        if capture {
            renderer.snapshot();
        }
    });
    match termination {
        Termination::Converged => eprintln!(
            "converged after {} lines, no darkness left to match",
            algorithm.steps().len()
        ),
        Termination::Exhausted => eprintln!("line budget of {} exhausted", args.lines),
    }

    if args.svg {
        svg::save(
            args.output.join("result.out.svg"),
            &algorithm.build_svg(args.line_width as f32),
        )
        .context("failed to save svg pattern")?;
    }

    let output = renderer.finalize();
    output
        .image
        .save(args.output.join("result.out.png"))
        .context("failed to save rendered image")?;

    if args.gif {
        write_gif(args, output.frames)?;
    }

    if args.print_pins {
        println!("======================= pins ========================");
        for (index, pin) in output.sequence.iter().enumerate() {
            print!("{pin:3}  ");
            if index % 10 == 9 {
                println!();
            }
        }
        println!();
        println!("======================= pins ========================");
    }

    if args.pins_json {
        let file = File::create(args.output.join("pins.json"))
            .context("failed to create pins.json")?;
        serde_json::to_writer(file, &output.sequence).context("failed to write pins.json")?;
    }

    Ok(())
}

fn write_gif(args: &Args, frames: Vec<GrayImage>) -> Result<()> {
    let file = File::create(args.output.join("result.out.gif"))
        .context("failed to create .gif file on disk")?;
    let mut encoder = GifEncoder::new_with_speed(file, 10);
    encoder.set_repeat(Repeat::Infinite)?;
    encoder.encode_frames(frames.into_iter().map(|frame| {
        Frame::from_parts(
            DynamicImage::ImageLuma8(frame).to_rgba8(),
            0,
            0,
            Delay::from_numer_denom_ms(30, 1),
        )
    }))?;
    Ok(())
}
