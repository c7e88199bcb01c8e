//! # rdtype - text-seeded reaction diffusion
//!
//! Type a word and watch it grow. Text is rasterized into a mask that
//! continuously injects chemical B into a running Gray-Scott simulation; the
//! resulting pattern displaces and colors a dense 3D surface.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rdtype::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default().with_preset(Preset::by_name("mitosis").unwrap());
//!     Viewer::new(config).with_text("HELLO").run()?;
//!     Ok(())
//! }
//! ```
//!
//! Headless, without a window or GPU:
//!
//! ```ignore
//! let config = AppConfig::default();
//! let mut session = Session::new(300, 300, config.text_style())?;
//! session.set_text("A");
//! for _ in 0..200 {
//!     session.advance_frame(&config.simulation_params());
//! }
//! let image = render_image(session.instance().field(), &config.surface_style(), 600);
//! ```
//!
//! ## Core Concepts
//!
//! ### Text mask
//!
//! [`TextRasterizer`] lays text out centered on the grid, shrinking it to fit
//! 90% of the width and height, and draws it with a built-in bitmap face.
//! Each [`FontFamily`] renders that face with its own weight, slant or
//! sampling. The mask is regenerated only when the text or its style changes.
//!
//! ### Field and stepping
//!
//! [`ConcentrationField`] stores chemicals `a` and `b` in two buffers. A
//! half-step reads one buffer and writes the other; [`FieldStepper`] runs
//! `iterations_per_frame` cycles of two half-steps per displayed frame, taking
//! a fresh [`ParamSource`] snapshot at the start of each cycle. Rows are
//! computed in parallel with rayon.
//!
//! ### Sessions
//!
//! A [`Session`] owns the current [`SimulationInstance`]. Changing its reset
//! key replaces the instance with a fresh one; that is the only way to start
//! over.
//!
//! ### Surface
//!
//! [`shade`] and [`sample_b`] map the settled `b` channel to color and
//! height. The viewer runs the same math in WGSL; [`render_image`] uses it
//! for PNG stills.
//!
//! ## Presets
//!
//! | Name | Feed | Kill |
//! |------|------|------|
//! | Coral | 0.0545 | 0.0620 |
//! | Mitosis | 0.0367 | 0.0644 |
//! | Mazes | 0.0290 | 0.0570 |
//! | Chaos | 0.0820 | 0.0600 |
//! | Worms | 0.0460 | 0.0630 |
//! | Spots | 0.0250 | 0.0600 |

pub mod config;
pub mod error;
pub mod field;
pub mod font;
mod gpu;
pub mod input;
pub mod mask;
pub mod params;
pub mod simulation;
pub mod stepper;
pub mod surface;
pub mod time;
pub mod viewer;

pub use glam::Vec3;

pub use config::{AppConfig, HexColor, Preset, PRESETS};
pub use error::{ConfigError, GpuError, SimulationError, ViewerError};
pub use field::{Cell, ConcentrationField};
pub use font::{BitmapFont, FontFamily, GlyphSource};
pub use gpu::{STEP_SHADER, SURFACE_SHADER};
pub use input::{Command, TextInput, MAX_TEXT_LEN};
pub use mask::{TextMask, TextRasterizer, TextStyle};
pub use params::{ParamSource, SharedParams, SimulationParams};
pub use simulation::{Session, SimulationInstance, DEFAULT_GRID};
pub use stepper::{FieldStepper, FrameStats};
pub use surface::{render_image, sample_b, shade, SurfaceGrid, SurfaceStyle};
pub use viewer::{Backend, Viewer};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use rdtype::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{AppConfig, HexColor, Preset, PRESETS};
    pub use crate::field::{Cell, ConcentrationField};
    pub use crate::font::FontFamily;
    pub use crate::input::TextInput;
    pub use crate::mask::{TextMask, TextRasterizer, TextStyle};
    pub use crate::params::{ParamSource, SharedParams, SimulationParams};
    pub use crate::simulation::{Session, SimulationInstance, DEFAULT_GRID};
    pub use crate::stepper::FieldStepper;
    pub use crate::surface::{render_image, SurfaceStyle};
    pub use crate::viewer::{Backend, Viewer};
    pub use crate::Vec3;
}
