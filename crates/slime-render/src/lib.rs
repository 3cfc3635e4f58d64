//! Pictures of the mask neighborhood around a position, one PNG per line
//! of a results file.
#![forbid(unsafe_code)]

mod error;
mod painter;
mod task;

pub use error::RenderError;
pub use painter::{MaskImage, MaskPainter, RenderOptions, image_file_name};
pub use task::{ImageJob, ImageOutcome, ImageProgress, ImageTask};
