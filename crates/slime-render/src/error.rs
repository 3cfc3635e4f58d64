use std::fmt;
use std::io;

use slime_io::ResultsError;

#[derive(Debug)]
pub enum RenderError {
    Io(io::Error),
    Encode(image::ImageError),
    Results(ResultsError),
    Pool(rayon::ThreadPoolBuildError),
    WorkerPanicked,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "image i/o error: {}", e),
            RenderError::Encode(e) => write!(f, "png encoding failed: {}", e),
            RenderError::Results(e) => write!(f, "{}", e),
            RenderError::Pool(e) => write!(f, "could not start render threads: {}", e),
            RenderError::WorkerPanicked => write!(f, "image worker panicked"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(e) => Some(e),
            RenderError::Encode(e) => Some(e),
            RenderError::Results(e) => Some(e),
            RenderError::Pool(e) => Some(e),
            RenderError::WorkerPanicked => None,
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        RenderError::Io(e)
    }
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        RenderError::Encode(e)
    }
}

impl From<ResultsError> for RenderError {
    fn from(e: ResultsError) -> Self {
        RenderError::Results(e)
    }
}

impl From<rayon::ThreadPoolBuildError> for RenderError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        RenderError::Pool(e)
    }
}
