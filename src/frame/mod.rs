//! Camera frame intake: data types, sources and preprocessing.

pub mod preprocess;
pub mod source;
pub mod types;

pub use preprocess::FramePreprocessor;
pub use source::{FrameSource, MockFrameSource, SyntheticFrameSource};
pub use types::{CapturedFrame, PixelData, PreparedImage, RawFrame, Rotation};
