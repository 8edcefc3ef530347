// Audio module - sample buffers, WAV collaborator and click-track fixtures

pub mod buffer;
pub mod click_track;
pub mod wav;

// Re-export commonly used types for convenience
pub use buffer::SampleBuffer;
pub use click_track::ClickTrack;
pub use wav::{read_wav, write_wav};
