//! Audio input for the offline driver: decoding and spectral framing

pub mod decoder;
pub mod stft;

pub use decoder::{decode, TARGET_SAMPLE_RATE};
pub use stft::{SpectralFrames, FFT_SIZE, HOP_SIZE};
