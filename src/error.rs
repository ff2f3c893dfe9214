use image::ImageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error while decoding image: {0}")]
    Image(#[from] ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("Pixel buffer holds {got} bytes, expected {expected} for an RGBA image")]
    BufferSize { expected: usize, got: usize },
    #[error("`{0}` is not a #rrggbb hex color")]
    InvalidHex(String),
}
