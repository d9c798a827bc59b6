use anyhow::Context;
use std::fs;
use std::path::Path;

/// Smallest byte sequence that still reads as a JPEG stream (SOI, JFIF APP0, EOI).
pub fn synthetic_frame() -> Vec<u8> {
    let mut frame = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    frame.extend_from_slice(b"JFIF\0");
    frame.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    frame.extend_from_slice(&[0xFF, 0xD9]);
    frame
}

pub fn load_capture(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => {
            fs::read(path).with_context(|| format!("reading capture {}", path.display()))
        }
        None => Ok(synthetic_frame()),
    }
}
