//! RGB pixel buffer with a portable pixmap (PPM) codec.
//!
//! Reads both the ASCII (`P3`) and binary (`P6`) forms, with `#` comments in
//! the header and any maxval up to 65535 (scaled to 8 bits). Writes binary
//! `P6`.

use crate::error::{self, Result};

/// Row-major RGB image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, fill: [u8; 3]) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Set a pixel; out-of-range writes are dropped
    pub fn set(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = rgb;
        }
    }

    /// Fill a `size` x `size` square with its top-left corner at `(x, y)`
    pub fn fill_square(&mut self, x: usize, y: usize, size: usize, rgb: [u8; 3]) {
        for dy in 0..size {
            for dx in 0..size {
                self.set(x + dx, y + dy, rgb);
            }
        }
    }

    /// Decode a P3 or P6 image
    pub fn from_ppm(data: &[u8]) -> Result<Self> {
        let mut header = HeaderReader { data, pos: 0 };
        let magic = header.token()?;
        let binary = match magic.as_str() {
            "P6" => true,
            "P3" => false,
            other => {
                return Err(error::parse_failed(format!("unsupported image format '{}'", other))
                    .with_operation("image::from_ppm"))
            }
        };
        let width = header.number()?;
        let height = header.number()?;
        let maxval = header.number()?;
        if maxval == 0 || maxval > 65535 {
            return Err(error::parse_failed(format!("invalid maxval {}", maxval)).with_operation("image::from_ppm"));
        }
        let overflow = || error::parse_failed("image dimensions overflow").with_operation("image::from_ppm");
        let sample_count = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(3))
            .ok_or_else(overflow)?;
        let truncated = |needed: usize, found: usize| {
            error::parse_failed(format!(
                "image data truncated: expected {} bytes, found {}",
                needed, found
            ))
            .with_operation("image::from_ppm")
        };

        let samples: Vec<usize> = if binary {
            // exactly one whitespace byte separates the header from the raster
            let raster = data.get(header.pos + 1..).unwrap_or_default();
            let wide = maxval > 255;
            let needed = sample_count
                .checked_mul(if wide { 2 } else { 1 })
                .ok_or_else(overflow)?;
            if raster.len() < needed {
                return Err(truncated(needed, raster.len()));
            }
            if wide {
                raster[..needed]
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as usize)
                    .collect()
            } else {
                raster[..needed].iter().map(|&b| b as usize).collect()
            }
        } else {
            // every ASCII sample takes at least one byte
            let remaining = data.len() - header.pos;
            if remaining < sample_count {
                return Err(truncated(sample_count, remaining));
            }
            let mut samples = Vec::with_capacity(sample_count);
            for _ in 0..sample_count {
                samples.push(header.number()?);
            }
            samples
        };

        let scale = |v: usize| -> u8 { (v.min(maxval) * 255 / maxval) as u8 };
        let pixels = samples
            .chunks_exact(3)
            .map(|rgb| [scale(rgb[0]), scale(rgb[1]), scale(rgb[2])])
            .collect();
        Ok(Self { width, height, pixels })
    }

    /// Encode as binary P6 with maxval 255
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut out = format!("P6\n{} {}\n255\n", self.width, self.height).into_bytes();
        out.reserve(self.pixels.len() * 3);
        for rgb in &self.pixels {
            out.extend_from_slice(rgb);
        }
        out
    }
}

/// Tokenizer over the whitespace-separated PPM header
struct HeaderReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl HeaderReader<'_> {
    fn skip_space(&mut self) {
        while let Some(&byte) = self.data.get(self.pos) {
            if byte == b'#' {
                while self.data.get(self.pos).is_some_and(|&b| b != b'\n') {
                    self.pos += 1;
                }
            } else if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<String> {
        self.skip_space();
        let start = self.pos;
        while self.data.get(self.pos).is_some_and(|b| !b.is_ascii_whitespace() && *b != b'#') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(error::parse_failed("image header ended early").with_operation("image::from_ppm"));
        }
        Ok(String::from_utf8_lossy(&self.data[start..self.pos]).into_owned())
    }

    fn number(&mut self) -> Result<usize> {
        let token = self.token()?;
        token.parse().map_err(|_| {
            error::parse_failed(format!("expected a number in image, found '{}'", token))
                .with_operation("image::from_ppm")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_ascii_ppm_with_comments() {
        let data = b"P3\n# two pixels\n2 1\n# max\n255\n255 0 0  0 0 255\n";
        let image = PixelGrid::from_ppm(data).unwrap();
        assert_eq!((image.width(), image.height()), (2, 1));
        assert_eq!(image.get(0, 0), Some([255, 0, 0]));
        assert_eq!(image.get(1, 0), Some([0, 0, 255]));
        assert_eq!(image.get(2, 0), None);
    }

    #[test]
    fn test_binary_ppm() {
        let mut image = PixelGrid::new(2, 2, [0, 0, 0]);
        image.set(1, 1, [0xC0, 0xFF, 0xC0]);
        let decoded = PixelGrid::from_ppm(&image.to_ppm()).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_maxval_scaling() {
        let image = PixelGrid::from_ppm(b"P3 1 1 1 1 0 1").unwrap();
        assert_eq!(image.get(0, 0), Some([255, 0, 255]));
    }

    #[test]
    fn test_rejects_bad_images() {
        assert_eq!(PixelGrid::from_ppm(b"P5 1 1 255 0").unwrap_err().kind(), ErrorKind::ParseFailed);
        assert_eq!(PixelGrid::from_ppm(b"P6 2 2 255\n\0\0").unwrap_err().kind(), ErrorKind::ParseFailed);
        assert_eq!(PixelGrid::from_ppm(b"P3 1 1 255 9").unwrap_err().kind(), ErrorKind::ParseFailed);
    }

    #[test]
    fn test_declared_size_larger_than_data() {
        let huge = PixelGrid::from_ppm(b"P6 3000000000 3000000000 255\n\0\0\0").unwrap_err();
        assert_eq!(huge.kind(), ErrorKind::ParseFailed);

        let overflow = format!("P6 {} 2 255\n\0\0\0", usize::MAX);
        let err = PixelGrid::from_ppm(overflow.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);

        let err = PixelGrid::from_ppm(b"P6 100000 100000 65535\n\0\0\0\0\0\0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);

        let err = PixelGrid::from_ppm(b"P3 100000 100000 255\n0 0 0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
    }
}
