//! Linear-light image buffer and the encoders that persist it.
//!
//! Two formats are written: ASCII PPM (`P3`) and uncompressed 24-bit BMP.
//! Both go through the same tone map, [`color_to_rgb8`].

use crate::error::{RenderError, RenderResult};
use crate::Color;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const BMP_FILE_HEADER_SIZE: u32 = 14;
const BMP_INFO_HEADER_SIZE: u32 = 40;
const BMP_PIXEL_OFFSET: u32 = BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE;

/// Row-major image of linear radiance values, top row first.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a black image, failing cleanly if the pixels cannot be
    /// allocated.
    pub fn try_new(width: u32, height: u32) -> RenderResult<Self> {
        let count = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RenderError::Allocation { pixels: usize::MAX })?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(count)
            .map_err(|_| RenderError::Allocation { pixels: count })?;
        pixels.resize(count, Color::ZERO);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Tone-mapped 8-bit RGB of one row.
    fn row_rgb8(&self, y: u32) -> impl Iterator<Item = [u8; 3]> + '_ {
        let start = self.index(0, y);
        self.pixels[start..start + self.width as usize]
            .iter()
            .map(|&c| color_to_rgb8(c))
    }

    /// Write a plain-text `P3` PPM, one pixel per line.
    pub fn write_ppm<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "P3\n{} {}\n255\n", self.width, self.height)?;

        for y in 0..self.height {
            for [r, g, b] in self.row_rgb8(y) {
                writeln!(writer, "{r} {g} {b}")?;
            }
        }

        writer.flush()
    }

    /// Write an uncompressed 24-bit BMP.
    ///
    /// The height field is positive, so rows are stored bottom-up.
    pub fn write_bmp<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let stride = bmp_stride(self.width);
        let too_large =
            || io::Error::new(io::ErrorKind::InvalidInput, "image too large for BMP");

        let image_size = u32::try_from(stride as u64 * self.height as u64)
            .map_err(|_| too_large())?;
        let file_size = image_size.checked_add(BMP_PIXEL_OFFSET).ok_or_else(too_large)?;
        let width = i32::try_from(self.width).map_err(|_| too_large())?;
        let height = i32::try_from(self.height).map_err(|_| too_large())?;

        // File header
        writer.write_all(b"BM")?;
        writer.write_all(&file_size.to_le_bytes())?;
        writer.write_all(&0u32.to_le_bytes())?; // reserved
        writer.write_all(&BMP_PIXEL_OFFSET.to_le_bytes())?;

        // BITMAPINFOHEADER
        writer.write_all(&BMP_INFO_HEADER_SIZE.to_le_bytes())?;
        writer.write_all(&width.to_le_bytes())?;
        writer.write_all(&height.to_le_bytes())?;
        writer.write_all(&1u16.to_le_bytes())?; // planes
        writer.write_all(&24u16.to_le_bytes())?; // bits per pixel
        writer.write_all(&0u32.to_le_bytes())?; // BI_RGB
        writer.write_all(&image_size.to_le_bytes())?;
        writer.write_all(&0i32.to_le_bytes())?; // x pixels per meter
        writer.write_all(&0i32.to_le_bytes())?; // y pixels per meter
        writer.write_all(&0u32.to_le_bytes())?; // colors used
        writer.write_all(&0u32.to_le_bytes())?; // important colors

        let mut row = Vec::with_capacity(stride as usize);
        for y in (0..self.height).rev() {
            row.clear();
            for [r, g, b] in self.row_rgb8(y) {
                row.extend_from_slice(&[b, g, r]);
            }
            row.resize(stride as usize, 0);
            writer.write_all(&row)?;
        }

        writer.flush()
    }

    /// Save to `path`, choosing the encoder from the file extension.
    pub fn save(&self, path: &Path) -> RenderResult<()> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let io_error = |source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let is_bmp = match extension.as_str() {
            "bmp" => true,
            "ppm" => false,
            _ => return Err(RenderError::UnsupportedFormat(path.display().to_string())),
        };

        let writer = BufWriter::new(File::create(path).map_err(io_error)?);
        if is_bmp {
            self.write_bmp(writer)
        } else {
            self.write_ppm(writer)
        }
        .map_err(io_error)?;

        log::info!(
            "Saved {}x{} image to {}",
            self.width,
            self.height,
            path.display()
        );
        Ok(())
    }
}

/// Bytes per BMP row, padded to a multiple of four.
pub fn bmp_stride(width: u32) -> u32 {
    (3 * width + 3) / 4 * 4
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGB.
///
/// NaN components (from degenerate samples) map to black.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let intensity = lumen_math::Interval::new(0.0, 0.999);
    let channel = |c: f32| {
        let c = if c.is_nan() { 0.0 } else { c };
        (256.0 * intensity.clamp(linear_to_gamma(c))) as u8
    };
    [channel(color.x), channel(color.y), channel(color.z)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> ImageBuffer {
        let mut image = ImageBuffer::try_new(width, height).expect("small image");
        for y in 0..height {
            for x in 0..width {
                let r = x as f32 / width as f32;
                let g = y as f32 / height as f32;
                image.set(x, y, Color::new(r * r, g * g, 0.25));
            }
        }
        image
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_tone_map() {
        assert_eq!(color_to_rgb8(Color::ZERO), [0, 0, 0]);
        assert_eq!(color_to_rgb8(Color::ONE), [255, 255, 255]);
        assert_eq!(color_to_rgb8(Color::splat(100.0)), [255, 255, 255]);
        assert_eq!(color_to_rgb8(Color::new(0.25, -3.0, f32::NAN)), [128, 0, 0]);
    }

    #[test]
    fn test_allocation_failure_is_an_error() {
        let result = ImageBuffer::try_new(u32::MAX, u32::MAX);
        assert!(matches!(result, Err(RenderError::Allocation { .. })));
    }

    #[test]
    fn test_ppm_layout() {
        let mut image = ImageBuffer::try_new(2, 1).expect("tiny image");
        image.set(0, 0, Color::ONE);
        image.set(1, 0, Color::new(0.25, 0.0, 0.0));

        let mut bytes = Vec::new();
        image.write_ppm(&mut bytes).expect("write to memory");

        let text = String::from_utf8(bytes).expect("ppm is ascii");
        assert_eq!(text, "P3\n2 1\n255\n255 255 255\n128 0 0\n");
    }

    #[test]
    fn test_bmp_stride() {
        assert_eq!(bmp_stride(1), 4);
        assert_eq!(bmp_stride(3), 12);
        assert_eq!(bmp_stride(4), 12);
        assert_eq!(bmp_stride(5), 16);
    }

    #[test]
    fn test_bmp_header_fields() {
        let image = gradient(5, 3);
        let mut bytes = Vec::new();
        image.write_bmp(&mut bytes).expect("write to memory");

        let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        let stride = 16;

        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(u32_at(2) as usize, bytes.len());
        assert_eq!(u32_at(2), 54 + stride * 3);
        assert_eq!(u32_at(6), 0);
        assert_eq!(u32_at(10), 54);
        assert_eq!(u32_at(14), 40);
        assert_eq!(u32_at(18), 5);
        assert_eq!(u32_at(22), 3);
        assert_eq!(u16_at(26), 1);
        assert_eq!(u16_at(28), 24);
        assert_eq!(u32_at(30), 0);
        assert_eq!(u32_at(34), stride * 3);
        assert_eq!(u32_at(38), 0);
        assert_eq!(u32_at(42), 0);
        assert_eq!(u32_at(46), 0);
        assert_eq!(u32_at(50), 0);

        // Padding bytes after the 15 pixel bytes of the first stored row
        assert_eq!(bytes[54 + 15], 0);
        // First stored row is the bottom image row, BGR order
        let [r, g, b] = color_to_rgb8(image.get(0, 2));
        assert_eq!(&bytes[54..57], &[b, g, r]);
    }

    #[test]
    fn test_bmp_decodes_upright() {
        let image = gradient(7, 4);
        let mut bytes = Vec::new();
        image.write_bmp(&mut bytes).expect("write to memory");

        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Bmp)
            .expect("valid bmp")
            .to_rgb8();

        assert_eq!(decoded.width(), 7);
        assert_eq!(decoded.height(), 4);
        for y in 0..4 {
            for x in 0..7 {
                assert_eq!(
                    decoded.get_pixel(x, y).0,
                    color_to_rgb8(image.get(x, y)),
                    "pixel ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_save_rejects_unknown_extension() {
        let image = gradient(2, 2);
        let path = std::env::temp_dir().join("lumen_unsupported_output.png");

        let result = image.save(&path);
        assert!(matches!(result, Err(RenderError::UnsupportedFormat(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_reports_io_errors() {
        let image = gradient(2, 2);
        let path = std::env::temp_dir()
            .join("lumen_missing_directory")
            .join("nested")
            .join("out.bmp");

        let result = image.save(&path);
        assert!(matches!(result, Err(RenderError::Io { .. })));
    }

    #[test]
    fn test_save_ppm_to_disk() {
        let image = gradient(3, 2);
        let path = std::env::temp_dir().join(format!("lumen_save_{}.ppm", std::process::id()));

        image.save(&path).expect("temp dir is writable");
        let text = std::fs::read_to_string(&path).expect("file was written");
        std::fs::remove_file(&path).ok();

        assert!(text.starts_with("P3\n3 2\n255\n"));
        assert_eq!(text.lines().count(), 3 + 6);
    }
}
