use glow::HasContext;
use log::{error, info};
use nalgebra::Vector4;
use std::path::Path;

/// Policy for mapping an out-of-range texel index back into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

impl WrapMode {
    fn to_gl(self) -> i32 {
        match self {
            Self::Repeat => glow::REPEAT as i32,
            Self::ClampToEdge => glow::CLAMP_TO_EDGE as i32,
        }
    }
}

/// Maps an integer texel index into `[0, size)` under the given wrap mode.
///
/// Repeat uses Euclidean modulo so any negative input still lands in range;
/// clamp-to-edge pins to the nearest valid index. `size` must be non-zero.
pub fn wrap_index(i: i32, size: u32, mode: WrapMode) -> u32 {
    debug_assert!(size > 0);
    match mode {
        WrapMode::Repeat => i.rem_euclid(size as i32) as u32,
        WrapMode::ClampToEdge => i.clamp(0, size as i32 - 1) as u32,
    }
}

/// Image decoding failure; carries the decoder's diagnostic verbatim.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode image '{path}': {message}")]
pub struct DecodeError {
    pub path: String,
    pub message: String,
}

/// An in-memory image with f32 RGBA samples and a bottom-left origin.
///
/// Files are flipped vertically on load so texture coordinate (0,0) samples
/// the bottom-left of the picture, matching GPU conventions; `save` flips
/// back on write. Byte-backed sources convert to float as x/255 on load and
/// back as round(clamp(x,0,1)*255) on save.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    /// Per-axis wrap policy (horizontal, vertical).
    pub wrap: (WrapMode, WrapMode),
    samples: Vec<f32>,
}

/// Samples per texel (RGBA).
const CHANNELS: usize = 4;

impl PixelBuffer {
    /// Creates a zero-filled buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            wrap: (WrapMode::Repeat, WrapMode::Repeat),
            samples: vec![0.0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Decodes an image file. Standard formats arrive as bytes, Radiance HDR
    /// as floats; both are stored as f32 RGBA.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| DecodeError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let width = img.width();
        let height = img.height();
        // Flip so row 0 is the bottom of the picture.
        let samples = img.flipv().to_rgba32f().into_raw();

        info!("Loaded image: {} ({}x{})", path.display(), width, height);

        Ok(Self {
            width,
            height,
            wrap: (WrapMode::Repeat, WrapMode::Repeat),
            samples,
        })
    }

    /// Builds a procedural checkerboard alternating `a` and `b` per texel.
    pub fn checkerboard(width: u32, height: u32, a: Vector4<f32>, b: Vector4<f32>) -> Self {
        let mut buffer = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                buffer.set_texel(x, y, if (x + y) % 2 == 0 { a } else { b });
            }
        }
        buffer
    }

    /// Wraps raw RGBA bytes read back from the framebuffer (already
    /// bottom-up, matching this buffer's origin).
    pub fn from_gl_pixels(width: u32, height: u32, rgba: &[u8]) -> Self {
        debug_assert_eq!(rgba.len(), width as usize * height as usize * CHANNELS);
        Self {
            width,
            height,
            wrap: (WrapMode::Repeat, WrapMode::Repeat),
            samples: rgba.iter().map(|&b| b as f32 / 255.0).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Direct texel read. The caller must stay in range.
    pub fn texel(&self, x: u32, y: u32) -> Vector4<f32> {
        let i = CHANNELS * (x as usize + y as usize * self.width as usize);
        debug_assert!(i + CHANNELS <= self.samples.len());
        Vector4::new(
            self.samples[i],
            self.samples[i + 1],
            self.samples[i + 2],
            self.samples[i + 3],
        )
    }

    /// Direct texel write. The caller must stay in range.
    pub fn set_texel(&mut self, x: u32, y: u32, value: Vector4<f32>) {
        let i = CHANNELS * (x as usize + y as usize * self.width as usize);
        debug_assert!(i + CHANNELS <= self.samples.len());
        self.samples[i] = value.x;
        self.samples[i + 1] = value.y;
        self.samples[i + 2] = value.z;
        self.samples[i + 3] = value.w;
    }

    /// Samples the buffer with bilinear filtering at the normalized
    /// coordinate (u, v), applying each axis's wrap mode independently.
    ///
    /// Sampling exactly at a texel center returns that texel unchanged.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Vector4<f32> {
        let px = u * self.width as f32;
        let py = v * self.height as f32;

        let mut result = Vector4::zeros();
        for dy in 0..2i32 {
            for dx in 0..2i32 {
                let ix = (px - 0.5).floor() as i32 + dx;
                let iy = (py - 0.5).floor() as i32 + dy;
                let wx = 1.0 - (ix as f32 + 0.5 - px).abs();
                let wy = 1.0 - (iy as f32 + 0.5 - py).abs();
                let tx = wrap_index(ix, self.width, self.wrap.0);
                let ty = wrap_index(iy, self.height, self.wrap.1);
                result += self.texel(tx, ty) * (wx * wy);
            }
        }
        result
    }

    /// Uploads the samples to a GPU texture with linear magnification,
    /// mipmapped-linear minification, and the configured per-axis wrap.
    ///
    /// Pass an existing handle to re-upload into it; otherwise a new texture
    /// object is created. `format` is the GL internal format (e.g. RGBA8).
    pub fn upload_texture(
        &self,
        gl: &glow::Context,
        format: i32,
        existing: Option<glow::Texture>,
    ) -> Result<glow::Texture, String> {
        let texture = match existing {
            Some(t) => t,
            None => unsafe { gl.create_texture()? },
        };
        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, self.wrap.0.to_gl());
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, self.wrap.1.to_gl());
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format,
                self.width as i32,
                self.height as i32,
                0,
                glow::RGBA,
                glow::FLOAT,
                glow::PixelUnpackData::Slice(Some(bytemuck::cast_slice(&self.samples))),
            );
            gl.generate_mipmap(glow::TEXTURE_2D);
        }
        Ok(texture)
    }

    /// Reads a region of the current framebuffer into a new pixel buffer.
    /// `x`/`y` are in GL window coordinates (origin bottom-left).
    pub fn read_framebuffer(gl: &glow::Context, x: i32, y: i32, width: u32, height: u32) -> Self {
        let mut rgba = vec![0u8; width as usize * height as usize * CHANNELS];
        unsafe {
            gl.read_pixels(
                x,
                y,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(&mut rgba)),
            );
        }
        Self::from_gl_pixels(width, height, &rgba)
    }

    /// Re-encodes the samples to a file: Radiance HDR when the extension is
    /// `.hdr`, PNG-class byte output otherwise. Write failures are logged,
    /// not propagated; rendering continues.
    pub fn save<P: AsRef<Path>>(&self, path: P) {
        let path = path.as_ref();
        let is_hdr = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("hdr"));
        let result = if is_hdr {
            self.write_hdr(path)
        } else {
            self.write_bytes(path)
        };
        match result {
            Ok(()) => info!("Wrote image: {}", path.display()),
            Err(e) => error!("Failed to save image to '{}': {}", path.display(), e),
        }
    }

    fn write_bytes(&self, path: &Path) -> Result<(), String> {
        let mut img = image::RgbaImage::new(self.width, self.height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            // Undo the load-time flip: file row 0 is the top.
            let t = self.texel(x, self.height - 1 - y);
            *pixel = image::Rgba([
                float_to_byte(t.x),
                float_to_byte(t.y),
                float_to_byte(t.z),
                float_to_byte(t.w),
            ]);
        }
        img.save(path).map_err(|e| e.to_string())
    }

    fn write_hdr(&self, path: &Path) -> Result<(), String> {
        let file = std::fs::File::create(path).map_err(|e| e.to_string())?;
        let encoder = image::codecs::hdr::HdrEncoder::new(std::io::BufWriter::new(file));
        let mut rows = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let t = self.texel(x, y);
                rows.push(image::Rgb([t.x, t.y, t.z]));
            }
        }
        encoder
            .encode(&rows, self.width as usize, self.height as usize)
            .map_err(|e| e.to_string())
    }
}

fn float_to_byte(x: f32) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white() -> Vector4<f32> {
        Vector4::new(1.0, 1.0, 1.0, 1.0)
    }

    fn black() -> Vector4<f32> {
        Vector4::new(0.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn repeat_wrap_is_periodic_and_in_range() {
        for s in [1u32, 2, 3, 7, 100] {
            for i in -250i32..250 {
                let w = wrap_index(i, s, WrapMode::Repeat);
                assert!(w < s);
                for k in [-2i32, -1, 1, 2] {
                    assert_eq!(wrap_index(i + k * s as i32, s, WrapMode::Repeat), w);
                }
            }
        }
    }

    #[test]
    fn clamp_wrap_pins_to_edges() {
        for s in [1u32, 2, 5] {
            for i in -10i32..15 {
                let w = wrap_index(i, s, WrapMode::ClampToEdge);
                assert!(w < s);
                if i >= 0 && (i as u32) < s {
                    assert_eq!(w, i as u32);
                }
            }
        }
        assert_eq!(wrap_index(-3, 4, WrapMode::ClampToEdge), 0);
        assert_eq!(wrap_index(9, 4, WrapMode::ClampToEdge), 3);
    }

    #[test]
    fn bilinear_is_exact_at_texel_centers() {
        for wrap in [WrapMode::Repeat, WrapMode::ClampToEdge] {
            let mut buffer = PixelBuffer::checkerboard(4, 4, white(), black());
            buffer.wrap = (wrap, wrap);
            for y in 0..4 {
                for x in 0..4 {
                    let u = (x as f32 + 0.5) / 4.0;
                    let v = (y as f32 + 0.5) / 4.0;
                    let sampled = buffer.sample_bilinear(u, v);
                    let stored = buffer.texel(x, y);
                    assert!((sampled - stored).norm() < 1e-5);
                }
            }
        }
    }

    #[test]
    fn repeat_sampling_blends_across_the_seam() {
        // 2x2 checkerboard with repeat wrap: sampling just inside the corner
        // must blend all four texels (wraparound), not clamp to the edge.
        let buffer = PixelBuffer::checkerboard(2, 2, white(), black());

        let near_one = buffer.sample_bilinear(0.999, 0.999);
        let near_zero = buffer.sample_bilinear(0.001, 0.001);

        // Equal parts white and black under wraparound, so the blend sits at
        // the midpoint (up to the 0.001 offset).
        assert!((near_one.x - 0.5).abs() < 0.01);
        assert!((near_zero.x - 0.5).abs() < 0.01);

        // Clamp-to-edge at the same spots returns the corner texel instead.
        let mut clamped = buffer.clone();
        clamped.wrap = (WrapMode::ClampToEdge, WrapMode::ClampToEdge);
        assert!((clamped.sample_bilinear(0.999, 0.999).x - 1.0).abs() < 0.01);
        assert!((clamped.sample_bilinear(0.001, 0.001).x - 1.0).abs() < 0.01);
    }

    #[test]
    fn byte_conversion_rounds() {
        assert_eq!(float_to_byte(0.0), 0);
        assert_eq!(float_to_byte(1.0), 255);
        assert_eq!(float_to_byte(0.5), 128);
        assert_eq!(float_to_byte(-2.0), 0);
        assert_eq!(float_to_byte(7.5), 255);
    }

    #[test]
    fn texel_round_trip() {
        let mut buffer = PixelBuffer::new(3, 2);
        let value = Vector4::new(0.25, 0.5, 0.75, 1.0);
        buffer.set_texel(2, 1, value);
        assert_eq!(buffer.texel(2, 1), value);
        assert_eq!(buffer.texel(0, 0), Vector4::zeros());
    }
}
