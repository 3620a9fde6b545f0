//! The render target: a flat linear-radiance float buffer, plus the
//! Reinhard-tonemap-and-gamma-correct PNG writer that turns one into a file.
use image::{ImageBuffer, Rgb};
use std::path::Path;

/// `width * height` RGB triples of accumulated (not yet normalized or
/// tonemapped) linear radiance. `render::LocalRenderer`/`RPCRenderer` both
/// produce one of these; `Scene.width/height` gives its dimensions.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f64>,
}

impl Image {
    pub fn black(width: u32, height: u32) -> Image {
        Image { width, height, data: vec![0.0; width as usize * height as usize * 3] }
    }

    pub fn pixel(&self, x: u32, y: u32) -> (f64, f64, f64) {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: (f64, f64, f64)) {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        self.data[i] = rgb.0;
        self.data[i + 1] = rgb.1;
        self.data[i + 2] = rgb.2;
    }

    /// Reinhard tonemap (`c / (1 + c)`) followed by a gamma-2.2 encode, then
    /// writes an 8-bit PNG via the `image` crate.
    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        let mut buf = ImageBuffer::<Rgb<u8>, _>::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let (r, g, b) = self.pixel(x, y);
                buf.put_pixel(x, y, Rgb(tonemap(r, g, b)));
            }
        }
        buf.save(path)
    }
}

fn tonemap(r: f64, g: f64, b: f64) -> [u8; 3] {
    let enc = |c: f64| {
        let c = c.max(0.0);
        let reinhard = c / (1.0 + c);
        let gamma = reinhard.powf(1.0 / 2.2);
        (gamma.clamp(0.0, 1.0) * 255.0).round() as u8
    };
    [enc(r), enc(g), enc(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_image_stays_black_after_tonemap() {
        let img = Image::black(4, 4);
        assert_eq!(tonemap(img.data[0], img.data[1], img.data[2]), [0, 0, 0]);
    }

    #[test]
    fn set_and_get_pixel_round_trips() {
        let mut img = Image::black(2, 2);
        img.set_pixel(1, 0, (1.0, 2.0, 3.0));
        assert_eq!(img.pixel(1, 0), (1.0, 2.0, 3.0));
        assert_eq!(img.pixel(0, 0), (0.0, 0.0, 0.0));
    }
}
