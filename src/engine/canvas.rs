use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::resources::Color;

/// Software raster target. Coordinates are in pixels; shapes are clipped to
/// the canvas and covered by pixel-center sampling.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).map(|p| Color::from(*p))
    }

    pub fn fill(&mut self, color: Color) {
        let pixel = color.to_rgba();
        for p in self.image.pixels_mut() {
            *p = pixel;
        }
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.fill_where(x, y, width, height, color, |_, _| true);
    }

    pub fn fill_oval(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        let rx = width / 2.0;
        let ry = height / 2.0;
        let (cx, cy) = (x + rx, y + ry);
        self.fill_where(x, y, width, height, color, |px, py| {
            let dx = (px - cx) / rx;
            let dy = (py - cy) / ry;
            dx * dx + dy * dy <= 1.0
        });
    }

    /// Rectangle whose corners are quarter ellipses with radii `rx`, `ry`.
    pub fn fill_round_rect(&mut self, x: f64, y: f64, width: f64, height: f64, rx: f64, ry: f64, color: Color) {
        let rx = rx.clamp(0.0, width / 2.0);
        let ry = ry.clamp(0.0, height / 2.0);
        let (right, bottom) = (x + width, y + height);
        self.fill_where(x, y, width, height, color, |px, py| {
            if rx <= 0.0 || ry <= 0.0 {
                return true;
            }
            let cx = if px < x + rx {
                x + rx
            } else if px > right - rx {
                right - rx
            } else {
                return true;
            };
            let cy = if py < y + ry {
                y + ry
            } else if py > bottom - ry {
                bottom - ry
            } else {
                return true;
            };
            let dx = (px - cx) / rx;
            let dy = (py - cy) / ry;
            dx * dx + dy * dy <= 1.0
        });
    }

    /// Alpha-composites `image` with its top-left corner at (`x`, `y`).
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(&mut self.image, image, x, y);
    }

    /// Stretches `image` over the whole canvas, replacing what was there.
    pub fn draw_image_scaled(&mut self, image: &RgbaImage) {
        if image.dimensions() == self.image.dimensions() {
            self.image.copy_from_slice(image.as_raw());
        } else {
            self.image = imageops::resize(image, self.width(), self.height(), FilterType::Triangle);
        }
    }

    fn fill_where(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color, inside: impl Fn(f64, f64) -> bool) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let x0 = x.floor().max(0.0) as u32;
        let y0 = y.floor().max(0.0) as u32;
        let x1 = (x + width).ceil().clamp(0.0, self.width() as f64) as u32;
        let y1 = (y + height).ceil().clamp(0.0, self.height() as f64) as u32;
        let (right, bottom) = (x + width, y + height);
        let source = color.to_rgba();
        let opaque = color.a == u8::MAX;

        for py in y0..y1 {
            let cy = py as f64 + 0.5;
            if cy < y || cy >= bottom {
                continue;
            }
            for px in x0..x1 {
                let cx = px as f64 + 0.5;
                if cx < x || cx >= right || !inside(cx, cy) {
                    continue;
                }
                let target = self.image.get_pixel_mut(px, py);
                if opaque {
                    *target = source;
                } else {
                    source_over(target, source);
                }
            }
        }
    }
}

/// Source-over compositing. An opaque destination stays opaque.
fn source_over(target: &mut Rgba<u8>, source: Rgba<u8>) {
    let sa = source[3] as f64 / 255.0;
    let da = target[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *target = Rgba([0, 0, 0, 0]);
        return;
    }
    for c in 0..3 {
        let blended = (source[c] as f64 * sa + target[c] as f64 * da * (1.0 - sa)) / out_a;
        target[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    target[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(canvas: &Canvas, color: Color) -> usize {
        canvas.image().pixels().filter(|p| **p == color.to_rgba()).count()
    }

    #[test]
    fn rect_covers_exact_pixels() {
        let mut canvas = Canvas::new(20, 20);
        canvas.fill(Color::BLACK);
        canvas.fill_rect(2.0, 3.0, 5.0, 4.0, Color::RED);

        assert_eq!(count(&canvas, Color::RED), 20);
        assert_eq!(canvas.pixel(2, 3), Some(Color::RED));
        assert_eq!(canvas.pixel(6, 6), Some(Color::RED));
        assert_eq!(canvas.pixel(7, 6), Some(Color::BLACK));
    }

    #[test]
    fn rect_is_clipped_to_canvas() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_rect(-5.0, 8.0, 100.0, 100.0, Color::BLUE);
        assert_eq!(count(&canvas, Color::BLUE), 20);
    }

    #[test]
    fn oval_leaves_corners_empty() {
        let mut canvas = Canvas::new(20, 20);
        canvas.fill(Color::BLACK);
        canvas.fill_oval(0.0, 0.0, 20.0, 20.0, Color::GREEN);

        assert_eq!(canvas.pixel(0, 0), Some(Color::BLACK));
        assert_eq!(canvas.pixel(19, 19), Some(Color::BLACK));
        assert_eq!(canvas.pixel(10, 10), Some(Color::GREEN));
        assert_eq!(canvas.pixel(0, 10), Some(Color::GREEN));
    }

    #[test]
    fn round_rect_rounds_only_corners() {
        let mut canvas = Canvas::new(40, 20);
        canvas.fill(Color::BLACK);
        canvas.fill_round_rect(0.0, 0.0, 40.0, 20.0, 6.0, 6.0, Color::YELLOW);

        assert_eq!(canvas.pixel(0, 0), Some(Color::BLACK));
        assert_eq!(canvas.pixel(39, 19), Some(Color::BLACK));
        assert_eq!(canvas.pixel(20, 0), Some(Color::YELLOW));
        assert_eq!(canvas.pixel(0, 10), Some(Color::YELLOW));
    }

    #[test]
    fn translucent_fill_blends() {
        let mut canvas = Canvas::new(1, 1);
        canvas.fill(Color::BLACK);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, Color::rgba(255, 255, 255, 128));

        let Color { r, a, .. } = canvas.pixel(0, 0).unwrap();
        assert_eq!(r, 128);
        assert_eq!(a, 255);
    }

    #[test]
    fn translucent_fill_over_transparent_keeps_source() {
        let mut canvas = Canvas::new(1, 1);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, Color::rgba(10, 20, 30, 100));
        assert_eq!(canvas.pixel(0, 0), Some(Color::rgba(10, 20, 30, 100)));
    }

    #[test]
    fn scaled_image_fills_canvas() {
        let mut canvas = Canvas::new(8, 8);
        canvas.draw_image_scaled(&RgbaImage::from_pixel(2, 2, Color::CYAN.to_rgba()));
        assert_eq!(count(&canvas, Color::CYAN), 64);
    }
}
