use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use parking_lot::RwLock;

use super::canvas::Canvas;
use super::geometry::Shape;
use super::resources::Resource;
use super::stage::Stage;

#[derive(Debug)]
struct Frame {
    number: u64,
    image: Arc<RgbaImage>,
}

/// The stable buffer: the last fully composited frame. Publishing swaps in a
/// whole new frame, so readers only ever see complete ones.
#[derive(Debug, Clone)]
pub struct FrameStore {
    latest: Arc<RwLock<Frame>>,
}

impl FrameStore {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            latest: Arc::new(RwLock::new(Frame {
                number: 0,
                image: Arc::new(RgbaImage::new(width, height)),
            })),
        }
    }

    pub fn publish(&self, image: RgbaImage) -> u64 {
        let image = Arc::new(image);
        let mut frame = self.latest.write();
        frame.number += 1;
        frame.image = image;
        frame.number
    }

    pub fn latest(&self) -> Arc<RgbaImage> {
        self.latest.read().image.clone()
    }

    /// Number of frames published so far.
    pub fn frame_number(&self) -> u64 {
        self.latest.read().number
    }

    /// Snapshot of the last complete frame, safe from any thread.
    pub fn screen_cut(&self) -> Resource {
        Resource::RasterImage(self.latest())
    }
}

/// Owns the working buffer and runs paint passes over a [`Stage`].
#[derive(Debug)]
pub struct Compositor {
    working: Canvas,
    frames: FrameStore,
    scaled_background: Option<(Arc<RgbaImage>, RgbaImage)>,
}

impl Compositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            working: Canvas::new(width, height),
            frames: FrameStore::new(width, height),
            scaled_background: None,
        }
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn working(&self) -> &Canvas {
        &self.working
    }

    /// One paint pass: background, object update passes, objects in order,
    /// buttons on top, then publish to the stable buffer.
    pub fn paint(&mut self, stage: &mut Stage, dt: Duration) -> u64 {
        self.draw_background(stage.background());
        stage.update_objects(dt);
        self.draw_objects(stage);
        self.draw_buttons(stage);
        let frame = self.frames.publish(self.working.image().clone());
        tracing::trace!(
            target: "paint",
            frame,
            objects = stage.objects().len(),
            buttons = stage.buttons().len(),
            "frame composited"
        );
        frame
    }

    fn draw_background(&mut self, background: &Resource) {
        match background {
            Resource::SolidColor(color) => self.working.fill(*color),
            Resource::RasterImage(image) => {
                let cached = matches!(&self.scaled_background, Some((source, _)) if Arc::ptr_eq(source, image));
                if !cached {
                    let mut scaled = Canvas::new(self.working.width(), self.working.height());
                    scaled.draw_image_scaled(image);
                    self.scaled_background = Some((image.clone(), scaled.image().clone()));
                }
                if let Some((_, scaled)) = &self.scaled_background {
                    self.working.draw_image_scaled(scaled);
                }
            }
        }
    }

    fn draw_objects(&mut self, stage: &Stage) {
        for obj in stage.objects().iter().filter(|o| o.alive) {
            let body = obj.body;
            match &obj.resource {
                Resource::RasterImage(image) => {
                    self.working.draw_image(image, body.x as i64, body.y as i64);
                }
                Resource::SolidColor(color) if !obj.is_particle() => match obj.shape {
                    Shape::Rectangle => self.working.fill_rect(body.x, body.y, body.width, body.height, *color),
                    Shape::Oval => self.working.fill_oval(body.x, body.y, body.width, body.height, *color),
                },
                // particle effect without a generated frame yet
                Resource::SolidColor(_) => {}
            }
        }
    }

    fn draw_buttons(&mut self, stage: &Stage) {
        for button in stage.buttons() {
            let b = button.bounds;
            let (rx, ry) = button.corner_radii();
            self.working.fill_round_rect(b.x, b.y, b.width, b.height, rx, ry, button.color());
        }
    }
}
