use std::fmt;
use std::sync::Arc;

use super::events::MouseEvent;
use super::geometry::Rect;
use super::resources::Color;
use super::scene::{Bounded, ObjectId};

pub type ClickHandler = Arc<dyn Fn(&MouseEvent) + Send + Sync>;

pub trait Clickable: Bounded {
    /// Offered every press/release; fires only when the event lands inside.
    /// Returns whether the handler ran.
    fn touch(&self, event: &MouseEvent) -> bool;
}

/// Top-layer rounded rectangle with a label and click handler. Never
/// animated or collision-checked.
#[derive(Clone)]
pub struct Button {
    id: ObjectId,
    pub text: String,
    pub bounds: Rect,
    pub color: Color,
    on_click: Option<ClickHandler>,
}

impl Button {
    pub fn new(text: impl Into<String>, bounds: Rect, color: Color) -> Self {
        Self {
            id: ObjectId::next(),
            text: text.into(),
            bounds,
            color,
            on_click: None,
        }
    }

    pub fn on_click(mut self, handler: impl Fn(&MouseEvent) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(handler));
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Corner radii used when painting: 15% of each side.
    pub fn corner_radii(&self) -> (f64, f64) {
        (self.bounds.width * 0.15, self.bounds.height * 0.15)
    }
}

impl Bounded for Button {
    fn bounds(&self) -> Rect {
        self.bounds
    }
}

impl Clickable for Button {
    fn touch(&self, event: &MouseEvent) -> bool {
        if !self.contains(event.x, event.y) {
            return false;
        }
        match &self.on_click {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }
}

impl PartialEq for Button {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("id", &self.id)
            .field("text", &self.text)
            .field("bounds", &self.bounds)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}
