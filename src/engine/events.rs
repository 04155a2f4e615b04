#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Entered,
    Exited,
    Pressed,
    Released,
    Clicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub kind: MouseKind,
    pub x: f64,
    pub y: f64,
    pub button: MouseButton,
}

impl MouseEvent {
    pub fn new(kind: MouseKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            x,
            y,
            button: MouseButton::Left,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Press and release are the only kinds offered to buttons.
    pub fn is_touch(&self) -> bool {
        matches!(self.kind, MouseKind::Pressed | MouseKind::Released)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Typed,
    Pressed,
    Released,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyKind,
    /// Logical key name: the produced character, or a named key like
    /// `Space` or `Escape`.
    pub key: String,
    pub text: Option<String>,
}

impl KeyEvent {
    pub fn new(kind: KeyKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn is(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

type KeyCallback = Box<dyn FnMut(&KeyEvent) + Send>;

/// Separate callbacks per key event kind; unset kinds are ignored.
#[derive(Default)]
pub struct KeyListener {
    typed: Option<KeyCallback>,
    pressed: Option<KeyCallback>,
    released: Option<KeyCallback>,
}

impl KeyListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// One callback for every kind.
    pub fn all(callback: impl FnMut(&KeyEvent) + Send + 'static) -> Self {
        let shared = std::sync::Arc::new(parking_lot::Mutex::new(callback));
        let typed = shared.clone();
        let pressed = shared.clone();
        Self {
            typed: Some(Box::new(move |e: &KeyEvent| {
                let mut callback = typed.lock();
                (*callback)(e)
            })),
            pressed: Some(Box::new(move |e: &KeyEvent| {
                let mut callback = pressed.lock();
                (*callback)(e)
            })),
            released: Some(Box::new(move |e: &KeyEvent| {
                let mut callback = shared.lock();
                (*callback)(e)
            })),
        }
    }

    pub fn on_typed(mut self, callback: impl FnMut(&KeyEvent) + Send + 'static) -> Self {
        self.typed = Some(Box::new(callback));
        self
    }

    pub fn on_pressed(mut self, callback: impl FnMut(&KeyEvent) + Send + 'static) -> Self {
        self.pressed = Some(Box::new(callback));
        self
    }

    pub fn on_released(mut self, callback: impl FnMut(&KeyEvent) + Send + 'static) -> Self {
        self.released = Some(Box::new(callback));
        self
    }

    pub fn dispatch(&mut self, event: &KeyEvent) {
        let slot = match event.kind {
            KeyKind::Typed => &mut self.typed,
            KeyKind::Pressed => &mut self.pressed,
            KeyKind::Released => &mut self.released,
        };
        if let Some(callback) = slot {
            callback(event);
        }
    }
}

impl std::fmt::Debug for KeyListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyListener")
            .field("typed", &self.typed.is_some())
            .field("pressed", &self.pressed.is_some())
            .field("released", &self.released.is_some())
            .finish()
    }
}
