use winit::event::{ElementState, KeyEvent as WinitKeyEvent, MouseButton as WinitMouseButton};
use winit::event_loop::EventLoopProxy;
use winit::keyboard::Key;

use super::events::{KeyEvent, KeyKind, MouseButton, MouseEvent, MouseKind};
use super::game_loop::Display;

/// Events the tick thread posts back to the window's event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    Repaint,
    Exit,
}

pub struct WindowDisplay {
    proxy: EventLoopProxy<ShellEvent>,
}

impl WindowDisplay {
    pub fn new(proxy: EventLoopProxy<ShellEvent>) -> Self {
        Self { proxy }
    }
}

impl Display for WindowDisplay {
    fn request_repaint(&self) {
        // a closed loop means the window is already gone
        let _ = self.proxy.send_event(ShellEvent::Repaint);
    }

    fn request_exit(&self) {
        let _ = self.proxy.send_event(ShellEvent::Exit);
    }
}

/// Turns raw window input into engine events. Tracks the cursor, since
/// button events carry no position, and synthesizes `Clicked` when a button
/// is released where it was pressed.
#[derive(Debug)]
pub struct PlatformLayer {
    boot_timestamp: std::time::Instant,
    cursor: (f64, f64),
    pressed_at: Option<(MouseButton, (f64, f64))>,
}

impl PlatformLayer {
    pub fn new() -> Self {
        Self {
            boot_timestamp: std::time::Instant::now(),
            cursor: (0.0, 0.0),
            pressed_at: None,
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.boot_timestamp.elapsed()
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
    }

    pub fn cursor_entered(&self) -> MouseEvent {
        MouseEvent::new(MouseKind::Entered, self.cursor.0, self.cursor.1)
    }

    pub fn cursor_left(&mut self) -> MouseEvent {
        self.pressed_at = None;
        MouseEvent::new(MouseKind::Exited, self.cursor.0, self.cursor.1)
    }

    pub fn mouse_button(&mut self, pressed: bool, button: MouseButton) -> Vec<MouseEvent> {
        let (x, y) = self.cursor;
        if pressed {
            self.pressed_at = Some((button, self.cursor));
            return vec![MouseEvent::new(MouseKind::Pressed, x, y).with_button(button)];
        }
        let mut events = vec![MouseEvent::new(MouseKind::Released, x, y).with_button(button)];
        if self.pressed_at.take() == Some((button, self.cursor)) {
            events.push(MouseEvent::new(MouseKind::Clicked, x, y).with_button(button));
        }
        events
    }

    /// A press that produces text also yields a `Typed` event.
    pub fn keyboard(&self, event: &WinitKeyEvent) -> Vec<KeyEvent> {
        let key = key_name(&event.logical_key);
        match event.state {
            ElementState::Pressed => {
                let mut events = vec![KeyEvent::new(KeyKind::Pressed, key.clone())];
                if let Some(text) = event.text.as_ref().filter(|t| !t.is_empty()) {
                    events.push(KeyEvent::new(KeyKind::Typed, key).with_text(text.as_str()));
                }
                events
            }
            ElementState::Released => vec![KeyEvent::new(KeyKind::Released, key)],
        }
    }
}

impl Default for PlatformLayer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn mouse_button(button: WinitMouseButton) -> MouseButton {
    match button {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(code) => MouseButton::Other(code),
    }
}

pub fn key_name(key: &Key) -> String {
    match key {
        Key::Character(text) => text.to_string(),
        Key::Named(named) => format!("{named:?}"),
        Key::Unidentified(_) => "Unidentified".to_string(),
        Key::Dead(_) => "Dead".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NamedKey;

    #[test]
    fn release_in_place_is_a_click() {
        let mut platform = PlatformLayer::new();
        platform.cursor_moved(10.0, 20.0);

        assert_eq!(platform.mouse_button(true, MouseButton::Left).len(), 1);
        let released = platform.mouse_button(false, MouseButton::Left);

        let kinds: Vec<_> = released.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![MouseKind::Released, MouseKind::Clicked]);
        assert_eq!((released[1].x, released[1].y), (10.0, 20.0));
    }

    #[test]
    fn drag_is_not_a_click() {
        let mut platform = PlatformLayer::new();
        platform.mouse_button(true, MouseButton::Left);
        platform.cursor_moved(30.0, 5.0);

        let released = platform.mouse_button(false, MouseButton::Left);
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].kind, MouseKind::Released);
    }

    #[test]
    fn leaving_cancels_pending_click() {
        let mut platform = PlatformLayer::new();
        platform.mouse_button(true, MouseButton::Right);
        assert_eq!(platform.cursor_left().kind, MouseKind::Exited);
        assert_eq!(platform.mouse_button(false, MouseButton::Right).len(), 1);
    }

    #[test]
    fn named_keys_use_their_names() {
        assert_eq!(key_name(&Key::Named(NamedKey::Space)), "Space");
        assert_eq!(key_name(&Key::Character("q".into())), "q");
    }
}
