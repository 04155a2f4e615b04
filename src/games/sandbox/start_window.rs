use crossbeam_channel::Sender;

use crate::engine::button::Button;
use crate::engine::events::MouseKind;
use crate::engine::geometry::Rect;
use crate::engine::resources::Color;

use super::states::MenuAction;

#[derive(Debug, Clone)]
pub struct StartWindow {
    pub title: &'static str,
    pub subtitle: &'static str,
    buttons: Vec<(&'static str, MenuAction)>,
}

impl Default for StartWindow {
    fn default() -> Self {
        Self {
            title: "Sandbox Prototype",
            subtitle: "Ready to explore?",
            buttons: vec![("Start", MenuAction::Start), ("Reset", MenuAction::Reset)],
        }
    }
}

impl StartWindow {
    /// Menu buttons centered in a `width` x `height` window. Each one posts
    /// its action when released.
    pub fn buttons(&self, width: u32, height: u32, actions: &Sender<MenuAction>) -> Vec<Button> {
        let button_width = (width as f64 * 0.5).min(360.0);
        let button_height = 48.0;
        let vertical_spacing = 18.0;
        let center_x = (width as f64 - button_width) / 2.0;
        let start_y = (height as f64 * 0.45) - button_height / 2.0;

        self.buttons
            .iter()
            .enumerate()
            .map(|(idx, (label, action))| {
                let y = start_y + idx as f64 * (button_height + vertical_spacing);
                let color = if idx == 0 {
                    Color::rgba(158, 92, 240, 235)
                } else {
                    Color::rgba(71, 79, 130, 230)
                };
                let sender = actions.clone();
                let action = *action;
                Button::new(*label, Rect::new(center_x, y, button_width, button_height), color).on_click(move |event| {
                    if event.kind == MouseKind::Released {
                        let _ = sender.send(action);
                    }
                })
            })
            .collect()
    }
}
