pub mod sandbox;

use anyhow::Result;

use crate::engine::events::{KeyEvent, MouseEvent};
use crate::engine::stage::Stage;

/// Extension points the engine calls from the tick thread. Every method has
/// a default, so a game overrides only what it needs.
pub trait Game: Send {
    fn name(&self) -> &str;

    /// Runs once, before the tick thread starts.
    fn on_init(&mut self, _stage: &mut Stage) -> Result<()> {
        Ok(())
    }

    /// Per-frame hook. Errors and panics are logged and the loop goes on.
    fn on_refresh(&mut self, _stage: &mut Stage) -> Result<()> {
        Ok(())
    }

    fn on_click(&mut self, _stage: &mut Stage, _event: &MouseEvent) {}

    fn on_mouse(&mut self, _stage: &mut Stage, _event: &MouseEvent) {}

    fn on_key(&mut self, _stage: &mut Stage, _event: &KeyEvent) {}

    fn on_focus(&mut self, stage: &mut Stage) {
        stage.resume();
    }

    fn on_lose_focus(&mut self, stage: &mut Stage) {
        stage.pause();
    }

    /// Asked when the window is closed; `true` lets the process exit.
    fn on_exit(&mut self, _stage: &mut Stage) -> bool {
        true
    }
}

pub use sandbox::SandboxGame;
