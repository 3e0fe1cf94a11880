//! Component trait, the interface every pane implements.
//!
//! - Components own their own view state and render themselves.
//! - They read `AppState` but never mutate it.
//! - They answer input with `Vec<Action>`; the App applies those.

use ratatui::crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

use crate::action::{Action, ComponentId};
use crate::app_state::AppState;

pub trait Component {
    fn id(&self) -> ComponentId;

    /// Only called while this component has focus.
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action>;

    /// `area` is where the component was last drawn.
    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action>;

    /// Actions are broadcast to every component, focused or not.
    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState);
}
