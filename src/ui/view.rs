use crate::routes::Route;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to input or a tick
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Replace the whole stack with the view for a route
  Navigate(Route),
}

/// Trait for view behavior
///
/// Views handle their own input modes (prompts, confirmations) and return
/// actions for the App to execute: App → View → Components.
///
/// Views that wait on remote calls hold a `Pending<T>` and poll it in
/// `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Pasted text, e.g. a dropped file path
  fn handle_paste(&mut self, _text: &str) {}

  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Route this view renders, shown in the footer
  fn route(&self) -> Route;

  /// Called on each tick to poll background work
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// True while the view is capturing text, so global keys pass through
  fn is_capturing_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("esc", "back").with_priority(90),
    ]
  }
}
