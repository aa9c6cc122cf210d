mod command_input;
mod confirm;
mod input;
mod toasts;

pub use command_input::CommandInput;
pub use confirm::ConfirmDialog;
pub use input::{InputResult, TextInput};
pub use toasts::Toasts;

/// What a component did with a key.
///
/// Components return this so their parent view knows whether to keep
/// looking for a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent
  Handled,
  /// Consumed, with an event for the parent
  Event(T),
  /// Not consumed, try the next handler
  NotHandled,
}
