use crate::ui::components::TextInput;
use ratatui::prelude::*;

/// Truncate a string to at most `max_len` chars, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// First line of a possibly multi-line text
pub fn first_line(s: &str) -> &str {
  s.lines().next().unwrap_or("")
}

/// Rect of at most `width` x `height` centered in `area`
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

/// An input's text with a block cursor when `focused`
pub fn input_line(input: &TextInput, focused: bool, indent: usize) -> Line<'static> {
  let text = input.display();
  let pad = " ".repeat(indent);
  if !focused {
    return Line::raw(format!("{}{}", pad, text));
  }

  let cursor = input.cursor_position();
  let before: String = text.chars().take(cursor).collect();
  let under: String = text.chars().skip(cursor).take(1).collect();
  let after: String = text.chars().skip(cursor + 1).collect();
  let cursor_style = Style::default().bg(Color::Yellow).fg(Color::Black);

  Line::from(vec![
    Span::raw(format!("{}{}", pad, before)),
    if under.is_empty() {
      Span::styled(" ", cursor_style)
    } else {
      Span::styled(under, cursor_style)
    },
    Span::raw(after),
  ])
}
