use crate::notify::{Level, Notification};
use crate::ui::renderfns::truncate;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_VISIBLE: usize = 4;
const WIDTH: u16 = 44;

/// Stack of recent notifications in the top-right corner.
#[derive(Debug)]
pub struct Toasts {
  items: VecDeque<(Notification, Instant)>,
  ttl: Duration,
}

impl Default for Toasts {
  fn default() -> Self {
    Self::new(Duration::from_secs(5))
  }
}

impl Toasts {
  pub fn new(ttl: Duration) -> Self {
    Self {
      items: VecDeque::new(),
      ttl,
    }
  }

  pub fn push(&mut self, notification: Notification) {
    self.items.push_back((notification, Instant::now()));
    while self.items.len() > MAX_VISIBLE {
      self.items.pop_front();
    }
  }

  /// Drop expired toasts
  pub fn tick(&mut self) {
    let ttl = self.ttl;
    self.items.retain(|(_, shown)| shown.elapsed() < ttl);
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let width = WIDTH.min(area.width);
    let mut y = area.y;

    for (note, _) in self.items.iter().rev() {
      let height = 4u16;
      if y + height > area.y + area.height {
        break;
      }
      let rect = Rect::new(area.x + area.width - width, y, width, height);
      y += height;

      let color = level_color(note.level);
      let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
          format!(" {} ", truncate(&note.title, (width as usize).saturating_sub(4))),
          Style::default().fg(color).bold(),
        ));

      frame.render_widget(Clear, rect);
      frame.render_widget(
        Paragraph::new(note.description.as_str())
          .block(block)
          .wrap(Wrap { trim: true }),
        rect,
      );
    }
  }
}

fn level_color(level: Level) -> Color {
  match level {
    Level::Success => Color::Green,
    Level::Warning => Color::Yellow,
    Level::Error => Color::Red,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn note(title: &str) -> Notification {
    Notification {
      level: Level::Success,
      title: title.into(),
      description: String::new(),
    }
  }

  #[test]
  fn test_keeps_most_recent() {
    let mut toasts = Toasts::default();
    for i in 0..6 {
      toasts.push(note(&format!("n{i}")));
    }
    assert_eq!(toasts.len(), MAX_VISIBLE);
    assert_eq!(toasts.items.front().unwrap().0.title, "n2");
  }

  #[test]
  fn test_expire() {
    let mut toasts = Toasts::new(Duration::ZERO);
    toasts.push(note("gone"));
    toasts.tick();
    assert_eq!(toasts.len(), 0);
  }
}
