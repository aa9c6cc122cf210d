use super::KeyResult;
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Yes/no confirmation overlay. Carries the value being confirmed so the
/// parent gets it back with the answer.
#[derive(Debug, Clone)]
pub struct ConfirmDialog<T> {
  pending: Option<(String, String, T)>,
}

impl<T> Default for ConfirmDialog<T> {
  fn default() -> Self {
    Self { pending: None }
  }
}

impl<T> ConfirmDialog<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.pending.is_some()
  }

  pub fn show(&mut self, title: impl Into<String>, message: impl Into<String>, value: T) {
    self.pending = Some((title.into(), message.into(), value));
  }

  /// `y` confirms and hands back the value; `n`/Esc dismisses.
  /// Swallows every other key while open.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<T> {
    if self.pending.is_none() {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => match self.pending.take() {
        Some((_, _, value)) => KeyResult::Event(value),
        None => KeyResult::Handled,
      },
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
        self.pending = None;
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some((title, message, _)) = &self.pending else {
      return;
    };

    let overlay = centered_rect(area, 56, 7);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(format!(" {} ", title));

    let text = vec![
      Line::from(message.as_str()),
      Line::raw(""),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" delete   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, overlay);
  }
}
