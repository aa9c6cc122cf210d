use crate::routes::Route;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Shown for paths that match no route
pub struct NotFoundView {
  path: String,
}

impl NotFoundView {
  pub fn new(path: String) -> Self {
    Self { path }
  }
}

impl View for NotFoundView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Enter => ViewAction::Navigate(Route::Dashboard),
      KeyCode::Esc | KeyCode::Char('q') => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let text = vec![
      Line::styled("404", Style::default().fg(Color::Red).bold()),
      Line::raw(""),
      Line::raw(format!("Nothing lives at {}", self.path)),
      Line::styled(
        "Press Enter to return to the dashboard",
        Style::default().fg(Color::DarkGray),
      ),
    ];
    let block = Block::default()
      .title(" Page not found ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    frame.render_widget(
      Paragraph::new(text).alignment(Alignment::Center).block(block),
      area,
    );
  }

  fn breadcrumb_label(&self) -> String {
    "Not found".to_string()
  }

  fn route(&self) -> Route {
    Route::NotFound(self.path.clone())
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("enter", "dashboard").with_priority(20),
    ]
  }
}
