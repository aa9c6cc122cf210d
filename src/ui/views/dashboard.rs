use crate::app::Context;
use crate::model::{Employee, Project, Testimonial};
use crate::routes::{Collection, Route};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Landing page: one card per collection with its record count
pub struct DashboardView {
  ctx: Context,
  selected: usize,
}

impl DashboardView {
  pub fn new(ctx: Context) -> Self {
    Self { ctx, selected: 0 }
  }

  fn selected_collection(&self) -> Collection {
    Collection::ALL[self.selected % Collection::ALL.len()]
  }

  /// Count, or `None` while the first fetch is still running
  fn count(&self, collection: Collection) -> Option<usize> {
    let cache = &self.ctx.cache;
    let (loading, len) = match collection {
      Collection::Employees => (cache.is_loading::<Employee>(), cache.len::<Employee>()),
      Collection::Projects => (cache.is_loading::<Project>(), cache.len::<Project>()),
      Collection::Testimonials => (
        cache.is_loading::<Testimonial>(),
        cache.len::<Testimonial>(),
      ),
    };
    if loading && len == 0 {
      None
    } else {
      Some(len)
    }
  }

  fn render_card(&self, frame: &mut Frame, area: Rect, collection: Collection, selected: bool) {
    let border = if selected { Color::Cyan } else { Color::Blue };
    let block = Block::default()
      .title(format!(" {} ", collection.title()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));

    let count = match self.count(collection) {
      Some(n) => Span::styled(n.to_string(), Style::default().fg(Color::White).bold()),
      None => Span::styled("...", Style::default().fg(Color::DarkGray)),
    };

    let text = vec![
      Line::raw(""),
      Line::from(count),
      Line::styled(
        format!("total {}", collection.slug()),
        Style::default().fg(Color::DarkGray),
      ),
      Line::raw(""),
      Line::from(vec![
        Span::styled("<enter>", Style::default().fg(Color::Cyan)),
        Span::styled(" view  ", Style::default().fg(Color::DarkGray)),
        Span::styled("<a>", Style::default().fg(Color::Cyan)),
        Span::styled(" add", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    frame.render_widget(
      Paragraph::new(text).alignment(Alignment::Center).block(block),
      area,
    );
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let n = Collection::ALL.len();
    match key.code {
      KeyCode::Char('l') | KeyCode::Right | KeyCode::Char('j') | KeyCode::Down => {
        self.selected = (self.selected + 1) % n;
      }
      KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('k') | KeyCode::Up => {
        self.selected = (self.selected + n - 1) % n;
      }
      KeyCode::Enter | KeyCode::Char('v') => {
        return ViewAction::Navigate(Route::List(self.selected_collection()));
      }
      KeyCode::Char('a') => {
        return ViewAction::Push(views::for_route(
          Route::Add(self.selected_collection()),
          &self.ctx,
        ));
      }
      KeyCode::Char('r') => self.ctx.reload_all(),
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let outer = Block::default()
      .title(" Dashboard ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(9), Constraint::Min(0)])
      .split(inner);
    let cards = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Ratio(1, 3); 3])
      .split(rows[0]);

    for (i, collection) in Collection::ALL.into_iter().enumerate() {
      self.render_card(frame, cards[i], collection, i == self.selected);
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn route(&self) -> Route {
    Route::Dashboard
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("enter", "view").with_priority(20),
      ShortcutInfo::new("a", "add").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
    ]
  }
}
