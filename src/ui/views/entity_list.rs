use crate::app::Context;
use crate::cache::Cached;
use crate::error::RepositoryError;
use crate::lifecycle;
use crate::model::{Employee, Project, Testimonial};
use crate::pending::Pending;
use crate::routes::{Collection, Route};
use crate::ui::components::{ConfirmDialog, KeyResult};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{first_line, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::EntityFormView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// How an entity shows up as a list row
pub trait Summary: Cached {
  const COLLECTION: Collection;

  /// Second column, e.g. the designation
  fn detail(&self) -> String;

  /// Third column, describing the attachments
  fn media(&self) -> String;
}

impl Summary for Employee {
  const COLLECTION: Collection = Collection::Employees;

  fn detail(&self) -> String {
    self.designation.clone()
  }

  fn media(&self) -> String {
    if self.image.is_empty() {
      "no photo".into()
    } else {
      "photo".into()
    }
  }
}

impl Summary for Project {
  const COLLECTION: Collection = Collection::Projects;

  fn detail(&self) -> String {
    first_line(&self.description).to_string()
  }

  fn media(&self) -> String {
    let images = match (self.cover(), self.images.len()) {
      (None, _) => "no images".to_string(),
      (Some(_), 1) => "1 image".to_string(),
      (Some(_), n) => format!("{} images", n),
    };
    if self.video.is_some() {
      format!("{} + video", images)
    } else {
      images
    }
  }
}

impl Summary for Testimonial {
  const COLLECTION: Collection = Collection::Testimonials;

  fn detail(&self) -> String {
    format!("\"{}\"", first_line(&self.description))
  }

  fn media(&self) -> String {
    if self.image.is_empty() {
      "no photo".into()
    } else {
      "photo".into()
    }
  }
}

/// Cached collection with add/edit/delete
pub struct EntityListView<E: Summary> {
  ctx: Context,
  list_state: ListState,
  confirm: ConfirmDialog<E>,
  deleting: Pending<Result<(), RepositoryError>>,
  refreshing: Pending<Result<(), RepositoryError>>,
}

impl<E: Summary> EntityListView<E> {
  pub fn new(ctx: Context) -> Self {
    Self {
      ctx,
      list_state: ListState::default(),
      confirm: ConfirmDialog::new(),
      deleting: Pending::default(),
      refreshing: Pending::default(),
    }
  }

  fn selected(&self) -> Option<E> {
    let idx = self.list_state.selected()?;
    self.ctx.cache.items::<E>().into_iter().nth(idx)
  }

  fn refresh(&mut self) {
    if self.refreshing.is_running() {
      return;
    }
    let cache = self.ctx.cache.clone();
    self.refreshing = Pending::spawn(async move { cache.refresh::<E>().await });
  }

  fn delete(&mut self, entity: E) {
    let ctx = self.ctx.clone();
    self.deleting = Pending::spawn(async move {
      lifecycle::delete_entity(&ctx.cache, &ctx.attachments, &ctx.notifier, &entity).await
    });
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let snapshot = self.ctx.cache.snapshot::<E>();
    ensure_valid_selection(&mut self.list_state, snapshot.items.len());

    let status = if self.deleting.is_running() {
      " (deleting...)".to_string()
    } else if snapshot.loading {
      " (loading...)".to_string()
    } else {
      String::new()
    };
    let title = format!(
      " {} ({}){} ",
      E::COLLECTION.title(),
      snapshot.items.len(),
      status
    );

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if snapshot.items.is_empty() {
      let content = if snapshot.loading {
        vec![Line::raw(format!("Loading {}...", E::PLURAL))]
      } else {
        vec![
          Line::raw(format!("No {} added yet", E::PLURAL)),
          Line::styled(
            format!("Press 'a' to add your first {}", E::SINGULAR),
            Style::default().fg(Color::DarkGray),
          ),
        ]
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = snapshot
      .items
      .iter()
      .map(|entity| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<26}", truncate(entity.display_name(), 26)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::raw(format!("{:<50}", truncate(&entity.detail(), 50))),
          Span::raw(" "),
          Span::styled(entity.media(), Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl<E: Summary> View for EntityListView<E> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.confirm.handle_key(key) {
      KeyResult::Event(entity) => {
        self.delete(entity);
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('a') => {
        return ViewAction::Push(Box::new(EntityFormView::<E>::new(self.ctx.clone(), None)));
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(entity) = self.selected() {
          return ViewAction::Push(Box::new(EntityFormView::<E>::new(
            self.ctx.clone(),
            Some(entity.id().to_string()),
          )));
        }
      }
      KeyCode::Char('d') => {
        if self.deleting.is_running() {
          return ViewAction::None;
        }
        if let Some(entity) = self.selected() {
          let message = format!(
            "This will permanently delete {}. This action cannot be undone.",
            entity.display_name()
          );
          self.confirm.show("Are you sure?", message, entity);
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    E::COLLECTION.title().to_string()
  }

  fn route(&self) -> Route {
    Route::List(E::COLLECTION)
  }

  fn tick(&mut self) -> ViewAction {
    // Outcomes are reported through notifications
    let _ = self.deleting.poll();
    let _ = self.refreshing.poll();
    ViewAction::None
  }

  fn is_capturing_input(&self) -> bool {
    self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    if self.confirm.is_active() {
      return vec![
        ShortcutInfo::new("y", "confirm").with_priority(10),
        ShortcutInfo::new("n", "cancel").with_priority(20),
      ];
    }
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a", format_add::<E>()).with_priority(20),
      ShortcutInfo::new("e", "edit").with_priority(30),
      ShortcutInfo::new("d", "delete").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("esc", "back").with_priority(90),
    ]
  }
}

/// "add employee" style label
fn format_add<E: Summary>() -> &'static str {
  match E::COLLECTION {
    Collection::Employees => "add employee",
    Collection::Projects => "add project",
    Collection::Testimonials => "add testimonial",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::memory::MemoryBackend;
  use crate::lifecycle::capitalize;
  use crate::model::Entity;
  use crossterm::event::KeyModifiers;
  use serde_json::json;
  use std::sync::Arc;

  fn project(images: usize, video: Option<&str>) -> Project {
    Project {
      id: "p".into(),
      name: "Tower".into(),
      description: "Twin towers\nby the lake".into(),
      details: String::new(),
      images: (0..images).map(|i| format!("https://cdn/{i}.jpg")).collect(),
      video: video.map(String::from),
      created_at: None,
    }
  }

  #[test]
  fn test_project_summary() {
    assert_eq!(project(0, None).media(), "no images");
    assert_eq!(project(1, None).media(), "1 image");
    assert_eq!(project(3, Some("https://youtu.be/x")).media(), "3 images + video");
    assert_eq!(project(1, None).detail(), "Twin towers");
  }

  #[test]
  fn test_capitalized_collection_names() {
    assert_eq!(capitalize(Employee::SINGULAR), "Employee");
    assert_eq!(format_add::<Testimonial>(), "add testimonial");
  }

  #[tokio::test]
  async fn test_delete_confirm_holds_keys_until_answered() {
    let backend = Arc::new(MemoryBackend::new());
    let ctx = Context::for_tests(backend.clone());
    backend.seed(
      "employees",
      json!({ "name": "A. Rao" }).as_object().unwrap().clone(),
    );
    ctx.cache.load_all().await;

    let mut view = EntityListView::<Employee>::new(ctx);
    ensure_valid_selection(&mut view.list_state, 1);
    assert!(!view.is_capturing_input());

    view.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE));
    assert!(view.is_capturing_input());

    view.handle_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE));
    assert!(!view.is_capturing_input());
    assert_eq!(backend.rows("employees").len(), 1);
  }
}
