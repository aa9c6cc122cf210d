use super::Summary;
use crate::app::Context;
use crate::attachments::storage_key;
use crate::error::RepositoryError;
use crate::form::{FormController, Mode, Phase};
use crate::lifecycle::capitalize;
use crate::model::{Draft, FieldKind, FieldSpec, FieldValue};
use crate::pending::Pending;
use crate::routes::Route;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::renderfns::{centered_rect, input_line, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::video::Embed;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::path::PathBuf;

/// Result of a background upload for one field
#[derive(Debug)]
enum Uploaded {
  /// New URL for a single-image field, `None` if the upload failed
  Image(&'static str, Option<String>),
  /// URLs to append to a gallery
  Gallery(&'static str, Vec<String>),
}

/// Add or edit form for any entity.
///
/// Text fields edit in place. Image fields take local file paths through a
/// prompt and upload them right away; the resulting URLs go into the draft.
pub struct EntityFormView<E: Summary> {
  ctx: Context,
  form: FormController<E>,
  /// One input per field, used by the text-like ones
  inputs: Vec<TextInput>,
  focus: usize,
  /// Selected image within the focused gallery
  gallery_cursor: usize,
  /// Path prompt for the focused image field
  prompt: Option<TextInput>,
  uploading: Pending<Uploaded>,
  saving: Pending<Result<(), RepositoryError>>,
  /// Inputs reflect the draft loaded from the cache
  populated: bool,
}

impl<E: Summary> EntityFormView<E> {
  /// Create form without `id`, edit form with one.
  pub fn new(ctx: Context, id: Option<String>) -> Self {
    let form = match id {
      Some(id) => FormController::edit(id, ctx.notifier.clone()),
      None => FormController::create(ctx.notifier.clone()),
    };
    let mut view = Self {
      ctx,
      form,
      inputs: Vec::new(),
      focus: 0,
      gallery_cursor: 0,
      prompt: None,
      uploading: Pending::default(),
      saving: Pending::default(),
      populated: false,
    };
    view.sync();
    view
  }

  fn fields() -> &'static [FieldSpec] {
    E::Draft::FIELDS
  }

  fn focused(&self) -> &'static FieldSpec {
    &Self::fields()[self.focus.min(Self::fields().len() - 1)]
  }

  fn is_text(kind: FieldKind) -> bool {
    matches!(
      kind,
      FieldKind::Text | FieldKind::LongText | FieldKind::VideoUrl
    )
  }

  /// Pull the edit target from the cache and build the inputs once
  fn sync(&mut self) {
    self.form.sync(&self.ctx.cache);
    if !self.populated && self.form.phase() == Phase::Editing {
      self.inputs = Self::fields()
        .iter()
        .map(|f| TextInput::with_value(self.form.value(f.name).as_text()))
        .collect();
      self.populated = true;
    }
  }

  fn move_focus(&mut self, delta: isize) {
    let n = Self::fields().len() as isize;
    self.focus = (self.focus as isize + delta).rem_euclid(n) as usize;
    self.gallery_cursor = 0;
  }

  fn gallery(&self, field: &str) -> Vec<String> {
    self.form.value(field).urls()
  }

  fn submit(&mut self) {
    if self.saving.is_running() || self.form.is_submitting() {
      return;
    }
    if self.uploading.is_running() {
      self
        .ctx
        .notifier
        .warning("Upload in progress", "Please wait for the upload to finish");
      return;
    }
    if let Some(submission) = self.form.begin_submit() {
      let cache = self.ctx.cache.clone();
      self.saving = Pending::spawn(async move { submission.execute::<E>(cache).await });
    }
  }

  fn open_prompt(&mut self) {
    if self.uploading.is_running() {
      return;
    }
    self.prompt = Some(TextInput::new());
  }

  /// Read the files behind `input` and upload them for the focused field
  fn start_upload(&mut self, input: &str) {
    let field = self.focused();
    let paths: Vec<PathBuf> = input
      .split(',')
      .map(|p| p.trim().trim_matches('\'').trim_matches('"'))
      .filter(|p| !p.is_empty())
      .map(PathBuf::from)
      .collect();
    if paths.is_empty() {
      return;
    }

    let attachments = self.ctx.attachments.clone();

    match field.kind {
      FieldKind::Image => {
        let path = paths[0].clone();
        self.uploading = Pending::spawn(async move {
          Uploaded::Image(field.name, attachments.attach_path(&path).await)
        });
      }
      FieldKind::Gallery { max } => {
        let existing = self.gallery(field.name);
        let max = max.min(self.ctx.config.limits.max_gallery_images);
        self.uploading = Pending::spawn(async move {
          let files = attachments.read_batch(&paths).await;
          let added = match attachments.upload_batch(&existing, &files, max).await {
            Ok(urls) => urls.into_iter().skip(existing.len()).collect(),
            Err(_) => Vec::new(),
          };
          Uploaded::Gallery(field.name, added)
        });
      }
      _ => {}
    }
  }

  fn apply_upload(&mut self, uploaded: Uploaded) {
    match uploaded {
      Uploaded::Image(field, Some(url)) => {
        self.form.set_value(field, FieldValue::Image(Some(url)));
      }
      Uploaded::Image(_, None) => {}
      Uploaded::Gallery(field, added) => {
        if added.is_empty() {
          return;
        }
        let mut urls = self.gallery(field);
        urls.extend(added);
        self.form.set_value(field, FieldValue::Gallery(urls));
      }
    }
  }

  /// Drop the selected image from the draft and delete it best-effort
  fn remove_image(&mut self) {
    if self.uploading.is_running() {
      return;
    }
    let field = self.focused();
    let removed = match field.kind {
      FieldKind::Image => {
        let url = self.form.value(field.name).urls().into_iter().next();
        if url.is_some() {
          self.form.set_value(field.name, FieldValue::Image(None));
        }
        url
      }
      FieldKind::Gallery { .. } => {
        let mut urls = self.gallery(field.name);
        if self.gallery_cursor < urls.len() {
          let url = urls.remove(self.gallery_cursor);
          self.form.set_value(field.name, FieldValue::Gallery(urls));
          self.gallery_cursor = self.gallery_cursor.saturating_sub(1);
          Some(url)
        } else {
          None
        }
      }
      _ => None,
    };

    if let Some(url) = removed {
      let attachments = self.ctx.attachments.clone();
      tokio::spawn(async move { attachments.detach(&url).await });
    }
  }

  fn handle_image_key(&mut self, key: KeyEvent) -> ViewAction {
    let field = self.focused();
    match key.code {
      KeyCode::Enter => self.open_prompt(),
      KeyCode::Char('x') | KeyCode::Delete => self.remove_image(),
      KeyCode::Char(']') | KeyCode::Right => {
        let len = self.gallery(field.name).len();
        if len > 0 {
          self.gallery_cursor = (self.gallery_cursor + 1).min(len - 1);
        }
      }
      KeyCode::Char('[') | KeyCode::Left => {
        self.gallery_cursor = self.gallery_cursor.saturating_sub(1);
      }
      KeyCode::Char('j') => self.move_focus(1),
      KeyCode::Char('k') => self.move_focus(-1),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn title(&self) -> String {
    let singular = capitalize(E::SINGULAR);
    if matches!(self.form.mode(), Mode::Create) {
      format!(" Add {} ", singular)
    } else {
      format!(" Edit {} ", singular)
    }
  }

  fn field_lines(&self, index: usize, spec: &FieldSpec) -> Vec<Line<'static>> {
    let focused = index == self.focus;
    let marker = if focused { "▶ " } else { "  " };
    let label_style = if focused {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    let mut lines = vec![Line::from(vec![
      Span::styled(marker, Style::default().fg(Color::Cyan)),
      Span::styled(spec.label, label_style),
    ])];

    match spec.kind {
      FieldKind::Text | FieldKind::LongText | FieldKind::VideoUrl => {
        let Some(input) = self.inputs.get(index) else {
          return lines;
        };
        let value = input.value();
        lines.push(input_line(input, focused && self.prompt.is_none(), 4));

        if spec.kind == FieldKind::VideoUrl && !value.trim().is_empty() {
          let preview = match Embed::parse(value) {
            Some(embed) => Span::styled(
              format!("    preview: {}", embed.player_url()),
              Style::default().fg(Color::DarkGray),
            ),
            None => Span::styled("    Invalid video URL", Style::default().fg(Color::Yellow)),
          };
          lines.push(Line::from(preview));
        }
      }
      FieldKind::Image => {
        let text = match self.form.value(spec.name).urls().first() {
          Some(url) => storage_key(url).unwrap_or(url).to_string(),
          None => "(no image) Enter to upload".to_string(),
        };
        lines.push(Line::styled(
          format!("    {}", text),
          Style::default().fg(Color::White),
        ));
      }
      FieldKind::Gallery { max } => {
        let urls = self.form.value(spec.name).urls();
        lines.push(Line::styled(
          format!("    {}/{} images, Enter to add", urls.len(), max),
          Style::default().fg(Color::DarkGray),
        ));
        for (i, url) in urls.iter().enumerate() {
          let selected = focused && i == self.gallery_cursor;
          let style = if selected {
            Style::default().bg(Color::DarkGray).fg(Color::White)
          } else {
            Style::default().fg(Color::White)
          };
          let cover = if i == 0 { "  (cover)" } else { "" };
          lines.push(Line::styled(
            format!(
              "    {}. {}{}",
              i + 1,
              truncate(storage_key(url).unwrap_or(url), 48),
              cover
            ),
            style,
          ));
        }
      }
    }

    if let Some(message) = self.form.error(spec.name) {
      lines.push(Line::styled(
        format!("    {}", message),
        Style::default().fg(Color::Red),
      ));
    }
    lines.push(Line::raw(""));
    lines
  }

  fn render_prompt(&self, frame: &mut Frame, area: Rect) {
    let Some(prompt) = &self.prompt else {
      return;
    };
    let title = match self.focused().kind {
      FieldKind::Gallery { .. } => " Image paths (comma separated) ",
      _ => " Image path ",
    };
    let overlay = centered_rect(area, 70, 3);
    frame.render_widget(Clear, overlay);
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(title);
    frame.render_widget(
      Paragraph::new(input_line(prompt, true, 0)).block(block),
      overlay,
    );
  }
}

impl<E: Summary> View for EntityFormView<E> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(prompt) = self.prompt.as_mut() {
      match prompt.handle_key(key) {
        InputResult::Submitted(value) => {
          self.prompt = None;
          self.start_upload(&value);
        }
        InputResult::Cancelled => self.prompt = None,
        _ => {}
      }
      return ViewAction::None;
    }

    match self.form.phase() {
      Phase::Loading | Phase::Missing => {
        return match key.code {
          KeyCode::Esc | KeyCode::Char('q') => ViewAction::Pop,
          _ => ViewAction::None,
        };
      }
      Phase::Succeeded => return ViewAction::Pop,
      // Fields are locked until the save settles
      Phase::Validating | Phase::Submitting => return ViewAction::None,
      Phase::Editing => {}
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Char('s') if ctrl => {
        self.submit();
        return ViewAction::None;
      }
      KeyCode::Tab | KeyCode::Down => {
        self.move_focus(1);
        return ViewAction::None;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.move_focus(-1);
        return ViewAction::None;
      }
      _ => {}
    }

    let field = self.focused();
    if !Self::is_text(field.kind) {
      return self.handle_image_key(key);
    }

    let Some(input) = self.inputs.get_mut(self.focus) else {
      return ViewAction::None;
    };
    match input.handle_key(key) {
      InputResult::Changed => {
        let value = input.value().to_string();
        self.form.set_value(field.name, FieldValue::Text(value));
      }
      InputResult::Submitted(_) => self.move_focus(1),
      InputResult::Cancelled => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn handle_paste(&mut self, text: &str) {
    if let Some(prompt) = self.prompt.as_mut() {
      prompt.insert_str(text.trim());
      return;
    }
    let field = self.focused();
    if !Self::is_text(field.kind) || !self.form.is_editable() {
      return;
    }
    if let Some(input) = self.inputs.get_mut(self.focus) {
      input.insert_str(text);
      let value = input.value().to_string();
      self.form.set_value(field.name, FieldValue::Text(value));
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines: Vec<Line> = match self.form.phase() {
      Phase::Loading => vec![Line::styled(
        format!("Loading {}...", E::SINGULAR),
        Style::default().fg(Color::DarkGray),
      )],
      Phase::Missing => vec![
        Line::styled(
          format!("{} not found", capitalize(E::SINGULAR)),
          Style::default().fg(Color::Red),
        ),
        Line::styled("Press Esc to go back", Style::default().fg(Color::DarkGray)),
      ],
      _ => {
        let mut lines: Vec<Line> = Self::fields()
          .iter()
          .enumerate()
          .flat_map(|(i, spec)| self.field_lines(i, spec))
          .collect();
        let status = if self.form.is_submitting() {
          Line::styled("Saving...", Style::default().fg(Color::Yellow))
        } else if self.uploading.is_running() {
          Line::styled("Uploading...", Style::default().fg(Color::Yellow))
        } else {
          Line::styled("Ctrl-S to save", Style::default().fg(Color::DarkGray))
        };
        lines.push(status);
        lines
      }
    };

    // Keep the focused field in view on small terminals
    let focus_line: usize = Self::fields()
      .iter()
      .take(self.focus)
      .enumerate()
      .map(|(i, spec)| self.field_lines(i, spec).len())
      .sum();
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = focus_line.saturating_sub(visible / 2) as u16;

    frame.render_widget(
      Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0)),
      area,
    );
    self.render_prompt(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.form.mode() {
      Mode::Create => format!("Add {}", capitalize(E::SINGULAR)),
      Mode::Edit(_) => match self.form.draft().display_name() {
        "" => format!("Edit {}", capitalize(E::SINGULAR)),
        name => format!("Edit {}", name),
      },
    }
  }

  fn route(&self) -> Route {
    match self.form.mode() {
      Mode::Create => Route::Add(E::COLLECTION),
      Mode::Edit(id) => Route::Edit(E::COLLECTION, id.clone()),
    }
  }

  fn tick(&mut self) -> ViewAction {
    self.sync();

    if let Some(uploaded) = self.uploading.poll() {
      self.apply_upload(uploaded);
    }

    if let Some(result) = self.saving.poll() {
      self.form.finish(result);
      if self.form.phase() == Phase::Succeeded {
        return ViewAction::Pop;
      }
    }
    ViewAction::None
  }

  fn is_capturing_input(&self) -> bool {
    self.prompt.is_some() || (self.form.is_editable() && Self::is_text(self.focused().kind))
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new("tab", "next field").with_priority(10),
      ShortcutInfo::new("ctrl-s", "save").with_priority(20),
      ShortcutInfo::new("esc", "back").with_priority(90),
    ];
    match self.focused().kind {
      FieldKind::Image => {
        shortcuts.push(ShortcutInfo::new("enter", "upload").with_priority(30));
        shortcuts.push(ShortcutInfo::new("x", "remove").with_priority(40));
      }
      FieldKind::Gallery { .. } => {
        shortcuts.push(ShortcutInfo::new("enter", "add images").with_priority(30));
        shortcuts.push(ShortcutInfo::new("[ ]", "select").with_priority(35));
        shortcuts.push(ShortcutInfo::new("x", "remove").with_priority(40));
      }
      _ => {}
    }
    shortcuts
  }
}
