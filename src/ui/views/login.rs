use crate::app::Context;
use crate::error::AuthError;
use crate::pending::Pending;
use crate::routes::Route;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::renderfns::{centered_rect, input_line};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Email,
  Password,
}

/// Email/password sign-in
pub struct LoginView {
  ctx: Context,
  email: TextInput,
  password: TextInput,
  focus: Field,
  signing_in: Pending<Result<(), AuthError>>,
  /// Where to go once signed in
  redirect: Option<Route>,
}

impl LoginView {
  /// With both a configured email and `password`, signing in starts at once.
  pub fn new(ctx: Context, redirect: Option<Route>, password: Option<String>) -> Self {
    let email = ctx.config.email.clone().unwrap_or_default();
    let mut view = Self {
      email: TextInput::with_value(email),
      password: TextInput::masked(),
      focus: Field::Email,
      signing_in: Pending::default(),
      redirect,
      ctx,
    };

    if !view.email.is_empty() {
      view.focus = Field::Password;
    }
    if let Some(password) = password {
      view.password.set(password);
      if !view.email.is_empty() {
        view.submit();
      }
    }
    view
  }

  fn submit(&mut self) {
    if self.signing_in.is_running() {
      return;
    }
    let email = self.email.value().trim().to_string();
    let password = self.password.value().to_string();
    if email.is_empty() || password.is_empty() {
      self
        .ctx
        .notifier
        .error("Login failed", "Email and password are required");
      return;
    }

    let auth = self.ctx.auth.clone();
    self.signing_in = Pending::spawn(async move { auth.sign_in(&email, &password).await });
  }

  fn focused(&mut self) -> &mut TextInput {
    match self.focus {
      Field::Email => &mut self.email,
      Field::Password => &mut self.password,
    }
  }

  fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      Field::Email => Field::Password,
      Field::Password => Field::Email,
    };
  }

  fn field_line<'a>(&self, label: &'a str, input: &TextInput, field: Field) -> Vec<Line<'a>> {
    let focused = self.focus == field;
    let label_style = if focused {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };
    vec![
      Line::styled(label, label_style),
      input_line(input, focused, 2),
      Line::raw(""),
    ]
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.signing_in.is_running() {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.toggle_focus();
        return ViewAction::None;
      }
      _ => {}
    }

    match self.focused().handle_key(key) {
      InputResult::Submitted(_) => match self.focus {
        Field::Email => self.focus = Field::Password,
        Field::Password => self.submit(),
      },
      InputResult::Cancelled => self.focused().clear(),
      _ => {}
    }
    ViewAction::None
  }

  fn handle_paste(&mut self, text: &str) {
    self.focused().insert_str(text.trim());
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let form_area = centered_rect(area, 50, 11);

    let mut lines = Vec::new();
    lines.extend(self.field_line("Email", &self.email, Field::Email));
    lines.extend(self.field_line("Password", &self.password, Field::Password));
    lines.push(if self.signing_in.is_running() {
      Line::styled("Signing in...", Style::default().fg(Color::Yellow))
    } else {
      Line::styled("Enter to sign in", Style::default().fg(Color::DarkGray))
    });

    let block = Block::default()
      .title(" Admin Login ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    frame.render_widget(Paragraph::new(lines).block(block), form_area);
  }

  fn breadcrumb_label(&self) -> String {
    "Login".to_string()
  }

  fn route(&self) -> Route {
    Route::Login
  }

  fn tick(&mut self) -> ViewAction {
    match self.signing_in.poll() {
      Some(Ok(())) => ViewAction::Navigate(self.redirect.take().unwrap_or(Route::Dashboard)),
      Some(Err(_)) => {
        self.password.clear();
        self.focus = Field::Password;
        ViewAction::None
      }
      None => ViewAction::None,
    }
  }

  fn is_capturing_input(&self) -> bool {
    true
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "next field").with_priority(10),
      ShortcutInfo::new("enter", "sign in").with_priority(20),
      ShortcutInfo::new("ctrl-c", "quit").with_priority(90),
    ]
  }
}
