use crate::attachments::Attachments;
use crate::cache::EntityCache;
use crate::commands::{Action, Resolved};
use crate::config::Config;
use crate::error::AuthError;
use crate::event::{Event, EventHandler};
use crate::notify::{Notification, Notifier};
use crate::pending::Pending;
use crate::routes::Route;
use crate::session::{Auth, Session};
use crate::ui::components::{CommandInput, KeyResult, Toasts};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{self, LoginView};
use color_eyre::Result;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Services shared by every view, built once at startup.
#[derive(Clone)]
pub struct Context {
  pub config: Arc<Config>,
  pub cache: Arc<EntityCache>,
  pub attachments: Attachments,
  pub auth: Auth,
  pub notifier: Notifier,
}

impl Context {
  /// Context over the in-memory backend, with a pre-filled login email.
  #[cfg(test)]
  pub fn for_tests(backend: Arc<crate::backend::memory::MemoryBackend>) -> Self {
    use crate::config::{BackendConfig, LimitsConfig};
    use crate::session::SessionState;

    let (notifier, _) = Notifier::channel();
    Self {
      config: Arc::new(Config {
        backend: BackendConfig {
          url: "https://cdn.test".into(),
          bucket: "images".into(),
        },
        title: None,
        email: Some("admin@site.test".into()),
        limits: LimitsConfig::default(),
      }),
      cache: Arc::new(EntityCache::new(backend.clone(), notifier.clone())),
      attachments: Attachments::new(backend.clone(), notifier.clone()),
      auth: Auth::new(backend, SessionState::new(), notifier.clone()),
      notifier,
    }
  }

  /// Refetch every collection in the background.
  pub fn reload_all(&self) {
    let cache = self.cache.clone();
    tokio::spawn(async move { cache.load_all().await });
  }
}

/// Main application state
pub struct App {
  ctx: Context,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  command_input: CommandInput,

  toasts: Toasts,
  notifications: mpsc::UnboundedReceiver<Notification>,

  signing_out: Pending<Result<(), AuthError>>,
  session_changes: watch::Receiver<Option<Session>>,

  should_quit: bool,
}

impl App {
  /// With a `password`, the first login screen signs in on its own.
  pub fn new(
    ctx: Context,
    notifications: mpsc::UnboundedReceiver<Notification>,
    password: Option<String>,
  ) -> Self {
    let login: Box<dyn View> = Box::new(LoginView::new(ctx.clone(), None, password));
    let session_changes = ctx.auth.state().subscribe();
    Self {
      ctx,
      view_stack: vec![login],
      command_input: CommandInput::new(),
      toasts: Toasts::default(),
      notifications,
      signing_out: Pending::default(),
      session_changes,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(100));

    let result = self.main_loop(&mut terminal, &mut events).await;

    // Restore the terminal even when the loop failed
    let _ = stdout().execute(DisableBracketedPaste);
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn main_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Paste(text)) => {
          if let Some(view) = self.view_stack.last_mut() {
            view.handle_paste(&text);
          }
        }
        Some(Event::Resize) => {}
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let capturing = self
      .view_stack
      .last()
      .is_some_and(|v| v.is_capturing_input());

    // The palette only opens when the view is not taking text
    if self.command_input.is_active() || !capturing {
      match self.command_input.handle_key(key) {
        KeyResult::Handled => return,
        KeyResult::Event(resolved) => {
          if let Some(resolved) = resolved {
            self.execute(resolved);
          }
          return;
        }
        KeyResult::NotHandled => {}
      }
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  fn execute(&mut self, resolved: Resolved) {
    match resolved {
      Resolved::Route(route) => self.navigate(route),
      Resolved::Action(Action::Go(dest)) => self.navigate(dest.route()),
      Resolved::Action(Action::Logout) => self.sign_out(),
      Resolved::Action(Action::Quit) => self.should_quit = true,
    }
  }

  fn sign_out(&mut self) {
    if self.signing_out.is_running() {
      return;
    }
    let auth = self.ctx.auth.clone();
    self.signing_out = Pending::spawn(async move { auth.sign_out().await });
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        if view.route().requires_session() && !self.ctx.auth.state().is_signed_in() {
          self.navigate(view.route());
        } else {
          self.view_stack.push(view);
        }
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.navigate(Route::Dashboard);
        }
      }
      ViewAction::Navigate(route) => self.navigate(route),
    }
  }

  /// Replace the stack with the view for `route`. Protected routes
  /// redirect to the login screen without a session.
  fn navigate(&mut self, route: Route) {
    let signed_in = self.ctx.auth.state().is_signed_in();
    let view = if route.requires_session() && !signed_in {
      info!(%route, "no session, redirecting to login");
      views::login(&self.ctx, Some(route))
    } else if route == Route::Login && signed_in {
      views::for_route(Route::Dashboard, &self.ctx)
    } else {
      views::for_route(route, &self.ctx)
    };

    debug!(route = %view.route(), "navigate");
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  fn tick(&mut self) {
    while let Ok(note) = self.notifications.try_recv() {
      self.toasts.push(note);
    }
    self.toasts.tick();

    // Fresh session: fetch every collection
    if self.session_changes.has_changed().unwrap_or(false) {
      let signed_in = self.session_changes.borrow_and_update().is_some();
      if signed_in {
        self.ctx.reload_all();
      }
    }

    if self.signing_out.poll().is_some_and(|r| r.is_ok()) {
      self.navigate(Route::Login);
    }

    // Session expired or ended while on a protected view
    let guarded = self
      .view_stack
      .last()
      .is_some_and(|v| v.route().requires_session());
    if guarded && !self.ctx.auth.state().is_signed_in() {
      let current = self.view_stack.last().map(|v| v.route());
      self.view_stack.clear();
      self.view_stack.push(views::login(&self.ctx, current));
      return;
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.tick();
      self.apply(action);
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let title = self.ctx.config.display_title();
    let user = self.ctx.auth.state().current().map(|s| s.email);
    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect();

    let (shortcuts, path) = match self.view_stack.last() {
      Some(view) => (view.shortcuts(), view.route().path()),
      None => (Vec::new(), String::new()),
    };
    draw_header(frame, chunks[0], &title, user.as_deref(), &shortcuts);

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }

    self.command_input.render_overlay(frame, chunks[1]);
    self.toasts.render(frame, chunks[1]);

    draw_footer(frame, chunks[2], &breadcrumb, &path);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::memory::MemoryBackend;

  fn app(password: Option<&str>) -> App {
    let ctx = Context::for_tests(Arc::new(MemoryBackend::new()));
    // Toasts are not under test; nothing is queued on this receiver
    let (_, rx) = mpsc::unbounded_channel();
    App::new(ctx, rx, password.map(String::from))
  }

  fn top_route(app: &App) -> Option<Route> {
    app.view_stack.last().map(|v| v.route())
  }

  fn signed_in(app: &App) -> bool {
    app.ctx.auth.state().is_signed_in()
  }

  /// Tick until `done` holds
  async fn settle(app: &mut App, done: impl Fn(&App) -> bool) {
    for _ in 0..200 {
      app.tick();
      if done(app) {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("app never settled");
  }

  #[tokio::test]
  async fn test_startup_password_signs_in() {
    let mut app = app(Some(MemoryBackend::PASSWORD));
    settle(&mut app, |a| top_route(a) == Some(Route::Dashboard)).await;
    assert!(signed_in(&app));
  }

  #[tokio::test]
  async fn test_logout_ends_session_with_startup_password() {
    let mut app = app(Some(MemoryBackend::PASSWORD));
    settle(&mut app, |a| top_route(a) == Some(Route::Dashboard)).await;

    app.execute(Resolved::Action(Action::Logout));
    settle(&mut app, |a| !signed_in(a) && top_route(a) == Some(Route::Login)).await;

    // The login screen shown after sign-out waits for the user
    for _ in 0..20 {
      app.tick();
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!signed_in(&app));
    assert_eq!(top_route(&app), Some(Route::Login));
  }

  #[tokio::test]
  async fn test_protected_route_redirects_to_login() {
    let mut app = app(None);
    app.navigate(Route::List(crate::routes::Collection::Projects));
    assert_eq!(top_route(&app), Some(Route::Login));
  }
}
