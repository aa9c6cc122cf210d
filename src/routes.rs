//! Route table for the admin console.
//!
//! Paths mirror the public site's admin URLs so a path can be typed into
//! the command palette: `/login`, `/admin`, `/admin/<collection>[/add|/edit/<id>]`.

use std::fmt;

/// One of the managed collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
  Employees,
  Projects,
  Testimonials,
}

impl Collection {
  pub const ALL: [Collection; 3] = [
    Collection::Employees,
    Collection::Projects,
    Collection::Testimonials,
  ];

  pub fn slug(self) -> &'static str {
    match self {
      Collection::Employees => "employees",
      Collection::Projects => "projects",
      Collection::Testimonials => "testimonials",
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      Collection::Employees => "Employees",
      Collection::Projects => "Projects",
      Collection::Testimonials => "Testimonials",
    }
  }

  fn from_slug(slug: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.slug() == slug)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Login,
  Dashboard,
  List(Collection),
  Add(Collection),
  Edit(Collection, String),
  NotFound(String),
}

impl Route {
  /// Parse a path. The root goes to the login screen, like the public site.
  pub fn parse(path: &str) -> Self {
    let trimmed = path.trim();
    let segments: Vec<&str> = trimmed
      .trim_matches('/')
      .split('/')
      .filter(|s| !s.is_empty())
      .collect();

    match segments.as_slice() {
      [] | ["login"] => Route::Login,
      ["admin"] => Route::Dashboard,
      ["admin", slug] => match Collection::from_slug(slug) {
        Some(c) => Route::List(c),
        None => Route::NotFound(trimmed.to_string()),
      },
      ["admin", slug, "add"] => match Collection::from_slug(slug) {
        Some(c) => Route::Add(c),
        None => Route::NotFound(trimmed.to_string()),
      },
      ["admin", slug, "edit", id] => match Collection::from_slug(slug) {
        Some(c) => Route::Edit(c, id.to_string()),
        None => Route::NotFound(trimmed.to_string()),
      },
      _ => Route::NotFound(trimmed.to_string()),
    }
  }

  pub fn path(&self) -> String {
    match self {
      Route::Login => "/login".to_string(),
      Route::Dashboard => "/admin".to_string(),
      Route::List(c) => format!("/admin/{}", c.slug()),
      Route::Add(c) => format!("/admin/{}/add", c.slug()),
      Route::Edit(c, id) => format!("/admin/{}/edit/{}", c.slug(), id),
      Route::NotFound(path) => path.clone(),
    }
  }

  /// Everything under `/admin` needs an active session.
  pub fn requires_session(&self) -> bool {
    matches!(
      self,
      Route::Dashboard | Route::List(_) | Route::Add(_) | Route::Edit(..)
    )
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.path())
  }
}
