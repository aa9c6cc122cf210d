/// Command palette entries and autocomplete logic
use crate::routes::{Collection, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Go(Destination),
  Logout,
  Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
  Dashboard,
  List(Collection),
}

impl Destination {
  pub fn route(self) -> Route {
    match self {
      Destination::Dashboard => Route::Dashboard,
      Destination::List(c) => Route::List(c),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub action: Action,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "dashboard",
    aliases: &["d", "home", "admin"],
    description: "Overview of every collection",
    action: Action::Go(Destination::Dashboard),
  },
  Command {
    name: "employees",
    aliases: &["e", "emp", "team"],
    description: "Manage team members",
    action: Action::Go(Destination::List(Collection::Employees)),
  },
  Command {
    name: "projects",
    aliases: &["p", "proj", "portfolio"],
    description: "Manage portfolio projects",
    action: Action::Go(Destination::List(Collection::Projects)),
  },
  Command {
    name: "testimonials",
    aliases: &["t", "reviews"],
    description: "Manage client testimonials",
    action: Action::Go(Destination::List(Collection::Testimonials)),
  },
  Command {
    name: "logout",
    aliases: &["signout"],
    description: "Sign out",
    action: Action::Logout,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit siteadmin",
    action: Action::Quit,
  },
];

/// What the palette resolves a submitted input to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
  Action(Action),
  Route(Route),
}

/// Resolve submitted palette input: a path if it starts with `/`, else the
/// best-matching command.
pub fn resolve(input: &str) -> Option<Resolved> {
  let input = input.trim();
  if input.starts_with('/') {
    return Some(Resolved::Route(Route::parse(input)));
  }
  get_suggestions(input)
    .first()
    .filter(|_| !input.is_empty())
    .map(|cmd| Resolved::Action(cmd.action))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }
  // Paths are not completed
  if input_lower.starts_with('/') {
    return Vec::new();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("projects");
    assert_eq!(suggestions[0].name, "projects");
  }

  #[test]
  fn test_alias_match() {
    assert_eq!(get_suggestions("t")[0].name, "testimonials");
    assert_eq!(get_suggestions("q")[0].name, "quit");
  }

  #[test]
  fn test_prefix_match() {
    assert_eq!(get_suggestions("emp")[0].name, "employees");
    assert_eq!(get_suggestions("log")[0].name, "logout");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("monial");
    assert_eq!(suggestions[0].name, "testimonials");
  }

  #[test]
  fn test_resolve_path_and_command() {
    assert_eq!(
      resolve("/admin/projects/add"),
      Some(Resolved::Route(Route::Add(Collection::Projects)))
    );
    assert_eq!(
      resolve("employees"),
      Some(Resolved::Action(Action::Go(Destination::List(
        Collection::Employees
      ))))
    );
    assert_eq!(resolve("zzz"), None);
    assert_eq!(resolve(""), None);
  }
}
