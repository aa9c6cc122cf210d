//! Project video links: host recognition and embed URLs.

use regex::Regex;
use std::sync::LazyLock;

/// Host substrings a project video URL must contain to be accepted
pub const RECOGNIZED_HOSTS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com"];

// A pattern that fails to build disables embed previews
static YOUTUBE_ID: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(
    r"(?:youtube\.com/(?:[^/\n\s]+/\S+/|(?:v|e(?:mbed)?)/|\S*?[?&]v=)|youtu\.be/)([a-zA-Z0-9_-]{11})",
  )
  .ok()
});

static VIMEO_ID: LazyLock<Option<Regex>> = LazyLock::new(|| {
  Regex::new(
    r"vimeo\.com/(?:channels/(?:\w+/)?|groups/(?:[^/]*)/videos/|album/(?:\d+)/video/|)(\d+)(?:[a-zA-Z0-9_-]+)?",
  )
  .ok()
});

/// First capture group of `re` in `url`
fn capture_id(re: &LazyLock<Option<Regex>>, url: &str) -> Option<String> {
  let caps = Option::as_ref(re)?.captures(url)?;
  caps.get(1).map(|m| m.as_str().to_string())
}

/// Shape check only: the URL mentions one of the recognized hosts.
pub fn is_recognized(url: &str) -> bool {
  RECOGNIZED_HOSTS.iter().any(|host| url.contains(host))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
  YouTube,
  Vimeo,
}

/// A video resolved to its platform and id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
  pub platform: Platform,
  pub id: String,
}

impl Embed {
  /// Resolve a watch/share URL. Returns None for anything unparseable.
  pub fn parse(url: &str) -> Option<Self> {
    if let Some(id) = capture_id(&YOUTUBE_ID, url) {
      return Some(Embed {
        platform: Platform::YouTube,
        id,
      });
    }
    capture_id(&VIMEO_ID, url).map(|id| Embed {
      platform: Platform::Vimeo,
      id,
    })
  }

  /// Player URL for embedding
  pub fn player_url(&self) -> String {
    match self.platform {
      Platform::YouTube => format!("https://www.youtube.com/embed/{}", self.id),
      Platform::Vimeo => format!("https://player.vimeo.com/video/{}", self.id),
    }
  }
}
