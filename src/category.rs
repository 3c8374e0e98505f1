use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{StudioError, StudioResult};

// Category
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Text,
    Url,
    Email,
    Phone,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] =
        [Category::Text, Category::Url, Category::Email, Category::Phone, Category::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Url => "url",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Other => "other",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = StudioError;

    fn from_str(s: &str) -> StudioResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| StudioError::InvalidFilter { kind: "category", value: s.into() })
    }
}

// Detection
//------------------------------------------------------------------------------

static URL_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^https?://"));
// Digits are ASCII only. `.` stops at line terminators and whitespace
// excludes U+0085.
const LINE: &str = r"[^\n\r\x{2028}\x{2029}]";
const SPACE: &str = r"\t\n\x0B\f\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^mailto:|@{LINE}*\.")));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| compile(&format!(r"^tel:|^\+?[0-9{SPACE}\-()]+$")));

// Patterns are literals covered by the tests below
fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => panic!("Invalid category pattern {pattern:?}: {e}"),
    }
}

/// Classifies a payload. Rules are checked in order and the first match wins.
pub fn detect(content: &str) -> Category {
    if URL_RE.is_match(content) {
        Category::Url
    } else if EMAIL_RE.is_match(content) {
        Category::Email
    } else if PHONE_RE.is_match(content) {
        Category::Phone
    } else {
        Category::Text
    }
}

/// Returns true if the payload can be handed to the OS as a link.
pub fn is_openable(content: &str) -> bool {
    ["http://", "https://", "mailto:", "tel:"].iter().any(|p| content.starts_with(p))
}

pub fn open_link(content: &str) -> StudioResult<()> {
    if !is_openable(content) {
        return Err(StudioError::NotALink);
    }
    tracing::debug!(target = content, "Opening link");
    open::that(content)?;
    Ok(())
}
