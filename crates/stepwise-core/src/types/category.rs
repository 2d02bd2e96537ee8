use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse request category attached to every step context.
///
/// Informational only; it never affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SocialMedia,
    Email,
    Document,
    Code,
    Resume,
    Planning,
    General,
}

impl Category {
    /// Ordered keyword table, first match wins.
    pub const TABLE: &'static [(&'static [&'static str], Category)] = &[
        (&["social", "post"], Category::SocialMedia),
        (&["email", "message"], Category::Email),
        (&["document", "report"], Category::Document),
        (&["code", "review"], Category::Code),
        (&["resume", "cv"], Category::Resume),
        (&["calendar", "schedule"], Category::Planning),
    ];

    /// Classify a request by keyword containment on its lowercased text.
    pub fn detect(input: &str) -> Self {
        let lower = input.to_lowercase();
        Self::TABLE
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, category)| *category)
            .unwrap_or(Category::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SocialMedia => "social_media",
            Self::Email => "email",
            Self::Document => "document",
            Self::Code => "code",
            Self::Resume => "resume",
            Self::Planning => "planning",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
