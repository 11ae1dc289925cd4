/// Describes how to find elements on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Elements matching a css selector.
    Css(String),
    /// Anchors whose trimmed visible text equals the given text.
    LinkText(String),
}

impl Locator {
    /// Returns a css locator.
    pub fn css(selector: &str) -> Self {
        Self::Css(selector.to_string())
    }

    /// Returns a link text locator.
    pub fn link_text(text: &str) -> Self {
        Self::LinkText(text.to_string())
    }
}

/// Display implementation.
impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css '{}'", s),
            Self::LinkText(t) => write!(f, "link text '{}'", t),
        }
    }
}
