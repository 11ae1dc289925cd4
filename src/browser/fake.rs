//! In-memory stand-in for a directory site, driven through the `Page` trait.
use std::sync::{Mutex, MutexGuard};

use crate::error::Error;

use super::{Locator, Page};

pub const LISTINGS: &str = ".resultsBlock";
pub const POPUP: &str = ".Popup";
pub const CLOSE: &str = "input[value='close']";
pub const NEXT: &str = "Next Page >";

/// A listing as rendered on a result page.
#[derive(Debug, Clone)]
pub struct FakeListing {
    pub id: Option<String>,
    /// Popup html shown when clicked; `None` means the popup never appears.
    pub popup: Option<String>,
}

impl FakeListing {
    pub fn new(id: &str, popup: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            popup: Some(popup.to_string()),
        }
    }

    pub fn broken(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            popup: None,
        }
    }

    pub fn without_id() -> Self {
        Self {
            id: None,
            popup: Some(popup_html("Nameless", "")),
        }
    }
}

/// Result pages of a fake directory.
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pub pages: Vec<Vec<FakeListing>>,
    /// Re-render the result list whenever a popup is closed, turning every
    /// listing handle stale.
    pub rerender_on_close: bool,
    /// Ignore clicks on the close button.
    pub sticky_popup: bool,
    /// Ids missing from the result list once it has been re-rendered by a
    /// popup close.
    pub vanishing: Vec<String>,
}

impl FakeSite {
    pub fn single_page(ids: &[&str]) -> Self {
        Self::paged(&[ids])
    }

    /// One page per slice; each listing's popup is named after its id.
    pub fn paged(pages: &[&[&str]]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|ids| {
                    ids.iter()
                        .map(|id| FakeListing::new(id, &popup_html(id, "")))
                        .collect()
                })
                .collect(),
            ..Default::default()
        }
    }
}

/// Builds popup markup shaped like the directory's detail popup.
pub fn popup_html(name: &str, address: &str) -> String {
    format!(
        r#"<div class="Popup"><h2>{}</h2><h4>Charity</h4><span><h3>Address</h3><p>{}</p></span><input type="button" value="close"></div>"#,
        name, address
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum FakeElement {
    Listing { render: u64, index: usize },
    Popup { opened: u64 },
    Close { opened: u64 },
    Next { render: u64 },
}

#[derive(Debug, Default)]
struct State {
    navigated: bool,
    page: usize,
    /// Bumped whenever the result list is rendered.
    render: u64,
    /// Bumped whenever a popup opens.
    opened: u64,
    popup: Option<usize>,
    clicked: Vec<String>,
    closes: usize,
    /// Re-renders caused by closing a popup.
    close_renders: usize,
}

/// A `Page` over a `FakeSite`.
#[derive(Debug)]
pub struct FakePage {
    site: FakeSite,
    state: Mutex<State>,
}

impl FakePage {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site,
            state: Mutex::new(State::default()),
        }
    }

    /// Ids of the listings clicked so far, in click order.
    pub fn clicked(&self) -> Vec<String> {
        self.lock().clicked.clone()
    }

    /// Number of effective popup closes.
    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    /// Index of the result page currently shown.
    pub fn current_page(&self) -> usize {
        self.lock().page
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn stale(&self, state: &State, el: &FakeElement) -> bool {
        match el {
            FakeElement::Listing { render, .. } | FakeElement::Next { render } => {
                *render != state.render
            }
            FakeElement::Popup { opened } | FakeElement::Close { opened } => {
                state.popup.is_none() || *opened != state.opened
            }
        }
    }

    fn listing(&self, state: &State, index: usize) -> Option<&FakeListing> {
        self.site.pages.get(state.page).and_then(|p| p.get(index))
    }

    fn vanished(&self, state: &State, index: usize) -> bool {
        state.close_renders > 0
            && self
                .listing(state, index)
                .and_then(|l| l.id.as_ref())
                .is_some_and(|id| self.site.vanishing.contains(id))
    }
}

impl Page for FakePage {
    type Element = FakeElement;

    async fn goto(&self, _url: &str) -> Result<(), Error> {
        let mut state = self.lock();
        state.navigated = true;
        state.page = 0;
        state.render += 1;
        state.popup = None;
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>, Error> {
        let state = self.lock();
        if !state.navigated {
            return Ok(Vec::new());
        }
        let found = match locator {
            Locator::Css(s) if s == LISTINGS => {
                let n = self.site.pages.get(state.page).map_or(0, |p| p.len());
                (0..n)
                    .filter(|index| !self.vanished(&state, *index))
                    .map(|index| FakeElement::Listing {
                        render: state.render,
                        index,
                    })
                    .collect()
            }
            Locator::Css(s) if s == POPUP && state.popup.is_some() => vec![FakeElement::Popup {
                opened: state.opened,
            }],
            Locator::Css(s) if s == CLOSE && state.popup.is_some() => vec![FakeElement::Close {
                opened: state.opened,
            }],
            Locator::LinkText(t) if t == NEXT && state.page + 1 < self.site.pages.len() => {
                vec![FakeElement::Next {
                    render: state.render,
                }]
            }
            _ => Vec::new(),
        };
        Ok(found)
    }

    // detached nodes keep their attributes, like in a real browser
    async fn attribute(&self, el: &FakeElement, name: &str) -> Result<Option<String>, Error> {
        let state = self.lock();
        match (el, name) {
            (FakeElement::Listing { index, .. }, "id") => {
                Ok(self.listing(&state, *index).and_then(|l| l.id.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn outer_html(&self, el: &FakeElement) -> Result<String, Error> {
        let state = self.lock();
        if self.stale(&state, el) {
            return Err(Error::ElementNotFound("stale element".to_string()));
        }
        match (el, state.popup) {
            (FakeElement::Popup { .. }, Some(index)) => self
                .listing(&state, index)
                .and_then(|l| l.popup.clone())
                .ok_or_else(|| Error::ElementNotFound("popup".to_string())),
            _ => Ok(String::new()),
        }
    }

    async fn click(&self, el: &FakeElement) -> Result<(), Error> {
        let mut state = self.lock();
        if self.stale(&state, el) {
            return Err(Error::ElementNotFound("stale element".to_string()));
        }
        match el {
            FakeElement::Listing { index, .. } => {
                let listing = self.listing(&state, *index).cloned();
                if let Some(l) = listing {
                    state.clicked.push(l.id.clone().unwrap_or_default());
                    if l.popup.is_some() {
                        state.popup = Some(*index);
                        state.opened += 1;
                    }
                }
            }
            FakeElement::Close { .. } => {
                if !self.site.sticky_popup {
                    state.popup = None;
                    state.closes += 1;
                    if self.site.rerender_on_close {
                        state.render += 1;
                        state.close_renders += 1;
                    }
                }
            }
            FakeElement::Next { .. } => {
                state.page += 1;
                state.render += 1;
                state.popup = None;
            }
            FakeElement::Popup { .. } => {}
        }
        Ok(())
    }

    async fn is_clickable(&self, el: &FakeElement) -> Result<bool, Error> {
        let state = self.lock();
        Ok(!self.stale(&state, el))
    }

    async fn is_stale(&self, el: &FakeElement) -> Result<bool, Error> {
        let state = self.lock();
        Ok(self.stale(&state, el))
    }
}
