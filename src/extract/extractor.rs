use log::debug;
use scraper::{ElementRef, Html};
use url::Url;

use super::Listing;

/// Extracts listing fields from the html of a detail popup.
#[derive(Debug, Clone)]
pub struct Extractor {
    opts: ExtractOptions,
}

impl Extractor {
    /// Returns a new Extractor instance.
    pub fn new(opts: ExtractOptions) -> Self {
        Self { opts }
    }

    /// Build a listing from the popup's outer html. Every lookup is scoped to
    /// the popup; absent values become the configured placeholder.
    pub fn listing_from_html(&self, html: &str) -> Listing {
        let doc = Html::parse_fragment(html);
        let popup = doc.root_element();

        let full_address = self.section_paragraph(popup, &self.opts.address_heading);
        let (address, postcode) = split_address(&full_address, &self.opts.placeholder);

        let listing = Listing {
            name: self.first_text(popup, "h2"),
            kind: self.first_text(popup, "h4"),
            description: self.section_paragraph(popup, &self.opts.description_heading),
            areas_of_work: self.section_paragraph(popup, &self.opts.areas_of_work_heading),
            website: self.website(popup),
            contact_phone: self.phone(popup),
            address,
            postcode,
        };
        debug!("extracted listing: {:?}", listing);
        listing
    }

    fn first_text(&self, root: ElementRef, tag: &str) -> String {
        descendants(root)
            .find(|e| e.value().name() == tag)
            .map(text_of)
            .unwrap_or_else(|| self.opts.placeholder.clone())
    }

    /// Text of the first paragraph directly under the headed section.
    fn section_paragraph(&self, root: ElementRef, heading: &str) -> String {
        section(root, heading)
            .and_then(|s| children(s).find(|c| c.value().name() == "p"))
            .map(text_of)
            .unwrap_or_else(|| self.opts.placeholder.clone())
    }

    /// First contact paragraph that looks like a phone number.
    fn phone(&self, root: ElementRef) -> String {
        contact_items(root, &self.opts.contact_heading, "p")
            .map(text_of)
            .find(|t| {
                t.starts_with(self.opts.phone_prefix.as_str())
                    && t.chars().any(|c| c.is_ascii_digit())
            })
            .unwrap_or_else(|| self.opts.placeholder.clone())
    }

    /// First contact link pointing at a web address, resolved the way the
    /// browser resolves it.
    fn website(&self, root: ElementRef) -> String {
        contact_items(root, &self.opts.contact_heading, "a")
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| self.resolve(href.trim()))
            .find(|href| href.starts_with("http"))
            .unwrap_or_else(|| self.opts.placeholder.clone())
    }

    fn resolve(&self, href: &str) -> Option<String> {
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        if href.starts_with("http") {
            return Some(href.to_string());
        }
        match &self.opts.base_url {
            Some(base) => base.join(href).ok().map(String::from),
            None => Url::parse(href).ok().map(String::from),
        }
    }
}

/// Split a one-line address into the address proper and its trailing
/// postcode; without a comma the postcode is the placeholder.
pub fn split_address(full: &str, placeholder: &str) -> (String, String) {
    let parts: Vec<&str> = full.split(',').map(str::trim).collect();
    if parts.len() > 1 {
        let (rest, last) = parts.split_at(parts.len() - 1);
        (rest.join(", "), last[0].to_string())
    } else {
        (full.to_string(), placeholder.to_string())
    }
}

fn descendants<'a>(root: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    root.descendants().filter_map(ElementRef::wrap)
}

fn children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Whitespace-collapsed text content of the element.
fn text_of(el: ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A `span` carrying a direct `h3` child with the given heading.
fn section<'a>(root: ElementRef<'a>, heading: &str) -> Option<ElementRef<'a>> {
    descendants(root)
        .filter(|e| e.value().name() == "span")
        .find(|span| children(*span).any(|c| c.value().name() == "h3" && text_of(c) == heading))
}

/// Elements with the given tag directly inside the contact section's nested spans.
fn contact_items<'a>(
    root: ElementRef<'a>,
    heading: &str,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> {
    section(root, heading)
        .into_iter()
        .flat_map(children)
        .filter(|c| c.value().name() == "span")
        .flat_map(children)
        .filter(move |c| c.value().name() == tag)
}

/// Options used when extracting listings from popups.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Heading of the description section.
    description_heading: String,
    /// Heading of the areas of work section.
    areas_of_work_heading: String,
    /// Heading of the contact section (phone numbers and website links).
    contact_heading: String,
    /// Heading of the address section.
    address_heading: String,
    /// Value recorded for anything missing.
    placeholder: String,
    /// Contact paragraphs starting with this are phone numbers.
    phone_prefix: String,
    /// Relative contact links are resolved against this.
    base_url: Option<Url>,
}

impl ExtractOptions {
    /// Returns a new ExtractOptions instance.
    pub fn new(
        description_heading: &str,
        areas_of_work_heading: &str,
        contact_heading: &str,
        address_heading: &str,
        placeholder: &str,
        phone_prefix: &str,
    ) -> Self {
        Self {
            description_heading: description_heading.to_string(),
            areas_of_work_heading: areas_of_work_heading.to_string(),
            contact_heading: contact_heading.to_string(),
            address_heading: address_heading.to_string(),
            placeholder: placeholder.to_string(),
            phone_prefix: phone_prefix.to_string(),
            base_url: None,
        }
    }

    /// Resolve relative links against the given page url.
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new(
            "Description",
            "Areas of Work",
            "Contact",
            "Address",
            "N/A",
            "0",
        )
    }
}
