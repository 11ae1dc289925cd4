use serde::{Deserialize, Serialize};
use std::fs;
use url::Url;

use crate::browser::Locator;
use crate::error::Error;
use crate::extract::ExtractOptions;

/// Where things live on the target directory site. Every field is optional
/// in a profile file; missing ones fall back to the defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SiteProfile {
    /// Directory page to start from.
    pub start_url: String,
    /// Css selector of the clickable listing blocks.
    pub listing_selector: String,
    /// Only listings whose id ends with this are opened.
    pub listing_id_suffix: String,
    /// Css selector of the detail popup.
    pub popup_selector: String,
    /// Css selector of the popup's close button.
    pub close_selector: String,
    /// Visible text of the link leading to the next result page.
    pub next_link_text: String,
    /// Section headings inside the popup.
    pub headings: Headings,
    /// Recorded for any value the popup lacks.
    pub placeholder: String,
    /// Contact lines starting with this are taken as phone numbers.
    pub phone_prefix: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Headings {
    pub description: String,
    pub areas_of_work: String,
    pub contact: String,
    pub address: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            start_url: "https://integratecic.my.salesforce-sites.com/directory/".to_string(),
            listing_selector: ".resultsBlock".to_string(),
            listing_id_suffix: ":j_id39".to_string(),
            popup_selector: ".Popup".to_string(),
            close_selector: "input[value='close']".to_string(),
            next_link_text: "Next Page >".to_string(),
            headings: Headings::default(),
            placeholder: "N/A".to_string(),
            phone_prefix: "0".to_string(),
        }
    }
}

impl Default for Headings {
    fn default() -> Self {
        Self {
            description: "Description".to_string(),
            areas_of_work: "Areas of Work".to_string(),
            contact: "Contact".to_string(),
            address: "Address".to_string(),
        }
    }
}

impl SiteProfile {
    /// Returns a new SiteProfile constructed from the given json file.
    pub fn new_from_file(file: &str) -> Result<SiteProfile, Error> {
        let contents = fs::read_to_string(file)?;
        let profile: SiteProfile = serde_json::from_str(contents.as_str())?;

        Ok(profile)
    }

    pub fn listing_locator(&self) -> Locator {
        Locator::css(&self.listing_selector)
    }

    pub fn popup_locator(&self) -> Locator {
        Locator::css(&self.popup_selector)
    }

    pub fn close_locator(&self) -> Locator {
        Locator::css(&self.close_selector)
    }

    pub fn next_locator(&self) -> Locator {
        Locator::link_text(&self.next_link_text)
    }

    /// Returns whether a listing with this id should be opened.
    pub fn wants_listing(&self, id: &str) -> bool {
        id.ends_with(self.listing_id_suffix.as_str())
    }

    /// Returns the extraction options described by this profile.
    pub fn extract_options(&self) -> ExtractOptions {
        let opts = ExtractOptions::new(
            &self.headings.description,
            &self.headings.areas_of_work,
            &self.headings.contact,
            &self.headings.address,
            &self.placeholder,
            &self.phone_prefix,
        );
        match Url::parse(&self.start_url) {
            Ok(base) => opts.with_base_url(base),
            Err(_) => opts,
        }
    }
}
