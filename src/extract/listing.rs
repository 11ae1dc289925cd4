use serde::{Deserialize, Serialize};

/// Fields of one directory entry, as read from its detail popup.
///
/// Field order is the column order of the output file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Listing {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Areas of Work")]
    pub areas_of_work: String,
    #[serde(rename = "Website")]
    pub website: String,
    #[serde(rename = "Contact Phone")]
    pub contact_phone: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Postcode")]
    pub postcode: String,
}

impl Listing {
    /// Column headers, matching the serialized field names.
    pub const HEADERS: [&'static str; 8] = [
        "Name",
        "Type",
        "Description",
        "Areas of Work",
        "Website",
        "Contact Phone",
        "Address",
        "Postcode",
    ];
}
