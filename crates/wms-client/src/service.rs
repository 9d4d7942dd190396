//! Service-level metadata from the capabilities `Service` section.

use serde::{Deserialize, Serialize};

/// Descriptive service metadata. Every field is optional in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescription {
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub keywords: Vec<String>,
    pub online_resource: Option<String>,
    pub contact: Option<ContactInformation>,
    pub fees: Option<String>,
    pub access_constraints: Option<String>,
    pub layer_limit: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInformation {
    pub person: Option<String>,
    pub organization: Option<String>,
    pub position: Option<String>,
    pub address: Option<ContactAddress>,
    pub voice_telephone: Option<String>,
    pub facsimile_telephone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactAddress {
    pub address_type: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub post_code: Option<String>,
    pub country: Option<String>,
}

impl ContactInformation {
    pub fn is_empty(&self) -> bool {
        *self == ContactInformation::default()
    }
}
