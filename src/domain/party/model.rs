use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    #[default]
    Client,
    Franchise,
}

impl std::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Franchise => write!(f, "franchise"),
        }
    }
}

/// Client or franchise account; shipments link to it through `ref_code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingParty {
    #[serde(alias = "clientCode", alias = "franchiseCode")]
    pub ref_code: String,
    #[serde(alias = "companyName", alias = "franchiseName")]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "gst", alias = "gstNo")]
    pub gst_number: String,
    #[serde(default)]
    pub kind: PartyKind,
}

impl BillingParty {
    pub fn new(kind: PartyKind, ref_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ref_code: ref_code.into(),
            name: name.into(),
            address: String::new(),
            gst_number: String::new(),
            kind,
        }
    }
}
