use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::Tag;

/// Newsletter subscription state of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ContactStatus {
    #[default]
    Pending,
    Active,
    Confirmed,
    Unsubscribed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Pending => "pending",
            ContactStatus::Active => "active",
            ContactStatus::Confirmed => "confirmed",
            ContactStatus::Unsubscribed => "unsubscribed",
        }
    }

    /// Maps a status cell from an uploaded file onto a status.
    ///
    /// Accepts the canonical names plus the spellings other mailing tools
    /// export (`subscribed`, `yes`, `opted out`, ...). Anything unrecognized
    /// falls back to `Pending`.
    pub fn from_import_value(value: &str) -> Self {
        let normalized = value.trim().to_lowercase().replace(['_', '-'], " ");

        match normalized.as_str() {
            "active" | "subscribed" | "subscriber" | "yes" | "true" | "1" => {
                ContactStatus::Active
            }
            "confirmed" | "verified" | "double opt in" | "opted in" => ContactStatus::Confirmed,
            "unsubscribed" | "unsubscribe" | "no" | "false" | "0" | "opted out" | "opt out"
            | "cleaned" | "bounced" => ContactStatus::Unsubscribed,
            _ => ContactStatus::Pending,
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ContactStatus::Pending),
            "active" => Ok(ContactStatus::Active),
            "confirmed" => Ok(ContactStatus::Confirmed),
            "unsubscribed" => Ok(ContactStatus::Unsubscribed),
            other => Err(format!("Unknown contact status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Contact {
    pub id: i64,
    pub website_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: ContactStatus,
    pub tags: Vec<Tag>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Contact {
    pub fn has_tag(&self, tag_id: i64) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct CreateContactRequest {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct UpdateContactRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: Option<ContactStatus>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct ContactsResponse {
    pub contacts: Vec<Contact>,
}
