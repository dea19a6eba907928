use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A customer's managed website. Contacts and tags are scoped to one website.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Website {
    pub id: i64,
    pub name: String,
    pub domain: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct CreateWebsiteRequest {
    pub name: String,
    pub domain: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct WebsitesResponse {
    pub websites: Vec<Website>,
}
