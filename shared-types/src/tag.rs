use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tag {
    pub id: i64,
    pub website_id: i64,
    pub name: String,
    pub color: String,
    pub is_system: bool,
    pub created_at: i64,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct TagsResponse {
    pub tags: Vec<Tag>,
}
