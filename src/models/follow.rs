use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// `follows_user_url` follows `user_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_url: String,
    pub follows_user_url: String,
}

/// Body of follow and unfollow requests: the user being (un)followed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub user_url: String,
}
