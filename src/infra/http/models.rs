//! Request payloads accepted by the HTTP surface.

use serde::Deserialize;
use uuid::Uuid;

use crate::application::posts::PostDraft;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupBody {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct PostBody {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub image_path: Option<String>,
}

impl PostBody {
    pub fn into_draft(self) -> PostDraft {
        PostDraft {
            title: self.title,
            text: self.text,
            group_id: self.group_id,
            image_path: self.image_path,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub text: String,
}
