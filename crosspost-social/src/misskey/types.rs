use serde::{Deserialize, Serialize};

/// Body of `POST /api/users/show`.
#[derive(Debug, Clone, Serialize)]
pub struct UserShowRequest<'a> {
    pub username: &'a str,
}

/// The subset of a Misskey `UserDetailed` we read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    /// Display name; null when the user never set one.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Body of `POST /api/notes/create`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCreateRequest<'a> {
    pub i: &'a str,
    pub text: &'a str,
    pub via_mobile: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCreateResponse {
    pub created_note: Note,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
}
