use serde::Deserialize;

/// Request body for skill creation.
#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
}
