use serde::Deserialize;

#[derive(Default, Deserialize)]
pub struct FlashQuery {
    pub status: Option<String>,
    pub error: Option<String>,
}
