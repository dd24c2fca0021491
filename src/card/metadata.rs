/// Author identity and text of one post, as reported by the acquisition provider.
///
/// Missing fields deserialize to empty strings (or no avatar) rather than failing.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TweetMetadata {
    pub display_name: String,
    pub username: String,
    pub avatar_ref: Option<String>,
    pub caption: String,
}

impl TweetMetadata {
    pub fn new(
        display_name: impl Into<String>,
        username: impl Into<String>,
        avatar_ref: Option<String>,
        caption: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            username: username.into(),
            avatar_ref: avatar_ref.filter(|r| !r.trim().is_empty()),
            caption: caption.into(),
        }
    }

    /// `@username` as drawn on the card.
    pub fn handle(&self) -> String {
        format!("@{}", self.username.trim_start_matches('@'))
    }
}
