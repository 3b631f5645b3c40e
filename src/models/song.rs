use crate::error::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Placeholder stored when the song info API has nothing for a field
pub const NO_INFORMATION: &str = "no information";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Group {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Song {
    pub id: i32,
    pub name: String,
    pub group_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct SongDetails {
    pub id: i32,
    pub song_id: i32,
    pub release_date: NaiveDate,
    pub text: String,
    pub link: String,
}

/// Details as returned by the song info API, before they are attached to a song
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SongInfo {
    #[serde(default = "default_release_date", deserialize_with = "deserialize_release_date")]
    pub release_date: NaiveDate,
    #[serde(default = "no_information")]
    pub text: String,
    #[serde(default = "no_information")]
    pub link: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewSongRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "no group name"))]
    pub group: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "no song name"))]
    pub song: String,
}

/// Partial update. Empty strings and zero ids leave the stored value alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditSongRequest {
    pub song: SongPatch,
    pub song_details: SongDetailsPatch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SongPatch {
    pub name: Option<String>,
    pub group_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SongDetailsPatch {
    pub release_date: Option<String>,
    pub text: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SongListResponse {
    pub song: Vec<Song>,
}

#[derive(Debug, Serialize)]
pub struct SongTextResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct EditSongResponse {
    pub song: Song,
    pub song_details: SongDetails,
}

impl NewSongRequest {
    /// Validates and reports the first failing field's own message, group
    /// before song.
    pub fn check(&self) -> crate::error::Result<()> {
        self.validate().map_err(|e| {
            let fields = e.field_errors();
            let message = ["group", "song"]
                .into_iter()
                .filter_map(|field| fields.get(field))
                .flat_map(|errors| errors.iter())
                .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| e.to_string());
            AppError::Validation(message)
        })
    }
}

impl SongPatch {
    pub fn apply(self, song: &mut Song) {
        if let Some(name) = self.name.filter(|n| !n.is_empty()) {
            song.name = name;
        }
        if let Some(group_id) = self.group_id.filter(|id| *id != 0) {
            song.group_id = group_id;
        }
    }
}

impl SongDetailsPatch {
    pub fn apply(self, details: &mut SongDetails) -> crate::error::Result<()> {
        if let Some(raw) = self.release_date.filter(|d| !d.is_empty()) {
            details.release_date = parse_release_date(&raw).ok_or_else(|| {
                AppError::Validation(format!("invalid release_date format: {}", raw))
            })?;
        }
        if let Some(text) = self.text.filter(|t| !t.is_empty()) {
            details.text = text;
        }
        if let Some(link) = self.link.filter(|l| !l.is_empty()) {
            details.link = link;
        }
        Ok(())
    }
}

/// Parses `YYYY-MM-DD` or the `DD.MM.YYYY` form the song info API uses
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .ok()
}

fn deserialize_release_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if raw.trim().is_empty() {
        return Ok(default_release_date());
    }
    parse_release_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid release_date '{}'", raw)))
}

fn default_release_date() -> NaiveDate {
    NaiveDate::default()
}

fn no_information() -> String {
    NO_INFORMATION.to_string()
}
