use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WrappedExport {
    pub top_tracks: WrappedTopTracks,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WrappedTopTracks {
    pub top_tracks: Vec<WrappedTrack>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WrappedTrack {
    pub track_uri: Option<String>,
    pub count: Option<u64>,
    pub ms_played: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapsuleExport {
    pub stats: Vec<CapsuleStat>,
    pub highlights: Vec<CapsuleHighlight>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapsuleStat {
    pub date: Option<String>,
    pub stream_count: Option<u64>,
    pub seconds_played: Option<u64>,
    pub top_artists: Vec<CapsuleArtist>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapsuleArtist {
    pub name: Option<String>,
    pub stream_count: Option<u64>,
    pub seconds_played: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapsuleHighlight {
    pub date: Option<String>,
    pub highlight_type: Option<String>,
    pub on_repeat_highlight: Option<OnRepeatPayload>,
    pub streaks_highlight: Option<StreaksPayload>,
    pub proportion_listening_highlight: Option<ProportionListeningPayload>,
    pub multi_entity_milestone_highlight: Option<MilestonePayload>,
    pub unlike_combination_highlight: Option<UnlikeCombinationPayload>,
    pub first_to_discover_highlight: Option<FirstToDiscoverPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnRepeatPayload {
    pub entity: Option<String>,
    pub stream_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreaksPayload {
    pub entity: Option<String>,
    pub day_streaks: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProportionListeningPayload {
    pub entity: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub listening_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MilestonePayload {
    pub entities: Vec<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub milestone_listening_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnlikeCombinationPayload {
    pub first_entity: Option<String>,
    pub second_entity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FirstToDiscoverPayload {
    pub entity: Option<String>,
    pub country: Option<String>,
    pub position: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistExport {
    pub playlists: Vec<PlaylistEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistEntry {
    pub name: Option<String>,
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistItem {
    pub added_date: Option<String>,
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistTrack {
    pub track_uri: Option<String>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryExport {
    pub tracks: Vec<LibraryTrack>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LibraryTrack {
    pub uri: Option<String>,
    pub track: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceBundle {
    pub wrapped: WrappedExport,
    pub capsule: CapsuleExport,
    pub playlist: PlaylistExport,
    pub library: LibraryExport,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShortlistEntry {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub play_count: u64,
    pub ms_played: u64,
}

// Exports are inconsistent about numeric fields: numbers, numeric
// strings, empty strings, and null all occur in the wild.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid number {trimmed:?}")))
        }
        None => Ok(None),
    }
}
