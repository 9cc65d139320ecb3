use crate::highlight::{self, HighlightEvent};
use crate::model::{LibraryExport, PlaylistExport, SourceBundle};
use std::collections::{BTreeMap, HashMap};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMeta {
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTrack {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub play_count: u64,
    pub ms_played: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistAddEvent {
    pub playlist_name: String,
    pub added_at: OffsetDateTime,
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistWeeklyStat {
    pub date: Date,
    pub artist_name: String,
    pub stream_count: u64,
    pub seconds_played: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceFrame {
    pub date: Date,
    pub rows: Vec<ArtistWeeklyStat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyListeningStat {
    pub date: Date,
    pub stream_count: u64,
    pub seconds_played: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactTables {
    pub ranked_tracks: Vec<RankedTrack>,
    pub playlist_adds: Vec<PlaylistAddEvent>,
    pub race_frames: Vec<RaceFrame>,
    pub daily_stats: Vec<DailyListeningStat>,
    pub highlights: Vec<HighlightEvent>,
    pub skipped_rows: usize,
}

/// Track metadata keyed by track id. Playlist items are written first,
/// library entries only fill keys that are still absent.
pub fn resolve_track_meta(
    playlist: &PlaylistExport,
    library: &LibraryExport,
) -> HashMap<String, TrackMeta> {
    let mut map = HashMap::new();

    for entry in &playlist.playlists {
        for item in &entry.items {
            let Some(track) = &item.track else { continue };
            let Some(uri) = track.track_uri.as_deref().filter(|uri| !uri.is_empty()) else {
                continue;
            };
            map.insert(
                uri.to_string(),
                TrackMeta {
                    track_name: track.track_name.clone(),
                    artist_name: track.artist_name.clone(),
                    album_name: track.album_name.clone(),
                },
            );
        }
    }

    for track in &library.tracks {
        let Some(uri) = track.uri.as_deref().filter(|uri| !uri.is_empty()) else {
            continue;
        };
        map.entry(uri.to_string()).or_insert_with(|| TrackMeta {
            track_name: track.track.clone(),
            artist_name: track.artist.clone(),
            album_name: track.album.clone(),
        });
    }

    map
}

/// Builds every fact table from the raw bundle. Pure and deterministic;
/// malformed rows are skipped and counted, never an error.
pub fn transform(bundle: &SourceBundle) -> FactTables {
    let meta = resolve_track_meta(&bundle.playlist, &bundle.library);
    let mut skipped = 0_usize;

    let mut ranked_tracks = Vec::new();
    for raw in &bundle.wrapped.top_tracks.top_tracks {
        let Some(uri) = raw.track_uri.as_deref().filter(|uri| !uri.is_empty()) else {
            skipped += 1;
            continue;
        };
        let found = meta.get(uri);
        ranked_tracks.push(RankedTrack {
            track_id: uri.to_string(),
            track_name: found
                .and_then(|meta| meta.track_name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| uri.to_string()),
            artist_name: found
                .and_then(|meta| meta.artist_name.clone())
                .unwrap_or_default(),
            play_count: raw.count.unwrap_or(0),
            ms_played: raw.ms_played.unwrap_or(0),
        });
    }
    ranked_tracks.sort_by(|a, b| b.play_count.cmp(&a.play_count));

    let mut playlist_adds = Vec::new();
    for entry in &bundle.playlist.playlists {
        let playlist_name = entry.name.clone().unwrap_or_default();
        for item in &entry.items {
            let Some(track) = &item.track else {
                skipped += 1;
                continue;
            };
            let Some(uri) = track.track_uri.as_deref().filter(|uri| !uri.is_empty()) else {
                skipped += 1;
                continue;
            };
            let Some(added_at) = item.added_date.as_deref().and_then(parse_timestamp) else {
                skipped += 1;
                continue;
            };
            playlist_adds.push(PlaylistAddEvent {
                playlist_name: playlist_name.clone(),
                added_at,
                track_id: uri.to_string(),
                track_name: track.track_name.clone().unwrap_or_default(),
                artist_name: track.artist_name.clone().unwrap_or_default(),
            });
        }
    }

    // Grouped by calendar date so two reports on the same day merge into
    // one frame regardless of time-of-day.
    let mut by_date: BTreeMap<Date, Vec<ArtistWeeklyStat>> = BTreeMap::new();
    let mut daily_stats = Vec::new();
    for stat in &bundle.capsule.stats {
        let Some(date) = stat.date.as_deref().and_then(parse_day) else {
            skipped += 1;
            continue;
        };
        daily_stats.push(DailyListeningStat {
            date,
            stream_count: stat.stream_count.unwrap_or(0),
            seconds_played: stat.seconds_played.unwrap_or(0),
        });
        for artist in &stat.top_artists {
            let Some(name) = artist.name.as_deref().filter(|name| !name.is_empty()) else {
                skipped += 1;
                continue;
            };
            by_date.entry(date).or_default().push(ArtistWeeklyStat {
                date,
                artist_name: name.to_string(),
                stream_count: artist.stream_count.unwrap_or(0),
                seconds_played: artist.seconds_played.unwrap_or(0),
            });
        }
    }
    daily_stats.sort_by(|a, b| a.date.cmp(&b.date));

    let race_frames = by_date
        .into_iter()
        .map(|(date, rows)| RaceFrame { date, rows })
        .collect();

    let mut highlights = highlight::extract(&bundle.capsule.highlights, &mut skipped);
    highlights.sort_by(|a, b| b.date.cmp(&a.date));

    FactTables {
        ranked_tracks,
        playlist_adds,
        race_frames,
        daily_stats,
        highlights,
        skipped_rows: skipped,
    }
}

pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(parsed);
    }
    parse_day(trimmed).map(|date| date.midnight().assume_utc())
}

pub fn parse_day(raw: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    let trimmed = raw.trim();
    let day_part = trimmed.get(..10).unwrap_or(trimmed);
    Date::parse(day_part, &format).ok()
}

pub fn format_day(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
