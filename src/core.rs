use crate::agg::{self, HeatCell, MonthBucket, RankEntry, RACE_RANK_LIMIT, TOP_TRACK_LIMIT};
use crate::export;
use crate::facts::{self, DailyListeningStat, FactTables, PlaylistAddEvent, RankedTrack};
use crate::highlight::HighlightEvent;
use crate::model::ShortlistEntry;
use std::collections::HashMap;
use std::path::Path;
use time::Date;

pub const HIGHLIGHT_PANEL_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RaceMetric {
    #[default]
    StreamCount,
    SecondsPlayed,
}

impl RaceMetric {
    pub fn label(self) -> &'static str {
        match self {
            Self::StreamCount => "streams",
            Self::SecondsPlayed => "seconds",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::StreamCount => Self::SecondsPlayed,
            Self::SecondsPlayed => Self::StreamCount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub selected_artist: Option<String>,
    pub date_range: Option<(Date, Date)>,
    pub race_metric: RaceMetric,
    pub race_playing: bool,
    pub shortlist: Vec<ShortlistEntry>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            selected_artist: None,
            date_range: None,
            race_metric: RaceMetric::default(),
            race_playing: true,
            shortlist: Vec::new(),
        }
    }
}

/// Everything the panels need for one draw, derived in a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub top_tracks: Vec<RankedTrack>,
    pub top_tracks_from_filters: bool,
    pub filtered_adds: Vec<PlaylistAddEvent>,
    pub timeline: Vec<MonthBucket>,
    pub race_date: Option<Date>,
    pub race_rows: Vec<RankEntry>,
    pub heatmap: Vec<HeatCell>,
    pub highlights: Vec<HighlightEvent>,
    pub daily_trend: Vec<DailyListeningStat>,
    pub shortlist: Vec<ShortlistEntry>,
}

/// Owns the immutable fact tables and the session's cross-filter state.
/// All mutation goes through the methods below; each one marks the core
/// dirty so the app loop runs exactly one derive+draw pass.
#[derive(Debug)]
pub struct DashCore {
    pub facts: FactTables,
    pub filters: FilterState,
    pub race_index: usize,
    pub track_cursor: usize,
    pub artist_cursor: usize,
    pub dirty: bool,
    pub status: String,
}

impl DashCore {
    pub fn new(facts: FactTables) -> Self {
        let status = if facts.skipped_rows > 0 {
            format!(
                "Loaded {} tracks, {} adds, {} frames ({} malformed rows skipped)",
                facts.ranked_tracks.len(),
                facts.playlist_adds.len(),
                facts.race_frames.len(),
                facts.skipped_rows
            )
        } else {
            format!(
                "Loaded {} tracks, {} adds, {} frames",
                facts.ranked_tracks.len(),
                facts.playlist_adds.len(),
                facts.race_frames.len()
            )
        };

        Self {
            facts,
            filters: FilterState::default(),
            race_index: 0,
            track_cursor: 0,
            artist_cursor: 0,
            dirty: true,
            status,
        }
    }

    pub fn derive(&self) -> ViewModel {
        derive_views(&self.facts, &self.filters, None, self.race_index)
    }

    pub fn toggle_artist(&mut self, name: &str) {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return;
        }

        let already = self
            .filters
            .selected_artist
            .as_deref()
            .is_some_and(|current| normalize(current) == normalize(trimmed));
        if already {
            self.filters.selected_artist = None;
            self.set_status("Artist filter cleared");
        } else {
            self.filters.selected_artist = Some(trimmed.to_string());
            self.set_status(&format!("Artist filter: {trimmed}"));
        }
    }

    pub fn set_date_range(&mut self, range: Option<(Date, Date)>) {
        self.filters.date_range = range.map(|(a, b)| if a <= b { (a, b) } else { (b, a) });
        match self.filters.date_range {
            Some((start, end)) => self.set_status(&format!(
                "Dates: {} to {}",
                facts::format_day(start),
                facts::format_day(end)
            )),
            None => self.set_status("Date range cleared"),
        }
    }

    /// Brush from the left: move the range start one month forward.
    pub fn shrink_range_start(&mut self) {
        let Some((start, end)) = self.current_or_full_range() else {
            self.set_status("No playlist additions to brush");
            return;
        };
        let next = agg::next_month(agg::month_floor(start));
        if next > end {
            self.set_status("Date range cannot shrink further");
            return;
        }
        self.set_date_range(Some((next, end)));
    }

    /// Brush from the right: move the range end back to the previous
    /// month's last day.
    pub fn shrink_range_end(&mut self) {
        let Some((start, end)) = self.current_or_full_range() else {
            self.set_status("No playlist additions to brush");
            return;
        };
        let Some(previous) = agg::month_floor(end).previous_day() else {
            return;
        };
        if previous < start {
            self.set_status("Date range cannot shrink further");
            return;
        }
        self.set_date_range(Some((start, previous)));
    }

    pub fn clear_date_range(&mut self) {
        self.filters.date_range = None;
        self.set_status("Date range cleared");
    }

    pub fn cycle_race_metric(&mut self) {
        self.filters.race_metric = self.filters.race_metric.toggle();
        self.set_status(&format!("Race metric: {}", self.filters.race_metric.label()));
    }

    pub fn toggle_race_playing(&mut self) {
        self.filters.race_playing = !self.filters.race_playing;
        self.set_status(if self.filters.race_playing {
            "Race playing"
        } else {
            "Race paused"
        });
    }

    /// Steps the race cursor, wrapping at the last frame. The app loop
    /// calls this on a fixed interval while the race is playing; pausing
    /// simply stops the calls, so the index freezes in place.
    pub fn advance_race_frame(&mut self) {
        if self.facts.race_frames.is_empty() {
            return;
        }
        self.race_index = (self.race_index + 1) % self.facts.race_frames.len();
        self.dirty = true;
    }

    pub fn toggle_shortlist(&mut self, track: &RankedTrack) {
        if let Some(position) = self
            .filters
            .shortlist
            .iter()
            .position(|entry| entry.track_id == track.track_id)
        {
            self.filters.shortlist.remove(position);
            self.set_status(&format!("Removed from shortlist: {}", track.track_name));
        } else {
            self.filters.shortlist.push(ShortlistEntry {
                track_id: track.track_id.clone(),
                track_name: track.track_name.clone(),
                artist_name: track.artist_name.clone(),
                play_count: track.play_count,
                ms_played: track.ms_played,
            });
            self.set_status(&format!("Shortlisted: {}", track.track_name));
        }
    }

    /// Resets the selection fields to their defaults. The shortlist is
    /// deliberately left alone.
    pub fn clear_filters(&mut self) {
        self.filters.selected_artist = None;
        self.filters.date_range = None;
        self.set_status("Filters cleared");
    }

    pub fn export_shortlist(&mut self, path: &Path) -> anyhow::Result<()> {
        export::write_shortlist(path, &self.filters.shortlist)?;
        self.set_status(&format!(
            "Exported {} shortlist entries to {}",
            self.filters.shortlist.len(),
            path.display()
        ));
        Ok(())
    }

    pub fn select_next_track(&mut self, list_len: usize) {
        if list_len == 0 {
            return;
        }
        self.track_cursor = (self.track_cursor + 1).min(list_len - 1);
        self.dirty = true;
    }

    pub fn select_prev_track(&mut self) {
        self.track_cursor = self.track_cursor.saturating_sub(1);
        self.dirty = true;
    }

    pub fn select_next_artist(&mut self, list_len: usize) {
        if list_len == 0 {
            return;
        }
        self.artist_cursor = (self.artist_cursor + 1).min(list_len - 1);
        self.dirty = true;
    }

    pub fn select_prev_artist(&mut self) {
        self.artist_cursor = self.artist_cursor.saturating_sub(1);
        self.dirty = true;
    }

    fn current_or_full_range(&self) -> Option<(Date, Date)> {
        self.filters.date_range.or_else(|| {
            let mut dates = self.facts.playlist_adds.iter().map(|add| add.added_at.date());
            let first = dates.next()?;
            Some(dates.fold((first, first), |(min, max), date| {
                (min.min(date), max.max(date))
            }))
        })
    }

    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
        self.dirty = true;
    }
}

/// The full derive pass: one pure function from facts + filters to what
/// every panel draws. `playlist_restriction` is the first step of the
/// filter pipeline; the current UI exposes no playlist picker and passes
/// `None`.
pub fn derive_views(
    facts: &FactTables,
    filters: &FilterState,
    playlist_restriction: Option<&str>,
    race_index: usize,
) -> ViewModel {
    let filtered_adds = filter_adds(
        &facts.playlist_adds,
        playlist_restriction,
        filters.date_range,
        filters.selected_artist.as_deref(),
    );

    let (top_tracks, top_tracks_from_filters) = if playlist_restriction.is_some() {
        (top_tracks_from_adds(&filtered_adds), true)
    } else {
        (
            facts
                .ranked_tracks
                .iter()
                .take(TOP_TRACK_LIMIT)
                .cloned()
                .collect(),
            false,
        )
    };

    let timeline = agg::month_buckets(&filtered_adds, |add| add.added_at.date());
    let heatmap = agg::weekday_hour_histogram(&filtered_adds, |add| add.added_at);

    let (race_date, race_rows) = match facts.race_frames.get(race_index) {
        Some(frame) => (
            Some(frame.date),
            agg::rank_by(
                &frame.rows,
                |row| row.artist_name.as_str(),
                |row| match filters.race_metric {
                    RaceMetric::StreamCount => row.stream_count,
                    RaceMetric::SecondsPlayed => row.seconds_played,
                },
                RACE_RANK_LIMIT,
            ),
        ),
        None => (None, Vec::new()),
    };

    let highlights = facts
        .highlights
        .iter()
        .take(HIGHLIGHT_PANEL_LIMIT)
        .cloned()
        .collect();

    let daily_trend = match filters.date_range {
        Some((start, end)) => {
            let ranged: Vec<DailyListeningStat> = facts
                .daily_stats
                .iter()
                .filter(|stat| stat.date >= start && stat.date <= end)
                .cloned()
                .collect();
            if ranged.is_empty() {
                facts.daily_stats.clone()
            } else {
                ranged
            }
        }
        None => facts.daily_stats.clone(),
    };

    let mut shortlist = filters.shortlist.clone();
    shortlist.sort_by(|a, b| b.play_count.cmp(&a.play_count));

    ViewModel {
        top_tracks,
        top_tracks_from_filters,
        filtered_adds,
        timeline,
        race_date,
        race_rows,
        heatmap,
        highlights,
        daily_trend,
        shortlist,
    }
}

/// Composable filter pipeline in fixed order: playlist, date range,
/// artist. Each step only commits when it leaves at least one row, so a
/// filter that matches nothing never blanks a view.
pub fn filter_adds(
    adds: &[PlaylistAddEvent],
    playlist: Option<&str>,
    range: Option<(Date, Date)>,
    artist: Option<&str>,
) -> Vec<PlaylistAddEvent> {
    let mut current = adds.to_vec();

    if let Some(playlist) = playlist {
        let wanted = normalize(playlist);
        apply_if_nonempty(&mut current, |add| normalize(&add.playlist_name) == wanted);
    }

    if let Some((start, end)) = range {
        apply_if_nonempty(&mut current, |add| {
            let day = add.added_at.date();
            day >= start && day <= end
        });
    }

    if let Some(artist) = artist {
        let wanted = normalize(artist);
        apply_if_nonempty(&mut current, |add| normalize(&add.artist_name) == wanted);
    }

    current
}

fn apply_if_nonempty(
    rows: &mut Vec<PlaylistAddEvent>,
    keep: impl Fn(&PlaylistAddEvent) -> bool,
) {
    let filtered: Vec<PlaylistAddEvent> = rows.iter().filter(|row| keep(row)).cloned().collect();
    if !filtered.is_empty() {
        *rows = filtered;
    }
}

// Count is "times added"; there is no play time in a playlist snapshot.
fn top_tracks_from_adds(adds: &[PlaylistAddEvent]) -> Vec<RankedTrack> {
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut tracks: Vec<RankedTrack> = Vec::new();

    for add in adds {
        let index = *order.entry(add.track_id.clone()).or_insert_with(|| {
            tracks.push(RankedTrack {
                track_id: add.track_id.clone(),
                track_name: add.track_name.clone(),
                artist_name: add.artist_name.clone(),
                play_count: 0,
                ms_played: 0,
            });
            tracks.len() - 1
        });
        tracks[index].play_count += 1;
    }

    tracks.sort_by(|a, b| b.play_count.cmp(&a.play_count));
    tracks.truncate(TOP_TRACK_LIMIT);
    tracks
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
