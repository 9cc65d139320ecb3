#![no_main]

use libfuzzer_sys::fuzz_target;
use recap::core::DashCore;
use recap::facts::{ArtistWeeklyStat, FactTables, PlaylistAddEvent, RaceFrame, RankedTrack};
use time::{Date, Month};

fn day(offset: u8) -> Date {
    Date::from_calendar_date(2025, Month::March, (offset % 28) + 1).unwrap_or(Date::MIN)
}

fuzz_target!(|data: &[u8]| {
    let track_count = (data.len() % 8).max(1);
    let facts = FactTables {
        ranked_tracks: (0..track_count)
            .map(|idx| RankedTrack {
                track_id: format!("uri:{idx}"),
                track_name: format!("track {idx}"),
                artist_name: format!("artist {}", idx % 3),
                play_count: idx as u64,
                ms_played: 0,
            })
            .collect(),
        playlist_adds: (0..track_count)
            .map(|idx| PlaylistAddEvent {
                playlist_name: String::from("mix"),
                added_at: day(idx as u8).midnight().assume_utc(),
                track_id: format!("uri:{idx}"),
                track_name: format!("track {idx}"),
                artist_name: format!("artist {}", idx % 3),
            })
            .collect(),
        race_frames: (0..3u8)
            .map(|frame| RaceFrame {
                date: day(frame),
                rows: vec![ArtistWeeklyStat {
                    date: day(frame),
                    artist_name: String::from("artist 0"),
                    stream_count: u64::from(frame),
                    seconds_played: 1,
                }],
            })
            .collect(),
        ..FactTables::default()
    };

    let mut core = DashCore::new(facts);
    for byte in data {
        match byte % 11 {
            0 => core.toggle_artist("artist 0"),
            1 => core.toggle_artist("no such artist"),
            2 => core.set_date_range(Some((day(*byte), day(byte.wrapping_add(40))))),
            3 => core.clear_date_range(),
            4 => core.clear_filters(),
            5 => core.advance_race_frame(),
            6 => core.cycle_race_metric(),
            7 => core.toggle_race_playing(),
            8 => core.shrink_range_start(),
            9 => core.shrink_range_end(),
            _ => {
                let track = core.facts.ranked_tracks[0].clone();
                core.toggle_shortlist(&track);
            }
        }

        let view = core.derive();
        assert!(!view.filtered_adds.is_empty());
        assert_eq!(view.heatmap.len(), 168);
    }
});
