use recap::core::DashCore;
use recap::model::ShortlistEntry;
use recap::{export, facts, sources};
use std::fs;
use time::macros::date;

fn write_bundle(dir: &std::path::Path) {
    fs::write(
        dir.join(sources::WRAPPED_FILE),
        r#"{"topTracks":{"topTracks":[
            {"trackUri":"uri:a","count":5,"msPlayed":1000},
            {"trackUri":"uri:b","count":9,"msPlayed":500}
        ]}}"#,
    )
    .expect("wrapped");

    fs::write(
        dir.join(sources::CAPSULE_FILE),
        r#"{"stats":[
            {"date":"2025-02-02T08:00:00Z","streamCount":12,"secondsPlayed":700,
             "topArtists":[{"name":"Alpha","streamCount":8,"secondsPlayed":500},
                           {"name":"Beta","streamCount":4,"secondsPlayed":200}]},
            {"date":"2025-02-09","streamCount":6,"secondsPlayed":300,
             "topArtists":[{"name":"Beta","streamCount":6,"secondsPlayed":300}]}
        ],
        "highlights":[
            {"date":"2025-02-09","highlightType":"MILESTONE",
             "multiEntityMilestoneHighlight":{"entities":["A","B","C","D"],"milestoneListeningSeconds":125}}
        ]}"#,
    )
    .expect("capsule");

    fs::write(
        dir.join(sources::PLAYLISTS_FILE),
        r#"{"playlists":[{"name":"mix","items":[
            {"addedDate":"2025-01-15T10:30:00Z",
             "track":{"trackUri":"uri:a","trackName":"Track A","artistName":"Alpha","albumName":"One"}},
            {"addedDate":"2025-02-20T22:10:00Z",
             "track":{"trackUri":"uri:b","trackName":"Track B","artistName":"Beta","albumName":"Two"}}
        ]}]}"#,
    )
    .expect("playlists");
}

#[test]
fn bundle_to_dashboard_flow_works() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_bundle(dir.path());

    let bundle = sources::load_bundle(dir.path()).expect("load");
    let mut core = DashCore::new(facts::transform(&bundle));

    // Wrapped ranking, decorated from playlist metadata.
    let view = core.derive();
    assert_eq!(view.top_tracks[0].track_name, "Track B");
    assert_eq!(view.top_tracks[0].play_count, 9);
    assert_eq!(view.top_tracks[1].track_name, "Track A");

    // Two capsule dates, two frames; milestone highlight formatted.
    assert_eq!(core.facts.race_frames.len(), 2);
    assert_eq!(view.highlights.len(), 1);
    assert_eq!(view.highlights[0].entity, "A, B, C +1 more");
    assert_eq!(view.highlights[0].value, "2 min");

    // An artist filter that matches playlist adds narrows the timeline.
    core.toggle_artist("alpha");
    let filtered = core.derive();
    assert_eq!(filtered.filtered_adds.len(), 1);
    assert_eq!(filtered.filtered_adds[0].track_id, "uri:a");

    // A filter that matches nothing leaves the view populated.
    core.clear_filters();
    core.set_date_range(Some((date!(2030 - 01 - 01), date!(2030 - 12 - 31))));
    let unmatched = core.derive();
    assert_eq!(unmatched.filtered_adds.len(), 2);
}

#[test]
fn shortlist_survives_filter_churn_and_exports() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_bundle(dir.path());

    let bundle = sources::load_bundle(dir.path()).expect("load");
    let mut core = DashCore::new(facts::transform(&bundle));

    let track = core.derive().top_tracks[0].clone();
    core.toggle_shortlist(&track);

    core.toggle_artist("Alpha");
    core.set_date_range(Some((date!(2025 - 01 - 01), date!(2025 - 01 - 31))));
    core.clear_filters();
    assert_eq!(core.filters.shortlist.len(), 1);

    let path = dir.path().join(export::SHORTLIST_FILE);
    core.export_shortlist(&path).expect("export");

    let raw = fs::read_to_string(&path).expect("read");
    let exported: Vec<ShortlistEntry> = serde_json::from_str(&raw).expect("parse");
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].track_id, "uri:b");
    assert_eq!(exported[0].play_count, 9);
}

#[test]
fn race_animation_steps_through_frames_and_respects_metric() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_bundle(dir.path());

    let bundle = sources::load_bundle(dir.path()).expect("load");
    let mut core = DashCore::new(facts::transform(&bundle));

    let first = core.derive();
    assert_eq!(first.race_date, Some(date!(2025 - 02 - 02)));
    assert_eq!(first.race_rows[0].label, "Alpha");

    core.advance_race_frame();
    let second = core.derive();
    assert_eq!(second.race_date, Some(date!(2025 - 02 - 09)));
    assert_eq!(second.race_rows[0].label, "Beta");

    core.advance_race_frame();
    assert_eq!(core.derive().race_date, Some(date!(2025 - 02 - 02)));
}
