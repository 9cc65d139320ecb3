use crate::core::{DashCore, ViewModel};
use crate::export;
use crate::facts;
use crate::sources;
use crate::ui;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const RACE_FRAME_INTERVAL: Duration = Duration::from_millis(1200);

#[derive(Debug, Default)]
pub struct AppOptions {
    pub bundle_dir: PathBuf,
    pub export_path: Option<PathBuf>,
}

pub fn run(options: AppOptions) -> Result<()> {
    let bundle = sources::load_bundle(&options.bundle_dir)?;
    let mut core = DashCore::new(facts::transform(&bundle));
    let export_path = options
        .export_path
        .unwrap_or_else(export::default_export_path);

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut view = core.derive();
    let mut last_tick = Instant::now();
    let mut last_race_step = Instant::now();

    let result: Result<()> = loop {
        if core.filters.race_playing && last_race_step.elapsed() >= RACE_FRAME_INTERVAL {
            core.advance_race_frame();
            last_race_step = Instant::now();
        }

        if core.dirty || last_tick.elapsed() > Duration::from_millis(250) {
            view = core.derive();
            terminal.draw(|frame| ui::draw(frame, &core, &view))?;
            core.dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let was_playing = core.filters.race_playing;
        if handle_key(&mut core, &view, &export_path, key.code, key.modifiers) {
            break Ok(());
        }
        if !was_playing && core.filters.race_playing {
            last_race_step = Instant::now();
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// One state mutation per key; returns true when the app should quit.
fn handle_key(
    core: &mut DashCore,
    view: &ViewModel,
    export_path: &Path,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> bool {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Down => core.select_next_track(view.top_tracks.len()),
        KeyCode::Up => core.select_prev_track(),
        KeyCode::Enter => {
            if let Some(track) = view.top_tracks.get(core.track_cursor).cloned() {
                core.toggle_shortlist(&track);
            }
        }
        KeyCode::Right => core.select_next_artist(view.race_rows.len()),
        KeyCode::Left => core.select_prev_artist(),
        KeyCode::Tab => {
            if let Some(row) = view.race_rows.get(core.artist_cursor).cloned() {
                core.toggle_artist(&row.label);
            }
        }
        KeyCode::Char('[') => core.shrink_range_start(),
        KeyCode::Char(']') => core.shrink_range_end(),
        KeyCode::Char('r') => core.clear_date_range(),
        KeyCode::Char('m') => core.cycle_race_metric(),
        KeyCode::Char(' ') => core.toggle_race_playing(),
        KeyCode::Char('c') => core.clear_filters(),
        KeyCode::Char('e') => {
            if let Err(err) = core.export_shortlist(export_path) {
                core.status = format!("export error: {err:#}");
                core.dirty = true;
            }
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FactTables, RankedTrack};
    use crate::model::ShortlistEntry;

    fn core_with_tracks() -> DashCore {
        DashCore::new(FactTables {
            ranked_tracks: vec![
                RankedTrack {
                    track_id: String::from("uri:a"),
                    track_name: String::from("a"),
                    artist_name: String::from("Alpha"),
                    play_count: 5,
                    ms_played: 1000,
                },
                RankedTrack {
                    track_id: String::from("uri:b"),
                    track_name: String::from("b"),
                    artist_name: String::from("Beta"),
                    play_count: 2,
                    ms_played: 400,
                },
            ],
            ..FactTables::default()
        })
    }

    #[test]
    fn enter_toggles_shortlist_for_cursor_track() {
        let mut core = core_with_tracks();
        let view = core.derive();

        handle_key(&mut core, &view, Path::new("x.json"), KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(core.filters.shortlist.len(), 1);
        assert_eq!(core.filters.shortlist[0].track_id, "uri:a");

        handle_key(&mut core, &view, Path::new("x.json"), KeyCode::Enter, KeyModifiers::NONE);
        assert!(core.filters.shortlist.is_empty());
    }

    #[test]
    fn clear_key_resets_filters_but_not_shortlist() {
        let mut core = core_with_tracks();
        core.filters.shortlist.push(ShortlistEntry {
            track_id: String::from("uri:a"),
            track_name: String::from("a"),
            artist_name: String::from("Alpha"),
            play_count: 5,
            ms_played: 1000,
        });
        core.toggle_artist("Alpha");
        let view = core.derive();

        handle_key(&mut core, &view, Path::new("x.json"), KeyCode::Char('c'), KeyModifiers::NONE);

        assert_eq!(core.filters.selected_artist, None);
        assert_eq!(core.filters.shortlist.len(), 1);
    }

    #[test]
    fn quit_keys_are_reported() {
        let mut core = core_with_tracks();
        let view = core.derive();

        assert!(handle_key(&mut core, &view, Path::new("x.json"), KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(handle_key(&mut core, &view, Path::new("x.json"), KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!handle_key(&mut core, &view, Path::new("x.json"), KeyCode::Char('m'), KeyModifiers::NONE));
    }

    #[test]
    fn export_key_writes_the_shortlist_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shortlist.json");
        let mut core = core_with_tracks();
        let view = core.derive();
        handle_key(&mut core, &view, &path, KeyCode::Enter, KeyModifiers::NONE);

        handle_key(&mut core, &view, &path, KeyCode::Char('e'), KeyModifiers::NONE);

        assert!(path.exists());
        assert!(core.status.contains("Exported 1"));
    }

    #[test]
    fn track_cursor_stays_within_the_view() {
        let mut core = core_with_tracks();
        let view = core.derive();

        for _ in 0..10 {
            handle_key(&mut core, &view, Path::new("x.json"), KeyCode::Down, KeyModifiers::NONE);
        }
        assert_eq!(core.track_cursor, view.top_tracks.len() - 1);

        handle_key(&mut core, &view, Path::new("x.json"), KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(core.track_cursor, view.top_tracks.len() - 2);
    }
}
