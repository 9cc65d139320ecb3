use crate::agg::WEEKDAY_LABELS;
use crate::core::{DashCore, ViewModel};
use crate::facts::format_day;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

const APP_TITLE: &str = "Recap v0.1.0  ";
const RACE_BAR_WIDTH: usize = 18;
const TIMELINE_BAR_WIDTH: usize = 24;
const SHADE_RAMP: [char; 5] = [' ', '\u{2591}', '\u{2592}', '\u{2593}', '\u{2588}'];

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
}

fn palette() -> Palette {
    Palette {
        bg: Color::Rgb(10, 15, 24),
        panel_bg: Color::Rgb(19, 29, 43),
        panel_alt_bg: Color::Rgb(24, 38, 58),
        border: Color::Rgb(69, 121, 176),
        text: Color::Rgb(214, 228, 248),
        muted: Color::Rgb(149, 173, 204),
        accent: Color::Rgb(100, 203, 184),
        alert: Color::Rgb(249, 174, 88),
        selected_bg: Color::Rgb(34, 55, 82),
    }
}

pub fn draw(frame: &mut Frame, core: &DashCore, view: &ViewModel) {
    let colors = palette();
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, core, view, &colors, vertical[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(36),
            Constraint::Percentage(30),
        ])
        .split(vertical[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(body[0]);
    draw_top_tracks(frame, core, view, &colors, left[0]);
    draw_shortlist(frame, view, &colors, left[1]);

    let middle = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(48), Constraint::Percentage(52)])
        .split(body[1]);
    draw_timeline(frame, view, &colors, middle[0]);
    draw_race(frame, core, view, &colors, middle[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(42),
            Constraint::Percentage(38),
            Constraint::Percentage(20),
        ])
        .split(body[2]);
    draw_highlights(frame, view, &colors, right[0]);
    draw_heatmap(frame, view, &colors, right[1]);
    draw_daily_trend(frame, view, &colors, right[2]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "Keys: Up/Down tracks, Enter shortlist, Left/Right artists, Tab filter artist, [ ] brush, r range off, m metric, Space race, c clear, e export, q quit",
            Style::default().fg(colors.muted),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
    ]))
    .block(panel_block("Message", colors.panel_bg, colors.text, colors.border))
    .wrap(Wrap { trim: true });
    frame.render_widget(footer, vertical[2]);
}

fn draw_header(frame: &mut Frame, core: &DashCore, view: &ViewModel, colors: &Palette, area: Rect) {
    frame.render_widget(
        panel_block("Status", colors.panel_bg, colors.text, colors.border),
        area,
    );
    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });

    let mut spans = vec![Span::styled(
        APP_TITLE,
        Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD),
    )];

    match &core.filters.selected_artist {
        Some(artist) => spans.push(Span::styled(
            format!("Artist: {artist}"),
            Style::default().fg(colors.alert),
        )),
        None => spans.push(Span::styled(
            "Artist: all",
            Style::default().fg(colors.muted),
        )),
    }
    spans.push(Span::styled("  |  ", Style::default().fg(colors.muted)));

    match core.filters.date_range {
        Some((start, end)) => spans.push(Span::styled(
            format!("Dates: {} to {}", format_day(start), format_day(end)),
            Style::default().fg(colors.alert),
        )),
        None => spans.push(Span::styled(
            "Dates: all",
            Style::default().fg(colors.muted),
        )),
    }
    spans.push(Span::styled("  |  ", Style::default().fg(colors.muted)));

    spans.push(Span::styled(
        format!("Race: {}", core.filters.race_metric.label()),
        Style::default().fg(colors.text),
    ));
    spans.push(Span::styled(
        if core.filters.race_playing {
            " playing"
        } else {
            " paused"
        },
        Style::default().fg(colors.muted),
    ));
    spans.push(Span::styled("  |  ", Style::default().fg(colors.muted)));
    spans.push(Span::styled(
        format!("Shortlist: {}", view.shortlist.len()),
        Style::default().fg(colors.accent),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn draw_top_tracks(frame: &mut Frame, core: &DashCore, view: &ViewModel, colors: &Palette, area: Rect) {
    let title = if view.top_tracks_from_filters {
        "Top Tracks (from current filters)"
    } else {
        "Top Tracks (Wrapped)"
    };

    let items: Vec<ListItem> = view
        .top_tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let shortlisted = view
                .shortlist
                .iter()
                .any(|entry| entry.track_id == track.track_id);
            let marker = if shortlisted { "* " } else { "  " };
            let minutes = track.ms_played / 60_000;
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{marker}{:>2} ", index + 1),
                    Style::default().fg(if shortlisted { colors.accent } else { colors.muted }),
                ),
                Span::styled(track.track_name.clone(), Style::default().fg(colors.text)),
                Span::styled(
                    format!("  {}", track.artist_name),
                    Style::default().fg(colors.muted),
                ),
                Span::styled(
                    format!("  {} plays, {minutes} min", track.play_count),
                    Style::default().fg(colors.alert),
                ),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(
        (!view.top_tracks.is_empty()).then_some(core.track_cursor.min(view.top_tracks.len() - 1)),
    );

    let list = List::new(items)
        .block(panel_block(title, colors.panel_bg, colors.text, colors.border))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_shortlist(frame: &mut Frame, view: &ViewModel, colors: &Palette, area: Rect) {
    let title = format!("Shortlist ({})", view.shortlist.len());
    if view.shortlist.is_empty() {
        let hint = Paragraph::new(Span::styled(
            "Enter on a top track adds it here.",
            Style::default().fg(colors.muted),
        ))
        .block(panel_block(&title, colors.panel_alt_bg, colors.text, colors.border))
        .wrap(Wrap { trim: true });
        frame.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = view
        .shortlist
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(entry.track_name.clone(), Style::default().fg(colors.text)),
                Span::styled(
                    format!("  {}  plays {}", entry.artist_name, entry.play_count),
                    Style::default().fg(colors.muted),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(panel_block(
        &title,
        colors.panel_alt_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(list, area);
}

fn draw_timeline(frame: &mut Frame, view: &ViewModel, colors: &Palette, area: Rect) {
    let max = view
        .timeline
        .iter()
        .map(|bucket| bucket.count)
        .max()
        .unwrap_or(0)
        .max(1);

    let lines: Vec<Line> = view
        .timeline
        .iter()
        .map(|bucket| {
            let month = format_day(bucket.month_start);
            Line::from(vec![
                Span::styled(
                    format!("{} ", &month[..7]),
                    Style::default().fg(colors.muted),
                ),
                Span::styled(
                    value_bar(bucket.count, max, TIMELINE_BAR_WIDTH),
                    Style::default().fg(colors.accent),
                ),
                Span::styled(
                    format!(" {}", bucket.count),
                    Style::default().fg(colors.text),
                ),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(panel_block(
        "Playlist Additions (per month)",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(paragraph, area);
}

fn draw_race(frame: &mut Frame, core: &DashCore, view: &ViewModel, colors: &Palette, area: Rect) {
    let title = match view.race_date {
        Some(date) => format!(
            "Artist Race ({}, {})",
            format_day(date),
            core.filters.race_metric.label()
        ),
        None => String::from("Artist Race (no capsule stats)"),
    };

    let max = view
        .race_rows
        .iter()
        .map(|row| row.value)
        .max()
        .unwrap_or(0)
        .max(1);

    let items: Vec<ListItem> = view
        .race_rows
        .iter()
        .map(|row| {
            let selected = core
                .filters
                .selected_artist
                .as_deref()
                .is_some_and(|artist| artist.eq_ignore_ascii_case(&row.label));
            let name_style = if selected {
                Style::default()
                    .fg(colors.alert)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.text)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<18.18} ", row.label), name_style),
                Span::styled(
                    value_bar(row.value, max, RACE_BAR_WIDTH),
                    Style::default().fg(colors.accent),
                ),
                Span::styled(format!(" {}", row.value), Style::default().fg(colors.muted)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(
        (!view.race_rows.is_empty()).then_some(core.artist_cursor.min(view.race_rows.len() - 1)),
    );

    let list = List::new(items)
        .block(panel_block(&title, colors.panel_bg, colors.text, colors.border))
        .highlight_style(Style::default().bg(colors.selected_bg))
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_highlights(frame: &mut Frame, view: &ViewModel, colors: &Palette, area: Rect) {
    if view.highlights.is_empty() {
        let hint = Paragraph::new(Span::styled(
            "No highlights found.",
            Style::default().fg(colors.muted),
        ))
        .block(panel_block("Highlights", colors.panel_bg, colors.text, colors.border));
        frame.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = view
        .highlights
        .iter()
        .map(|event| {
            let mut spans = vec![
                Span::styled(
                    format!("{} ", format_day(event.date)),
                    Style::default().fg(colors.muted),
                ),
                Span::styled(
                    format!("{}: ", event.kind.label()),
                    Style::default().fg(colors.accent),
                ),
                Span::styled(event.entity.clone(), Style::default().fg(colors.text)),
            ];
            if !event.value.is_empty() {
                spans.push(Span::styled(
                    format!(" [{}]", event.value),
                    Style::default().fg(colors.alert),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).block(panel_block(
        "Highlights",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(list, area);
}

fn draw_heatmap(frame: &mut Frame, view: &ViewModel, colors: &Palette, area: Rect) {
    let max = view
        .heatmap
        .iter()
        .map(|cell| cell.count)
        .max()
        .unwrap_or(0)
        .max(1);

    let mut lines = vec![Line::from(Span::styled(
        String::from("    0   4   8   12  16  20"),
        Style::default().fg(colors.muted),
    ))];
    for (day_index, label) in WEEKDAY_LABELS.iter().enumerate() {
        let row: String = view
            .heatmap
            .iter()
            .filter(|cell| cell.day_index == day_index)
            .map(|cell| shade(cell.count, max))
            .collect();
        lines.push(Line::from(vec![
            Span::styled(format!("{label} "), Style::default().fg(colors.muted)),
            Span::styled(row, Style::default().fg(colors.accent)),
        ]));
    }

    let paragraph = Paragraph::new(lines).block(panel_block(
        "Listening Rhythm (when added)",
        colors.panel_alt_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(paragraph, area);
}

fn draw_daily_trend(frame: &mut Frame, view: &ViewModel, colors: &Palette, area: Rect) {
    let max = view
        .daily_trend
        .iter()
        .map(|stat| stat.seconds_played)
        .max()
        .unwrap_or(0)
        .max(1);
    let spark: String = view
        .daily_trend
        .iter()
        .map(|stat| shade(stat.seconds_played, max))
        .collect();

    let caption = match (view.daily_trend.first(), view.daily_trend.last()) {
        (Some(first), Some(last)) => {
            format!("{} to {}", format_day(first.date), format_day(last.date))
        }
        _ => String::from("no capsule stats"),
    };

    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(spark, Style::default().fg(colors.accent))),
        Line::from(Span::styled(caption, Style::default().fg(colors.muted))),
    ])
    .block(panel_block(
        "Daily Listening (seconds)",
        colors.panel_bg,
        colors.text,
        colors.border,
    ))
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

fn value_bar(value: u64, max: u64, width: usize) -> String {
    let filled = ((value as f64 / max as f64) * width as f64).round() as usize;
    let filled = filled.min(width);
    let mut bar = String::with_capacity(width);
    bar.push_str(&"\u{2588}".repeat(filled));
    bar.push_str(&"\u{b7}".repeat(width - filled));
    bar
}

fn shade(value: u64, max: u64) -> char {
    if value == 0 {
        return SHADE_RAMP[0];
    }
    let ratio = value as f64 / max as f64;
    let step = ((ratio * (SHADE_RAMP.len() - 1) as f64).ceil() as usize)
        .clamp(1, SHADE_RAMP.len() - 1);
    SHADE_RAMP[step]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agg::HOURS_PER_DAY;

    #[test]
    fn value_bar_fills_proportionally() {
        assert_eq!(value_bar(0, 10, 4), "\u{b7}\u{b7}\u{b7}\u{b7}");
        assert_eq!(value_bar(10, 10, 4), "\u{2588}".repeat(4));
        assert_eq!(value_bar(5, 10, 4).chars().filter(|ch| *ch == '\u{2588}').count(), 2);
    }

    #[test]
    fn shade_maps_zero_to_blank_and_max_to_full() {
        assert_eq!(shade(0, 8), ' ');
        assert_eq!(shade(8, 8), '\u{2588}');
        assert_ne!(shade(1, 8), ' ');
    }

    #[test]
    fn heatmap_rows_cover_every_hour() {
        let cells = crate::agg::weekday_hour_histogram(
            &Vec::<time::OffsetDateTime>::new(),
            |when| *when,
        );
        for day_index in 0..WEEKDAY_LABELS.len() {
            let row: String = cells
                .iter()
                .filter(|cell| cell.day_index == day_index)
                .map(|cell| shade(cell.count, 1))
                .collect();
            assert_eq!(row.chars().count(), HOURS_PER_DAY);
        }
    }
}
