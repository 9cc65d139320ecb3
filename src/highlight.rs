use crate::facts::parse_day;
use crate::model::CapsuleHighlight;
use time::Date;

pub const UNKNOWN_ENTITY: &str = "(unknown)";
const MILESTONE_ENTITY_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    OnRepeat,
    Streaks,
    ProportionListening,
    Milestone,
    UnlikeCombination,
    FirstToDiscover,
    Other,
}

impl HighlightKind {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.unwrap_or_default() {
            "ON_REPEAT" => Self::OnRepeat,
            "STREAKS" => Self::Streaks,
            "PROPORTION_LISTENING_ENTITY" => Self::ProportionListening,
            "MILESTONE" => Self::Milestone,
            "UNLIKE_COMBINATION" => Self::UnlikeCombination,
            "FIRST_TO_DISCOVER" => Self::FirstToDiscover,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OnRepeat => "On repeat",
            Self::Streaks => "Streak",
            Self::ProportionListening => "Share of listening",
            Self::Milestone => "Milestone",
            Self::UnlikeCombination => "Unlikely pair",
            Self::FirstToDiscover => "Early discovery",
            Self::Other => "Highlight",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightEvent {
    pub date: Date,
    pub kind: HighlightKind,
    pub entity: String,
    pub value: String,
}

/// One extraction rule per highlight kind; rows without a parseable date
/// are skipped and counted. The entity always ends up displayable.
pub fn extract(records: &[CapsuleHighlight], skipped: &mut usize) -> Vec<HighlightEvent> {
    let mut events = Vec::with_capacity(records.len());
    for record in records {
        let Some(date) = record.date.as_deref().and_then(parse_day) else {
            *skipped += 1;
            continue;
        };

        let kind = HighlightKind::from_tag(record.highlight_type.as_deref());
        let (mut entity, value) = match kind {
            HighlightKind::OnRepeat => {
                let payload = record.on_repeat_highlight.clone().unwrap_or_default();
                (
                    payload.entity.unwrap_or_default(),
                    payload
                        .stream_count
                        .map(|count| count.to_string())
                        .unwrap_or_default(),
                )
            }
            HighlightKind::Streaks => {
                let payload = record.streaks_highlight.clone().unwrap_or_default();
                (
                    payload.entity.unwrap_or_default(),
                    payload
                        .day_streaks
                        .map(|days| days.to_string())
                        .unwrap_or_default(),
                )
            }
            HighlightKind::ProportionListening => {
                let payload = record
                    .proportion_listening_highlight
                    .clone()
                    .unwrap_or_default();
                (
                    payload.entity.unwrap_or_default(),
                    payload
                        .listening_percentage
                        .map(|pct| format!("{:.1}%", round_to_tenth(pct)))
                        .unwrap_or_default(),
                )
            }
            HighlightKind::Milestone => {
                let payload = record
                    .multi_entity_milestone_highlight
                    .clone()
                    .unwrap_or_default();
                let entity = if payload.entities.is_empty() {
                    String::from("Milestone")
                } else {
                    let mut joined = payload.entities[..payload.entities.len().min(MILESTONE_ENTITY_LIMIT)]
                        .join(", ");
                    if payload.entities.len() > MILESTONE_ENTITY_LIMIT {
                        joined.push_str(&format!(
                            " +{} more",
                            payload.entities.len() - MILESTONE_ENTITY_LIMIT
                        ));
                    }
                    joined
                };
                let value = payload
                    .milestone_listening_seconds
                    .map(|seconds| format!("{} min", (seconds / 60.0).round() as i64))
                    .unwrap_or_default();
                (entity, value)
            }
            HighlightKind::UnlikeCombination => {
                let payload = record
                    .unlike_combination_highlight
                    .clone()
                    .unwrap_or_default();
                let entity = [payload.first_entity, payload.second_entity]
                    .into_iter()
                    .flatten()
                    .filter(|side| !side.is_empty())
                    .collect::<Vec<_>>()
                    .join(" + ");
                (entity, String::new())
            }
            HighlightKind::FirstToDiscover => {
                let payload = record
                    .first_to_discover_highlight
                    .clone()
                    .unwrap_or_default();
                let value = [
                    payload.country.map(|country| format!("in {country}")),
                    payload.position.map(|position| format!("rank {position}")),
                ]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" \u{b7} ");
                (payload.entity.unwrap_or_default(), value)
            }
            HighlightKind::Other => (String::new(), String::new()),
        };

        if entity.is_empty() {
            entity = String::from(UNKNOWN_ENTITY);
        }

        events.push(HighlightEvent {
            date,
            kind,
            entity,
            value,
        });
    }
    events
}

// {:.1} would round half-to-even; exports format percentages the
// round-half-away-from-zero way.
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn parse_records(raw: &str) -> Vec<CapsuleHighlight> {
        serde_json::from_str(raw).expect("records")
    }

    fn extract_one(raw: &str) -> HighlightEvent {
        let mut skipped = 0;
        let events = extract(&parse_records(raw), &mut skipped);
        assert_eq!(skipped, 0);
        assert_eq!(events.len(), 1);
        events.into_iter().next().expect("event")
    }

    #[test]
    fn on_repeat_uses_entity_and_raw_stream_count() {
        let event = extract_one(
            r#"[{"date":"2025-04-01","highlightType":"ON_REPEAT",
                "onRepeatHighlight":{"entity":"Song X","streamCount":41}}]"#,
        );
        assert_eq!(event.kind, HighlightKind::OnRepeat);
        assert_eq!(event.entity, "Song X");
        assert_eq!(event.value, "41");
    }

    #[test]
    fn proportion_formats_one_decimal_percent() {
        let event = extract_one(
            r#"[{"date":"2025-04-01","highlightType":"PROPORTION_LISTENING_ENTITY",
                "proportionListeningHighlight":{"entity":"Artist","listeningPercentage":12.25}}]"#,
        );
        assert_eq!(event.value, "12.3%");

        let blank = extract_one(
            r#"[{"date":"2025-04-01","highlightType":"PROPORTION_LISTENING_ENTITY",
                "proportionListeningHighlight":{"entity":"Artist"}}]"#,
        );
        assert_eq!(blank.value, "");
    }

    #[test]
    fn milestone_truncates_entities_and_rounds_minutes() {
        let event = extract_one(
            r#"[{"date":"2025-04-01","highlightType":"MILESTONE",
                "multiEntityMilestoneHighlight":{
                    "entities":["A","B","C","D"],
                    "milestoneListeningSeconds":125}}]"#,
        );
        assert_eq!(event.entity, "A, B, C +1 more");
        assert_eq!(event.value, "2 min");
    }

    #[test]
    fn milestone_with_no_entities_uses_literal_label() {
        let event = extract_one(
            r#"[{"date":"2025-04-01","highlightType":"MILESTONE",
                "multiEntityMilestoneHighlight":{"entities":[]}}]"#,
        );
        assert_eq!(event.entity, "Milestone");
        assert_eq!(event.value, "");
    }

    #[test]
    fn unlike_combination_drops_blank_sides() {
        let both = extract_one(
            r#"[{"date":"2025-04-01","highlightType":"UNLIKE_COMBINATION",
                "unlikeCombinationHighlight":{"firstEntity":"Jazz","secondEntity":"Noise"}}]"#,
        );
        assert_eq!(both.entity, "Jazz + Noise");

        let one = extract_one(
            r#"[{"date":"2025-04-01","highlightType":"UNLIKE_COMBINATION",
                "unlikeCombinationHighlight":{"firstEntity":"Jazz","secondEntity":""}}]"#,
        );
        assert_eq!(one.entity, "Jazz");
    }

    #[test]
    fn first_to_discover_joins_country_and_rank() {
        let event = extract_one(
            r#"[{"date":"2025-04-01","highlightType":"FIRST_TO_DISCOVER",
                "firstToDiscoverHighlight":{"entity":"Band","country":"NL","position":12}}]"#,
        );
        assert_eq!(event.value, "in NL \u{b7} rank 12");

        let rank_only = extract_one(
            r#"[{"date":"2025-04-01","highlightType":"FIRST_TO_DISCOVER",
                "firstToDiscoverHighlight":{"entity":"Band","position":3}}]"#,
        );
        assert_eq!(rank_only.value, "rank 3");
    }

    #[test]
    fn unknown_tag_falls_back_to_placeholder() {
        let event = extract_one(r#"[{"date":"2025-04-01","highlightType":"SOMETHING_NEW"}]"#);
        assert_eq!(event.kind, HighlightKind::Other);
        assert_eq!(event.entity, UNKNOWN_ENTITY);
        assert_eq!(event.value, "");
    }

    #[test]
    fn rows_without_dates_are_skipped() {
        let mut skipped = 0;
        let events = extract(
            &parse_records(r#"[{"highlightType":"ON_REPEAT"},{"date":"not a date"}]"#),
            &mut skipped,
        );
        assert!(events.is_empty());
        assert_eq!(skipped, 2);
    }

    #[test]
    fn extracted_date_is_calendar_day() {
        let event = extract_one(
            r#"[{"date":"2025-04-01T23:59:00Z","highlightType":"STREAKS",
                "streaksHighlight":{"entity":"Artist","dayStreaks":7}}]"#,
        );
        assert_eq!(event.date, date!(2025 - 04 - 01));
        assert_eq!(event.value, "7");
    }

    proptest::proptest! {
        #[test]
        fn entity_is_never_empty(tag in "[A-Z_]{0,24}", entity in ".{0,12}") {
            let records = vec![CapsuleHighlight {
                date: Some(String::from("2025-01-01")),
                highlight_type: Some(tag),
                on_repeat_highlight: Some(crate::model::OnRepeatPayload {
                    entity: Some(entity),
                    stream_count: None,
                }),
                ..CapsuleHighlight::default()
            }];

            let mut skipped = 0;
            for event in extract(&records, &mut skipped) {
                proptest::prop_assert!(!event.entity.is_empty());
            }
        }
    }
}
