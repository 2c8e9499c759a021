use crate::models::{EngineSettings, Event, SortMode};
use crate::shuffle::{fisher_yates, SeededRng};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::cmp::Ordering;

/// Orders a filtered set. Ended events are always demoted below ongoing
/// ones regardless of sort mode; the single exception is year-scope
/// chronological ordering, which sorts the whole set by date.
pub fn rank(
    matched: Vec<Event>,
    sort: SortMode,
    today: NaiveDate,
    year_chronological: bool,
    seed: i64,
    now: DateTime<Utc>,
    settings: &EngineSettings,
) -> Vec<Event> {
    if year_chronological {
        let mut events = matched;
        events.sort_by(chronological_cmp);
        return events;
    }

    let mut ongoing = Vec::new();
    let mut ended = Vec::new();
    for event in matched {
        match event.effective_end() {
            Some(end) if end < today => ended.push(event),
            _ => ongoing.push(event),
        }
    }

    let mut ranked = rank_group(ongoing, sort, seed, now, settings);
    ranked.extend(rank_group(ended, sort, seed, now, settings));
    ranked
}

fn rank_group(
    group: Vec<Event>,
    sort: SortMode,
    seed: i64,
    now: DateTime<Utc>,
    settings: &EngineSettings,
) -> Vec<Event> {
    match sort {
        SortMode::Shuffle => {
            // Recently created events are held out of the shuffle and
            // shown first, newest on top.
            let cutoff = now - Duration::hours(settings.promotion_window_hours);
            let (mut promoted, mut regular): (Vec<Event>, Vec<Event>) = group
                .into_iter()
                .partition(|event| event.created_at.is_some_and(|created| created > cutoff));
            promoted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let mut rng = SeededRng::new(seed);
            fisher_yates(&mut regular, &mut rng);
            promoted.extend(regular);
            promoted
        }
        SortMode::Chronological => {
            let mut sorted = group;
            sorted.sort_by(chronological_cmp);
            sorted
        }
        SortMode::Lexical => {
            let mut sorted = group;
            sorted.sort_by_key(|event| event.title.to_lowercase());
            sorted
        }
    }
}

/// Ascending by (start date, start time); events missing a date sort last.
/// Times are fixed-width "HH:MM" strings, so lexical comparison is
/// chronological.
fn chronological_cmp(a: &Event, b: &Event) -> Ordering {
    match (a.start_date, b.start_date) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => left.cmp(&right).then_with(|| {
            a.start_time
                .as_deref()
                .unwrap_or("")
                .cmp(b.start_time.as_deref().unwrap_or(""))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::rank;
    use crate::models::{Category, EngineSettings, Event, SortMode};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: &str, start: NaiveDate, end: NaiveDate) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Event {}", id),
            location: String::new(),
            organizer: String::new(),
            tag: None,
            category: Category::Social,
            start_date: Some(start),
            end_date: Some(end),
            explicit_dates: None,
            start_time: None,
            created_at: None,
        }
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap()
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|event| event.id.as_str()).collect()
    }

    #[test]
    fn ended_events_rank_after_ongoing_in_every_mode() {
        let today = date(2025, 6, 14);
        for sort in [SortMode::Shuffle, SortMode::Chronological, SortMode::Lexical] {
            let matched = vec![
                event("ended-1", date(2025, 6, 1), date(2025, 6, 2)),
                event("ongoing-1", date(2025, 6, 10), date(2025, 6, 20)),
                event("ended-2", date(2025, 5, 1), date(2025, 5, 3)),
                event("ongoing-2", date(2025, 6, 14), date(2025, 6, 14)),
            ];
            let ranked = rank(matched, sort, today, false, 7, now(), &EngineSettings::default());
            let ended_positions: Vec<usize> = ranked
                .iter()
                .enumerate()
                .filter(|(_, e)| e.id.starts_with("ended"))
                .map(|(i, _)| i)
                .collect();
            let ongoing_positions: Vec<usize> = ranked
                .iter()
                .enumerate()
                .filter(|(_, e)| e.id.starts_with("ongoing"))
                .map(|(i, _)| i)
                .collect();
            assert!(
                ongoing_positions.iter().max() < ended_positions.iter().min(),
                "ongoing must precede ended under {:?}",
                sort
            );
        }
    }

    #[test]
    fn event_ending_today_is_still_ongoing() {
        let today = date(2025, 6, 14);
        let matched = vec![
            event("past", date(2025, 6, 1), date(2025, 6, 13)),
            event("today", date(2025, 6, 10), date(2025, 6, 14)),
        ];
        let ranked = rank(
            matched,
            SortMode::Chronological,
            today,
            false,
            0,
            now(),
            &EngineSettings::default(),
        );
        assert_eq!(ids(&ranked), vec!["today", "past"]);
    }

    #[test]
    fn year_chronological_ignores_the_partition() {
        let today = date(2025, 6, 14);
        let matched = vec![
            event("b", date(2025, 8, 1), date(2025, 8, 2)),
            event("a", date(2025, 1, 1), date(2025, 1, 2)),
            event("c", date(2025, 12, 1), date(2025, 12, 2)),
        ];
        let ranked = rank(
            matched,
            SortMode::Chronological,
            today,
            true,
            0,
            now(),
            &EngineSettings::default(),
        );
        assert_eq!(ids(&ranked), vec!["a", "b", "c"]);
    }

    #[test]
    fn chronological_puts_dateless_events_last_and_breaks_ties_by_time() {
        let today = date(2025, 6, 14);
        let mut dateless = event("dateless", date(2025, 7, 1), date(2025, 7, 1));
        dateless.start_date = None;
        dateless.end_date = None;
        let mut late = event("late", date(2025, 7, 1), date(2025, 7, 1));
        late.start_time = Some("20:00".to_string());
        let mut early = event("early", date(2025, 7, 1), date(2025, 7, 1));
        early.start_time = Some("09:30".to_string());

        let ranked = rank(
            vec![dateless, late, early],
            SortMode::Chronological,
            today,
            false,
            0,
            now(),
            &EngineSettings::default(),
        );
        assert_eq!(ids(&ranked), vec!["early", "late", "dateless"]);
    }

    #[test]
    fn shuffle_is_reproducible_per_seed() {
        let today = date(2025, 6, 14);
        let matched: Vec<Event> = (0..20)
            .map(|i| event(&format!("e{}", i), date(2025, 7, 1), date(2025, 7, 2)))
            .collect();
        let first = rank(
            matched.clone(),
            SortMode::Shuffle,
            today,
            false,
            24_301,
            now(),
            &EngineSettings::default(),
        );
        let second = rank(
            matched,
            SortMode::Shuffle,
            today,
            false,
            24_301,
            now(),
            &EngineSettings::default(),
        );
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn recently_created_events_lead_the_shuffle_newest_first() {
        let today = date(2025, 6, 14);
        let mut fresh = event("fresh", date(2025, 7, 1), date(2025, 7, 2));
        fresh.created_at = Some(now() - Duration::hours(2));
        let mut fresher = event("fresher", date(2025, 7, 1), date(2025, 7, 2));
        fresher.created_at = Some(now() - Duration::hours(1));
        let mut stale = event("stale", date(2025, 7, 1), date(2025, 7, 2));
        stale.created_at = Some(now() - Duration::hours(100));

        let mut matched = vec![stale, fresh, fresher];
        matched.extend((0..5).map(|i| event(&format!("e{}", i), date(2025, 7, 1), date(2025, 7, 2))));

        let ranked = rank(
            matched,
            SortMode::Shuffle,
            today,
            false,
            1,
            now(),
            &EngineSettings::default(),
        );
        assert_eq!(&ids(&ranked)[..2], &["fresher", "fresh"]);
    }

    #[test]
    fn lexical_ordering_ignores_case() {
        let today = date(2025, 6, 14);
        let mut banana = event("banana", date(2025, 7, 1), date(2025, 7, 1));
        banana.title = "banana night".to_string();
        let mut apple = event("apple", date(2025, 7, 1), date(2025, 7, 1));
        apple.title = "Apple Social".to_string();

        let ranked = rank(
            vec![banana, apple],
            SortMode::Lexical,
            today,
            false,
            0,
            now(),
            &EngineSettings::default(),
        );
        assert_eq!(ids(&ranked), vec!["apple", "banana"]);
    }
}
