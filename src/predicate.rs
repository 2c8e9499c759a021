use crate::models::{normalize_tag, Category, CategoryFilter, EngineSettings, Event, FilterSet};
use chrono::{Datelike, NaiveDate};

/// Decides whether a record matches a filter set. Pure conjunction; a
/// malformed record is a silent non-match (logged as a data-quality
/// warning), never an error.
pub fn matches(
    event: &Event,
    filters: &FilterSet,
    today: NaiveDate,
    settings: &EngineSettings,
) -> bool {
    if !matches_category(event.category, filters.category) {
        return false;
    }

    if let Some(wanted) = filters.tag.as_deref() {
        let wanted = normalize_tag(wanted);
        if !wanted.is_empty() {
            match event.tag.as_deref() {
                Some(tag) if normalize_tag(tag) == wanted => {}
                _ => return false,
            }
        }
    }

    // Free text widens the scope: window/weekday constraints are replaced
    // by a +/-N-year range around today, independent of the displayed
    // month.
    if let Some(term) = filters.search_term() {
        if !matches_text(event, term) {
            return false;
        }
        let Some(anchor) = anchor_date(event) else {
            warn_unusable(event);
            return false;
        };
        let span = settings.search_scope_years;
        return (today.year() - span..=today.year() + span).contains(&anchor.year());
    }

    // A hard single-day filter replaces the window/weekday checks.
    if let Some(day) = filters.explicit_day {
        if event.explicit_dates().is_none() && event.range().is_none() {
            warn_unusable(event);
            return false;
        }
        return occurs_on(event, day);
    }

    if let Some(weekday) = filters.weekday {
        if !matches_weekday(event, weekday) {
            return false;
        }
    }

    matches_window(event, filters)
}

fn matches_category(category: Category, filter: CategoryFilter) -> bool {
    match filter {
        CategoryFilter::All => true,
        CategoryFilter::None => false,
        CategoryFilter::Only(wanted) => category == wanted,
    }
}

fn matches_text(event: &Event, term: &str) -> bool {
    let needle = term.to_lowercase();
    let mut haystacks = vec![&event.title, &event.location, &event.organizer];
    if let Some(tag) = &event.tag {
        haystacks.push(tag);
    }
    haystacks
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Whether the event runs on the given calendar day: explicit-date
/// membership when present, inclusive range containment otherwise.
pub fn occurs_on(event: &Event, day: NaiveDate) -> bool {
    if let Some(dates) = event.explicit_dates() {
        return dates.contains(&day);
    }
    match event.range() {
        Some((start, end)) => start <= day && day <= end,
        None => false,
    }
}

fn matches_window(event: &Event, filters: &FilterSet) -> bool {
    let window = filters.window;
    if let Some(dates) = event.explicit_dates() {
        return dates.iter().any(|date| window.contains(*date));
    }
    let Some((start, end)) = event.range() else {
        warn_unusable(event);
        return false;
    };
    let Some((window_start, window_end)) = window.bounds() else {
        return false;
    };
    start <= window_end && end >= window_start
}

fn matches_weekday(event: &Event, weekday: u8) -> bool {
    if let Some(dates) = event.explicit_dates() {
        return dates
            .iter()
            .any(|date| date.weekday().num_days_from_sunday() == u32::from(weekday));
    }
    let Some((start, end)) = event.range() else {
        warn_unusable(event);
        return false;
    };
    // An inclusive span of 6+ days necessarily covers every weekday. The
    // shortcut keeps unbounded ranges from being iterated.
    if (end - start).num_days() >= 6 {
        return true;
    }
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .any(|day| day.weekday().num_days_from_sunday() == u32::from(weekday))
}

fn anchor_date(event: &Event) -> Option<NaiveDate> {
    event
        .start_date
        .or_else(|| event.explicit_dates().and_then(|dates| dates.first().copied()))
}

fn warn_unusable(event: &Event) {
    tracing::warn!(
        event_id = %event.id,
        "record has no usable dates; excluded from date-constrained match"
    );
}
