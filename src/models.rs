use crate::errors::{EngineError, EngineResult};
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Class,
    Social,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Social => "social",
        }
    }
}

/// `All` matches every record, `None` matches nothing (forces an empty
/// result set), `Only` requires an exact category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryFilter {
    #[default]
    All,
    None,
    Only(Category),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    Shuffle,
    Chronological,
    Lexical,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shuffle => "shuffle",
            Self::Chronological => "chronological",
            Self::Lexical => "lexical",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub organizer: String,
    pub tag: Option<String>,
    pub category: Category,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// When present (non-empty), overrides the continuous range for
    /// matching and recurrence.
    pub explicit_dates: Option<Vec<NaiveDate>>,
    /// Time of day, "HH:MM". Chronological tiebreaker only.
    pub start_time: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn explicit_dates(&self) -> Option<&[NaiveDate]> {
        match &self.explicit_dates {
            Some(dates) if !dates.is_empty() => Some(dates.as_slice()),
            _ => None,
        }
    }

    /// Inclusive continuous range; a missing end date collapses to a
    /// single-day range at the start date.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.start_date?;
        Some((start, self.end_date.unwrap_or(start)))
    }

    /// Last day the event runs, used for the ongoing/ended partition.
    pub fn effective_end(&self) -> Option<NaiveDate> {
        self.end_date.or(self.start_date)
    }
}

/// Year or year+month scope a query is evaluated against.
/// `month == None` means year scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub year: i32,
    pub month: Option<u32>,
}

impl Window {
    pub fn is_year_scope(self) -> bool {
        self.month.is_none()
    }

    pub fn validate(self) -> EngineResult<()> {
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(EngineError::InvalidWindow(format!(
                    "month {} is outside 1-12",
                    month
                )));
            }
        }
        if self.bounds().is_none() {
            return Err(EngineError::InvalidWindow(format!(
                "year {} is not a valid calendar year",
                self.year
            )));
        }
        Ok(())
    }

    /// Inclusive first/last day of the window.
    pub fn bounds(self) -> Option<(NaiveDate, NaiveDate)> {
        match self.month {
            Some(month) => {
                let first = NaiveDate::from_ymd_opt(self.year, month, 1)?;
                let next = if month == 12 {
                    NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(self.year, month + 1, 1)?
                };
                Some((first, next.checked_sub_days(Days::new(1))?))
            }
            None => {
                let first = NaiveDate::from_ymd_opt(self.year, 1, 1)?;
                let last = NaiveDate::from_ymd_opt(self.year, 12, 31)?;
                Some((first, last))
            }
        }
    }

    pub fn contains(self, day: NaiveDate) -> bool {
        match self.month {
            Some(month) => day.year() == self.year && day.month() == month,
            None => day.year() == self.year,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    #[serde(default)]
    pub category: CategoryFilter,
    pub tag: Option<String>,
    pub search_text: Option<String>,
    /// Hard filter on a single calendar day; window/weekday checks are
    /// skipped when set.
    pub explicit_day: Option<NaiveDate>,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekday: Option<u8>,
    pub window: Window,
}

impl FilterSet {
    pub fn search_term(&self) -> Option<&str> {
        match self.search_text.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => Some(term),
            _ => None,
        }
    }
}

pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Memoization key for the result cache. `search_text` and `selected_day`
/// are deliberately absent: search bypasses the cache and the selected-day
/// reorder is an uncached pass over an already-ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DimensionKey {
    pub window_year: i32,
    pub window_month: Option<u32>,
    pub category: CategoryFilter,
    pub tag: Option<String>,
    pub weekday: Option<u8>,
    pub sort: SortMode,
}

impl DimensionKey {
    pub fn new(filters: &FilterSet, sort: SortMode) -> Self {
        Self {
            window_year: filters.window.year,
            window_month: filters.window.month,
            category: filters.category,
            tag: filters.tag.as_deref().map(normalize_tag),
            weekday: filters.weekday,
            sort,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub ordered_ids: Vec<String>,
    pub epoch: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub filters: FilterSet,
    pub sort: SortMode,
    /// Bring events occurring on this day to the front, preserving order
    /// within both groups.
    pub selected_day: Option<NaiveDate>,
    /// Defaults to the current local calendar day when omitted.
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub events: Vec<Event>,
    pub cache_hit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    /// Shuffle seed used for year-scope windows, where there is no
    /// year*12+month identity to derive one from.
    pub year_scope_seed: i64,
    /// Free-text search widens the window to today +/- this many years.
    pub search_scope_years: i32,
    /// Events created within this window are promoted ahead of the
    /// shuffled remainder, newest first.
    pub promotion_window_hours: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            year_scope_seed: 999_983,
            search_scope_years: 1,
            promotion_window_hours: 72,
        }
    }
}
