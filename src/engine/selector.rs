//! Weekday → economic-calendar view.

use anyhow::Result;
use chrono::Weekday;
use std::collections::HashMap;

use crate::config::{parse_weekday, CalendarConfig};
use crate::types::CalendarView;

/// Picks the calendar view for econ jobs that do not pin one.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSelector {
    default: CalendarView,
    by_day: HashMap<Weekday, CalendarView>,
}

impl Default for ViewSelector {
    /// Sunday previews the week ahead; every other day shows today.
    fn default() -> Self {
        Self {
            default: CalendarView::Today,
            by_day: HashMap::from([(Weekday::Sun, CalendarView::ThisWeek)]),
        }
    }
}

impl ViewSelector {
    pub fn new(default: CalendarView, by_day: HashMap<Weekday, CalendarView>) -> Self {
        Self { default, by_day }
    }

    pub fn from_config(cfg: &CalendarConfig) -> Result<Self> {
        let by_day = cfg
            .views
            .iter()
            .map(|(day, view)| Ok((parse_weekday(day)?, *view)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self::new(cfg.default_view, by_day))
    }

    pub fn view_for(&self, day: Weekday) -> CalendarView {
        self.by_day.get(&day).copied().unwrap_or(self.default)
    }
}
