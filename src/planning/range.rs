use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PlanningError;

/// Date window whose start is always strictly before its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<DateRange, PlanningError> {
        if start >= end {
            return Err(PlanningError::InvalidRange { start, end });
        }

        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn set_start(&mut self, start: NaiveDate) -> Result<(), PlanningError> {
        if start >= self.end {
            return Err(PlanningError::InvalidRange { start, end: self.end });
        }

        self.start = start;
        Ok(())
    }

    pub fn set_end(&mut self, end: NaiveDate) -> Result<(), PlanningError> {
        if end <= self.start {
            return Err(PlanningError::InvalidRange { start: self.start, end });
        }

        self.end = end;
        Ok(())
    }

    /// Both ends are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
