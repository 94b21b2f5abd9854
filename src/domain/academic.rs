//! Academic calendar records: courses (study years), academic years and
//! numbered teaching weeks.

use crate::domain::identifiers::{AcademicYearId, CourseId, WeekId};
use crate::domain::types::AcademicYearName;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Years of study offered by every faculty.
pub const COURSE_YEARS: std::ops::RangeInclusive<i32> = 1..=4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
}

#[derive(Debug, Clone)]
pub struct NewAcademicYear {
    pub name: AcademicYearName,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
}

impl NewAcademicYear {
    pub fn new(
        name: AcademicYearName,
        start_date: NaiveDate,
        end_date: NaiveDate,
        is_current: bool,
    ) -> Result<Self> {
        if start_date >= end_date {
            return Err(Error::validation(
                "academic year must start before it ends",
            ));
        }
        Ok(Self {
            name,
            start_date,
            end_date,
            is_current,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Week {
    pub id: WeekId,
    pub academic_year_id: AcademicYearId,
    pub week_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
}

#[derive(Debug, Clone)]
pub struct NewWeek {
    pub academic_year_id: AcademicYearId,
    pub week_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
}

impl NewWeek {
    pub fn new(
        academic_year_id: AcademicYearId,
        week_number: i32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        is_current: bool,
    ) -> Result<Self> {
        if week_number < 1 {
            return Err(Error::invalid_input("week_number", "must be positive"));
        }
        if start_date > end_date {
            return Err(Error::validation("week must start before it ends"));
        }
        Ok(Self {
            academic_year_id,
            week_number,
            start_date,
            end_date,
            is_current,
        })
    }
}
