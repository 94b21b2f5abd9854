//! CSV downloads of a faculty's students
//!
//! Deans get a plain `ID` column; vice deans get a running `#` index instead.

use crate::application::faculty_office::faculty_directory;
use crate::application::state::{faculty_of, AppState};
use crate::application::views::Directory;
use crate::domain::*;
use crate::error::{Error, Result};
use serde::Serialize;

/// How the first column of an export is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLabel {
    Id,
    Index,
}

impl RowLabel {
    fn header(self) -> &'static str {
        match self {
            RowLabel::Id => "ID",
            RowLabel::Index => "#",
        }
    }

    fn cell(self, position: usize, student: &Student) -> String {
        match self {
            RowLabel::Id => student.id.to_string(),
            RowLabel::Index => (position + 1).to_string(),
        }
    }
}

/// A rendered CSV attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

impl CsvExport {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

fn render(rows: Vec<Vec<String>>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|_| Error::Internal)
}

fn group_cells(directory: &Directory, student: &Student) -> (String, String) {
    let group = directory.group(student.group_id);
    (
        group.map(|g| g.number.clone()).unwrap_or_default(),
        group
            .and_then(|g| directory.course_year(g))
            .map(|y| y.to_string())
            .unwrap_or_default(),
    )
}

/// Every live student of the caller's faculty, alphabetically.
pub async fn students_csv(state: &AppState, actor: &User, label: RowLabel) -> Result<CsvExport> {
    let faculty_id = faculty_of(actor)?;
    let directory = faculty_directory(state, faculty_id).await?;
    let mut students = state
        .store
        .students(&StudentQuery::in_faculty(faculty_id))
        .await?;
    students.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    let mut rows = vec![
        [
            label.header(),
            "full_name",
            "student_code",
            "group",
            "course",
            "total_nb",
            "region",
            "birth_place",
            "parent_phone",
        ]
        .map(String::from)
        .to_vec(),
    ];
    for (position, student) in students.iter().enumerate() {
        let (group, course) = group_cells(&directory, student);
        rows.push(vec![
            label.cell(position, student),
            student.full_name.clone(),
            student.student_code.clone(),
            group,
            course,
            student.total_absent_hours.to_string(),
            student.region.clone().unwrap_or_default(),
            student.birth_place.clone().unwrap_or_default(),
            student.parent_phone.clone().unwrap_or_default(),
        ]);
    }
    Ok(CsvExport {
        filename: format!("students_{}.csv", state.today()),
        body: render(rows)?,
    })
}

/// Students at or above the absence limit, most hours first.
pub async fn nb_csv(state: &AppState, actor: &User, label: RowLabel) -> Result<CsvExport> {
    let faculty_id = faculty_of(actor)?;
    let directory = faculty_directory(state, faculty_id).await?;
    let query = StudentQuery {
        min_absent_hours: Some(state.nb_limit().await?),
        ..StudentQuery::in_faculty(faculty_id)
    };
    let mut students = state.store.students(&query).await?;
    students.sort_by(|a, b| b.total_absent_hours.cmp(&a.total_absent_hours));

    let mut rows = vec![
        [label.header(), "full_name", "group", "course", "total_nb", "parent_phone"]
            .map(String::from)
            .to_vec(),
    ];
    for (position, student) in students.iter().enumerate() {
        let (group, course) = group_cells(&directory, student);
        rows.push(vec![
            label.cell(position, student),
            student.full_name.clone(),
            group,
            course,
            student.total_absent_hours.to_string(),
            student.parent_phone.clone().unwrap_or_default(),
        ]);
    }
    Ok(CsvExport {
        filename: format!("nb_{}.csv", state.today()),
        body: render(rows)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::state::test_support::*;

    async fn faculty_with_students() -> (AppState, User) {
        let (state, _) = state_on(monday());
        let math = faculty(&state, "Mathematics", "MM").await;
        let dean = user(&state, "dean", UserRole::Dean, Some(math.id)).await;
        let home = group(&state, math.id, "101", 2, None).await;
        student(&state, &home, "Zarina, Karimova", 50).await;
        student(&state, &home, "Aziz", 3).await;
        student(&state, &home, "Bahrom", 36).await;

        let other = faculty(&state, "Physics", "PH").await;
        let elsewhere = group(&state, other.id, "201", 1, None).await;
        student(&state, &elsewhere, "Stranger", 90).await;
        (state, dean)
    }

    #[tokio::test]
    async fn students_export_is_alphabetical_and_scoped() {
        let (state, dean) = faculty_with_students().await;
        let export = students_csv(&state, &dean, RowLabel::Id).await.unwrap();
        assert_eq!(export.filename, "students_2024-09-02.csv");

        let lines: Vec<&str> = export.body.lines().collect();
        assert_eq!(
            lines[0],
            "ID,full_name,student_code,group,course,total_nb,region,birth_place,parent_phone"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains(",Aziz,"));
        assert!(lines[3].contains("\"Zarina, Karimova\""));
        assert!(!export.body.contains("Stranger"));
    }

    #[tokio::test]
    async fn nb_export_lists_only_students_over_the_limit() {
        let (state, dean) = faculty_with_students().await;
        let export = nb_csv(&state, &dean, RowLabel::Index).await.unwrap();
        assert_eq!(export.content_disposition(), "attachment; filename=nb_2024-09-02.csv");

        let lines: Vec<&str> = export.body.lines().collect();
        assert_eq!(lines[0], "#,full_name,group,course,total_nb,parent_phone");
        assert_eq!(lines[1], "1,\"Zarina, Karimova\",101,2,50,+992900000000");
        assert_eq!(lines[2], "2,Bahrom,101,2,36,+992900000000");
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn export_requires_a_faculty() {
        let (state, _) = state_on(monday());
        let dean = user(&state, "lost", UserRole::Dean, None).await;
        assert!(matches!(
            students_csv(&state, &dean, RowLabel::Id).await.unwrap_err(),
            Error::Forbidden(_)
        ));
    }
}
