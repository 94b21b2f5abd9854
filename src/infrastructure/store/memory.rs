//! In-memory store used by tests and local demos

use super::UniversityStore;
use crate::domain::student::generated_student_code;
use crate::domain::*;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct Sequences {
    user: i64,
    faculty: i64,
    course: i64,
    academic_year: i64,
    week: i64,
    group: i64,
    student: i64,
    lesson: i64,
    attendance: i64,
    audit: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    seq: Sequences,
    users: BTreeMap<UserId, User>,
    faculties: BTreeMap<FacultyId, Faculty>,
    courses: BTreeMap<CourseId, Course>,
    academic_years: BTreeMap<AcademicYearId, AcademicYear>,
    weeks: BTreeMap<WeekId, Week>,
    groups: BTreeMap<GroupId, Group>,
    students: BTreeMap<StudentId, Student>,
    lessons: BTreeMap<LessonId, Lesson>,
    attendance: BTreeMap<AttendanceId, Attendance>,
    settings: BTreeMap<String, SystemSetting>,
    audit: Vec<AuditEntry>,
    logins: Vec<NewLoginRecord>,
}

impl Tables {
    fn lesson_for(&mut self, group_id: GroupId, date: NaiveDate) -> Lesson {
        if let Some(lesson) = self
            .lessons
            .values()
            .find(|l| l.group_id == group_id && l.lesson_date == date)
        {
            return lesson.clone();
        }
        let lesson = Lesson {
            id: LessonId::new(next(&mut self.seq.lesson)),
            group_id,
            lesson_date: date,
            subject: attendance::DEFAULT_LESSON_SUBJECT.to_string(),
            lesson_type: attendance::DEFAULT_LESSON_TYPE.to_string(),
        };
        self.lessons.insert(lesson.id, lesson.clone());
        lesson
    }

    fn absent_hours(&self, student_id: StudentId) -> i32 {
        self.attendance
            .values()
            .filter(|a| a.student_id == student_id && a.is_absent())
            .map(|a| a.nb_hours)
            .sum()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sign-in attempt recorded so far, oldest first.
    pub fn login_records(&self) -> Vec<NewLoginRecord> {
        self.tables.read().logins.clone()
    }
}

#[async_trait]
impl UniversityStore for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .get(&id)
            .filter(|u| !u.is_deleted)
            .cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| !u.is_deleted && u.username == username)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .any(|u| u.username == username))
    }

    async fn users(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let tables = self.tables.read();
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write();
        if tables
            .users
            .values()
            .any(|u| u.username == user.username.as_ref())
        {
            return Err(Error::conflict("username is already taken"));
        }
        let user = User {
            id: UserId::new(next(&mut tables.seq.user)),
            full_name: user.full_name.into_inner(),
            username: user.username.into_inner(),
            password_hash: user.password_hash,
            role: user.role,
            faculty_id: user.faculty_id,
            token_version: 1,
            force_password_change: user.force_password_change,
            birth_year: user.birth_year,
            department: user.department,
            email: user.email,
            phone: user.phone,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write();
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| Error::not_found("user"))?;
        *stored = User {
            updated_at: Some(Utc::now()),
            ..user.clone()
        };
        Ok(())
    }

    async fn record_login(&self, record: NewLoginRecord) -> Result<()> {
        self.tables.write().logins.push(record);
        Ok(())
    }

    async fn faculties(&self) -> Result<Vec<Faculty>> {
        let tables = self.tables.read();
        let mut faculties: Vec<Faculty> = tables
            .faculties
            .values()
            .filter(|f| !f.is_deleted)
            .cloned()
            .collect();
        faculties.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(faculties)
    }

    async fn faculty(&self, id: FacultyId) -> Result<Option<Faculty>> {
        Ok(self
            .tables
            .read()
            .faculties
            .get(&id)
            .filter(|f| !f.is_deleted)
            .cloned())
    }

    async fn faculty_conflicts(
        &self,
        name: &str,
        code: &str,
        except: Option<FacultyId>,
    ) -> Result<bool> {
        Ok(self.tables.read().faculties.values().any(|f| {
            Some(f.id) != except && (f.name == name || f.code == code)
        }))
    }

    async fn insert_faculty(&self, faculty: NewFaculty) -> Result<Faculty> {
        let mut tables = self.tables.write();
        let faculty = Faculty {
            id: FacultyId::new(next(&mut tables.seq.faculty)),
            name: faculty.name.into_inner(),
            code: faculty.code.into_inner(),
            logo_url: faculty.logo_url,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.faculties.insert(faculty.id, faculty.clone());
        Ok(faculty)
    }

    async fn update_faculty(&self, faculty: &Faculty) -> Result<()> {
        let mut tables = self.tables.write();
        let stored = tables
            .faculties
            .get_mut(&faculty.id)
            .ok_or_else(|| Error::not_found("faculty"))?;
        *stored = Faculty {
            updated_at: Some(Utc::now()),
            ..faculty.clone()
        };
        Ok(())
    }

    async fn courses(&self) -> Result<Vec<Course>> {
        let mut courses: Vec<Course> = self.tables.read().courses.values().copied().collect();
        courses.sort_by_key(|c| c.year);
        Ok(courses)
    }

    async fn ensure_course(&self, year: i32) -> Result<Course> {
        let mut tables = self.tables.write();
        if let Some(course) = tables.courses.values().find(|c| c.year == year) {
            return Ok(*course);
        }
        let course = Course {
            id: CourseId::new(next(&mut tables.seq.course)),
            year,
        };
        tables.courses.insert(course.id, course);
        Ok(course)
    }

    async fn academic_years(&self) -> Result<Vec<AcademicYear>> {
        let mut years: Vec<AcademicYear> =
            self.tables.read().academic_years.values().cloned().collect();
        years.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(years)
    }

    async fn insert_academic_year(&self, year: NewAcademicYear) -> Result<AcademicYear> {
        let mut tables = self.tables.write();
        if tables
            .academic_years
            .values()
            .any(|y| y.name == year.name.as_ref())
        {
            return Err(Error::conflict("academic year already exists"));
        }
        if year.is_current {
            tables
                .academic_years
                .values_mut()
                .for_each(|y| y.is_current = false);
        }
        let year = AcademicYear {
            id: AcademicYearId::new(next(&mut tables.seq.academic_year)),
            name: year.name.into_inner(),
            start_date: year.start_date,
            end_date: year.end_date,
            is_current: year.is_current,
        };
        tables.academic_years.insert(year.id, year.clone());
        Ok(year)
    }

    async fn set_current_academic_year(&self, id: AcademicYearId) -> Result<bool> {
        let mut tables = self.tables.write();
        if !tables.academic_years.contains_key(&id) {
            return Ok(false);
        }
        tables
            .academic_years
            .values_mut()
            .for_each(|y| y.is_current = y.id == id);
        Ok(true)
    }

    async fn weeks(&self, limit: usize) -> Result<Vec<Week>> {
        let mut weeks: Vec<Week> = self.tables.read().weeks.values().cloned().collect();
        weeks.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        weeks.truncate(limit);
        Ok(weeks)
    }

    async fn insert_week(&self, week: NewWeek) -> Result<Week> {
        let mut tables = self.tables.write();
        if !tables.academic_years.contains_key(&week.academic_year_id) {
            return Err(Error::not_found("academic year"));
        }
        if tables.weeks.values().any(|w| {
            w.academic_year_id == week.academic_year_id && w.week_number == week.week_number
        }) {
            return Err(Error::conflict("week number already exists for this year"));
        }
        if week.is_current {
            tables.weeks.values_mut().for_each(|w| w.is_current = false);
        }
        let week = Week {
            id: WeekId::new(next(&mut tables.seq.week)),
            academic_year_id: week.academic_year_id,
            week_number: week.week_number,
            start_date: week.start_date,
            end_date: week.end_date,
            is_current: week.is_current,
        };
        tables.weeks.insert(week.id, week.clone());
        Ok(week)
    }

    async fn set_current_week(&self, id: WeekId) -> Result<bool> {
        let mut tables = self.tables.write();
        if !tables.weeks.contains_key(&id) {
            return Ok(false);
        }
        tables
            .weeks
            .values_mut()
            .for_each(|w| w.is_current = w.id == id);
        Ok(true)
    }

    async fn groups(&self, filter: &GroupFilter) -> Result<Vec<Group>> {
        let tables = self.tables.read();
        let mut groups: Vec<Group> = tables
            .groups
            .values()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.number.cmp(&b.number).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn group(&self, id: GroupId) -> Result<Option<Group>> {
        Ok(self
            .tables
            .read()
            .groups
            .get(&id)
            .filter(|g| !g.is_deleted)
            .cloned())
    }

    async fn insert_group(&self, group: NewGroup) -> Result<Group> {
        let mut tables = self.tables.write();
        let group = Group {
            id: GroupId::new(next(&mut tables.seq.group)),
            number: group.number.into_inner(),
            shift: group.shift,
            course_id: group.course_id,
            academic_year_id: group.academic_year_id,
            faculty_id: group.faculty_id,
            curator_id: group.curator_id,
            is_active: true,
            is_closed: false,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, group: &Group) -> Result<()> {
        let mut tables = self.tables.write();
        let stored = tables
            .groups
            .get_mut(&group.id)
            .ok_or_else(|| Error::not_found("group"))?;
        *stored = Group {
            updated_at: Some(Utc::now()),
            ..group.clone()
        };
        Ok(())
    }

    async fn students(&self, query: &StudentQuery) -> Result<Vec<Student>> {
        let tables = self.tables.read();
        let mut students: Vec<Student> = tables
            .students
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        students.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(students)
    }

    async fn student(&self, id: StudentId) -> Result<Option<Student>> {
        Ok(self
            .tables
            .read()
            .students
            .get(&id)
            .filter(|s| !s.is_deleted)
            .cloned())
    }

    async fn insert_student(&self, student: NewStudent) -> Result<Student> {
        let mut tables = self.tables.write();
        if let Some(code) = &student.student_code {
            if tables
                .students
                .values()
                .any(|s| s.student_code == code.as_ref())
            {
                return Err(Error::conflict("student code is already in use"));
            }
        }
        let id = StudentId::new(next(&mut tables.seq.student));
        let student = Student {
            id,
            student_code: student
                .student_code
                .map(|code| code.into_inner())
                .unwrap_or_else(|| generated_student_code(id)),
            full_name: student.full_name.into_inner(),
            faculty_id: student.faculty_id,
            group_id: student.group_id,
            birth_year: student.birth_year,
            birth_place: student.birth_place,
            region: student.region,
            parent_phone: student.parent_phone,
            study_start: student.study_start,
            expected_graduation: student.expected_graduation,
            total_absent_hours: student.total_absent_hours,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn update_student(&self, student: &Student) -> Result<()> {
        let mut tables = self.tables.write();
        if tables
            .students
            .values()
            .any(|s| s.id != student.id && s.student_code == student.student_code)
        {
            return Err(Error::conflict("student code is already in use"));
        }
        let stored = tables
            .students
            .get_mut(&student.id)
            .ok_or_else(|| Error::not_found("student"))?;
        *stored = Student {
            updated_at: Some(Utc::now()),
            ..student.clone()
        };
        Ok(())
    }

    async fn lessons(
        &self,
        group_ids: &[GroupId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Lesson>> {
        let tables = self.tables.read();
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .values()
            .filter(|l| {
                group_ids.contains(&l.group_id) && l.lesson_date >= from && l.lesson_date <= to
            })
            .cloned()
            .collect();
        lessons.sort_by_key(|l| (l.lesson_date, l.group_id));
        Ok(lessons)
    }

    async fn attendance(&self, query: &AttendanceQuery) -> Result<Vec<Attendance>> {
        let tables = self.tables.read();
        let mut records: Vec<Attendance> = tables
            .attendance
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.lesson_date.cmp(&a.lesson_date).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn attendance_record(&self, id: AttendanceId) -> Result<Option<Attendance>> {
        Ok(self.tables.read().attendance.get(&id).cloned())
    }

    async fn apply_attendance(&self, batch: AttendanceBatch) -> Result<usize> {
        let mut guard = self.tables.write();
        let tables = &mut *guard;
        let mut touched = BTreeSet::new();
        for mark in &batch.marks {
            let lesson = tables.lesson_for(batch.group_id, mark.date);
            let hours = mark.nb_hours.into_inner();
            let now = Utc::now();
            let existing = tables
                .attendance
                .values_mut()
                .find(|a| a.lesson_id == lesson.id && a.student_id == mark.student_id);
            match existing {
                Some(record) => {
                    record.nb_hours = hours;
                    record.status = AttendanceStatus::from_hours(hours);
                    record.comment = mark.comment.clone();
                    record.marked_by = Some(batch.marked_by);
                    record.updated_at = Some(now);
                }
                None => {
                    let record = Attendance {
                        id: AttendanceId::new(next(&mut tables.seq.attendance)),
                        student_id: mark.student_id,
                        lesson_id: lesson.id,
                        group_id: lesson.group_id,
                        lesson_date: lesson.lesson_date,
                        status: AttendanceStatus::from_hours(hours),
                        nb_hours: hours,
                        comment: mark.comment.clone(),
                        is_reasoned: false,
                        reason_text: None,
                        reasoned_by: None,
                        marked_by: Some(batch.marked_by),
                        created_at: now,
                        updated_at: None,
                    };
                    tables.attendance.insert(record.id, record);
                }
            }
            touched.insert(mark.student_id);
        }
        for student_id in touched {
            let total = tables.absent_hours(student_id);
            if let Some(student) = tables.students.get_mut(&student_id) {
                student.total_absent_hours = total;
            }
        }
        Ok(batch.marks.len())
    }

    async fn justify_attendance(
        &self,
        id: AttendanceId,
        justification: Justification,
    ) -> Result<bool> {
        let mut tables = self.tables.write();
        let Some(record) = tables.attendance.get_mut(&id) else {
            return Ok(false);
        };
        record.is_reasoned = justification.is_reasoned;
        record.reason_text = justification.reason_text;
        record.reasoned_by = Some(justification.reasoned_by);
        record.updated_at = Some(Utc::now());
        Ok(true)
    }

    async fn recalculate_absent_hours(&self, students: Option<&[StudentId]>) -> Result<u64> {
        let mut tables = self.tables.write();
        let ids: Vec<StudentId> = tables
            .students
            .values()
            .filter(|s| !s.is_deleted && students.is_none_or(|ids| ids.contains(&s.id)))
            .map(|s| s.id)
            .collect();
        for id in &ids {
            let total = tables.absent_hours(*id);
            if let Some(student) = tables.students.get_mut(id) {
                student.total_absent_hours = total;
            }
        }
        Ok(ids.len() as u64)
    }

    async fn settings(&self) -> Result<Vec<SystemSetting>> {
        Ok(self.tables.read().settings.values().cloned().collect())
    }

    async fn setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .tables
            .read()
            .settings
            .get(key)
            .map(|s| s.value.clone()))
    }

    async fn upsert_setting(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<SystemSetting> {
        let mut tables = self.tables.write();
        let setting = tables
            .settings
            .entry(key.to_string())
            .or_insert_with(|| SystemSetting {
                key: key.to_string(),
                value: String::new(),
                description: None,
            });
        setting.value = value.to_string();
        if let Some(description) = description {
            setting.description = Some(description.to_string());
        }
        Ok(setting.clone())
    }

    async fn insert_setting_if_absent(
        &self,
        key: &str,
        value: &str,
        description: &str,
    ) -> Result<()> {
        self.tables
            .write()
            .settings
            .entry(key.to_string())
            .or_insert_with(|| SystemSetting {
                key: key.to_string(),
                value: value.to_string(),
                description: Some(description.to_string()),
            });
        Ok(())
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> Result<()> {
        let mut tables = self.tables.write();
        let actor_name = entry
            .user_id
            .and_then(|id| tables.users.get(&id))
            .map(|u| u.full_name.clone());
        let entry = AuditEntry {
            id: AuditEntryId::new(next(&mut tables.seq.audit)),
            user_id: entry.user_id,
            actor_name,
            action: entry.action.to_string(),
            target_table: entry.target_table.to_string(),
            target_id: entry.target_id,
            description: entry.description,
            timestamp: Utc::now(),
        };
        tables.audit.push(entry);
        Ok(())
    }

    async fn audit_log(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        Ok(self
            .tables
            .read()
            .audit
            .iter()
            .rev()
            .filter(|e| query.matches(e))
            .take(query.limit)
            .cloned()
            .collect())
    }
}
