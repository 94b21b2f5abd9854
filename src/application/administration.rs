//! System administration
//!
//! Faculties, accounts, the academic calendar and system settings. Every
//! mutation leaves an audit entry.

use crate::application::state::{explicit, non_blank, Ack, AppState};
use crate::domain::audit::actions;
use crate::domain::password::NewPassword;
use crate::domain::types::{
    AcademicYearName, FacultyCode, FacultyName, FullName, SettingKey, Username,
};
use crate::domain::*;
use crate::error::{Error, FieldContext, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};

pub const DEFAULT_AUDIT_LIMIT: usize = 50;
const MAX_AUDIT_LIMIT: usize = 500;
const LISTED_WEEKS: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub total_users: usize,
    pub total_faculties: usize,
    pub total_groups: usize,
    pub total_students: usize,
    pub high_absence_students: usize,
    pub nb_limit: i32,
    pub role_counts: BTreeMap<&'static str, usize>,
}

pub async fn stats(state: &AppState) -> Result<AdminStats> {
    let users = state.store.users(&UserFilter::default()).await?;
    let students = state.store.students(&StudentQuery::default()).await?;
    let nb_limit = state.nb_limit().await?;

    let mut role_counts: BTreeMap<&'static str, usize> =
        UserRole::ALL.iter().map(|r| (r.as_str(), 0)).collect();
    for user in &users {
        *role_counts.entry(user.role.as_str()).or_default() += 1;
    }

    Ok(AdminStats {
        total_users: users.len(),
        total_faculties: state.store.faculties().await?.len(),
        total_groups: state.store.groups(&GroupFilter::default()).await?.len(),
        total_students: students.len(),
        high_absence_students: students.iter().filter(|s| s.is_high_risk(nb_limit)).count(),
        nb_limit,
        role_counts,
    })
}

// ---------------------------------------------------------------------------
// Faculties

#[derive(Debug, Clone, Serialize)]
pub struct PersonRef {
    pub id: UserId,
    pub full_name: String,
    pub username: String,
}

impl From<&User> for PersonRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FacultyRow {
    pub id: FacultyId,
    pub name: String,
    pub code: String,
    pub logo_url: Option<String>,
    pub student_count: usize,
    pub group_count: usize,
    pub dean: Option<PersonRef>,
    pub vice_dean: Option<PersonRef>,
}

pub async fn faculties(state: &AppState) -> Result<Vec<FacultyRow>> {
    let faculties = state.store.faculties().await?;
    let groups = state.store.groups(&GroupFilter::default()).await?;
    let students = state.store.students(&StudentQuery::default()).await?;
    let staff = state
        .store
        .users(&UserFilter {
            roles: vec![UserRole::Dean, UserRole::ViceDean],
            faculty_id: None,
        })
        .await?;

    let faculty_of_group: HashMap<GroupId, FacultyId> =
        groups.iter().map(|g| (g.id, g.faculty_id)).collect();

    Ok(faculties
        .into_iter()
        .map(|faculty| {
            let person = |role: UserRole| {
                staff
                    .iter()
                    .find(|u| u.role == role && u.faculty_id == Some(faculty.id))
                    .map(PersonRef::from)
            };
            FacultyRow {
                student_count: students
                    .iter()
                    .filter(|s| faculty_of_group.get(&s.group_id) == Some(&faculty.id))
                    .count(),
                group_count: groups.iter().filter(|g| g.faculty_id == faculty.id).count(),
                dean: person(UserRole::Dean),
                vice_dean: person(UserRole::ViceDean),
                id: faculty.id,
                name: faculty.name,
                code: faculty.code,
                logo_url: faculty.logo_url,
            }
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacultyForm {
    pub name: String,
    pub code: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacultyUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub logo_url: Option<String>,
}

#[instrument(skip(state, actor, form), fields(actor = %actor.id))]
pub async fn create_faculty(state: &AppState, actor: &User, form: FacultyForm) -> Result<Faculty> {
    let name = FacultyName::try_new(form.name).field("name")?;
    let code = FacultyCode::try_new(form.code).field("code")?;
    if state
        .store
        .faculty_conflicts(name.as_ref(), code.as_ref(), None)
        .await?
    {
        return Err(Error::conflict("a faculty with this name or code already exists"));
    }
    let faculty = state
        .store
        .insert_faculty(NewFaculty {
            name,
            code,
            logo_url: non_blank(form.logo_url),
        })
        .await?;
    state
        .audit(
            NewAuditEntry::new(
                actor.id,
                actions::FACULTY_CREATED,
                "faculties",
                Some(faculty.id.into_inner()),
            )
            .describe(faculty.name.clone()),
        )
        .await;
    Ok(faculty)
}

pub async fn update_faculty(
    state: &AppState,
    actor: &User,
    id: FacultyId,
    update: FacultyUpdate,
) -> Result<Faculty> {
    let mut faculty = state
        .store
        .faculty(id)
        .await?
        .ok_or_else(|| Error::not_found("faculty"))?;
    if let Some(name) = update.name {
        faculty.name = FacultyName::try_new(name).field("name")?.into_inner();
    }
    if let Some(code) = update.code {
        faculty.code = FacultyCode::try_new(code).field("code")?.into_inner();
    }
    if update.logo_url.is_some() {
        faculty.logo_url = non_blank(update.logo_url);
    }
    if state
        .store
        .faculty_conflicts(&faculty.name, &faculty.code, Some(id))
        .await?
    {
        return Err(Error::conflict("a faculty with this name or code already exists"));
    }
    state.store.update_faculty(&faculty).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::FACULTY_UPDATED, "faculties", Some(id.into_inner()))
                .describe(faculty.name.clone()),
        )
        .await;
    Ok(faculty)
}

pub async fn delete_faculty(state: &AppState, actor: &User, id: FacultyId) -> Result<Ack> {
    let mut faculty = state
        .store
        .faculty(id)
        .await?
        .ok_or_else(|| Error::not_found("faculty"))?;
    faculty.is_deleted = true;
    state.store.update_faculty(&faculty).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::FACULTY_DELETED, "faculties", Some(id.into_inner()))
                .describe(faculty.name),
        )
        .await;
    Ok(Ack::OK)
}

// ---------------------------------------------------------------------------
// Accounts

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub faculty_id: Option<FacultyId>,
    pub faculty_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub birth_year: Option<i32>,
    /// Number of the curator's running group
    pub group: Option<String>,
    pub force_password_change: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
    pub faculty_id: Option<FacultyId>,
}

pub async fn users(state: &AppState, params: UserListParams) -> Result<Vec<UserRow>> {
    let filter = UserFilter {
        roles: params
            .role
            .as_deref()
            .and_then(|r| r.parse::<UserRole>().ok())
            .into_iter()
            .collect(),
        faculty_id: params.faculty_id,
    };
    let users = state.store.users(&filter).await?;
    let faculty_names: HashMap<FacultyId, String> = state
        .store
        .faculties()
        .await?
        .into_iter()
        .map(|f| (f.id, f.name))
        .collect();
    let running = state
        .store
        .groups(&GroupFilter::default().running())
        .await?;

    Ok(users
        .into_iter()
        .map(|user| UserRow {
            faculty_name: user.faculty_id.and_then(|id| faculty_names.get(&id).cloned()),
            group: running
                .iter()
                .find(|g| g.curator_id == Some(user.id))
                .map(|g| g.number.clone()),
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            faculty_id: user.faculty_id,
            email: user.email,
            phone: user.phone,
            department: user.department,
            birth_year: user.birth_year,
            force_password_change: user.force_password_change,
            created_at: user.created_at,
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserForm {
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub faculty_id: Option<FacultyId>,
    /// Defaults to the configured default password
    pub password: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub birth_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "explicit")]
    pub faculty_id: Option<Option<FacultyId>>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub birth_year: Option<i32>,
}

async fn check_faculty(state: &AppState, role: UserRole, faculty_id: Option<FacultyId>) -> Result<()> {
    match faculty_id {
        None if role.requires_faculty() => Err(Error::invalid_input(
            "faculty_id",
            format!("a {role} must belong to a faculty"),
        )),
        Some(id) if state.store.faculty(id).await?.is_none() => {
            Err(Error::invalid_input("faculty_id", "faculty does not exist"))
        }
        _ => Ok(()),
    }
}

/// Password for a new or reset account: the given one, or the default.
fn chosen_password(state: &AppState, candidate: Option<String>) -> Result<NewPassword> {
    match non_blank(candidate) {
        Some(password) => NewPassword::parse(&password),
        None => state.default_password(),
    }
}

#[instrument(skip(state, actor, form), fields(actor = %actor.id, username = %form.username))]
pub async fn create_user(state: &AppState, actor: &User, form: UserForm) -> Result<User> {
    let username = Username::try_new(form.username).field("username")?;
    let full_name = FullName::try_new(form.full_name).field("full_name")?;
    check_faculty(state, form.role, form.faculty_id).await?;
    if state.store.username_exists(username.as_ref()).await? {
        return Err(Error::conflict("username is already taken"));
    }
    let password = chosen_password(state, form.password)?;

    let user = state
        .store
        .insert_user(NewUser {
            full_name,
            username,
            password_hash: state.hasher.hash(&password).await?,
            role: form.role,
            faculty_id: form.faculty_id,
            force_password_change: true,
            birth_year: form.birth_year,
            department: non_blank(form.department),
            email: non_blank(form.email),
            phone: non_blank(form.phone),
        })
        .await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::USER_CREATED, "users", Some(user.id.into_inner()))
                .describe(format!("{} ({})", user.full_name, user.role)),
        )
        .await;
    info!(user_id = %user.id, role = %user.role, "account created");
    Ok(user)
}

async fn live_user(state: &AppState, id: UserId) -> Result<User> {
    state
        .store
        .user(id)
        .await?
        .ok_or_else(|| Error::not_found("user"))
}

pub async fn update_user(
    state: &AppState,
    actor: &User,
    id: UserId,
    update: UserUpdate,
) -> Result<User> {
    let mut user = live_user(state, id).await?;
    if let Some(full_name) = update.full_name {
        user.full_name = FullName::try_new(full_name).field("full_name")?.into_inner();
    }
    if let Some(role) = update.role {
        user.role = role;
    }
    if let Some(faculty_id) = update.faculty_id {
        user.faculty_id = faculty_id;
    }
    check_faculty(state, user.role, user.faculty_id).await?;
    if update.email.is_some() {
        user.email = non_blank(update.email);
    }
    if update.phone.is_some() {
        user.phone = non_blank(update.phone);
    }
    if update.department.is_some() {
        user.department = non_blank(update.department);
    }
    if update.birth_year.is_some() {
        user.birth_year = update.birth_year;
    }
    state.store.update_user(&user).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::USER_UPDATED, "users", Some(id.into_inner()))
                .describe(user.full_name.clone()),
        )
        .await;
    Ok(user)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordForm {
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordReset {
    pub ok: bool,
    pub new_password: String,
}

/// Sets a temporary password the owner must change at next sign-in.
pub async fn reset_password(
    state: &AppState,
    actor: &User,
    id: UserId,
    form: ResetPasswordForm,
) -> Result<PasswordReset> {
    let mut user = live_user(state, id).await?;
    let password = chosen_password(state, form.new_password)?;
    user.password_hash = state.hasher.hash(&password).await?;
    user.force_password_change = true;
    user.revoke_sessions();
    state.store.update_user(&user).await?;
    state
        .audit(NewAuditEntry::new(
            actor.id,
            actions::PASSWORD_RESET,
            "users",
            Some(id.into_inner()),
        ))
        .await;
    Ok(PasswordReset {
        ok: true,
        new_password: password.expose().to_string(),
    })
}

pub async fn delete_user(state: &AppState, actor: &User, id: UserId) -> Result<Ack> {
    if id == actor.id {
        return Err(Error::validation("you cannot delete your own account"));
    }
    let mut user = live_user(state, id).await?;
    user.is_deleted = true;
    user.revoke_sessions();
    state.store.update_user(&user).await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::USER_DELETED, "users", Some(id.into_inner()))
                .describe(user.full_name),
        )
        .await;
    Ok(Ack::OK)
}

// ---------------------------------------------------------------------------
// Groups

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupListParams {
    pub faculty_id: Option<FacultyId>,
    pub course_id: Option<CourseId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminGroupRow {
    pub id: GroupId,
    pub number: String,
    pub shift: crate::domain::types::Shift,
    pub course_year: Option<i32>,
    pub faculty_id: FacultyId,
    pub faculty_name: Option<String>,
    pub curator_id: Option<UserId>,
    pub curator_name: Option<String>,
    pub total_students: usize,
    pub is_active: bool,
    pub is_closed: bool,
}

pub async fn groups(state: &AppState, params: GroupListParams) -> Result<Vec<AdminGroupRow>> {
    let groups = state
        .store
        .groups(&GroupFilter {
            faculty_id: params.faculty_id,
            course_id: params.course_id,
            ..GroupFilter::default()
        })
        .await?;
    let courses: HashMap<CourseId, i32> = state
        .store
        .courses()
        .await?
        .into_iter()
        .map(|c| (c.id, c.year))
        .collect();
    let faculties: HashMap<FacultyId, String> = state
        .store
        .faculties()
        .await?
        .into_iter()
        .map(|f| (f.id, f.name))
        .collect();
    let curators: HashMap<UserId, String> = state
        .store
        .users(&UserFilter::role(UserRole::Curator))
        .await?
        .into_iter()
        .map(|u| (u.id, u.full_name))
        .collect();
    let students = state
        .store
        .students(&StudentQuery::in_groups(groups.iter().map(|g| g.id).collect()))
        .await?;

    Ok(groups
        .into_iter()
        .map(|g| AdminGroupRow {
            course_year: courses.get(&g.course_id).copied(),
            faculty_name: faculties.get(&g.faculty_id).cloned(),
            curator_name: g.curator_id.and_then(|id| curators.get(&id).cloned()),
            total_students: students.iter().filter(|s| s.group_id == g.id).count(),
            id: g.id,
            number: g.number,
            shift: g.shift,
            faculty_id: g.faculty_id,
            curator_id: g.curator_id,
            is_active: g.is_active,
            is_closed: g.is_closed,
        })
        .collect())
}

pub async fn courses(state: &AppState) -> Result<Vec<Course>> {
    state.store.courses().await
}

// ---------------------------------------------------------------------------
// Academic calendar

#[derive(Debug, Clone, Deserialize)]
pub struct AcademicYearForm {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
}

pub async fn academic_years(state: &AppState) -> Result<Vec<AcademicYear>> {
    state.store.academic_years().await
}

pub async fn create_academic_year(
    state: &AppState,
    actor: &User,
    form: AcademicYearForm,
) -> Result<AcademicYear> {
    let name = AcademicYearName::try_new(form.name).field("name")?;
    let new = NewAcademicYear::new(name, form.start_date, form.end_date, form.is_current)?;
    let mut year = state.store.insert_academic_year(new).await?;
    if year.is_current {
        state.store.set_current_academic_year(year.id).await?;
        year.is_current = true;
    }
    state
        .audit(
            NewAuditEntry::new(
                actor.id,
                actions::ACADEMIC_YEAR_CREATED,
                "academic_years",
                Some(year.id.into_inner()),
            )
            .describe(year.name.clone()),
        )
        .await;
    Ok(year)
}

pub async fn set_current_academic_year(
    state: &AppState,
    actor: &User,
    id: AcademicYearId,
) -> Result<Ack> {
    if !state.store.set_current_academic_year(id).await? {
        return Err(Error::not_found("academic year"));
    }
    state
        .audit(NewAuditEntry::new(
            actor.id,
            actions::ACADEMIC_YEAR_SET_CURRENT,
            "academic_years",
            Some(id.into_inner()),
        ))
        .await;
    Ok(Ack::OK)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeekForm {
    pub academic_year_id: AcademicYearId,
    pub week_number: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
}

pub async fn weeks(state: &AppState) -> Result<Vec<Week>> {
    state.store.weeks(LISTED_WEEKS).await
}

pub async fn create_week(state: &AppState, actor: &User, form: WeekForm) -> Result<Week> {
    if !state
        .store
        .academic_years()
        .await?
        .iter()
        .any(|y| y.id == form.academic_year_id)
    {
        return Err(Error::invalid_input("academic_year_id", "academic year does not exist"));
    }
    let new = NewWeek::new(
        form.academic_year_id,
        form.week_number,
        form.start_date,
        form.end_date,
        form.is_current,
    )?;
    let week = state.store.insert_week(new).await?;
    if week.is_current {
        state.store.set_current_week(week.id).await?;
    }
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::WEEK_CREATED, "weeks", Some(week.id.into_inner()))
                .describe(format!("week {}", week.week_number)),
        )
        .await;
    Ok(week)
}

pub async fn set_current_week(state: &AppState, actor: &User, id: WeekId) -> Result<Ack> {
    if !state.store.set_current_week(id).await? {
        return Err(Error::not_found("week"));
    }
    state
        .audit(NewAuditEntry::new(
            actor.id,
            actions::WEEK_SET_CURRENT,
            "weeks",
            Some(id.into_inner()),
        ))
        .await;
    Ok(Ack::OK)
}

// ---------------------------------------------------------------------------
// Settings and audit

#[derive(Debug, Clone, Deserialize)]
pub struct SettingForm {
    pub value: String,
    pub description: Option<String>,
}

pub async fn settings(state: &AppState) -> Result<Vec<SystemSetting>> {
    state.store.settings().await
}

pub async fn update_setting(
    state: &AppState,
    actor: &User,
    key: &str,
    form: SettingForm,
) -> Result<SystemSetting> {
    let key = SettingKey::try_new(key.to_string()).field("key")?;
    let value = form.value.trim();
    if value.is_empty() {
        return Err(Error::invalid_input("value", "must not be empty"));
    }
    let description = non_blank(form.description);
    let setting = state
        .store
        .upsert_setting(key.as_ref(), value, description.as_deref())
        .await?;
    state
        .audit(
            NewAuditEntry::new(actor.id, actions::SETTING_UPDATED, "system_settings", None)
                .describe(format!("{} = {}", setting.key, setting.value)),
        )
        .await;
    Ok(setting)
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRow {
    pub id: AuditEntryId,
    pub user_id: Option<UserId>,
    pub user_name: String,
    pub action: String,
    pub object_type: String,
    pub target_id: Option<i64>,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<AuditEntry> for AuditRow {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            user_name: entry.actor_name.unwrap_or_else(|| "System".to_string()),
            action: entry.action,
            object_type: entry.target_table,
            target_id: entry.target_id,
            details: entry.description,
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditParams {
    pub limit: Option<usize>,
}

pub async fn audit_log(state: &AppState, params: AuditParams) -> Result<Vec<AuditRow>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);
    let entries = state.store.audit_log(&AuditQuery::latest(limit)).await?;
    Ok(entries.into_iter().map(AuditRow::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::state::test_support::*;
    use crate::infrastructure::UniversityStore;

    async fn admin(state: &AppState) -> User {
        user(state, "admin", UserRole::Admin, None).await
    }

    fn faculty_form(name: &str, code: &str) -> FacultyForm {
        FacultyForm {
            name: name.to_string(),
            code: code.to_string(),
            logo_url: None,
        }
    }

    fn user_form(username: &str, role: UserRole, faculty_id: Option<FacultyId>) -> UserForm {
        UserForm {
            username: username.to_string(),
            full_name: format!("{username} person"),
            role,
            faculty_id,
            password: None,
            email: None,
            phone: None,
            department: None,
            birth_year: None,
        }
    }

    #[tokio::test]
    async fn faculty_codes_are_upper_cased_and_unique() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        let created = create_faculty(&state, &admin, faculty_form("Physics", "ph"))
            .await
            .unwrap();
        assert_eq!(created.code, "PH");

        let err = create_faculty(&state, &admin, faculty_form("Other", "PH"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let err = create_faculty(&state, &admin, faculty_form("Physics", "XX"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn deleted_faculty_disappears_from_listing() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        let physics = create_faculty(&state, &admin, faculty_form("Physics", "PH"))
            .await
            .unwrap();
        delete_faculty(&state, &admin, physics.id).await.unwrap();
        assert!(faculties(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_faculty_keeps_its_name_and_code_reserved() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        let dup = create_faculty(&state, &admin, faculty_form("Dup", "dup"))
            .await
            .unwrap();
        delete_faculty(&state, &admin, dup.id).await.unwrap();

        let err = create_faculty(&state, &admin, faculty_form("Dup", "dup"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let err = create_faculty(&state, &admin, faculty_form("Another", "DUP"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn faculty_rows_count_students_and_name_the_dean() {
        let (state, _) = state_on(monday());
        let math = faculty(&state, "Mathematics", "MM").await;
        user(&state, "dean", UserRole::Dean, Some(math.id)).await;
        let g = group(&state, math.id, "101", 1, None).await;
        student(&state, &g, "Ali", 0).await;
        student(&state, &g, "Vali", 0).await;

        let rows = faculties(&state).await.unwrap();
        assert_eq!(rows[0].student_count, 2);
        assert_eq!(rows[0].group_count, 1);
        assert_eq!(rows[0].dean.as_ref().unwrap().username, "dean");
        assert!(rows[0].vice_dean.is_none());
    }

    #[tokio::test]
    async fn new_accounts_must_change_the_default_password() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        let math = faculty(&state, "Mathematics", "MM").await;
        let dean = create_user(&state, &admin, user_form("dean", UserRole::Dean, Some(math.id)))
            .await
            .unwrap();
        assert!(dean.force_password_change);
        assert!(state.hasher.verify("020304", &dean.password_hash).await);
    }

    #[tokio::test]
    async fn deans_need_a_faculty() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        let err = create_user(&state, &admin, user_form("dean", UserRole::Dean, None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn duplicate_and_weak_passwords_are_refused() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        let err = create_user(&state, &admin, user_form("admin", UserRole::Rector, None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let mut form = user_form("rector", UserRole::Rector, None);
        form.password = Some("000000".to_string());
        let err = create_user(&state, &admin, form).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn deleting_yourself_is_refused() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        let err = delete_user(&state, &admin, admin.id).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn deleted_accounts_lose_their_sessions() {
        let (state, store) = state_on(monday());
        let admin = admin(&state).await;
        let rector = user(&state, "rector", UserRole::Rector, None).await;
        delete_user(&state, &admin, rector.id).await.unwrap();
        assert!(store.user(rector.id).await.unwrap().is_none());
        assert!(store.username_exists("rector").await.unwrap());
    }

    #[tokio::test]
    async fn reset_forces_a_change_and_bumps_the_token_version() {
        let (state, store) = state_on(monday());
        let admin = admin(&state).await;
        let rector = user(&state, "rector", UserRole::Rector, None).await;

        let reset = reset_password(&state, &admin, rector.id, ResetPasswordForm::default())
            .await
            .unwrap();

        assert_eq!(reset.new_password, "020304");
        let stored = store.user(rector.id).await.unwrap().unwrap();
        assert!(stored.force_password_change);
        assert_eq!(stored.token_version, rector.token_version + 1);
    }

    #[tokio::test]
    async fn unknown_role_filter_is_ignored() {
        let (state, _) = state_on(monday());
        admin(&state).await;
        user(&state, "rector", UserRole::Rector, None).await;
        let rows = users(
            &state,
            UserListParams {
                role: Some("wizard".to_string()),
                faculty_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn curator_rows_show_their_group() {
        let (state, _) = state_on(monday());
        let math = faculty(&state, "Mathematics", "MM").await;
        let curator = user(&state, "cur", UserRole::Curator, Some(math.id)).await;
        group(&state, math.id, "101", 1, Some(curator.id)).await;
        let rows = users(
            &state,
            UserListParams {
                role: Some("curator".to_string()),
                faculty_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(rows[0].group.as_deref(), Some("101"));
        assert_eq!(rows[0].faculty_name.as_deref(), Some("Mathematics"));
    }

    #[tokio::test]
    async fn only_one_academic_year_is_current() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        let first = create_academic_year(
            &state,
            &admin,
            AcademicYearForm {
                name: "2023-2024".to_string(),
                start_date: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
                is_current: true,
            },
        )
        .await
        .unwrap();
        let second = create_academic_year(
            &state,
            &admin,
            AcademicYearForm {
                name: "2024-2025".to_string(),
                start_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
                is_current: false,
            },
        )
        .await
        .unwrap();

        set_current_academic_year(&state, &admin, second.id).await.unwrap();

        let years = academic_years(&state).await.unwrap();
        let current: Vec<_> = years.iter().filter(|y| y.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, second.id);
        assert_eq!(years[0].id, second.id);
        assert_ne!(first.id, second.id);

        let err = set_current_academic_year(&state, &admin, AcademicYearId::new(999))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn settings_upsert_and_feed_the_nb_limit() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        update_setting(
            &state,
            &admin,
            "NB_LIMIT_HIGH",
            SettingForm {
                value: "40".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(state.nb_limit().await.unwrap(), 40);
    }

    #[tokio::test]
    async fn audit_log_names_the_actor() {
        let (state, _) = state_on(monday());
        let admin = admin(&state).await;
        create_faculty(&state, &admin, faculty_form("Physics", "PH"))
            .await
            .unwrap();
        let rows = audit_log(&state, AuditParams::default()).await.unwrap();
        assert_eq!(rows[0].action, actions::FACULTY_CREATED);
        assert_eq!(rows[0].user_name, "admin full");
    }

    #[tokio::test]
    async fn stats_count_high_absence_students() {
        let (state, _) = state_on(monday());
        admin(&state).await;
        let math = faculty(&state, "Mathematics", "MM").await;
        let g = group(&state, math.id, "101", 1, None).await;
        student(&state, &g, "Ali", 40).await;
        student(&state, &g, "Vali", 3).await;
        let stats = stats(&state).await.unwrap();
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.high_absence_students, 1);
        assert_eq!(stats.nb_limit, 35);
        assert_eq!(stats.role_counts["admin"], 1);
        assert_eq!(stats.role_counts["curator"], 0);
    }
}
