//! Own-profile view and edits, shared by every role

use crate::application::state::{non_blank, AppState};
use crate::domain::audit::actions;
use crate::domain::types::FullName;
use crate::domain::{GroupFilter, NewAuditEntry, User, UserFilter, UserId, UserRole};
use crate::error::{FieldContext, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: UserId,
    pub full_name: String,
    pub username: String,
    pub role: UserRole,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub birth_year: Option<i32>,
    pub faculty: Option<String>,
    pub group_number: Option<String>,
    pub force_password_change: bool,
}

/// Absent fields stay untouched; empty contact fields are cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub birth_year: Option<i32>,
}

impl ProfileUpdate {
    pub fn apply_to(self, user: &mut User) -> Result<()> {
        if let Some(full_name) = non_blank(self.full_name) {
            user.full_name = FullName::try_new(full_name).field("full_name")?.into_inner();
        }
        if self.email.is_some() {
            user.email = non_blank(self.email);
        }
        if self.phone.is_some() {
            user.phone = non_blank(self.phone);
        }
        if self.department.is_some() {
            user.department = non_blank(self.department);
        }
        if self.birth_year.is_some() {
            user.birth_year = self.birth_year;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSaved {
    pub ok: bool,
    pub id: UserId,
    pub full_name: String,
}

pub async fn profile(state: &AppState, user: &User) -> Result<ProfileView> {
    let faculty = match user.faculty_id {
        Some(id) => state.store.faculty(id).await?.map(|f| f.name),
        None => None,
    };
    let group_number = if user.role == UserRole::Curator {
        let filter = GroupFilter {
            curator_id: Some(user.id),
            ..GroupFilter::default()
        };
        state
            .store
            .groups(&filter)
            .await?
            .into_iter()
            .next()
            .map(|g| g.number)
    } else {
        None
    };
    Ok(ProfileView {
        id: user.id,
        full_name: user.full_name.clone(),
        username: user.username.clone(),
        role: user.role,
        email: user.email.clone(),
        phone: user.phone.clone(),
        department: user.department.clone(),
        birth_year: user.birth_year,
        faculty,
        group_number,
        force_password_change: user.force_password_change,
    })
}

pub async fn update_profile(
    state: &AppState,
    mut user: User,
    update: ProfileUpdate,
) -> Result<ProfileSaved> {
    update.apply_to(&mut user)?;
    state.store.update_user(&user).await?;
    state
        .audit(
            NewAuditEntry::new(
                user.id,
                actions::PROFILE_UPDATED,
                "users",
                Some(user.id.into_inner()),
            )
            .describe(user.full_name.clone()),
        )
        .await;
    Ok(ProfileSaved {
        ok: true,
        id: user.id,
        full_name: user.full_name,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Supervisor {
    pub id: UserId,
    pub role: UserRole,
    pub title: &'static str,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Supervisor {
    fn of(user: User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            title: title(user.role),
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
        }
    }
}

pub fn title(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "Administrator",
        UserRole::Rector => "Rector",
        UserRole::Dean => "Dean",
        UserRole::ViceDean => "Vice dean",
        UserRole::Curator => "Curator",
    }
}

/// People above the caller: the faculty's dean, its vice deans (for
/// curators) and the rector.
pub async fn supervisors(state: &AppState, user: &User) -> Result<Vec<Supervisor>> {
    let mut result = Vec::new();
    if let Some(faculty_id) = user.faculty_id {
        let mut roles = vec![UserRole::Dean];
        if user.role == UserRole::Curator {
            roles.push(UserRole::ViceDean);
        }
        for role in roles {
            let people = state
                .store
                .users(&UserFilter::role(role).in_faculty(faculty_id))
                .await?;
            let people = people.into_iter().filter(|p| p.id != user.id);
            if role == UserRole::Dean {
                result.extend(people.take(1).map(Supervisor::of));
            } else {
                result.extend(people.map(Supervisor::of));
            }
        }
    }
    let rector = state.store.users(&UserFilter::role(UserRole::Rector)).await?;
    result.extend(rector.into_iter().take(1).map(Supervisor::of));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::state::test_support::*;
    use crate::infrastructure::UniversityStore;

    #[tokio::test]
    async fn update_clears_empty_contacts_and_keeps_absent_ones() {
        let (state, store) = state_on(monday());
        let mut rector = user(&state, "rector", UserRole::Rector, None).await;
        rector.email = Some("old@uni.tj".to_string());
        rector.phone = Some("+992".to_string());
        state.store.update_user(&rector).await.unwrap();

        let saved = update_profile(
            &state,
            rector.clone(),
            ProfileUpdate {
                full_name: Some("  New Name ".to_string()),
                email: Some(String::new()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(saved.full_name, "New Name");
        let stored = store.user(rector.id).await.unwrap().unwrap();
        assert_eq!(stored.email, None);
        assert_eq!(stored.phone.as_deref(), Some("+992"));
    }

    #[tokio::test]
    async fn blank_full_name_is_ignored() {
        let (state, _) = state_on(monday());
        let rector = user(&state, "rector", UserRole::Rector, None).await;
        let saved = update_profile(
            &state,
            rector,
            ProfileUpdate {
                full_name: Some("   ".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(saved.full_name, "rector full");
    }

    #[tokio::test]
    async fn curator_profile_names_faculty_and_group() {
        let (state, _) = state_on(monday());
        let faculty = faculty(&state, "Mathematics", "MM").await;
        let curator = user(&state, "cur", UserRole::Curator, Some(faculty.id)).await;
        group(&state, faculty.id, "101", 1, Some(curator.id)).await;

        let view = profile(&state, &curator).await.unwrap();
        assert_eq!(view.faculty.as_deref(), Some("Mathematics"));
        assert_eq!(view.group_number.as_deref(), Some("101"));
    }

    #[tokio::test]
    async fn curator_supervisors_are_dean_vice_deans_and_rector() {
        let (state, _) = state_on(monday());
        let faculty = faculty(&state, "Mathematics", "MM").await;
        user(&state, "dean", UserRole::Dean, Some(faculty.id)).await;
        user(&state, "vd", UserRole::ViceDean, Some(faculty.id)).await;
        user(&state, "rector", UserRole::Rector, None).await;
        let curator = user(&state, "cur", UserRole::Curator, Some(faculty.id)).await;

        let people = supervisors(&state, &curator).await.unwrap();
        let roles: Vec<UserRole> = people.iter().map(|p| p.role).collect();
        assert_eq!(roles, vec![UserRole::Dean, UserRole::ViceDean, UserRole::Rector]);
        assert_eq!(people[1].title, "Vice dean");
    }

    #[tokio::test]
    async fn vice_dean_supervisors_skip_other_vice_deans() {
        let (state, _) = state_on(monday());
        let faculty = faculty(&state, "Mathematics", "MM").await;
        user(&state, "dean", UserRole::Dean, Some(faculty.id)).await;
        let vd = user(&state, "vd", UserRole::ViceDean, Some(faculty.id)).await;
        user(&state, "vd2", UserRole::ViceDean, Some(faculty.id)).await;

        let people = supervisors(&state, &vd).await.unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].role, UserRole::Dean);
    }
}
