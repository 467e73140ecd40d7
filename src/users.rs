//! User repository: maps verified identities onto stored users.

use log::info;
use sqlx::{Row, SqliteConnection};

use crate::auth::VerifiedIdentity;
use crate::constants::generate_row_id;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{millis_to_datetime, now_millis, User, UserRow};
use crate::queries::users;

#[derive(Clone, Debug)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the user on first login, or refresh the profile fields of an
    /// existing user with the same external id.
    ///
    /// Fails with [`Error::IntegrityViolation`] if the email already belongs
    /// to a different user.
    pub async fn upsert_user(&self, identity: &VerifiedIdentity) -> Result<User> {
        let mut tx = self.db.begin_write().await?;

        let existing = fetch_user_by_external_id(&mut tx, &identity.external_id).await?;
        let owner_of_email = fetch_user_id_by_email(&mut tx, &identity.email).await?;

        let user = match existing {
            Some(row) => {
                if let Some(owner) = owner_of_email.filter(|owner| *owner != row.id) {
                    return Err(email_taken(&identity.email, &owner));
                }
                let updated = UserRow {
                    email: identity.email.clone(),
                    display_name: identity.display_name.clone(),
                    avatar_url: identity.avatar_url.clone(),
                    updated_at_ms: now_millis().max(row.updated_at_ms),
                    ..row
                };
                sqlx::query(&users::update_profile(&updated))
                    .execute(&mut *tx)
                    .await?;
                User::try_from(updated)?
            }
            None => {
                if let Some(owner) = owner_of_email {
                    return Err(email_taken(&identity.email, &owner));
                }
                let now = millis_to_datetime(now_millis())?;
                let user = User {
                    id: generate_row_id(),
                    external_id: identity.external_id.clone(),
                    email: identity.email.clone(),
                    display_name: identity.display_name.clone(),
                    avatar_url: identity.avatar_url.clone(),
                    created_at: now,
                    updated_at: now,
                };
                sqlx::query(&users::insert(&UserRow::from(&user)))
                    .execute(&mut *tx)
                    .await?;
                info!("Created user {} for {}", user.id, user.email);
                user
            }
        };

        tx.commit().await?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        let sql = users::select_by_id(user_id);
        match sqlx::query(&sql).fetch_optional(self.db.pool()).await? {
            Some(row) => User::try_from(UserRow::from_row(&row)?),
            None => Err(Error::UserNotFound(user_id.to_string())),
        }
    }

    pub async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let mut conn = self.db.pool().acquire().await?;
        fetch_user_by_external_id(&mut conn, external_id)
            .await?
            .map(User::try_from)
            .transpose()
    }
}

fn email_taken(email: &str, owner: &str) -> Error {
    Error::IntegrityViolation(format!("email {} already belongs to user {}", email, owner))
}

async fn fetch_user_by_external_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<Option<UserRow>> {
    let sql = users::select_by_external_id(external_id);
    sqlx::query(&sql)
        .fetch_optional(&mut *conn)
        .await?
        .map(|row| UserRow::from_row(&row))
        .transpose()
}

async fn fetch_user_id_by_email(conn: &mut SqliteConnection, email: &str) -> Result<Option<String>> {
    let sql = users::select_id_by_email(email);
    let row = sqlx::query(&sql).fetch_optional(&mut *conn).await?;
    Ok(row.map(|r| r.get::<String, _>(0)))
}
