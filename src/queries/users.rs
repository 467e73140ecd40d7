use sea_query::{Expr, Query, SqliteQueryBuilder};

use crate::models::UserRow;
use crate::schema::Users;

const USER_COLUMNS: [Users; 7] = [
    Users::Id,
    Users::ExternalId,
    Users::Email,
    Users::DisplayName,
    Users::AvatarUrl,
    Users::CreatedAtMs,
    Users::UpdatedAtMs,
];

/// INSERT INTO users (id, external_id, email, display_name, avatar_url, created_at_ms, updated_at_ms)
/// VALUES (?, ?, ?, ?, ?, ?, ?)
pub fn insert(row: &UserRow) -> String {
    Query::insert()
        .into_table(Users::Table)
        .columns(USER_COLUMNS)
        .values_panic([
            row.id.clone().into(),
            row.external_id.clone().into(),
            row.email.clone().into(),
            row.display_name.clone().into(),
            row.avatar_url.clone().into(),
            row.created_at_ms.into(),
            row.updated_at_ms.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// UPDATE users SET email = ?, display_name = ?, avatar_url = ?, updated_at_ms = ? WHERE id = ?
pub fn update_profile(row: &UserRow) -> String {
    Query::update()
        .table(Users::Table)
        .value(Users::Email, row.email.clone())
        .value(Users::DisplayName, row.display_name.clone())
        .value(Users::AvatarUrl, row.avatar_url.clone())
        .value(Users::UpdatedAtMs, row.updated_at_ms)
        .and_where(Expr::col(Users::Id).eq(row.id.as_str()))
        .to_string(SqliteQueryBuilder)
}

/// SELECT <user columns> FROM users WHERE id = ?
pub fn select_by_id(id: &str) -> String {
    Query::select()
        .columns(USER_COLUMNS)
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT <user columns> FROM users WHERE external_id = ?
pub fn select_by_external_id(external_id: &str) -> String {
    Query::select()
        .columns(USER_COLUMNS)
        .from(Users::Table)
        .and_where(Expr::col(Users::ExternalId).eq(external_id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT id FROM users WHERE email = ?
pub fn select_id_by_email(email: &str) -> String {
    Query::select()
        .column(Users::Id)
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .to_string(SqliteQueryBuilder)
}

/// SELECT 1 FROM users WHERE id = ? (for existence check)
pub fn exists(id: &str) -> String {
    Query::select()
        .expr(Expr::val(1))
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_writes_null_avatar() {
        let row = UserRow {
            id: "u-1".to_string(),
            external_id: "google-1".to_string(),
            email: "ada@example.com".to_string(),
            display_name: "Ada".to_string(),
            avatar_url: None,
            created_at_ms: 10,
            updated_at_ms: 10,
        };
        let sql = insert(&row);
        assert!(sql.starts_with("INSERT INTO \"users\""));
        assert!(sql.contains("'ada@example.com', 'Ada', NULL, 10, 10"));
    }

    #[test]
    fn test_exists_selects_constant() {
        assert_eq!(
            exists("u-1"),
            r#"SELECT 1 FROM "users" WHERE "id" = 'u-1'"#
        );
    }
}
