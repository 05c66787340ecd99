use opsdesk_application::{ProfileRepository, RoleRepository};
use opsdesk_domain::{AccountStatus, UserId};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresDirectoryRepository;
use super::rows::{RoleRow, decode_role_rows};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

fn row(role_name: Option<&str>, is_global: Option<bool>, department: Option<&str>) -> RoleRow {
    RoleRow {
        role_name: role_name.map(str::to_owned),
        is_global,
        department_name: department.map(str::to_owned),
    }
}

#[test]
fn decode_keeps_valid_global_and_scoped_roles() {
    let roles = decode_role_rows(
        UserId::new(),
        vec![
            row(Some("Administrador"), Some(true), None),
            row(Some("Manobrista"), Some(false), Some("Operações")),
        ],
    );

    assert_eq!(roles.len(), 2);
    assert!(roles[0].is_global());
    assert_eq!(roles[1].department(), Some("Operações"));
}

#[test]
fn decode_drops_missing_and_inconsistent_rows() {
    let roles = decode_role_rows(
        UserId::new(),
        vec![
            row(None, None, None),
            row(Some("Gerente"), Some(true), Some("Operações")),
            row(Some("Técnico"), Some(false), None),
            row(Some("Supervisor"), Some(true), None),
        ],
    );

    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name(), "Supervisor");
}

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for directory tests: {error}");
    }

    Some(pool)
}

#[tokio::test]
async fn roles_and_profile_are_loaded_from_joined_tables() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresDirectoryRepository::new(pool.clone());
    let user_id = UserId::new();
    let department = format!("Operações {user_id}");
    let email = format!("{user_id}@opsdesk.test");

    let setup = sqlx::query(
        r#"
        WITH profile AS (
            INSERT INTO profiles (id, full_name, email, status)
            VALUES ($1, 'Otto Operador', $2, 'inactive')
            RETURNING id
        ), department AS (
            INSERT INTO departments (name) VALUES ($3) RETURNING id
        ), scoped_role AS (
            INSERT INTO roles (name, is_global, department_id)
            SELECT 'Manobrista', FALSE, id FROM department
            RETURNING id
        )
        INSERT INTO user_roles (user_id, role_id)
        SELECT profile.id, scoped_role.id FROM profile, scoped_role
        UNION ALL
        SELECT profile.id, NULL FROM profile
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(email.as_str())
    .bind(department.as_str())
    .execute(&pool)
    .await;
    assert!(setup.is_ok());

    let roles = repository
        .list_roles_for_user(user_id)
        .await
        .unwrap_or_else(|error| panic!("roles lookup failed: {error}"));
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].name(), "Manobrista");
    assert_eq!(roles[0].department(), Some(department.as_str()));

    let profile = repository
        .find_profile(user_id)
        .await
        .unwrap_or_else(|error| panic!("profile lookup failed: {error}"));
    let profile = profile.unwrap_or_else(|| panic!("profile should exist"));
    assert_eq!(profile.status, AccountStatus::Inactive);
    assert_eq!(profile.email.as_str(), email);

    let missing = repository.find_profile(UserId::new()).await;
    assert!(matches!(missing, Ok(None)));
}
