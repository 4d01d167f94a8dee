/// Common test utilities for integration tests
///
/// Provides a `TestContext` that connects to the database named by
/// `DATABASE_URL`, runs migrations, and builds the full router. Tests that
/// need a database call `TestContext::new()` and return early when it yields
/// `None`, so the suite still passes on machines without PostgreSQL.
///
/// Seeded data (the three user-management permissions and the "Super Admin"
/// role) comes from the migrations; everything else is created per test with
/// unique names and cleaned up afterwards.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

use userdesk_api::app::{build_router, AppState};
use userdesk_api::config::{ApiConfig, AuthConfig, Config, DatabaseConfig};
use userdesk_shared::auth::token::{create_token, Claims, TokenType};
use userdesk_shared::models::user::{CreateUser, User, UserWithRoles};

/// Token secret used by every test context
pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context: database pool, router, and created-record bookkeeping
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    user_ids: Vec<Uuid>,
    role_ids: Vec<Uuid>,
}

impl TestContext {
    /// Creates a context, or `None` when `DATABASE_URL` is not set
    pub async fn new() -> anyhow::Result<Option<Self>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping database-backed test");
            return Ok(None);
        };

        let db = PgPool::connect(&url).await?;
        sqlx::migrate!("../migrations").run(&db).await?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            auth: AuthConfig {
                token_secret: TEST_SECRET.to_string(),
            },
        };

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Ok(Some(Self {
            db,
            app,
            user_ids: Vec::new(),
            role_ids: Vec::new(),
        }))
    }

    /// Creates a role with a unique name granting the given permissions
    ///
    /// Permissions must already exist (the migrations seed create-user,
    /// edit-user, and delete-user). Returns the generated role name.
    pub async fn create_role(
        &mut self,
        base_name: &str,
        permissions: &[&str],
    ) -> anyhow::Result<String> {
        let name = format!("{} {}", base_name, short_tag());

        let role_id: Uuid =
            sqlx::query_scalar("INSERT INTO roles (name) VALUES ($1) RETURNING id")
                .bind(&name)
                .fetch_one(&self.db)
                .await?;

        for permission in permissions {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                SELECT $1, id FROM permissions WHERE name = $2
                "#,
            )
            .bind(role_id)
            .bind(permission)
            .execute(&self.db)
            .await?;
        }

        self.role_ids.push(role_id);
        Ok(name)
    }

    /// Creates a user with the given roles and a placeholder password hash
    pub async fn create_user(
        &mut self,
        name: &str,
        roles: &[String],
        active: bool,
    ) -> anyhow::Result<UserWithRoles> {
        self.create_user_with_hash(name, roles, active, "test-hash").await
    }

    /// Creates a user with an explicit password hash
    pub async fn create_user_with_hash(
        &mut self,
        name: &str,
        roles: &[String],
        active: bool,
        password_hash: &str,
    ) -> anyhow::Result<UserWithRoles> {
        let user = User::create_with_roles(
            &self.db,
            CreateUser {
                name: name.to_string(),
                email: format!(
                    "{}-{}@example.com",
                    name.to_lowercase().replace(' ', "-"),
                    short_tag()
                ),
                password_hash: password_hash.to_string(),
            },
            roles,
        )
        .await?;

        if !active {
            User::set_status(&self.db, user.id, false).await?;
        }

        self.user_ids.push(user.id);
        Ok(user)
    }

    /// Access token for a user
    pub fn token_for(&self, user_id: Uuid) -> String {
        let claims = Claims::new(user_id, TokenType::Access);
        create_token(&claims, TEST_SECRET).expect("token creation")
    }

    /// Authorization header value for a user
    pub fn auth_header(&self, user_id: Uuid) -> String {
        format!("Bearer {}", self.token_for(user_id))
    }

    /// Deletes everything this context created
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for id in &self.user_ids {
            let _ = User::delete_with_roles(&self.db, *id).await;
        }
        for id in &self.role_ids {
            sqlx::query("DELETE FROM roles WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await?;
        }
        Ok(())
    }

    /// Drives one request through the router, returning status and JSON body
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(header) = auth {
            builder = builder.header("authorization", header);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }
}

/// Role names held by a user, straight from the store
pub async fn role_names(db: &PgPool, user_id: Uuid) -> Vec<String> {
    userdesk_shared::models::role::Role::names_for_user(db, user_id)
        .await
        .expect("role query")
}

/// Password hash currently stored for a user
pub async fn stored_hash(db: &PgPool, user_id: Uuid) -> String {
    User::find_by_id(db, user_id)
        .await
        .expect("user query")
        .expect("user exists")
        .password_hash
}

/// Short unique suffix for names and emails
fn short_tag() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}
