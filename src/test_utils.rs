// Utilitaires de test partagés par les modules (compilés seulement en test)

use std::path::Path;

use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use crate::config::{AdminSeed, AppConfig};
use crate::db;
use crate::models::{documents, users};
use crate::utils::password;

pub const TEST_ITERATIONS: u32 = 1_000;
pub const TEST_PASSWORD: &str = "secret1";

/// Base SQLite en mémoire avec les tables créées
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    db::init_schema(&db).await.expect("Failed to create tables");
    db
}

pub fn test_config(upload_dir: &Path) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret-key-minimum-32-characters-long".to_string(),
        jwt_ttl_hours: 1,
        public_base_url: "http://localhost:3000".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 1024 * 1024,
        password_hash_iterations: TEST_ITERATIONS,
        host: "127.0.0.1".to_string(),
        port: 0,
        admin: AdminSeed {
            username: "admin".to_string(),
            email: "admin@digitalid.kz".to_string(),
            password: "admin123".to_string(),
            full_name: "System Administrator".to_string(),
        },
    }
}

/// Insère un user avec le mot de passe TEST_PASSWORD
pub async fn insert_user(db: &DatabaseConnection, username: &str, is_admin: bool) -> users::Model {
    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@x.com", username)),
        password_hash: Set(password::hash_password(TEST_PASSWORD, TEST_ITERATIONS).unwrap()),
        full_name: Set(format!("{} Full", username)),
        iin: Set(None),
        is_admin: Set(is_admin),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

pub async fn insert_document(
    db: &DatabaseConnection,
    owner_id: i32,
    public_token: Option<&str>,
) -> documents::Model {
    documents::ActiveModel {
        owner_id: Set(owner_id),
        doc_type: Set("ID card".to_string()),
        doc_number: Set("123".to_string()),
        doc_name: Set("My ID".to_string()),
        issue_date: Set(None),
        expiry_date: Set(None),
        doc_data: Set(Some("private".to_string())),
        file_path: Set(None),
        public_token: Set(public_token.map(str::to_string)),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert document")
}
