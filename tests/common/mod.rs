#![allow(dead_code)]

use std::path::Path;

use actix_web::test::TestRequest;
use actix_web::web;
use sea_orm::{Database, DatabaseConnection};
use serde_json::json;

use digital_id_wallet::config::{AdminSeed, AppConfig};
use digital_id_wallet::db;
use digital_id_wallet::middleware::auth::AUTH_HEADER;
use digital_id_wallet::services::file_storage::FileStorage;

pub const ADMIN_PASSWORD: &str = "admin123";
const BOUNDARY: &str = "----wallet-test-boundary";

pub struct TestState {
    pub db: web::Data<DatabaseConnection>,
    pub config: web::Data<AppConfig>,
    pub storage: web::Data<FileStorage>,
}

/// Construit l'app de test avec l'état partagé
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.db.clone())
                .app_data($state.config.clone())
                .app_data($state.storage.clone())
                .configure(digital_id_wallet::routes::configure_routes),
        )
        .await
    };
}

/// BD SQLite en mémoire + admin par défaut + dossier d'upload isolé
pub async fn setup(upload_dir: &Path) -> TestState {
    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "integration-secret-key-minimum-32-chars".to_string(),
        jwt_ttl_hours: 1,
        public_base_url: "http://localhost:3000".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 64 * 1024,
        password_hash_iterations: 1_000,
        host: "127.0.0.1".to_string(),
        port: 0,
        admin: AdminSeed {
            username: "admin".to_string(),
            email: "admin@digitalid.kz".to_string(),
            password: ADMIN_PASSWORD.to_string(),
            full_name: "System Administrator".to_string(),
        },
    };

    let conn = Database::connect(&config.database_url)
        .await
        .expect("Failed to create test database");
    db::init_schema(&conn).await.expect("Failed to create tables");
    db::seed_default_admin(&conn, &config).await.expect("Failed to seed admin");

    let storage = FileStorage::new(upload_dir, config.max_upload_bytes);

    TestState {
        db: web::Data::new(conn),
        config: web::Data::new(config),
        storage: web::Data::new(storage),
    }
}

pub fn register_request(username: &str, email: &str, iin: Option<&str>) -> TestRequest {
    TestRequest::post().uri("/api/auth/register").set_json(json!({
        "username": username,
        "email": email,
        "password": "secret1",
        "full_name": format!("{} A", username),
        "iin": iin,
    }))
}

pub fn login_request(username: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": password }))
}

pub fn authed(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((AUTH_HEADER, token.to_string()))
}

/// Fichier joint d'un formulaire multipart
pub struct FilePart<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

/// Corps multipart/form-data construit à la main
pub fn multipart_request(req: TestRequest, fields: &[(&str, &str)], file: Option<FilePart<'_>>) -> TestRequest {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    req.insert_header((
        "content-type",
        format!("multipart/form-data; boundary={BOUNDARY}"),
    ))
    .set_payload(body)
}

pub fn png(data: &[u8]) -> FilePart<'_> {
    FilePart {
        file_name: "scan.png",
        content_type: "image/png",
        data,
    }
}
