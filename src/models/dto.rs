// Contrats typés des requêtes/réponses JSON, validés à l'entrée des routes
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{documents, users};
use crate::services::verification::{ExpiryStatus, classify_expiry};

// ----------------------------------------------------------------------------
// Auth / utilisateurs
// ----------------------------------------------------------------------------

// DTO pour l'inscription
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[serde(default, alias = "national_id")]
    pub iin: Option<String>,
}

// DTO pour la connexion
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Réponse après login/register
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserResponse,
}

/// Utilisateur tel qu'exposé par l'API (sans hash de mot de passe)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub iin: Option<String>,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            iin: user.iin,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

// PUT /api/users/me
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

// PUT /api/users/me/password
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

// GET /api/auth/check?field=...&value=...
#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Admin
// ----------------------------------------------------------------------------

// POST /api/admin/users
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[serde(default, alias = "national_id")]
    pub iin: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

// PUT /api/admin/users/{id} - password optionnel
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[serde(default, alias = "national_id")]
    pub iin: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: u64,
    pub total_documents: u64,
    pub doc_types: Vec<DocTypeCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sea_orm::FromQueryResult)]
pub struct DocTypeCount {
    pub doc_type: String,
    pub count: i64,
}

// ----------------------------------------------------------------------------
// Documents
// ----------------------------------------------------------------------------

/// Vue propriétaire d'un document (tous les champs + statut d'expiration)
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: i32,
    pub user_id: i32,
    pub doc_type: String,
    pub doc_number: String,
    pub doc_name: String,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub doc_data: Option<String>,
    pub file_path: Option<String>,
    pub public_token: Option<String>,
    pub created_at: NaiveDateTime,
    pub expiry_status: Option<ExpiryStatus>,
}

impl DocumentResponse {
    pub fn from_model(doc: documents::Model, today: NaiveDate) -> Self {
        Self {
            expiry_status: classify_expiry(doc.expiry_date, today),
            id: doc.id,
            user_id: doc.owner_id,
            doc_type: doc.doc_type,
            doc_number: doc.doc_number,
            doc_name: doc.doc_name,
            issue_date: doc.issue_date,
            expiry_date: doc.expiry_date,
            doc_data: doc.doc_data,
            file_path: doc.file_path,
            public_token: doc.public_token,
            created_at: doc.created_at,
        }
    }
}

/// Vue admin : document + identité du propriétaire
#[derive(Debug, Serialize)]
pub struct AdminDocumentResponse {
    #[serde(flatten)]
    pub document: DocumentResponse,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

impl AdminDocumentResponse {
    pub fn from_pair(doc: documents::Model, owner: Option<users::Model>, today: NaiveDate) -> Self {
        let (username, full_name) = match owner {
            Some(owner) => (Some(owner.username), Some(owner.full_name)),
            None => (None, None),
        };

        Self {
            document: DocumentResponse::from_model(doc, today),
            username,
            full_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QrCodeResponse {
    #[serde(rename = "qrCode")]
    pub qr_code: String,
    #[serde(rename = "publicUrl")]
    pub public_url: String,
}
