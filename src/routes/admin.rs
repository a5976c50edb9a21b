// ============================================================================
// ROUTES ADMIN
// ============================================================================
//
// Toutes les routes prennent AdminUser : JWT valide + is_admin confirmé en BD.
// Un admin ne peut ni supprimer ni rétrograder son propre compte.
//
// ============================================================================

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::middleware::AdminUser;
use crate::models::dto::{
    AdminCreateUserRequest, AdminDocumentResponse, AdminUpdateUserRequest, MessageResponse, UserResponse,
};
use crate::services::access_control::Requester;
use crate::services::admin_service::AdminService;
use crate::services::document_service::DocumentService;
use crate::services::file_storage::FileStorage;
use crate::services::user_service::{NewUser, UserChanges, UserService};

/// GET /api/admin/stats - Totaux et répartition par type
#[get("/stats")]
pub async fn stats(_admin: AdminUser, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(AdminService::stats(db.get_ref()).await?))
}

/// GET /api/admin/users
#[get("/users")]
pub async fn list_users(_admin: AdminUser, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let users: Vec<UserResponse> = UserService::list_users(db.get_ref())
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

/// POST /api/admin/users - Créer un compte (éventuellement admin)
#[post("/users")]
pub async fn create_user(
    admin: AdminUser,
    body: web::Json<AdminCreateUserRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();

    let user = UserService::create_user(
        db.get_ref(),
        config.password_hash_iterations,
        NewUser {
            username: body.username,
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            iin: body.iin,
            is_admin: body.is_admin,
        },
    )
    .await?;

    tracing::info!("user {} created by admin {}", user.id, admin.0.user_id);
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// GET /api/admin/users/{id}
#[get("/users/{id}")]
pub async fn get_user(
    _admin: AdminUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::find_by_id(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PUT /api/admin/users/{id} - password vide ou absent => inchangé
#[put("/users/{id}")]
pub async fn update_user(
    admin: AdminUser,
    path: web::Path<i32>,
    body: web::Json<AdminUpdateUserRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let mut body = body.into_inner();
    // Champ vide envoyé par le formulaire = pas de changement
    body.password = body.password.filter(|p| !p.is_empty());
    body.validate()?;

    let user = UserService::admin_update_user(
        db.get_ref(),
        config.password_hash_iterations,
        admin.0.user_id,
        path.into_inner(),
        UserChanges {
            username: body.username,
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            iin: body.iin,
            is_admin: body.is_admin,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// DELETE /api/admin/users/{id} - Supprime aussi ses documents et fichiers
#[delete("/users/{id}")]
pub async fn delete_user(
    admin: AdminUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<FileStorage>,
) -> Result<HttpResponse, AppError> {
    UserService::delete_user(db.get_ref(), storage.get_ref(), admin.0.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("User deleted successfully")))
}

/// GET /api/admin/documents - Tous les documents avec leur propriétaire
#[get("/documents")]
pub async fn list_documents(
    _admin: AdminUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    let documents: Vec<AdminDocumentResponse> = DocumentService::list_all(db.get_ref())
        .await?
        .into_iter()
        .map(|(doc, owner)| AdminDocumentResponse::from_pair(doc, owner, today))
        .collect();

    Ok(HttpResponse::Ok().json(documents))
}

/// GET /api/admin/documents/{id}
#[get("/documents/{id}")]
pub async fn get_document(
    _admin: AdminUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (doc, owner) = DocumentService::find_with_owner(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AdminDocumentResponse::from_pair(doc, owner, Utc::now().date_naive())))
}

/// DELETE /api/admin/documents/{id}
#[delete("/documents/{id}")]
pub async fn delete_document(
    admin: AdminUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<FileStorage>,
) -> Result<HttpResponse, AppError> {
    DocumentService::delete(db.get_ref(), storage.get_ref(), Requester::from(&admin.0), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Document deleted successfully")))
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(stats)
            .service(list_users)
            .service(create_user)
            .service(get_user)
            .service(update_user)
            .service(delete_user)
            .service(list_documents)
            .service(get_document)
            .service(delete_document)
    );
}
