use actix_web::{HttpResponse, get, put, web};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{ChangePasswordRequest, MessageResponse, UpdateProfileRequest, UserResponse};
use crate::services::user_service::UserService;

/// GET /api/users/me - Profil courant (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser, db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let user = UserService::find_by_id(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PUT /api/users/me - Modifier nom et email (PROTÉGÉE)
#[put("/me")]
pub async fn update_me(
    auth_user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();

    let user = UserService::update_profile(db.get_ref(), auth_user.user_id, body.full_name, body.email).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// PUT /api/users/me/password - Changer son mot de passe (PROTÉGÉE)
#[put("/me/password")]
pub async fn change_password(
    auth_user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    UserService::change_password(
        db.get_ref(),
        config.password_hash_iterations,
        auth_user.user_id,
        &body.current_password,
        &body.new_password,
    )
    .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::ok("Password changed successfully")))
}

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(me)
            .service(update_me)
            .service(change_password)
    );
}
