use actix_web::{HttpResponse, get, post, web};
use sea_orm::DatabaseConnection;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::dto::{AuthResponse, CheckQuery, CheckResponse, LoginRequest, RegisterRequest};
use crate::services::user_service::{NewUser, UniqueField, UserService};
use crate::utils::jwt;

/// POST /api/auth/register - Créer un compte (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    // 1. Valider les champs
    body.validate()?;
    let body = body.into_inner();

    // 2. Créer l'utilisateur (unicité username > email > iin)
    let user = UserService::create_user(
        db.get_ref(),
        config.password_hash_iterations,
        NewUser {
            username: body.username,
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            iin: body.iin,
            is_admin: false,
        },
    )
    .await?;

    // 3. Générer le JWT
    let token = jwt::generate_token(&user, &config.jwt_secret, config.jwt_ttl_hours)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        success: true,
        token,
        user: user.into(),
    }))
}

/// POST /api/auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::find_by_credentials(db.get_ref(), &body.username, &body.password).await?;
    let token = jwt::generate_token(&user, &config.jwt_secret, config.jwt_ttl_hours)?;

    tracing::info!("user '{}' logged in", user.username);

    Ok(HttpResponse::Ok().json(AuthResponse {
        success: true,
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/check?field=username&value=alice - Disponibilité (PUBLIC)
#[get("/check")]
pub async fn check(
    query: web::Query<CheckQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let field = UniqueField::parse(&query.field)
        .ok_or_else(|| AppError::validation("Invalid field", "field"))?;

    let exists = UserService::exists(db.get_ref(), field, &query.value).await?;
    Ok(HttpResponse::Ok().json(CheckResponse { exists }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(check)
    );
}
