use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures::future::{LocalBoxFuture, Ready, ready};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::access_control;
use crate::utils::jwt;

/// Header qui transporte le jeton de session
pub const AUTH_HEADER: &str = "x-auth-token";

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

/// Utilisateur dont le rôle admin a été confirmé en BD
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// Résout l'identité depuis le header x-auth-token
pub fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    // 1. Extraire le header
    let token = req
        .headers()
        .get(AUTH_HEADER)
        .ok_or(AppError::MissingToken)?
        .to_str()
        .map_err(|_| AppError::InvalidToken)?
        .trim();

    if token.is_empty() {
        return Err(AppError::MissingToken);
    }

    // 2. Vérifier le token JWT avec le secret de la config
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| AppError::Internal("AppConfig is not registered".to_string()))?;
    let claims = jwt::verify_token(token, &config.jwt_secret)?;

    Ok(AuthUser {
        user_id: claims.sub,
        username: claims.username,
        email: claims.email,
        is_admin: claims.is_admin,
    })
}

/// Implémentation de FromRequest pour AuthUser
/// Cela permet à Actix-Web d'extraire automatiquement AuthUser des requêtes
impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// JWT valide + is_admin relu en BD (une rétrogradation prend effet tout de suite)
impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth_user = authenticate(req);
        let db = req.app_data::<web::Data<DatabaseConnection>>().cloned();

        Box::pin(async move {
            let auth_user = auth_user?;
            let db = db.ok_or_else(|| AppError::Internal("DatabaseConnection is not registered".to_string()))?;

            access_control::require_admin(db.get_ref(), auth_user.user_id).await?;
            Ok(AdminUser(auth_user))
        })
    }
}
