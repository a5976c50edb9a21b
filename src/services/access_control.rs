// ============================================================================
// CONTRÔLE D'ACCÈS
// ============================================================================
//
// Trois politiques, toutes ici (les routes ne refont jamais le test):
//   - Propriétaire : le document doit appartenir au demandeur, sinon 404
//     (on ne confirme pas l'existence du document d'un autre user)
//   - Admin : is_admin relu en BD à chaque requête, sinon 403
//   - Jeton public : seule la connaissance du jeton exact compte, sinon 404
//
// Les fonctions sont génériques sur ConnectionTrait pour être utilisées
// aussi bien avec le pool qu'à l'intérieur d'une transaction.
//
// ============================================================================

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::{documents, users};

/// Identité résolue depuis le jeton de session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: i32,
    pub is_admin: bool,
}

impl From<&AuthUser> for Requester {
    fn from(auth_user: &AuthUser) -> Self {
        Self {
            user_id: auth_user.user_id,
            is_admin: auth_user.is_admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAccess {
    /// Modification, QR code : propriétaire uniquement
    OwnerOnly,
    /// Lecture, suppression : propriétaire ou administrateur
    OwnerOrAdmin,
}

/// Charge un document si le demandeur y a droit
/// `lock` => SELECT ... FOR UPDATE (à utiliser dans une transaction)
pub async fn authorize_document<C: ConnectionTrait>(
    conn: &C,
    requester: Requester,
    document_id: i32,
    access: DocumentAccess,
    lock: bool,
) -> Result<documents::Model, AppError> {
    let mut query = documents::Entity::find_by_id(document_id);
    if lock {
        query = query.lock_exclusive();
    }

    let document = query.one(conn).await?.ok_or(AppError::NotFound("Document"))?;

    if document.owner_id == requester.user_id {
        return Ok(document);
    }

    if access == DocumentAccess::OwnerOrAdmin
        && requester.is_admin
        && is_admin(conn, requester.user_id).await?
    {
        return Ok(document);
    }

    Err(AppError::NotFound("Document"))
}

/// Politique admin : le compte doit exister et être admin en BD
pub async fn require_admin<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<users::Model, AppError> {
    match users::Entity::find_by_id(user_id).one(conn).await? {
        Some(user) if user.is_admin => Ok(user),
        Some(_) => Err(AppError::Forbidden),
        // Compte supprimé depuis l'émission du jeton
        None => Err(AppError::InvalidToken),
    }
}

async fn is_admin<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<bool, AppError> {
    Ok(users::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .map(|u| u.is_admin)
        .unwrap_or(false))
}

/// Politique jeton public : égalité stricte avec un jeton stocké
pub async fn resolve_public_token<C: ConnectionTrait>(
    conn: &C,
    token: &str,
) -> Result<(documents::Model, users::Model), AppError> {
    if token.is_empty() {
        return Err(AppError::NotFound("Document"));
    }

    let found = documents::Entity::find()
        .filter(documents::Column::PublicToken.eq(token))
        .find_also_related(users::Entity)
        .one(conn)
        .await?;

    match found {
        Some((document, Some(owner))) => Ok((document, owner)),
        _ => Err(AppError::NotFound("Document")),
    }
}
