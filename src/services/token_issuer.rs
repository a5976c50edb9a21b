use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, SqlErr};

use crate::errors::AppError;
use crate::models::documents;
use crate::utils::public_token;

/// Collision sur 128 bits = quasi impossible, la contrainte UNIQUE reste le filet
const MAX_ATTEMPTS: usize = 5;

pub struct TokenIssuer;

impl TokenIssuer {
    /// Retourne le jeton public du document, en le créant au premier appel
    /// Idempotent : un jeton déjà posé n'est jamais remplacé
    pub async fn ensure_public_token(
        db: &DatabaseConnection,
        document: &documents::Model,
    ) -> Result<String, AppError> {
        Self::ensure_public_token_with(db, document, public_token::generate).await
    }

    pub(crate) async fn ensure_public_token_with<G>(
        db: &DatabaseConnection,
        document: &documents::Model,
        mut generate: G,
    ) -> Result<String, AppError>
    where
        G: FnMut() -> String,
    {
        if let Some(token) = &document.public_token {
            return Ok(token.clone());
        }

        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = generate();

            // UPDATE conditionnel : si une autre requête a posé le jeton entre-temps,
            // 0 ligne modifiée et on relit le sien
            let result = documents::Entity::update_many()
                .col_expr(documents::Column::PublicToken, Expr::value(candidate.clone()))
                .filter(documents::Column::Id.eq(document.id))
                .filter(documents::Column::PublicToken.is_null())
                .exec(db)
                .await;

            match result {
                Ok(res) if res.rows_affected > 0 => {
                    tracing::info!("public token issued for document {}", document.id);
                    return Ok(candidate);
                }
                Ok(_) => return Self::current_token(db, document.id).await,
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    tracing::warn!(
                        "public token collision for document {} (attempt {}/{})",
                        document.id,
                        attempt,
                        MAX_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal(format!(
            "could not allocate a unique public token for document {}",
            document.id
        )))
    }

    async fn current_token(db: &DatabaseConnection, document_id: i32) -> Result<String, AppError> {
        documents::Entity::find_by_id(document_id)
            .one(db)
            .await?
            .ok_or(AppError::NotFound("Document"))?
            .public_token
            .ok_or_else(|| AppError::Internal(format!("document {} has no public token", document_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_document, insert_user, setup_test_db};

    #[tokio::test]
    async fn test_idempotent() {
        let db = setup_test_db().await;
        let alice = insert_user(&db, "alice", false).await;
        let doc = insert_document(&db, alice.id, None).await;

        let first = TokenIssuer::ensure_public_token(&db, &doc).await.unwrap();
        // Même modèle périmé (public_token = None) => on relit le jeton posé
        let second = TokenIssuer::ensure_public_token(&db, &doc).await.unwrap();
        let reloaded = documents::Entity::find_by_id(doc.id).one(&db).await.unwrap().unwrap();
        let third = TokenIssuer::ensure_public_token(&db, &reloaded).await.unwrap();

        assert_eq!(first.len(), 32);
        assert_eq!(first, second);
        assert_eq!(first, third);
        assert_eq!(reloaded.public_token.as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn test_existing_token_is_returned_unchanged() {
        let db = setup_test_db().await;
        let alice = insert_user(&db, "alice", false).await;
        let doc = insert_document(&db, alice.id, Some("already-there")).await;

        let token = TokenIssuer::ensure_public_token_with(&db, &doc, || panic!("must not generate"))
            .await
            .unwrap();
        assert_eq!(token, "already-there");
    }

    #[tokio::test]
    async fn test_collision_is_retried() {
        let db = setup_test_db().await;
        let alice = insert_user(&db, "alice", false).await;
        insert_document(&db, alice.id, Some("taken")).await;
        let doc = insert_document(&db, alice.id, None).await;

        let mut candidates = vec!["fresh".to_string(), "taken".to_string()];
        let token = TokenIssuer::ensure_public_token_with(&db, &doc, || candidates.pop().unwrap())
            .await
            .unwrap();

        assert_eq!(token, "fresh");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let db = setup_test_db().await;
        let alice = insert_user(&db, "alice", false).await;
        insert_document(&db, alice.id, Some("taken")).await;
        let doc = insert_document(&db, alice.id, None).await;

        let result = TokenIssuer::ensure_public_token_with(&db, &doc, || "taken".to_string()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
