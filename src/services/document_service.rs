// ============================================================================
// SERVICE DOCUMENTS
// ============================================================================
//
// Description:
//   CRUD des documents, toujours filtré par propriétaire (ou override admin
//   là où il est permis, voir access_control).
//
// Cohérence fichier / ligne BD:
//   - create : fichier écrit d'abord ; si l'insert échoue, on le supprime
//   - update : nouveau fichier écrit d'abord, ligne verrouillée puis modifiée ;
//              l'ancien fichier est mis de côté avant le commit, puis
//              finalize/restore selon le commit
//   - delete : fichier mis de côté, ligne supprimée, puis finalize/restore
//              selon le commit
//
// ============================================================================

use chrono::NaiveDate;
use sea_orm::*;

use crate::errors::AppError;
use crate::models::{documents, users};
use crate::services::access_control::{self, DocumentAccess, Requester};
use crate::services::file_storage::{FileStorage, StagedRemoval, UploadedFile};

pub struct DocumentService;

/// Champs saisis par le propriétaire (hors fichier)
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFields {
    pub doc_type: String,
    pub doc_number: String,
    pub doc_name: String,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub doc_data: Option<String>,
}

impl DocumentService {
    pub async fn create(
        db: &DatabaseConnection,
        storage: &FileStorage,
        owner_id: i32,
        fields: DocumentFields,
        file: Option<UploadedFile>,
    ) -> Result<documents::Model, AppError> {
        let file_path = match &file {
            Some(file) => Some(storage.save(file).await?),
            None => None,
        };

        let new_doc = documents::ActiveModel {
            owner_id: Set(owner_id),
            doc_type: Set(fields.doc_type),
            doc_number: Set(fields.doc_number),
            doc_name: Set(fields.doc_name),
            issue_date: Set(fields.issue_date),
            expiry_date: Set(fields.expiry_date),
            doc_data: Set(fields.doc_data),
            file_path: Set(file_path.clone()),
            public_token: Set(None),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        match new_doc.insert(db).await {
            Ok(doc) => {
                tracing::info!("document {} created for user {}", doc.id, owner_id);
                Ok(doc)
            }
            Err(e) => {
                if let Some(path) = &file_path {
                    discard_file(storage, path).await;
                }
                Err(e.into())
            }
        }
    }

    /// GET /api/documents/{id} : propriétaire ou admin
    pub async fn get(
        db: &DatabaseConnection,
        requester: Requester,
        document_id: i32,
    ) -> Result<documents::Model, AppError> {
        access_control::authorize_document(db, requester, document_id, DocumentAccess::OwnerOrAdmin, false).await
    }

    /// Document réservé au propriétaire (génération du QR code)
    pub async fn get_owned(
        db: &DatabaseConnection,
        requester: Requester,
        document_id: i32,
    ) -> Result<documents::Model, AppError> {
        access_control::authorize_document(db, requester, document_id, DocumentAccess::OwnerOnly, false).await
    }

    pub async fn list_for_owner(db: &DatabaseConnection, owner_id: i32) -> Result<Vec<documents::Model>, AppError> {
        Ok(documents::Entity::find()
            .filter(documents::Column::OwnerId.eq(owner_id))
            .order_by_desc(documents::Column::CreatedAt)
            .order_by_desc(documents::Column::Id)
            .all(db)
            .await?)
    }

    /// Vue admin : tous les documents avec leur propriétaire, du plus récent au plus ancien
    pub async fn list_all(
        db: &DatabaseConnection,
    ) -> Result<Vec<(documents::Model, Option<users::Model>)>, AppError> {
        Ok(documents::Entity::find()
            .find_also_related(users::Entity)
            .order_by_desc(documents::Column::CreatedAt)
            .order_by_desc(documents::Column::Id)
            .all(db)
            .await?)
    }

    pub async fn find_with_owner(
        db: &DatabaseConnection,
        document_id: i32,
    ) -> Result<(documents::Model, Option<users::Model>), AppError> {
        documents::Entity::find_by_id(document_id)
            .find_also_related(users::Entity)
            .one(db)
            .await?
            .ok_or(AppError::NotFound("Document"))
    }

    /// Remplace les champs ; le fichier ne change que si un nouveau est fourni
    pub async fn update(
        db: &DatabaseConnection,
        storage: &FileStorage,
        requester: Requester,
        document_id: i32,
        fields: DocumentFields,
        file: Option<UploadedFile>,
    ) -> Result<documents::Model, AppError> {
        // 1. Nouveau fichier durable avant de toucher à la ligne
        let new_path = match &file {
            Some(file) => Some(storage.save(file).await?),
            None => None,
        };

        // 2. Ligne verrouillée et modifiée, ancien fichier mis de côté avant le commit
        let outcome = Self::apply_update(db, storage, requester, document_id, fields, new_path.clone()).await;

        // 3. Ancien fichier purgé seulement si la BD a validé, nouveau fichier jeté sinon
        match outcome {
            Ok((updated, superseded)) => {
                if let Some(removal) = superseded {
                    removal.finalize().await;
                }
                tracing::info!("document {} updated by user {}", document_id, requester.user_id);
                Ok(updated)
            }
            Err(e) => {
                if let Some(path) = &new_path {
                    discard_file(storage, path).await;
                }
                Err(e)
            }
        }
    }

    async fn apply_update(
        db: &DatabaseConnection,
        storage: &FileStorage,
        requester: Requester,
        document_id: i32,
        fields: DocumentFields,
        new_path: Option<String>,
    ) -> Result<(documents::Model, Option<StagedRemoval>), AppError> {
        let txn = db.begin().await?;

        let current =
            access_control::authorize_document(&txn, requester, document_id, DocumentAccess::OwnerOnly, true).await?;

        // Fichier remplacé indéplaçable => rollback au drop, rien n'est modifié
        let superseded = match (&new_path, &current.file_path) {
            (Some(_), Some(old)) => storage.stage_removal(old).await?,
            _ => None,
        };

        let mut active: documents::ActiveModel = current.into();
        active.doc_type = Set(fields.doc_type);
        active.doc_number = Set(fields.doc_number);
        active.doc_name = Set(fields.doc_name);
        active.issue_date = Set(fields.issue_date);
        active.expiry_date = Set(fields.expiry_date);
        active.doc_data = Set(fields.doc_data);
        if let Some(path) = new_path {
            active.file_path = Set(Some(path));
        }

        let outcome = async {
            let updated = active.update(&txn).await?;
            txn.commit().await?;
            Ok::<_, DbErr>(updated)
        }
        .await;

        match outcome {
            Ok(updated) => Ok((updated, superseded)),
            Err(e) => {
                if let Some(removal) = superseded {
                    removal.restore().await;
                }
                Err(e.into())
            }
        }
    }

    /// Supprime la ligne et le fichier ensemble ; propriétaire ou admin
    pub async fn delete(
        db: &DatabaseConnection,
        storage: &FileStorage,
        requester: Requester,
        document_id: i32,
    ) -> Result<(), AppError> {
        let txn = db.begin().await?;

        let document =
            access_control::authorize_document(&txn, requester, document_id, DocumentAccess::OwnerOrAdmin, true)
                .await?;

        // Fichier indéplaçable => la transaction est abandonnée (rollback au drop)
        let staged = match &document.file_path {
            Some(path) => storage.stage_removal(path).await?,
            None => None,
        };

        let outcome = async {
            documents::Entity::delete_by_id(document.id).exec(&txn).await?;
            txn.commit().await
        }
        .await;

        match outcome {
            Ok(()) => {
                if let Some(removal) = staged {
                    removal.finalize().await;
                }
                tracing::info!("document {} deleted by user {}", document_id, requester.user_id);
                Ok(())
            }
            Err(e) => {
                if let Some(removal) = staged {
                    removal.restore().await;
                }
                Err(e.into())
            }
        }
    }
}

async fn discard_file(storage: &FileStorage, public_path: &str) {
    if let Err(e) = storage.remove(public_path).await {
        tracing::warn!("failed to discard unreferenced file {}: {}", public_path, e);
    }
}

#[cfg(test)]
impl DocumentFields {
    pub fn sample() -> Self {
        Self {
            doc_type: "ID card".to_string(),
            doc_number: "123".to_string(),
            doc_name: "My ID".to_string(),
            issue_date: None,
            expiry_date: None,
            doc_data: Some("private".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{insert_user, setup_test_db};

    fn pdf(bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            original_name: "scan.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            data: bytes.to_vec(),
        }
    }

    fn owner(user: &users::Model) -> Requester {
        Requester {
            user_id: user.id,
            is_admin: user.is_admin,
        }
    }

    fn files_in(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_create_is_owner_scoped() {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        let alice = insert_user(&db, "alice", false).await;
        let bob = insert_user(&db, "bob", false).await;

        let doc = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), None)
            .await
            .unwrap();
        assert_eq!(doc.owner_id, alice.id);
        assert!(doc.public_token.is_none());

        assert_eq!(DocumentService::get(&db, owner(&alice), doc.id).await.unwrap().id, doc.id);
        assert!(matches!(
            DocumentService::get(&db, owner(&bob), doc.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(DocumentService::list_for_owner(&db, bob.id).await.unwrap().is_empty());
        assert_eq!(DocumentService::list_for_owner(&db, alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_file_after_commit() {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        let alice = insert_user(&db, "alice", false).await;

        let doc = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), Some(pdf(b"v1")))
            .await
            .unwrap();
        let old_path = doc.file_path.clone().unwrap();

        let mut fields = DocumentFields::sample();
        fields.doc_name = "Renamed".to_string();
        let updated = DocumentService::update(&db, &storage, owner(&alice), doc.id, fields, Some(pdf(b"v2")))
            .await
            .unwrap();

        let new_path = updated.file_path.clone().unwrap();
        assert_ne!(new_path, old_path);
        assert_eq!(updated.doc_name, "Renamed");
        assert!(!storage.path_of(&old_path).unwrap().exists());
        assert_eq!(std::fs::read(storage.path_of(&new_path).unwrap()).unwrap(), b"v2");
        assert_eq!(files_in(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_update_without_file_keeps_file_and_token() {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        let alice = insert_user(&db, "alice", false).await;

        let doc = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), Some(pdf(b"v1")))
            .await
            .unwrap();
        documents::Entity::update_many()
            .col_expr(documents::Column::PublicToken, sea_query::Expr::value("tok"))
            .filter(documents::Column::Id.eq(doc.id))
            .exec(&db)
            .await
            .unwrap();

        let updated = DocumentService::update(&db, &storage, owner(&alice), doc.id, DocumentFields::sample(), None)
            .await
            .unwrap();
        assert_eq!(updated.file_path, doc.file_path);
        assert_eq!(updated.public_token.as_deref(), Some("tok"));
        assert_eq!(updated.owner_id, alice.id);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_old_state() {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        let alice = insert_user(&db, "alice", false).await;
        let admin = insert_user(&db, "root", true).await;

        let doc = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), Some(pdf(b"v1")))
            .await
            .unwrap();

        // L'admin n'a pas le droit de modifier : le nouveau fichier doit disparaître
        let mut fields = DocumentFields::sample();
        fields.doc_name = "Hijacked".to_string();
        let result = DocumentService::update(&db, &storage, owner(&admin), doc.id, fields, Some(pdf(b"v2"))).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let current = DocumentService::get(&db, owner(&alice), doc.id).await.unwrap();
        assert_eq!(current.doc_name, doc.doc_name);
        assert_eq!(current.file_path, doc.file_path);
        assert!(storage.path_of(doc.file_path.as_deref().unwrap()).unwrap().exists());
        assert_eq!(files_in(dir.path()), 1);

        // Fichier refusé : rien n'est modifié
        let bad = UploadedFile {
            original_name: "x.exe".to_string(),
            content_type: Some("application/octet-stream".to_string()),
            data: vec![1],
        };
        assert!(DocumentService::update(&db, &storage, owner(&alice), doc.id, DocumentFields::sample(), Some(bad))
            .await
            .is_err());
        let current = DocumentService::get(&db, owner(&alice), doc.id).await.unwrap();
        assert_eq!(current.file_path, doc.file_path);
        assert_eq!(files_in(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_file() {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        let alice = insert_user(&db, "alice", false).await;
        let bob = insert_user(&db, "bob", false).await;

        let doc = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), Some(pdf(b"v1")))
            .await
            .unwrap();

        assert!(matches!(
            DocumentService::delete(&db, &storage, owner(&bob), doc.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(files_in(dir.path()), 1);

        DocumentService::delete(&db, &storage, owner(&alice), doc.id).await.unwrap();
        assert_eq!(files_in(dir.path()), 0);
        assert!(matches!(
            DocumentService::get(&db, owner(&alice), doc.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_can_delete_and_list_all() {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        let alice = insert_user(&db, "alice", false).await;
        let admin = insert_user(&db, "root", true).await;

        let first = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), None)
            .await
            .unwrap();
        let second = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), None)
            .await
            .unwrap();

        let all = DocumentService::list_all(&db).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].0.id, second.id);
        assert_eq!(all[0].1.as_ref().unwrap().username, "alice");

        DocumentService::delete(&db, &storage, owner(&admin), first.id).await.unwrap();
        assert!(matches!(
            DocumentService::find_with_owner(&db, first.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    /// Chemin stocké hors du dossier d'upload : impossible à mettre de côté
    async fn corrupt_file_path(db: &DatabaseConnection, document_id: i32) {
        documents::Entity::update_many()
            .col_expr(documents::Column::FilePath, sea_query::Expr::value("/uploads/../escape.png"))
            .filter(documents::Column::Id.eq(document_id))
            .exec(db)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_keeps_row_when_file_cannot_be_removed() {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        let alice = insert_user(&db, "alice", false).await;

        let doc = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), None)
            .await
            .unwrap();
        corrupt_file_path(&db, doc.id).await;

        let result = DocumentService::delete(&db, &storage, owner(&alice), doc.id).await;
        assert!(matches!(result, Err(AppError::Storage(_))));

        // La ligne est toujours là (rollback), avec sa référence intacte
        let current = DocumentService::get(&db, owner(&alice), doc.id).await.unwrap();
        assert_eq!(current.file_path.as_deref(), Some("/uploads/../escape.png"));
    }

    #[tokio::test]
    async fn test_update_keeps_state_when_old_file_cannot_be_staged() {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        let alice = insert_user(&db, "alice", false).await;

        let doc = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), None)
            .await
            .unwrap();
        corrupt_file_path(&db, doc.id).await;

        let mut fields = DocumentFields::sample();
        fields.doc_name = "Renamed".to_string();
        let result = DocumentService::update(&db, &storage, owner(&alice), doc.id, fields, Some(pdf(b"v2"))).await;
        assert!(matches!(result, Err(AppError::Storage(_))));

        let current = DocumentService::get(&db, owner(&alice), doc.id).await.unwrap();
        assert_eq!(current.doc_name, "My ID");
        assert_eq!(current.file_path.as_deref(), Some("/uploads/../escape.png"));
        // Le nouveau fichier n'est référencé par rien : il a été jeté
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_update_leaves_no_staged_files_behind() {
        let db = setup_test_db().await;
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        let alice = insert_user(&db, "alice", false).await;

        let doc = DocumentService::create(&db, &storage, alice.id, DocumentFields::sample(), Some(pdf(b"v1")))
            .await
            .unwrap();
        for version in [b"v2".as_slice(), b"v3".as_slice()] {
            DocumentService::update(&db, &storage, owner(&alice), doc.id, DocumentFields::sample(), Some(pdf(version)))
                .await
                .unwrap();
        }

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].starts_with('.'));
    }
}
