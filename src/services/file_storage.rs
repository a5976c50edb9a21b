// ============================================================================
// STOCKAGE DES FICHIERS UPLOADÉS
// ============================================================================
//
// Description:
//   Répertoire des fichiers joints aux documents. Les noms sont aléatoires
//   (file-<uuid>.<ext>) pour qu'on ne puisse pas les énumérer.
//
// Écriture:
//   fichier caché .tmp-<nom> => sync => rename atomique vers <nom>
//
// Suppression en deux temps (cohérence avec la ligne en BD):
//   1. stage_removal : rename vers .trash-<nom> (atomique)
//   2. commit BD OK  => finalize (unlink)
//      commit BD KO  => restore (rename inverse)
//
// Points d'attention:
//   - Formats acceptés : jpeg, jpg, png, pdf (extension ET type MIME)
//   - Un fichier déjà absent est considéré comme supprimé
//
// ============================================================================

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::AppError;

/// Préfixe des chemins publics stockés dans documents.file_path
pub const PUBLIC_PREFIX: &str = "/uploads/";

const ALLOWED_TYPES: [&str; 4] = ["jpeg", "jpg", "png", "pdf"];

/// Fichier reçu dans un formulaire multipart, pas encore écrit sur disque
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    max_bytes: usize,
}

/// Fichier mis de côté en attendant le commit de la suppression en BD
#[derive(Debug)]
pub struct StagedRemoval {
    original: PathBuf,
    staged: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::storage("create upload dir", e))
    }

    /// Valide puis écrit le fichier, retourne son chemin public (/uploads/<nom>)
    pub async fn save(&self, file: &UploadedFile) -> Result<String, AppError> {
        let extension = validate_upload(file, self.max_bytes)?;
        let name = format!("file-{}.{}", Uuid::new_v4(), extension);

        let tmp_path = self.root.join(format!(".tmp-{}", name));
        let final_path = self.root.join(&name);

        if let Err(e) = write_synced(&tmp_path, &file.data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(AppError::storage("write upload", e));
        }

        if let Err(e) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(AppError::storage("rename upload", e));
        }

        tracing::debug!("stored upload {} ({} bytes)", name, file.data.len());
        Ok(format!("{}{}", PUBLIC_PREFIX, name))
    }

    /// Suppression immédiate (nettoyage d'un fichier qu'aucune ligne ne référence)
    pub async fn remove(&self, public_path: &str) -> Result<(), AppError> {
        let path = self.resolve(public_path)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::storage("remove upload", e)),
        }
    }

    /// Met le fichier de côté ; None si le fichier n'existe déjà plus
    pub async fn stage_removal(&self, public_path: &str) -> Result<Option<StagedRemoval>, AppError> {
        let original = self.resolve(public_path)?;
        let file_name = original
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Storage(format!("invalid stored path {}", public_path)))?;
        let staged = self.root.join(format!(".trash-{}", file_name));

        match fs::rename(&original, &staged).await {
            Ok(()) => Ok(Some(StagedRemoval { original, staged })),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("stored file {} already missing", public_path);
                Ok(None)
            }
            Err(e) => Err(AppError::storage("stage upload removal", e)),
        }
    }

    /// Lecture d'un fichier servi sous /uploads/{filename}
    pub async fn read(&self, file_name: &str) -> Result<Vec<u8>, AppError> {
        if !is_public_name(file_name) {
            return Err(AppError::NotFound("File"));
        }

        match fs::read(self.root.join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound("File")),
            Err(e) => Err(AppError::storage("read upload", e)),
        }
    }

    pub fn path_of(&self, public_path: &str) -> Option<PathBuf> {
        self.resolve(public_path).ok()
    }

    fn resolve(&self, public_path: &str) -> Result<PathBuf, AppError> {
        match public_path.strip_prefix(PUBLIC_PREFIX) {
            Some(name) if is_public_name(name) => Ok(self.root.join(name)),
            _ => Err(AppError::Storage(format!("invalid stored path {}", public_path))),
        }
    }
}

impl StagedRemoval {
    /// Suppression définitive, après commit de la BD
    pub async fn finalize(self) {
        if let Err(e) = fs::remove_file(&self.staged).await {
            tracing::warn!("failed to purge {}: {}", self.staged.display(), e);
        }
    }

    /// Annulation : le fichier reprend sa place
    pub async fn restore(self) {
        if let Err(e) = fs::rename(&self.staged, &self.original).await {
            tracing::error!(
                "failed to restore {} to {}: {}",
                self.staged.display(),
                self.original.display(),
                e
            );
        }
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

/// Retourne l'extension normalisée si le fichier est accepté
fn validate_upload(file: &UploadedFile, max_bytes: usize) -> Result<String, AppError> {
    if file.data.len() > max_bytes {
        return Err(AppError::validation(
            format!("File exceeds the {} byte limit", max_bytes),
            "file",
        ));
    }

    let extension = Path::new(&file.original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let mime_ok = file
        .content_type
        .as_deref()
        .map(|m| ALLOWED_TYPES.iter().any(|t| m.to_ascii_lowercase().contains(t)))
        .unwrap_or(false);

    if !ALLOWED_TYPES.contains(&extension.as_str()) || !mime_ok {
        return Err(AppError::validation(
            "Only .jpeg, .jpg, .png and .pdf files are allowed",
            "file",
        ));
    }

    Ok(extension)
}

// Pas de séparateur, pas de fichier caché (.tmp-/.trash-)
fn is_public_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Type MIME à renvoyer pour un fichier servi
pub fn content_type_for(file_name: &str) -> &'static str {
    match Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            data: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_save_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);

        let public_path = storage.save(&png("scan.PNG")).await.unwrap();
        assert!(public_path.starts_with("/uploads/file-"));
        assert!(public_path.ends_with(".png"));

        let name = public_path.strip_prefix(PUBLIC_PREFIX).unwrap();
        assert_eq!(storage.read(name).await.unwrap(), png("x.png").data);

        // Aucun fichier temporaire ne traîne
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_bad_type_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 4);

        let mut exe = png("virus.exe");
        exe.data.truncate(2);
        let err = storage.save(&exe).await.unwrap_err();
        assert_eq!(err.field(), Some("file"));

        let err = storage.save(&png("big.png")).await.unwrap_err();
        assert_eq!(err.field(), Some("file"));

        let mut wrong_mime = png("doc.pdf");
        wrong_mime.content_type = Some("text/html".to_string());
        wrong_mime.data.truncate(2);
        assert!(storage.save(&wrong_mime).await.is_err());
    }

    #[tokio::test]
    async fn test_stage_finalize_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);

        let kept = storage.save(&png("a.png")).await.unwrap();
        let staged = storage.stage_removal(&kept).await.unwrap().unwrap();
        assert!(!storage.path_of(&kept).unwrap().exists());
        staged.restore().await;
        assert!(storage.path_of(&kept).unwrap().exists());

        let gone = storage.save(&png("b.png")).await.unwrap();
        storage.stage_removal(&gone).await.unwrap().unwrap().finalize().await;
        assert!(!storage.path_of(&gone).unwrap().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_counts_as_removed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);

        assert!(storage.stage_removal("/uploads/file-missing.png").await.unwrap().is_none());
        assert!(storage.remove("/uploads/file-missing.png").await.is_ok());
    }

    #[tokio::test]
    async fn test_read_rejects_traversal_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);

        assert!(matches!(storage.read("../etc/passwd").await, Err(AppError::NotFound(_))));
        assert!(matches!(storage.read(".trash-file-x.png").await, Err(AppError::NotFound(_))));
        assert!(storage.stage_removal("/etc/passwd").await.is_err());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("file-1.PDF"), "application/pdf");
        assert_eq!(content_type_for("file-1.jpg"), "image/jpeg");
        assert_eq!(content_type_for("file-1.bin"), "application/octet-stream");
    }
}
