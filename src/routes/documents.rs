use actix_multipart::{Field, Multipart};
use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{DocumentResponse, MessageResponse, QrCodeResponse};
use crate::services::access_control::{self, Requester};
use crate::services::document_service::{DocumentFields, DocumentService};
use crate::services::file_storage::{FileStorage, UploadedFile};
use crate::services::token_issuer::TokenIssuer;
use crate::services::verification;
use crate::utils::qr;

/// GET /api/documents - Mes documents (PROTÉGÉE)
#[get("")]
pub async fn list_documents(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    let documents: Vec<DocumentResponse> = DocumentService::list_for_owner(db.get_ref(), auth_user.user_id)
        .await?
        .into_iter()
        .map(|doc| DocumentResponse::from_model(doc, today))
        .collect();

    Ok(HttpResponse::Ok().json(documents))
}

/// POST /api/documents - Ajouter un document, multipart (PROTÉGÉE)
#[post("")]
pub async fn create_document(
    auth_user: AuthUser,
    payload: Multipart,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<FileStorage>,
) -> Result<HttpResponse, AppError> {
    let (fields, file) = read_document_form(payload, storage.max_bytes()).await?;

    let doc = DocumentService::create(db.get_ref(), storage.get_ref(), auth_user.user_id, fields, file).await?;
    Ok(HttpResponse::Created().json(DocumentResponse::from_model(doc, Utc::now().date_naive())))
}

/// GET /api/documents/public/{token} - Vérification anonyme (PUBLIC)
#[get("/public/{token}")]
pub async fn public_document(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let (doc, owner) = access_control::resolve_public_token(db.get_ref(), &path.into_inner()).await?;
    let view = verification::project_for_public(&doc, &owner, Utc::now().date_naive());

    Ok(HttpResponse::Ok().json(view))
}

/// GET /api/documents/{id} - Détail, propriétaire ou admin (PROTÉGÉE)
#[get("/{id}")]
pub async fn get_document(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let doc = DocumentService::get(db.get_ref(), Requester::from(&auth_user), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DocumentResponse::from_model(doc, Utc::now().date_naive())))
}

/// PUT /api/documents/{id} - Modifier, propriétaire uniquement (PROTÉGÉE)
#[put("/{id}")]
pub async fn update_document(
    auth_user: AuthUser,
    path: web::Path<i32>,
    payload: Multipart,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<FileStorage>,
) -> Result<HttpResponse, AppError> {
    let (fields, file) = read_document_form(payload, storage.max_bytes()).await?;

    let doc = DocumentService::update(
        db.get_ref(),
        storage.get_ref(),
        Requester::from(&auth_user),
        path.into_inner(),
        fields,
        file,
    )
    .await?;

    Ok(HttpResponse::Ok().json(DocumentResponse::from_model(doc, Utc::now().date_naive())))
}

/// DELETE /api/documents/{id} - Supprimer document + fichier (PROTÉGÉE)
#[delete("/{id}")]
pub async fn delete_document(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<FileStorage>,
) -> Result<HttpResponse, AppError> {
    DocumentService::delete(db.get_ref(), storage.get_ref(), Requester::from(&auth_user), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::ok("Document deleted successfully")))
}

/// GET /api/documents/{id}/qrcode - QR code du lien public (PROTÉGÉE)
/// Le jeton est créé au premier appel puis toujours réutilisé
#[get("/{id}/qrcode")]
pub async fn document_qrcode(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let doc = DocumentService::get_owned(db.get_ref(), Requester::from(&auth_user), path.into_inner()).await?;

    let token = TokenIssuer::ensure_public_token(db.get_ref(), &doc).await?;
    let public_url = config.public_url(&token);
    let qr_code = qr::encode_as_data_url(&public_url)?;

    Ok(HttpResponse::Ok().json(QrCodeResponse { qr_code, public_url }))
}

/// Taille max d'un champ texte du formulaire (doc_data compris)
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Lit le formulaire multipart : champs texte + partie "file" optionnelle
async fn read_document_form(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<(DocumentFields, Option<UploadedFile>), AppError> {
    let mut form = DocumentForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(invalid_form)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let original_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .unwrap_or_default()
                .to_string();
            let content_type = field.content_type().map(|m| m.to_string());

            let data = read_limited(&mut field, max_bytes)
                .await?
                .ok_or_else(|| AppError::validation(format!("File exceeds the {} byte limit", max_bytes), "file"))?;

            // Input fichier laissé vide par le navigateur
            if original_name.is_empty() && data.is_empty() {
                continue;
            }

            form.file = Some(UploadedFile {
                original_name,
                content_type,
                data,
            });
        } else {
            let bytes = read_limited(&mut field, MAX_TEXT_FIELD_BYTES).await?.ok_or_else(|| {
                AppError::validation(
                    format!("{} exceeds the {} byte limit", name, MAX_TEXT_FIELD_BYTES),
                    name.clone(),
                )
            })?;
            let value = String::from_utf8(bytes)
                .map_err(|_| AppError::validation("Field must be valid UTF-8", name.clone()))?;
            form.set(&name, value);
        }
    }

    Ok((form.take_fields()?, form.file))
}

/// Lit une partie du formulaire ; None dès que `limit` est dépassé
/// (on coupe court avant de tout garder en mémoire)
async fn read_limited(field: &mut Field, limit: usize) -> Result<Option<Vec<u8>>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(invalid_form)? {
        if data.len() + chunk.len() > limit {
            return Ok(None);
        }
        data.extend_from_slice(&chunk);
    }
    Ok(Some(data))
}

fn invalid_form(e: actix_multipart::MultipartError) -> AppError {
    AppError::Validation {
        message: format!("Invalid multipart body: {}", e),
        field: None,
    }
}

#[derive(Default)]
struct DocumentForm {
    doc_type: Option<String>,
    doc_number: Option<String>,
    doc_name: Option<String>,
    issue_date: Option<String>,
    expiry_date: Option<String>,
    doc_data: Option<String>,
    file: Option<UploadedFile>,
}

impl DocumentForm {
    fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "doc_type" => &mut self.doc_type,
            "doc_number" => &mut self.doc_number,
            "doc_name" => &mut self.doc_name,
            "issue_date" => &mut self.issue_date,
            "expiry_date" => &mut self.expiry_date,
            "doc_data" => &mut self.doc_data,
            _ => return,
        };
        *slot = Some(value);
    }

    fn take_fields(&mut self) -> Result<DocumentFields, AppError> {
        Ok(DocumentFields {
            doc_type: required(self.doc_type.take(), "doc_type")?,
            doc_number: required(self.doc_number.take(), "doc_number")?,
            doc_name: required(self.doc_name.take(), "doc_name")?,
            issue_date: parse_date(self.issue_date.take(), "issue_date")?,
            expiry_date: parse_date(self.expiry_date.take(), "expiry_date")?,
            doc_data: self.doc_data.take().filter(|v| !v.is_empty()),
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(format!("{} is required", field), field)),
    }
}

/// YYYY-MM-DD ; vide => absent
fn parse_date(value: Option<String>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::validation(format!("{} must be a YYYY-MM-DD date", field), field)),
    }
}

pub fn document_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/documents")
            .service(list_documents)
            .service(create_document)
            // avant /{id} pour ne pas être capturée par le paramètre
            .service(public_document)
            .service(document_qrcode)
            .service(get_document)
            .service(update_document)
            .service(delete_document)
    );
}
