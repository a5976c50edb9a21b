use actix_web::{HttpResponse, get, web};

use crate::errors::AppError;
use crate::services::file_storage::{FileStorage, content_type_for};

/// GET /uploads/{filename} - Fichiers joints (PUBLIC, noms aléatoires)
#[get("/uploads/{filename}")]
pub async fn serve_upload(
    path: web::Path<String>,
    storage: web::Data<FileStorage>,
) -> Result<HttpResponse, AppError> {
    let file_name = path.into_inner();
    let bytes = storage.read(&file_name).await?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&file_name))
        .body(bytes))
}
