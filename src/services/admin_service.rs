use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::*;

use crate::errors::AppError;
use crate::models::dto::{DocTypeCount, StatsResponse};
use crate::models::{documents, users};

pub struct AdminService;

impl AdminService {
    /// Tableau de bord : totaux + répartition par type de document
    pub async fn stats(db: &DatabaseConnection) -> Result<StatsResponse, AppError> {
        let total_users = users::Entity::find().count(db).await?;
        let total_documents = documents::Entity::find().count(db).await?;

        let mut doc_types: Vec<DocTypeCount> = documents::Entity::find()
            .select_only()
            .column(documents::Column::DocType)
            .column_as(SimpleExpr::from(Func::count(Expr::col(documents::Column::Id))), "count")
            .group_by(documents::Column::DocType)
            .into_model::<DocTypeCount>()
            .all(db)
            .await?;

        // Tri côté Rust : plus grand nombre d'abord, puis ordre alphabétique
        doc_types.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.doc_type.cmp(&b.doc_type)));

        Ok(StatsResponse {
            total_users,
            total_documents,
            doc_types,
        })
    }
}
