// connexion BD + création des tables + admin par défaut

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Schema, Set,
};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{documents, users};
use crate::utils::password;

pub async fn establish_connection(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&config.database_url).await
}

/// Crée les tables depuis les entités si elles n'existent pas
/// (contraintes UNIQUE et clé étrangère documents.user_id incluses)
pub async fn init_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut users_table = schema.create_table_from_entity(users::Entity);
    users_table.if_not_exists();
    db.execute(backend.build(&users_table)).await?;

    let mut documents_table = schema.create_table_from_entity(documents::Entity);
    documents_table.if_not_exists();
    db.execute(backend.build(&documents_table)).await?;

    Ok(())
}

/// Crée le compte administrateur configuré s'il n'existe pas encore
pub async fn seed_default_admin(db: &DatabaseConnection, config: &AppConfig) -> Result<(), AppError> {
    let existing = users::Entity::find()
        .filter(users::Column::Username.eq(&config.admin.username))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let password_hash = password::hash_password(&config.admin.password, config.password_hash_iterations)?;

    users::ActiveModel {
        username: Set(config.admin.username.clone()),
        email: Set(config.admin.email.clone()),
        password_hash: Set(password_hash),
        full_name: Set(config.admin.full_name.clone()),
        iin: Set(None),
        is_admin: Set(true),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("default admin user '{}' created", config.admin.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{setup_test_db, test_config};
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let db = setup_test_db().await;
        init_schema(&db).await.unwrap();
    }

    #[tokio::test]
    async fn test_seed_admin_once() {
        let db = setup_test_db().await;
        let config = test_config(std::path::Path::new("uploads-test"));

        seed_default_admin(&db, &config).await.unwrap();
        seed_default_admin(&db, &config).await.unwrap();

        let admins = users::Entity::find()
            .filter(users::Column::IsAdmin.eq(true))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(admins, 1);
    }
}
