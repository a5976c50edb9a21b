// ============================================================================
// MODÈLE : USERS
// ============================================================================
//
// Colonnes de la table users:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - username (VARCHAR, UNIQUE, NOT NULL) - sensible à la casse
//   - email (VARCHAR, UNIQUE, NOT NULL)
//   - password (VARCHAR, NOT NULL) - hash PBKDF2, jamais exposé
//   - full_name (VARCHAR, NOT NULL)
//   - iin (VARCHAR(12), UNIQUE, NULL) - numéro d'identification national
//   - is_admin (BOOLEAN, DEFAULT FALSE)
//   - created_at (TIMESTAMP, NOT NULL) - immuable
//
// Points d'attention:
//   - La suppression d'un user supprime ses documents ET leurs fichiers
//     (fait par UserService::delete_user, pas par la BD)
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    #[serde(skip_serializing)]
    #[sea_orm(column_name = "password")]
    pub password_hash: String, // Format: pbkdf2:sha256:iterations$salt$hash

    pub full_name: String,

    #[sea_orm(unique)]
    pub iin: Option<String>,

    pub is_admin: bool,

    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::documents::Entity")]
    Documents,
}

impl Related<super::documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
