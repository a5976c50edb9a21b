// ============================================================================
// MODÈLE : DOCUMENTS
// ============================================================================
//
// Colonnes de la table documents:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - user_id (INTEGER, NOT NULL, FK vers users) - propriétaire, immuable
//   - doc_type (VARCHAR, NOT NULL) - "ID card", "Student card", ...
//   - doc_number (VARCHAR, NOT NULL)
//   - doc_name (VARCHAR, NOT NULL)
//   - issue_date (DATE, NULL)
//   - expiry_date (DATE, NULL)
//   - doc_data (TEXT, NULL) - privé, jamais dans la vue publique
//   - file_path (VARCHAR, NULL) - "/uploads/file-<uuid>.<ext>"
//   - public_token (VARCHAR, UNIQUE, NULL) - jeton de vérification publique
//   - created_at (TIMESTAMP, NOT NULL)
//
// Workflow du jeton public:
//   1. Document créé sans jeton
//   2. Premier GET /api/documents/{id}/qrcode => TokenIssuer génère 16 octets
//      aléatoires (hex) et les enregistre
//   3. Appels suivants => même jeton (idempotent)
//   4. GET /api/documents/public/{token} => vue réduite, sans authentification
//
// Points d'attention:
//   - Une fois posé, public_token ne change plus (pas de rotation, pas d'expiration)
//   - owner_id est mappé sur la colonne user_id
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[serde(rename = "user_id")]
    #[sea_orm(column_name = "user_id")]
    pub owner_id: i32,

    pub doc_type: String,
    pub doc_number: String,
    pub doc_name: String,
    pub issue_date: Option<Date>,
    pub expiry_date: Option<Date>,

    #[sea_orm(column_type = "Text", nullable)]
    pub doc_data: Option<String>,

    pub file_path: Option<String>,

    #[sea_orm(unique)]
    pub public_token: Option<String>,

    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id"
    )]
    Owner,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
