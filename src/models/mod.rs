// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque entité correspond à une table avec SeaORM.
//
// Liste des modules:
//   - users : Comptes (standard / administrateur)
//   - documents : Documents d'identité, avec jeton public optionnel
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//   - health : Health check API
//
// Points d'attention:
//   - Pas de SQL brut : les tables sont créées depuis les entités (db.rs)
//   - Le hash de mot de passe n'est jamais sérialisé
//
// ============================================================================

pub mod users;
pub mod documents;
pub mod dto;
pub mod health;
