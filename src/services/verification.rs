// ============================================================================
// VÉRIFICATION PUBLIQUE
// ============================================================================
//
// Description:
//   Projection d'un document pour un visiteur anonyme (porteur du lien QR)
//   et calcul du statut d'expiration partagé par toutes les vues.
//
// Points d'attention:
//   - PublicDocumentView est une liste BLANCHE : tout nouveau champ de
//     documents::Model reste privé tant qu'il n'est pas ajouté ici
//   - classify_expiry est l'unique implémentation des seuils (30 jours)
//
// ============================================================================

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{documents, users};

/// Fenêtre "expire bientôt", bornes incluses
pub const EXPIRING_SOON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    Valid,
}

/// expired si expiry < today, expiring_soon si today <= expiry <= today + 30j,
/// valid sinon, None sans date d'expiration
pub fn classify_expiry(expiry_date: Option<NaiveDate>, today: NaiveDate) -> Option<ExpiryStatus> {
    let expiry = expiry_date?;

    if expiry < today {
        Some(ExpiryStatus::Expired)
    } else if expiry <= today + Duration::days(EXPIRING_SOON_DAYS) {
        Some(ExpiryStatus::ExpiringSoon)
    } else {
        Some(ExpiryStatus::Valid)
    }
}

/// Vue publique d'un document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicDocumentView {
    pub doc_type: String,
    pub doc_number: String,
    pub doc_name: String,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub owner_name: String,
    pub expiry_status: Option<ExpiryStatus>,
}

pub fn project_for_public(
    document: &documents::Model,
    owner: &users::Model,
    today: NaiveDate,
) -> PublicDocumentView {
    PublicDocumentView {
        doc_type: document.doc_type.clone(),
        doc_number: document.doc_number.clone(),
        doc_name: document.doc_name.clone(),
        issue_date: document.issue_date,
        expiry_date: document.expiry_date,
        owner_name: owner.full_name.clone(),
        expiry_status: classify_expiry(document.expiry_date, today),
    }
}
