use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use rand::Rng;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

const SALT_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;

/// Hash un mot de passe avec PBKDF2-HMAC-SHA256 et un salt de 16 bytes
/// Format: pbkdf2:sha256:iterations$salt$hash
pub fn hash_password(password: &str, iterations: u32) -> Result<String, AppError> {
    // Générer un salt aléatoire de 16 bytes
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill(&mut salt);

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut key)
        .map_err(|e| AppError::Internal(format!("PBKDF2 hash generation failed: {}", e)))?;

    let salt_b64 = URL_SAFE_NO_PAD.encode(salt);
    let hash_b64 = URL_SAFE_NO_PAD.encode(key);

    Ok(format!("pbkdf2:sha256:{}${}${}", iterations, salt_b64, hash_b64))
}

/// Vérifie un mot de passe contre un hash stocké
/// Les itérations sont relues dans le hash (un changement de config ne casse pas les anciens comptes)
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let invalid = || AppError::Internal("Invalid password hash format".to_string());

    let mut parts = stored_hash.split('$');
    let (header, salt_str, hash_str) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(s), Some(k), None) => (h, s, k),
        _ => return Err(invalid()),
    };

    let iterations = match header.split(':').collect::<Vec<_>>().as_slice() {
        ["pbkdf2", "sha256", iterations] => iterations.parse::<u32>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    let salt = URL_SAFE_NO_PAD.decode(salt_str).map_err(|_| invalid())?;
    let expected_hash = URL_SAFE_NO_PAD.decode(hash_str).map_err(|_| invalid())?;

    let mut computed = vec![0u8; expected_hash.len()];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut computed)
        .map_err(|e| AppError::Internal(format!("PBKDF2 hash verification failed: {}", e)))?;

    // Comparaison en temps constant (évite les timing attacks)
    Ok(computed.ct_eq(&expected_hash).into())
}
