use rand::RngCore;
use rand::rngs::OsRng;

/// 16 octets = 128 bits d'entropie
const TOKEN_BYTES: usize = 16;

/// Génère un jeton public (32 caractères hex) depuis le RNG de l'OS
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
