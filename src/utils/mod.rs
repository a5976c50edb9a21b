pub mod jwt;
pub mod password;
pub mod public_token;
pub mod qr;
