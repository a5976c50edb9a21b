pub mod access_control;
pub mod admin_service;
pub mod document_service;
pub mod file_storage;
pub mod token_issuer;
pub mod user_service;
pub mod verification;
