use sea_orm::*;

use crate::errors::AppError;
use crate::models::{documents, users};
use crate::services::file_storage::{FileStorage, StagedRemoval};
use crate::utils::password;

pub struct UserService;

/// Candidat à la création (inscription ou création par un admin)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub iin: Option<String>,
    pub is_admin: bool,
}

/// Modification complète par un admin ; password None => inchangé
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub full_name: String,
    pub iin: Option<String>,
    pub is_admin: bool,
}

/// Champs interrogeables via GET /api/auth/check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    Iin,
}

impl UniqueField {
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "username" => Some(UniqueField::Username),
            "email" => Some(UniqueField::Email),
            "iin" => Some(UniqueField::Iin),
            _ => None,
        }
    }

    fn column(self) -> users::Column {
        match self {
            UniqueField::Username => users::Column::Username,
            UniqueField::Email => users::Column::Email,
            UniqueField::Iin => users::Column::Iin,
        }
    }

    fn name(self) -> &'static str {
        match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
            UniqueField::Iin => "iin",
        }
    }

    fn conflict(self) -> AppError {
        let message = match self {
            UniqueField::Username => "Username already exists",
            UniqueField::Email => "Email already exists",
            UniqueField::Iin => "IIN already exists",
        };
        AppError::Conflict {
            message: message.to_string(),
            field: self.name(),
        }
    }
}

/// IIN : vide => absent, sinon exactement 12 chiffres
pub fn normalize_iin(iin: Option<String>) -> Result<Option<String>, AppError> {
    match iin.map(|v| v.trim().to_string()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if v.len() == 12 && v.chars().all(|c| c.is_ascii_digit()) => Ok(Some(v)),
        Some(_) => Err(AppError::validation("IIN must be exactly 12 digits", "iin")),
    }
}

impl UserService {
    /// Crée un compte ; Conflict sur le premier champ déjà pris
    /// (ordre fixe : username, email, iin)
    pub async fn create_user(
        db: &DatabaseConnection,
        hash_iterations: u32,
        candidate: NewUser,
    ) -> Result<users::Model, AppError> {
        let iin = normalize_iin(candidate.iin)?;

        if let Some(conflict) =
            Self::find_conflict(db, &candidate.username, &candidate.email, iin.as_deref(), None).await?
        {
            return Err(conflict);
        }

        let password_hash = password::hash_password(&candidate.password, hash_iterations)?;

        let new_user = users::ActiveModel {
            username: Set(candidate.username.clone()),
            email: Set(candidate.email.clone()),
            password_hash: Set(password_hash),
            full_name: Set(candidate.full_name),
            iin: Set(iin.clone()),
            is_admin: Set(candidate.is_admin),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        match new_user.insert(db).await {
            Ok(user) => {
                tracing::info!("user '{}' created (id {})", user.username, user.id);
                Ok(user)
            }
            // Course entre la vérification et l'insert : la contrainte UNIQUE tranche
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                let conflict = Self::find_conflict(db, &candidate.username, &candidate.email, iin.as_deref(), None)
                    .await?
                    .unwrap_or(AppError::Conflict {
                        message: "User already exists".to_string(),
                        field: "username",
                    });
                Err(conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sonde username, email puis iin ; `exclude_id` ignore le compte modifié
    async fn find_conflict<C: ConnectionTrait>(
        conn: &C,
        username: &str,
        email: &str,
        iin: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<Option<AppError>, AppError> {
        let mut checks = vec![(UniqueField::Username, username), (UniqueField::Email, email)];
        if let Some(iin) = iin {
            checks.push((UniqueField::Iin, iin));
        }

        for (field, value) in checks {
            let mut query = users::Entity::find().filter(field.column().eq(value));
            if let Some(id) = exclude_id {
                query = query.filter(users::Column::Id.ne(id));
            }
            if query.one(conn).await?.is_some() {
                return Ok(Some(field.conflict()));
            }
        }

        Ok(None)
    }

    pub async fn exists(db: &DatabaseConnection, field: UniqueField, value: &str) -> Result<bool, AppError> {
        let found = users::Entity::find()
            .filter(field.column().eq(value))
            .one(db)
            .await?;
        Ok(found.is_some())
    }

    /// Même erreur pour user inconnu et mauvais mot de passe
    pub async fn find_by_credentials(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
    ) -> Result<users::Model, AppError> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(db)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !password::verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<users::Model, AppError> {
        users::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<users::Model>, AppError> {
        Ok(users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(db)
            .await?)
    }

    /// PUT /api/users/me : full_name + email (email unique hors soi-même)
    pub async fn update_profile(
        db: &DatabaseConnection,
        user_id: i32,
        full_name: String,
        email: String,
    ) -> Result<users::Model, AppError> {
        let user = Self::find_by_id(db, user_id).await?;

        let taken = users::Entity::find()
            .filter(users::Column::Email.eq(&email))
            .filter(users::Column::Id.ne(user_id))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(UniqueField::Email.conflict());
        }

        let mut active: users::ActiveModel = user.into();
        active.full_name = Set(full_name);
        active.email = Set(email);
        Ok(active.update(db).await?)
    }

    pub async fn change_password(
        db: &DatabaseConnection,
        hash_iterations: u32,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = Self::find_by_id(db, user_id).await?;

        if !password::verify_password(current_password, &user.password_hash)? {
            return Err(AppError::validation("Current password is incorrect", "current_password"));
        }

        let new_hash = password::hash_password(new_password, hash_iterations)?;
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.update(db).await?;

        tracing::info!("password changed for user {}", user_id);
        Ok(())
    }

    /// PUT /api/admin/users/{id}
    /// Un admin ne peut pas se retirer lui-même le rôle admin
    pub async fn admin_update_user(
        db: &DatabaseConnection,
        hash_iterations: u32,
        acting_admin_id: i32,
        user_id: i32,
        changes: UserChanges,
    ) -> Result<users::Model, AppError> {
        let user = Self::find_by_id(db, user_id).await?;

        if user_id == acting_admin_id && user.is_admin && !changes.is_admin {
            return Err(AppError::validation("You cannot remove your own administrator rights", "is_admin"));
        }

        let iin = normalize_iin(changes.iin)?;
        if let Some(conflict) =
            Self::find_conflict(db, &changes.username, &changes.email, iin.as_deref(), Some(user_id)).await?
        {
            return Err(conflict);
        }

        let mut active: users::ActiveModel = user.into();
        active.username = Set(changes.username);
        active.email = Set(changes.email);
        active.full_name = Set(changes.full_name);
        active.iin = Set(iin);
        active.is_admin = Set(changes.is_admin);
        if let Some(new_password) = changes.password.filter(|p| !p.is_empty()) {
            active.password_hash = Set(password::hash_password(&new_password, hash_iterations)?);
        }

        let updated = active.update(db).await?;
        tracing::info!("user {} updated by admin {}", user_id, acting_admin_id);
        Ok(updated)
    }

    /// Supprime un compte, ses documents et leurs fichiers (tout ou rien)
    pub async fn delete_user(
        db: &DatabaseConnection,
        storage: &FileStorage,
        acting_admin_id: i32,
        user_id: i32,
    ) -> Result<(), AppError> {
        if user_id == acting_admin_id {
            return Err(AppError::Validation {
                message: "You cannot delete your own account".to_string(),
                field: None,
            });
        }

        let txn = db.begin().await?;

        users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound("User"))?;

        let owned = documents::Entity::find()
            .filter(documents::Column::OwnerId.eq(user_id))
            .lock_exclusive()
            .all(&txn)
            .await?;

        // 1. Mettre les fichiers de côté (si un seul échoue, on annule tout)
        let mut staged: Vec<StagedRemoval> = Vec::new();
        for doc in &owned {
            let Some(path) = doc.file_path.as_deref() else { continue };
            match storage.stage_removal(path).await {
                Ok(Some(removal)) => staged.push(removal),
                Ok(None) => {}
                Err(e) => {
                    for removal in staged {
                        removal.restore().await;
                    }
                    return Err(e);
                }
            }
        }

        // 2. Supprimer documents puis user, dans la même transaction
        let outcome = async {
            documents::Entity::delete_many()
                .filter(documents::Column::OwnerId.eq(user_id))
                .exec(&txn)
                .await?;
            users::Entity::delete_by_id(user_id).exec(&txn).await?;
            Ok::<_, DbErr>(())
        }
        .await;

        let outcome = match outcome {
            Ok(()) => txn.commit().await,
            Err(e) => Err(e),
        };

        // 3. Finaliser ou restaurer les fichiers selon le résultat BD
        match outcome {
            Ok(()) => {
                for removal in staged {
                    removal.finalize().await;
                }
                tracing::info!(
                    "user {} deleted by admin {} ({} documents)",
                    user_id,
                    acting_admin_id,
                    owned.len()
                );
                Ok(())
            }
            Err(e) => {
                for removal in staged {
                    removal.restore().await;
                }
                Err(e.into())
            }
        }
    }
}
