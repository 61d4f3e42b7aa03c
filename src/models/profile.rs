use async_graphql::{Result, SimpleObject};
use sqlx::PgPool;

use crate::models::permissions::{Caller, Role};

/// An account, as provisioned by the identity provider
#[derive(SimpleObject, sqlx::FromRow, Clone, Debug)]
pub struct Profile {
    /// The opaque ID of the user
    pub id: String,
    /// The user's email
    pub email: String,
    /// The user's full name
    pub full_name: String,
    /// What the user is allowed to do
    pub role: Role,
    /// The club the user administers, if they are a club admin
    pub owned_club_id: Option<String>,
}

impl Profile {
    pub fn caller(&self) -> Caller {
        Caller::new(self.id.clone(), self.role, self.owned_club_id.clone())
    }

    pub async fn with_id(id: &str, pool: &PgPool) -> Result<Self> {
        Self::with_id_opt(id, pool)
            .await?
            .ok_or_else(|| format!("No user with id {}", id).into())
    }

    pub async fn with_id_opt(id: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, email, full_name, role, owned_club_id FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Resolves an API token issued by the identity provider
    pub async fn with_token_opt(token: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT p.id, p.email, p.full_name, p.role, p.owned_club_id
             FROM profiles p
             JOIN auth_tokens t ON t.user_id = p.id
             WHERE t.token = $1",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn all(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, email, full_name, role, owned_club_id FROM profiles ORDER BY full_name",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn admin_of_club(club_id: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, email, full_name, role, owned_club_id FROM profiles
             WHERE role = $1 AND owned_club_id = $2",
        )
        .bind(Role::CcaAdmin)
        .bind(club_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Changes a user's role, dropping any club they owned
    pub async fn set_role(id: &str, role: Role, pool: &PgPool) -> Result<()> {
        let result =
            sqlx::query("UPDATE profiles SET role = $1, owned_club_id = NULL WHERE id = $2")
                .bind(role)
                .bind(id)
                .execute(pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(format!("No user with id {}", id).into());
        }

        Ok(())
    }

    /// Makes the user the club's only admin
    pub async fn assign_club(id: &str, club_id: &str, pool: &PgPool) -> Result<()> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE profiles SET owned_club_id = NULL WHERE owned_club_id = $1")
            .bind(club_id)
            .execute(&mut tx)
            .await?;
        let result =
            sqlx::query("UPDATE profiles SET role = $1, owned_club_id = $2 WHERE id = $3")
                .bind(Role::CcaAdmin)
                .bind(club_id)
                .bind(id)
                .execute(&mut tx)
                .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(format!("No user with id {}", id).into());
        }

        tx.commit().await?;

        Ok(())
    }
}
