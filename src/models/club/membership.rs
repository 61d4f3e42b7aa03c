use async_graphql::{ComplexObject, Context, Result, SimpleObject};
use sqlx::PgPool;

use crate::models::event::attendance::Attendance;
use crate::models::profile::Profile;
use crate::models::DateTimeScalar;

/// A student's membership in a club
#[derive(SimpleObject, sqlx::FromRow, Clone, Debug)]
#[graphql(complex)]
pub struct Membership {
    /// The ID of the club
    pub club_id: String,
    /// When the student joined
    pub joined_at: DateTimeScalar,

    #[graphql(skip)]
    pub user_id: String,
}

#[ComplexObject]
impl Membership {
    /// The member's profile
    pub async fn member(&self, ctx: &Context<'_>) -> Result<Profile> {
        let pool: &PgPool = ctx.data_unchecked();
        Profile::with_id(&self.user_id, pool).await
    }
}

impl Membership {
    pub async fn for_club(club_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT m.user_id, m.club_id, m.joined_at
             FROM memberships m
             JOIN profiles p ON m.user_id = p.id
             WHERE m.club_id = $1
             ORDER BY p.full_name",
        )
        .bind(club_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn for_member(user_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT user_id, club_id, joined_at FROM memberships
             WHERE user_id = $1 ORDER BY joined_at",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_for_club(club_id: &str, pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM memberships WHERE club_id = $1")
            .bind(club_id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Adds the student to the club and expects them at its upcoming sessions
    pub async fn join(user_id: &str, club_id: &str, pool: &PgPool) -> Result<()> {
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO memberships (user_id, club_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(club_id)
        .execute(&mut tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(format!("Already a member of club {}", club_id).into());
        }

        let expected = Attendance::create_for_new_member(user_id, club_id, &mut tx).await?;
        tx.commit().await?;

        tracing::debug!(user_id, club_id, expected, "member joined club");

        Ok(())
    }

    /// Removes the member, keeping the attendance history they built up
    pub async fn leave(user_id: &str, club_id: &str, pool: &PgPool) -> Result<()> {
        let result = sqlx::query("DELETE FROM memberships WHERE user_id = $1 AND club_id = $2")
            .bind(user_id)
            .bind(club_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(format!("No member {} in club {}", user_id, club_id).into())
        } else {
            Ok(())
        }
    }

    /// Removes every trace of a club from the relational store.
    ///
    /// Attendance goes with the sessions and events through cascading deletes.
    pub async fn purge_club(club_id: &str, pool: &PgPool) -> Result<()> {
        let mut tx = pool.begin().await?;

        for statement in [
            "DELETE FROM memberships WHERE club_id = $1",
            "DELETE FROM sessions WHERE club_id = $1",
            "DELETE FROM events WHERE club_id = $1",
            "UPDATE profiles SET owned_club_id = NULL WHERE owned_club_id = $1",
        ] {
            sqlx::query(statement)
                .bind(club_id)
                .execute(&mut tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}
