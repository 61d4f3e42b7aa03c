use async_graphql::{ComplexObject, Context, InputObject, Result, SimpleObject};
use sqlx::PgPool;

use crate::models::event::attendance::Attendance;
use crate::models::{DateScalar, TimeScalar};

/// One meeting of a club's regular schedule
#[derive(SimpleObject, sqlx::FromRow, Clone, Debug)]
#[graphql(complex)]
pub struct Session {
    /// The ID of the session
    pub id: i64,
    /// The ID of the club meeting
    pub club_id: String,
    /// An optional name for the session
    pub title: Option<String>,
    /// The day of the meeting
    pub date: DateScalar,
    /// When the meeting starts
    pub start_time: TimeScalar,
    /// When the meeting ends
    pub end_time: TimeScalar,
    /// Where the meeting is held
    pub location: Option<String>,
}

#[ComplexObject]
impl Session {
    /// How many members are expected
    pub async fn expected(&self, ctx: &Context<'_>) -> Result<usize> {
        let pool: &PgPool = ctx.data_unchecked();
        Ok(Attendance::for_session(self.id, pool).await?.len())
    }
}

impl Session {
    pub const DEFAULT_TITLE: &'static str = "Session";

    /// The title to show, falling back to a generic one
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(Self::DEFAULT_TITLE)
    }

    pub async fn with_id(id: i64, pool: &PgPool) -> Result<Self> {
        Self::with_id_opt(id, pool)
            .await?
            .ok_or_else(|| format!("No session with id {}", id))
            .map_err(Into::into)
    }

    pub async fn with_id_opt(id: i64, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, club_id, title, date, start_time, end_time, location
             FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn for_club(club_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, club_id, title, date, start_time, end_time, location
             FROM sessions WHERE club_id = $1 ORDER BY date, start_time",
        )
        .bind(club_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Creates the session and expects every current member to attend it
    pub async fn create(club_id: &str, new_session: NewSession, pool: &PgPool) -> Result<i64> {
        new_session.validate()?;

        let mut tx = pool.begin().await?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO sessions (club_id, title, date, start_time, end_time, location)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(club_id)
        .bind(new_session.title)
        .bind(new_session.date)
        .bind(new_session.start_time)
        .bind(new_session.end_time)
        .bind(new_session.location)
        .fetch_one(&mut tx)
        .await?;

        let expected = Attendance::create_for_new_session(id, club_id, &mut tx).await?;
        tx.commit().await?;

        tracing::debug!(session_id = id, club_id, expected, "created session");

        Ok(id)
    }

    pub async fn update(id: i64, update: NewSession, pool: &PgPool) -> Result<()> {
        update.validate()?;

        sqlx::query(
            "UPDATE sessions SET title = $1, date = $2, start_time = $3, end_time = $4,
                 location = $5
             WHERE id = $6",
        )
        .bind(update.title)
        .bind(update.date)
        .bind(update.start_time)
        .bind(update.end_time)
        .bind(update.location)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn delete(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[derive(InputObject)]
pub struct NewSession {
    pub title: Option<String>,
    pub date: DateScalar,
    pub start_time: TimeScalar,
    pub end_time: TimeScalar,
    pub location: Option<String>,
}

impl NewSession {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.end_time <= self.start_time {
            Err("End time must be after start time".to_owned())
        } else {
            Ok(())
        }
    }
}
