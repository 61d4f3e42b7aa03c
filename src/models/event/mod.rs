use async_graphql::{ComplexObject, Context, Enum, InputObject, Result, SimpleObject};
use serde::Serialize;
use sqlx::PgPool;

use crate::models::event::attendance::Attendance;
use crate::models::permissions::Caller;
use crate::models::{DateScalar, DateTimeScalar, TimeScalar};

pub mod attendance;

/// Where an event is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum, Serialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Only visible to the club's admin
    Draft,
    /// Open for registration
    Published,
    Cancelled,
    Completed,
}

/// A one-off activity run by a club
#[derive(SimpleObject, sqlx::FromRow, Clone, Debug)]
#[graphql(complex)]
pub struct Event {
    /// The ID of the event
    pub id: i64,
    /// The ID of the club running the event
    pub club_id: String,
    /// The name of the event
    pub title: String,
    /// General information or details about this event
    pub description: Option<String>,
    /// Where this event will be held
    pub location: Option<String>,
    /// The day the event happens on
    pub date: DateScalar,
    /// When the event starts
    pub start_time: TimeScalar,
    /// When the event ends
    pub end_time: TimeScalar,
    /// How many members may register, if limited
    pub capacity: Option<i32>,
    /// When registration closes, if ever
    pub registration_deadline: Option<DateTimeScalar>,
    /// Whether the event is visible and open
    pub status: EventStatus,
}

#[ComplexObject]
impl Event {
    /// How many members have registered
    pub async fn registered(&self, ctx: &Context<'_>) -> Result<i64> {
        let pool: &PgPool = ctx.data_unchecked();
        Attendance::registered_count(self.id, pool).await
    }

    /// The attendance for the current user at this event
    pub async fn user_attendance(&self, ctx: &Context<'_>) -> Result<Option<Attendance>> {
        let pool: &PgPool = ctx.data_unchecked();

        if let Some(caller) = ctx.data_opt::<Caller>() {
            Attendance::for_member_at_event_opt(&caller.user_id, self.id, pool).await
        } else {
            Ok(None)
        }
    }
}

const EVENT_COLUMNS: &str = "id, club_id, title, description, location, date, start_time, end_time,
     capacity, registration_deadline, status";

impl Event {
    pub async fn with_id(id: i64, pool: &PgPool) -> Result<Self> {
        Self::with_id_opt(id, pool)
            .await?
            .ok_or_else(|| format!("No event with id {}", id))
            .map_err(Into::into)
    }

    pub async fn with_id_opt(id: i64, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn for_club(club_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {} FROM events WHERE club_id = $1 ORDER BY date, start_time",
            EVENT_COLUMNS
        ))
        .bind(club_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn published_for_club(club_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {} FROM events WHERE club_id = $1 AND status = $2 ORDER BY date, start_time",
            EVENT_COLUMNS
        ))
        .bind(club_id)
        .bind(EventStatus::Published)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn create(club_id: &str, new_event: NewEvent, pool: &PgPool) -> Result<i64> {
        new_event.validate()?;

        sqlx::query_scalar::<_, i64>(
            "INSERT INTO events
                 (club_id, title, description, location, date, start_time, end_time,
                  capacity, registration_deadline, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING id",
        )
        .bind(club_id)
        .bind(new_event.title)
        .bind(new_event.description)
        .bind(new_event.location)
        .bind(new_event.date)
        .bind(new_event.start_time)
        .bind(new_event.end_time)
        .bind(new_event.capacity)
        .bind(new_event.registration_deadline)
        .bind(new_event.status.unwrap_or(EventStatus::Draft))
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update(id: i64, update: NewEvent, pool: &PgPool) -> Result<()> {
        update.validate()?;

        sqlx::query(
            "UPDATE events SET title = $1, description = $2, location = $3, date = $4,
                 start_time = $5, end_time = $6, capacity = $7, registration_deadline = $8,
                 status = $9
             WHERE id = $10",
        )
        .bind(update.title)
        .bind(update.description)
        .bind(update.location)
        .bind(update.date)
        .bind(update.start_time)
        .bind(update.end_time)
        .bind(update.capacity)
        .bind(update.registration_deadline)
        .bind(update.status.unwrap_or(EventStatus::Draft))
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn delete(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[derive(InputObject)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: DateScalar,
    pub start_time: TimeScalar,
    pub end_time: TimeScalar,
    pub capacity: Option<i32>,
    pub registration_deadline: Option<DateTimeScalar>,
    /// Defaults to a draft
    pub status: Option<EventStatus>,
}

impl NewEvent {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.title.trim().is_empty() {
            Err("Events must have a title".to_owned())
        } else if self.end_time <= self.start_time {
            Err("End time must be after start time".to_owned())
        } else if self.capacity.map(|capacity| capacity < 1).unwrap_or(false) {
            Err("Capacity must be at least 1".to_owned())
        } else {
            Ok(())
        }
    }
}
