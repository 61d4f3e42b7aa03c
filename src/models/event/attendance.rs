use async_graphql::{ComplexObject, Context, Result, SimpleObject};
use sqlx::PgPool;

use crate::models::event::{Event, EVENT_COLUMNS};
use crate::models::permissions::{classify_registration, Decision, DenyReason};
use crate::models::profile::Profile;
use crate::util::{current_time, today};

/// Whether one member attended one session or event
#[derive(SimpleObject, sqlx::FromRow, Clone, Debug, PartialEq, Eq)]
#[graphql(complex)]
pub struct Attendance {
    /// Whether the member was confirmed present
    pub attended: bool,
    /// The session this record is for, if any
    pub session_id: Option<i64>,
    /// The event this record is for, if any
    pub event_id: Option<i64>,

    #[graphql(skip)]
    pub user_id: String,
}

/// The activity an attendance record belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActivityRef {
    Session(i64),
    Event(i64),
}

/// Why an attendance record can't be attributed to an activity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrityIssue {
    BothActivities,
    NoActivity,
}

#[ComplexObject]
impl Attendance {
    /// The member this attendance belongs to
    pub async fn member(&self, ctx: &Context<'_>) -> Result<Profile> {
        let pool: &PgPool = ctx.data_unchecked();
        Profile::with_id(&self.user_id, pool).await
    }
}

const ATTENDANCE_COLUMNS: &str = "user_id, session_id, event_id, attended";

impl Attendance {
    pub fn activity(&self) -> std::result::Result<ActivityRef, IntegrityIssue> {
        match (self.session_id, self.event_id) {
            (Some(session_id), None) => Ok(ActivityRef::Session(session_id)),
            (None, Some(event_id)) => Ok(ActivityRef::Event(event_id)),
            (Some(_), Some(_)) => Err(IntegrityIssue::BothActivities),
            (None, None) => Err(IntegrityIssue::NoActivity),
        }
    }

    pub fn integrity_issue(&self) -> Option<IntegrityIssue> {
        self.activity().err()
    }

    pub async fn for_session(session_id: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {} FROM attendance WHERE session_id = $1 ORDER BY user_id",
            ATTENDANCE_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn for_event(event_id: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {} FROM attendance WHERE event_id = $1 ORDER BY user_id",
            ATTENDANCE_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn for_member_at_event_opt(
        user_id: &str,
        event_id: i64,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {} FROM attendance WHERE user_id = $1 AND event_id = $2",
            ATTENDANCE_COLUMNS
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Every attendance row for the club's sessions and events
    pub async fn for_club(club_id: &str, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT a.user_id, a.session_id, a.event_id, a.attended
             FROM attendance a
             LEFT JOIN sessions s ON a.session_id = s.id
             LEFT JOIN events e ON a.event_id = e.id
             WHERE s.club_id = $1 OR e.club_id = $1",
        )
        .bind(club_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn registered_count(event_id: i64, pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Expects every current member of the club at a newly created session
    pub async fn create_for_new_session<'c, E>(
        session_id: i64,
        club_id: &str,
        executor: E,
    ) -> Result<u64>
    where
        E: sqlx::Executor<'c, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            "INSERT INTO attendance (user_id, session_id, attended)
             SELECT user_id, $1, false FROM memberships WHERE club_id = $2
             ON CONFLICT DO NOTHING",
        )
        .bind(session_id)
        .bind(club_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Expects a new member at all of the club's sessions from today on
    pub async fn create_for_new_member<'c, E>(
        user_id: &str,
        club_id: &str,
        executor: E,
    ) -> Result<u64>
    where
        E: sqlx::Executor<'c, Database = sqlx::Postgres>,
    {
        let result = sqlx::query(
            "INSERT INTO attendance (user_id, session_id, attended)
             SELECT $1, id, false FROM sessions WHERE club_id = $2 AND date >= $3
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(club_id)
        .bind(today())
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Registers the member for the event if it still has room.
    ///
    /// The event row stays locked until the insert commits, so two
    /// registrations racing for the last spot are decided one after the other.
    pub async fn register_for_event(
        event_id: i64,
        user_id: &str,
        pool: &PgPool,
    ) -> Result<Decision> {
        let mut tx = pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&mut tx)
        .await?;
        let event = match event {
            Some(event) => event,
            None => return Ok(Decision::Deny(DenyReason::NotFound)),
        };

        let registered =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut tx)
                .await?;

        let decision = classify_registration(
            current_time(),
            event.registration_deadline.map(|deadline| deadline.0),
            event.capacity,
            registered,
        );
        if !decision.is_allowed() {
            tx.rollback().await?;
            return Ok(decision);
        }

        let inserted = sqlx::query(
            "INSERT INTO attendance (user_id, event_id, attended) VALUES ($1, $2, false)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&mut tx)
        .await?;
        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(Decision::Deny(DenyReason::DuplicateRegistration));
        }

        tx.commit().await?;

        Ok(Decision::Allow)
    }

    pub async fn mark(
        activity: ActivityRef,
        user_id: &str,
        attended: bool,
        pool: &PgPool,
    ) -> Result<()> {
        let (column, activity_id) = match activity {
            ActivityRef::Session(id) => ("session_id", id),
            ActivityRef::Event(id) => ("event_id", id),
        };

        let result = sqlx::query(&format!(
            "UPDATE attendance SET attended = $1 WHERE user_id = $2 AND {} = $3",
            column
        ))
        .bind(attended)
        .bind(user_id)
        .bind(activity_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            Err(format!("No attendance for member {} at that activity", user_id).into())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(session_id: Option<i64>, event_id: Option<i64>) -> Attendance {
        Attendance {
            attended: true,
            session_id,
            event_id,
            user_id: "s-1".to_owned(),
        }
    }

    #[test]
    fn rows_belong_to_exactly_one_activity() {
        assert_eq!(row(Some(1), None).activity(), Ok(ActivityRef::Session(1)));
        assert_eq!(row(None, Some(2)).activity(), Ok(ActivityRef::Event(2)));
        assert_eq!(
            row(Some(1), Some(2)).integrity_issue(),
            Some(IntegrityIssue::BothActivities)
        );
        assert_eq!(
            row(None, None).integrity_issue(),
            Some(IntegrityIssue::NoActivity)
        );
    }
}
