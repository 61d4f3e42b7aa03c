use async_graphql::Result;
use sqlx::PgPool;

use crate::models::analytics::{aggregate, ClubAnalytics};
use crate::models::club::membership::Membership;
use crate::models::event::attendance::{Attendance, IntegrityIssue};
use crate::models::event::Event;
use crate::models::session::Session;

/// Everything needed to roll up a club's attendance
pub struct AnalyticsContext {
    pub member_count: i64,
    pub sessions: Vec<Session>,
    pub events: Vec<Event>,
    pub attendance: Vec<Attendance>,
}

impl AnalyticsContext {
    pub async fn for_club(club_id: &str, pool: &PgPool) -> Result<Self> {
        let (member_count, sessions, events, attendance) = tokio::try_join!(
            Membership::count_for_club(club_id, pool),
            Session::for_club(club_id, pool),
            Event::for_club(club_id, pool),
            Attendance::for_club(club_id, pool),
        )?;

        Ok(Self {
            member_count,
            sessions,
            events,
            attendance,
        })
    }

    pub fn malformed_rows(&self) -> impl Iterator<Item = (&Attendance, IntegrityIssue)> {
        self.attendance
            .iter()
            .filter_map(|row| row.integrity_issue().map(|issue| (row, issue)))
    }
}

impl ClubAnalytics {
    pub async fn for_club(club_id: &str, pool: &PgPool) -> Result<Self> {
        let context = AnalyticsContext::for_club(club_id, pool).await?;

        for (row, issue) in context.malformed_rows() {
            tracing::warn!(
                club_id,
                user_id = %row.user_id,
                session_id = ?row.session_id,
                event_id = ?row.event_id,
                ?issue,
                "skipping malformed attendance row"
            );
        }

        Ok(aggregate(
            context.member_count,
            &context.sessions,
            &context.events,
            &context.attendance,
        ))
    }
}
