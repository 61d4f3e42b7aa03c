use async_graphql::{Context, Object, Result};
use mongodb::Database;
use sqlx::PgPool;

use crate::graphql::guards::{club_target, ensure, event_target, session_target, LoggedIn};
use crate::models::analytics::ClubAnalytics;
use crate::models::club::membership::Membership;
use crate::models::club::Club;
use crate::models::event::attendance::Attendance;
use crate::models::event::Event;
use crate::models::permissions::{Action, Caller, Role, Target};
use crate::models::profile::Profile;
use crate::models::session::Session;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The currently logged in user
    pub async fn user<'c>(&self, ctx: &'c Context<'c>) -> Option<Profile> {
        ctx.data_opt::<Profile>().cloned()
    }

    /// Every club, ordered by name
    pub async fn clubs(&self, ctx: &Context<'_>) -> Result<Vec<Club>> {
        let database: &Database = ctx.data_unchecked();
        Club::all(database).await
    }

    pub async fn club(&self, ctx: &Context<'_>, id: String) -> Result<Club> {
        let database: &Database = ctx.data_unchecked();
        Club::with_id(&id, database).await
    }

    /// The club's regular sessions
    pub async fn sessions(&self, ctx: &Context<'_>, club_id: String) -> Result<Vec<Session>> {
        let pool: &PgPool = ctx.data_unchecked();
        Session::for_club(&club_id, pool).await
    }

    /// The club's events. Only the club's admin sees unpublished ones.
    pub async fn events(&self, ctx: &Context<'_>, club_id: String) -> Result<Vec<Event>> {
        let pool: &PgPool = ctx.data_unchecked();
        let runs_club = ctx
            .data_opt::<Caller>()
            .map(|caller| caller.owns(&club_id))
            .unwrap_or(false);

        if runs_club {
            Event::for_club(&club_id, pool).await
        } else {
            Event::published_for_club(&club_id, pool).await
        }
    }

    pub async fn members(&self, ctx: &Context<'_>, club_id: String) -> Result<Vec<Membership>> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&club_id, database).await?;
        ensure(ctx, Action::ViewClubMembers, &target)?;

        Membership::for_club(&club_id, pool).await
    }

    /// The clubs the current user has joined
    #[graphql(guard = "LoggedIn")]
    pub async fn my_clubs(&self, ctx: &Context<'_>) -> Result<Vec<Club>> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let caller = ctx.data_unchecked::<Caller>();

        let club_ids: Vec<String> = Membership::for_member(&caller.user_id, pool)
            .await?
            .into_iter()
            .map(|membership| membership.club_id)
            .collect();

        Club::with_ids(&club_ids, database).await
    }

    /// Attendance roll-ups and trends for a club
    pub async fn club_analytics(
        &self,
        ctx: &Context<'_>,
        club_id: String,
    ) -> Result<ClubAnalytics> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&club_id, database).await?;
        ensure(ctx, Action::ViewClubAnalytics, &target)?;

        ClubAnalytics::for_club(&club_id, pool).await
    }

    pub async fn session_attendance(
        &self,
        ctx: &Context<'_>,
        session_id: i64,
    ) -> Result<Vec<Attendance>> {
        let pool: &PgPool = ctx.data_unchecked();
        let session = Session::with_id_opt(session_id, pool).await?;
        ensure(ctx, Action::MarkAttendance, &session_target(&session))?;

        Attendance::for_session(session_id, pool).await
    }

    pub async fn event_attendance(
        &self,
        ctx: &Context<'_>,
        event_id: i64,
    ) -> Result<Vec<Attendance>> {
        let pool: &PgPool = ctx.data_unchecked();
        let event = Event::with_id_opt(event_id, pool).await?;
        ensure(ctx, Action::MarkAttendance, &event_target(&event))?;

        Attendance::for_event(event_id, pool).await
    }

    /// Every account, optionally only those with the given role
    pub async fn profiles(&self, ctx: &Context<'_>, role: Option<Role>) -> Result<Vec<Profile>> {
        let pool: &PgPool = ctx.data_unchecked();
        ensure(ctx, Action::ManageAccounts, &Target::Global)?;

        let profiles = Profile::all(pool).await?;
        Ok(match role {
            Some(role) => profiles
                .into_iter()
                .filter(|profile| profile.role == role)
                .collect(),
            None => profiles,
        })
    }
}
