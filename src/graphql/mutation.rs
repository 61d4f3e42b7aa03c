use async_graphql::{Context, Object, Result};
use mongodb::Database;
use sqlx::PgPool;

use crate::graphql::guards::{
    activity_club, club_target, deny_error, ensure, event_target, found, registration_target,
    session_target,
};
use crate::graphql::SUCCESS_MESSAGE;
use crate::models::club::membership::Membership;
use crate::models::club::{Club, NewClub};
use crate::models::event::attendance::{ActivityRef, Attendance};
use crate::models::event::{Event, NewEvent};
use crate::models::permissions::{Action, Role, Target};
use crate::models::profile::Profile;
use crate::models::session::{NewSession, Session};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Creates a club, optionally handing it to a club admin
    pub async fn create_club(
        &self,
        ctx: &Context<'_>,
        club: NewClub,
        admin_id: Option<String>,
    ) -> Result<Club> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        ensure(ctx, Action::CreateClub, &Target::Global)?;

        if let Some(admin_id) = &admin_id {
            Profile::with_id(admin_id, pool).await?;
        }

        let club = Club::create(club, database).await?;
        if let Some(admin_id) = admin_id {
            Profile::assign_club(&admin_id, &club.id.to_hex(), pool).await?;
        }

        tracing::info!(club_id = %club.id, name = %club.name, "created club");

        Ok(club)
    }

    pub async fn update_club(&self, ctx: &Context<'_>, id: String, club: NewClub) -> Result<Club> {
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&id, database).await?;
        ensure(ctx, Action::EditClub, &target)?;

        Club::update(&id, club, database).await
    }

    /// Deletes a club along with its members, sessions, events and attendance
    pub async fn delete_club(&self, ctx: &Context<'_>, id: String) -> Result<&'static str> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&id, database).await?;
        ensure(ctx, Action::DeleteClub, &target)?;

        found(Club::delete(&id, database).await?)?;
        Membership::purge_club(&id, pool).await?;

        tracing::info!(club_id = %id, "deleted club");

        Ok(SUCCESS_MESSAGE)
    }

    /// Makes the user the admin of the club, replacing any previous admin
    pub async fn assign_club_admin(
        &self,
        ctx: &Context<'_>,
        club_id: String,
        user_id: String,
    ) -> Result<Profile> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&club_id, database).await?;
        ensure(ctx, Action::ManageAccounts, &target)?;

        Profile::assign_club(&user_id, &club_id, pool).await?;
        Profile::with_id(&user_id, pool).await
    }

    pub async fn set_role(
        &self,
        ctx: &Context<'_>,
        user_id: String,
        role: Role,
    ) -> Result<Profile> {
        let pool: &PgPool = ctx.data_unchecked();
        ensure(ctx, Action::ManageAccounts, &Target::Global)?;

        Profile::set_role(&user_id, role, pool).await?;
        Profile::with_id(&user_id, pool).await
    }

    pub async fn join_club(&self, ctx: &Context<'_>, club_id: String) -> Result<&'static str> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&club_id, database).await?;
        let caller = ensure(ctx, Action::JoinClub, &target)?;

        Membership::join(&caller.user_id, &club_id, pool).await?;

        Ok(SUCCESS_MESSAGE)
    }

    pub async fn leave_club(&self, ctx: &Context<'_>, club_id: String) -> Result<&'static str> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&club_id, database).await?;
        let caller = ensure(ctx, Action::LeaveClub, &target)?;

        Membership::leave(&caller.user_id, &club_id, pool).await?;

        Ok(SUCCESS_MESSAGE)
    }

    pub async fn remove_member(
        &self,
        ctx: &Context<'_>,
        club_id: String,
        user_id: String,
    ) -> Result<&'static str> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&club_id, database).await?;
        ensure(ctx, Action::RemoveMember, &target)?;

        Membership::leave(&user_id, &club_id, pool).await?;

        Ok(SUCCESS_MESSAGE)
    }

    /// Schedules a session and expects all current members at it
    pub async fn create_session(
        &self,
        ctx: &Context<'_>,
        club_id: String,
        session: NewSession,
    ) -> Result<Session> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&club_id, database).await?;
        ensure(ctx, Action::CreateSession, &target)?;

        let id = Session::create(&club_id, session, pool).await?;
        Session::with_id(id, pool).await
    }

    pub async fn update_session(
        &self,
        ctx: &Context<'_>,
        id: i64,
        session: NewSession,
    ) -> Result<Session> {
        let pool: &PgPool = ctx.data_unchecked();
        let existing = Session::with_id_opt(id, pool).await?;
        ensure(ctx, Action::EditSession, &session_target(&existing))?;

        Session::update(id, session, pool).await?;
        Session::with_id(id, pool).await
    }

    pub async fn delete_session(&self, ctx: &Context<'_>, id: i64) -> Result<&'static str> {
        let pool: &PgPool = ctx.data_unchecked();
        let existing = Session::with_id_opt(id, pool).await?;
        ensure(ctx, Action::DeleteSession, &session_target(&existing))?;

        Session::delete(id, pool).await?;

        Ok(SUCCESS_MESSAGE)
    }

    pub async fn create_event(
        &self,
        ctx: &Context<'_>,
        club_id: String,
        event: NewEvent,
    ) -> Result<Event> {
        let pool: &PgPool = ctx.data_unchecked();
        let database: &Database = ctx.data_unchecked();
        let target = club_target(&club_id, database).await?;
        ensure(ctx, Action::CreateEvent, &target)?;

        let id = Event::create(&club_id, event, pool).await?;
        Event::with_id(id, pool).await
    }

    pub async fn update_event(&self, ctx: &Context<'_>, id: i64, event: NewEvent) -> Result<Event> {
        let pool: &PgPool = ctx.data_unchecked();
        let existing = Event::with_id_opt(id, pool).await?;
        ensure(ctx, Action::EditEvent, &event_target(&existing))?;

        Event::update(id, event, pool).await?;
        Event::with_id(id, pool).await
    }

    pub async fn delete_event(&self, ctx: &Context<'_>, id: i64) -> Result<&'static str> {
        let pool: &PgPool = ctx.data_unchecked();
        let existing = Event::with_id_opt(id, pool).await?;
        ensure(ctx, Action::DeleteEvent, &event_target(&existing))?;

        Event::delete(id, pool).await?;

        Ok(SUCCESS_MESSAGE)
    }

    /// Registers the current user for a published event
    pub async fn register_for_event(&self, ctx: &Context<'_>, event_id: i64) -> Result<Attendance> {
        let pool: &PgPool = ctx.data_unchecked();
        let event = Event::with_id_opt(event_id, pool).await?;
        let target = registration_target(ctx, &event, pool).await?;
        let caller = ensure(ctx, Action::RegisterEvent, &target)?;

        Attendance::register_for_event(event_id, &caller.user_id, pool)
            .await?
            .into_result()
            .map_err(deny_error)?;

        Attendance::for_member_at_event_opt(&caller.user_id, event_id, pool)
            .await?
            .ok_or_else(|| format!("No registration for event {}", event_id).into())
    }

    /// Confirms whether a member attended a session or an event
    pub async fn mark_attendance(
        &self,
        ctx: &Context<'_>,
        session_id: Option<i64>,
        event_id: Option<i64>,
        user_id: String,
        attended: bool,
    ) -> Result<&'static str> {
        let pool: &PgPool = ctx.data_unchecked();
        let activity = match (session_id, event_id) {
            (Some(session_id), None) => ActivityRef::Session(session_id),
            (None, Some(event_id)) => ActivityRef::Event(event_id),
            _ => return Err("Exactly one of sessionId and eventId must be given".into()),
        };

        let club_id = activity_club(activity, pool).await?;
        let target = club_id
            .as_deref()
            .map(Target::club)
            .unwrap_or(Target::Missing);
        ensure(ctx, Action::MarkAttendance, &target)?;

        Attendance::mark(activity, &user_id, attended, pool).await?;

        Ok(SUCCESS_MESSAGE)
    }
}
