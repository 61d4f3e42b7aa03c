use async_graphql::{Context, ErrorExtensions, Guard, Result};
use mongodb::Database;
use sqlx::PgPool;

use crate::models::club::Club;
use crate::models::event::attendance::{ActivityRef, Attendance};
use crate::models::event::Event;
use crate::models::permissions::{authorize, Action, Caller, DenyReason, Target};
use crate::models::session::Session;

pub struct LoggedIn;

#[async_trait::async_trait]
impl Guard for LoggedIn {
    async fn check(&self, ctx: &Context<'_>) -> Result<()> {
        if ctx.data_opt::<Caller>().is_some() {
            Ok(())
        } else {
            Err(deny_error(DenyReason::Unauthenticated))
        }
    }
}

pub fn deny_message(reason: DenyReason) -> &'static str {
    match reason {
        DenyReason::Unauthenticated => "User must be logged in",
        DenyReason::ForbiddenRole => "Your role does not allow this",
        DenyReason::ForbiddenOwnership => "You can only manage the club you run",
        DenyReason::NotFound => "Not found",
        DenyReason::DuplicateRegistration => "Already registered for this event",
        DenyReason::DeadlinePassed => "Registration for this event has closed",
        DenyReason::CapacityReached => "This event is full",
    }
}

pub fn deny_status(reason: DenyReason) -> u16 {
    match reason {
        DenyReason::Unauthenticated => 401,
        DenyReason::ForbiddenRole | DenyReason::ForbiddenOwnership => 403,
        DenyReason::NotFound => 404,
        DenyReason::DuplicateRegistration
        | DenyReason::DeadlinePassed
        | DenyReason::CapacityReached => 400,
    }
}

pub fn deny_error(reason: DenyReason) -> async_graphql::Error {
    async_graphql::Error::new(deny_message(reason)).extend_with(|_, extensions| {
        extensions.set("code", reason.code());
        extensions.set("status", deny_status(reason));
    })
}

/// Turns a delete that matched nothing into a `not_found` error
pub fn found(deleted: bool) -> Result<()> {
    if deleted {
        Ok(())
    } else {
        Err(deny_error(DenyReason::NotFound))
    }
}

/// Authorizes the current caller, returning them if allowed
pub fn ensure<'c>(ctx: &Context<'c>, action: Action, target: &Target<'_>) -> Result<&'c Caller> {
    let caller = ctx.data_opt::<Caller>();
    authorize(caller, action, target)
        .into_result()
        .map_err(deny_error)?;

    caller.ok_or_else(|| deny_error(DenyReason::Unauthenticated))
}

pub async fn club_target<'t>(club_id: &'t str, database: &Database) -> Result<Target<'t>> {
    Ok(match Club::with_id_opt(club_id, database).await? {
        Some(_) => Target::club(club_id),
        None => Target::Missing,
    })
}

pub fn session_target(session: &Option<Session>) -> Target<'_> {
    session
        .as_ref()
        .map(|session| Target::club(&session.club_id))
        .unwrap_or(Target::Missing)
}

pub fn event_target(event: &Option<Event>) -> Target<'_> {
    event
        .as_ref()
        .map(|event| Target::club(&event.club_id))
        .unwrap_or(Target::Missing)
}

/// The club an attendance record's activity belongs to
pub async fn activity_club(activity: ActivityRef, pool: &PgPool) -> Result<Option<String>> {
    Ok(match activity {
        ActivityRef::Session(id) => Session::with_id_opt(id, pool)
            .await?
            .map(|session| session.club_id),
        ActivityRef::Event(id) => Event::with_id_opt(id, pool).await?.map(|event| event.club_id),
    })
}

/// Builds the target for registering the caller at an event
pub async fn registration_target<'e>(
    ctx: &Context<'_>,
    event: &'e Option<Event>,
    pool: &PgPool,
) -> Result<Target<'e>> {
    let event = match event {
        Some(event) => event,
        None => return Ok(Target::Missing),
    };
    let already_registered = match ctx.data_opt::<Caller>() {
        Some(caller) => Attendance::for_member_at_event_opt(&caller.user_id, event.id, pool)
            .await?
            .is_some(),
        None => false,
    };

    Ok(Target::Event {
        club_id: &event.club_id,
        status: event.status,
        already_registered,
    })
}
