//! Role-based access control for every mutating or sensitive operation.
//!
//! [`authorize`] is a pure decision over a [`Caller`], the [`Action`] they want to
//! perform, and the [`Target`] it would be performed on. Route handlers look up
//! the caller and the target, ask for a [`Decision`], and only then touch the
//! stores.

use async_graphql::Enum;
use serde::Serialize;
use time::OffsetDateTime;

use crate::models::event::EventStatus;

/// The role an account holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Enum, Serialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses and joins clubs, registers for events
    Student,
    /// Manages the single club they own
    CcaAdmin,
    /// Manages accounts and clubs
    SystemAdmin,
}

impl Role {
    /// Everything a role may ever do, before ownership or activity checks
    pub const fn capabilities(self) -> &'static [Action] {
        match self {
            Role::Student => STUDENT_ACTIONS,
            Role::CcaAdmin => CCA_ADMIN_ACTIONS,
            Role::SystemAdmin => SYSTEM_ADMIN_ACTIONS,
        }
    }

    pub fn can(self, action: Action) -> bool {
        self.capabilities().contains(&action)
    }
}

const STUDENT_ACTIONS: &[Action] = &[Action::RegisterEvent, Action::JoinClub, Action::LeaveClub];

const CCA_ADMIN_ACTIONS: &[Action] = &[
    Action::EditClub,
    Action::RemoveMember,
    Action::ViewClubMembers,
    Action::CreateSession,
    Action::EditSession,
    Action::DeleteSession,
    Action::CreateEvent,
    Action::EditEvent,
    Action::DeleteEvent,
    Action::MarkAttendance,
    Action::ViewClubAnalytics,
];

const SYSTEM_ADMIN_ACTIONS: &[Action] = &[
    Action::CreateClub,
    Action::EditClub,
    Action::DeleteClub,
    Action::ManageAccounts,
];

/// Who is making a request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
    /// Only ever set for club admins
    pub owned_club_id: Option<String>,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role, owned_club_id: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            owned_club_id: if role == Role::CcaAdmin {
                owned_club_id
            } else {
                None
            },
        }
    }

    pub fn owns(&self, club_id: &str) -> bool {
        self.owned_club_id.as_deref() == Some(club_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    CreateClub,
    EditClub,
    DeleteClub,
    JoinClub,
    LeaveClub,
    RemoveMember,
    ViewClubMembers,
    CreateSession,
    EditSession,
    DeleteSession,
    CreateEvent,
    EditEvent,
    DeleteEvent,
    RegisterEvent,
    MarkAttendance,
    ViewClubAnalytics,
    ManageAccounts,
}

/// What an action is performed on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target<'t> {
    /// Actions that don't touch an existing entity, e.g. creating a club
    Global,
    Club {
        club_id: &'t str,
    },
    Event {
        club_id: &'t str,
        status: EventStatus,
        /// Whether the caller already holds an attendance record for the event
        already_registered: bool,
    },
    /// The entity being acted on couldn't be found
    Missing,
}

impl<'t> Target<'t> {
    pub fn club(club_id: &'t str) -> Self {
        Target::Club { club_id }
    }

    pub fn club_id(&self) -> Option<&'t str> {
        match *self {
            Target::Club { club_id } | Target::Event { club_id, .. } => Some(club_id),
            Target::Global | Target::Missing => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Unauthenticated,
    ForbiddenRole,
    ForbiddenOwnership,
    DuplicateRegistration,
    DeadlinePassed,
    CapacityReached,
    NotFound,
}

impl DenyReason {
    pub const fn code(self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::ForbiddenRole => "forbidden_role",
            DenyReason::ForbiddenOwnership => "forbidden_ownership",
            DenyReason::DuplicateRegistration => "duplicate_registration",
            DenyReason::DeadlinePassed => "deadline_passed",
            DenyReason::CapacityReached => "capacity_reached",
            DenyReason::NotFound => "not_found",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

impl From<Result<(), DenyReason>> for Decision {
    fn from(result: Result<(), DenyReason>) -> Self {
        match result {
            Ok(()) => Decision::Allow,
            Err(reason) => Decision::Deny(reason),
        }
    }
}

/// Decides whether `caller` may perform `action` on `target`.
///
/// Checks run in a fixed order: authentication, role capability, target
/// existence, club ownership, then activity constraints for event registration.
/// Capacity and deadline are not known here; see [`classify_registration`].
pub fn authorize(caller: Option<&Caller>, action: Action, target: &Target<'_>) -> Decision {
    check(caller, action, target).into()
}

fn check(caller: Option<&Caller>, action: Action, target: &Target<'_>) -> Result<(), DenyReason> {
    let caller = caller.ok_or(DenyReason::Unauthenticated)?;

    if !caller.role.can(action) {
        return Err(DenyReason::ForbiddenRole);
    }

    if *target == Target::Missing {
        return Err(DenyReason::NotFound);
    }

    if caller.role == Role::CcaAdmin {
        match target.club_id() {
            Some(club_id) if caller.owns(club_id) => {}
            _ => return Err(DenyReason::ForbiddenOwnership),
        }
    }

    if action == Action::RegisterEvent {
        match *target {
            Target::Event {
                status,
                already_registered,
                ..
            } => {
                if status != EventStatus::Published {
                    return Err(DenyReason::NotFound);
                }
                if already_registered {
                    return Err(DenyReason::DuplicateRegistration);
                }
            }
            _ => return Err(DenyReason::NotFound),
        }
    }

    Ok(())
}

/// Classifies whether one more registration fits an event.
///
/// Evaluated by the registration write path while it holds the event row,
/// so the outcome is deterministic under concurrent registrations.
pub fn classify_registration(
    now: OffsetDateTime,
    deadline: Option<OffsetDateTime>,
    capacity: Option<i32>,
    registered: i64,
) -> Decision {
    if deadline.map(|deadline| now > deadline).unwrap_or(false) {
        Decision::Deny(DenyReason::DeadlinePassed)
    } else if capacity
        .map(|capacity| registered >= i64::from(capacity))
        .unwrap_or(false)
    {
        Decision::Deny(DenyReason::CapacityReached)
    } else {
        Decision::Allow
    }
}
