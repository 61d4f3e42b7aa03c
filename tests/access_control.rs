use cca_hub::models::event::EventStatus;
use cca_hub::models::permissions::{
    authorize, classify_registration, Action, Caller, Decision, DenyReason, Role, Target,
};
use time::macros::datetime;

const CLUB_A: &str = "650000000000000000000001";
const CLUB_B: &str = "650000000000000000000002";

fn student() -> Caller {
    Caller::new("student", Role::Student, None)
}

fn admin_of(club_id: &str) -> Caller {
    Caller::new("cca-admin", Role::CcaAdmin, Some(club_id.to_owned()))
}

fn system_admin() -> Caller {
    Caller::new("system-admin", Role::SystemAdmin, None)
}

fn event(status: EventStatus, already_registered: bool) -> Target<'static> {
    Target::Event {
        club_id: CLUB_A,
        status,
        already_registered,
    }
}

#[test]
fn nobody_logged_in_is_unauthenticated() {
    assert_eq!(
        authorize(None, Action::RegisterEvent, &event(EventStatus::Published, false)),
        Decision::Deny(DenyReason::Unauthenticated)
    );
    assert_eq!(
        authorize(None, Action::CreateClub, &Target::Global),
        Decision::Deny(DenyReason::Unauthenticated)
    );
}

#[test]
fn students_register_but_never_create_events() {
    assert_eq!(
        authorize(Some(&student()), Action::CreateEvent, &Target::club(CLUB_A)),
        Decision::Deny(DenyReason::ForbiddenRole)
    );
    assert_eq!(
        authorize(
            Some(&student()),
            Action::RegisterEvent,
            &event(EventStatus::Published, false)
        ),
        Decision::Allow
    );
}

#[test]
fn club_admins_create_sessions_only_for_their_club() {
    let admin = admin_of(CLUB_A);

    assert_eq!(
        authorize(Some(&admin), Action::CreateSession, &Target::club(CLUB_A)),
        Decision::Allow
    );
    assert_eq!(
        authorize(Some(&admin), Action::CreateSession, &Target::club(CLUB_B)),
        Decision::Deny(DenyReason::ForbiddenOwnership)
    );
}

#[test]
fn system_admins_manage_clubs_but_not_attendance() {
    let admin = system_admin();

    for action in [Action::CreateClub, Action::ManageAccounts] {
        assert!(authorize(Some(&admin), action, &Target::Global).is_allowed());
    }
    for action in [Action::EditClub, Action::DeleteClub] {
        assert!(authorize(Some(&admin), action, &Target::club(CLUB_B)).is_allowed());
    }
    assert_eq!(
        authorize(Some(&admin), Action::ViewClubAnalytics, &Target::club(CLUB_A)),
        Decision::Deny(DenyReason::ForbiddenRole)
    );
}

#[test]
fn registering_twice_is_a_duplicate() {
    assert_eq!(
        authorize(
            Some(&student()),
            Action::RegisterEvent,
            &event(EventStatus::Published, true)
        ),
        Decision::Deny(DenyReason::DuplicateRegistration)
    );
}

#[test]
fn draft_events_cannot_be_registered_for() {
    assert_eq!(
        authorize(
            Some(&student()),
            Action::RegisterEvent,
            &event(EventStatus::Draft, false)
        ),
        Decision::Deny(DenyReason::NotFound)
    );
}

#[test]
fn full_events_and_closed_registration_are_refused() {
    let now = datetime!(2024-05-01 09:00 UTC);

    assert_eq!(
        classify_registration(now, None, Some(2), 2),
        Decision::Deny(DenyReason::CapacityReached)
    );
    assert_eq!(
        classify_registration(now, Some(datetime!(2024-04-30 23:59 UTC)), None, 0),
        Decision::Deny(DenyReason::DeadlinePassed)
    );
    assert_eq!(classify_registration(now, None, Some(2), 1), Decision::Allow);
}

#[test]
fn deny_reasons_use_snake_case_tags() {
    assert_eq!(
        serde_json::to_value(DenyReason::ForbiddenOwnership).unwrap(),
        serde_json::json!("forbidden_ownership")
    );
    assert_eq!(DenyReason::CapacityReached.code(), "capacity_reached");
}
