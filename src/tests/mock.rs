use time::macros::time;
use time::Date;

use crate::models::event::attendance::Attendance;
use crate::models::event::{Event, EventStatus};
use crate::models::permissions::{Caller, Role};
use crate::models::session::Session;
use crate::models::{DateScalar, TimeScalar};

pub const MOCK_CLUB_ID: &str = "6500000000000000000000aa";

pub fn mock_student() -> Caller {
    Caller::new("student-1", Role::Student, None)
}

pub fn mock_cca_admin(club_id: &str) -> Caller {
    Caller::new("cca-admin-1", Role::CcaAdmin, Some(club_id.to_owned()))
}

pub fn mock_system_admin() -> Caller {
    Caller::new("system-admin-1", Role::SystemAdmin, None)
}

pub fn mock_session(id: i64, date: Date) -> Session {
    Session {
        id,
        club_id: MOCK_CLUB_ID.to_owned(),
        title: None,
        date: DateScalar(date),
        start_time: TimeScalar(time!(15:30)),
        end_time: TimeScalar(time!(17:30)),
        location: Some(String::from("Field")),
    }
}

pub fn mock_event(id: i64, date: Date) -> Event {
    Event {
        id,
        club_id: MOCK_CLUB_ID.to_owned(),
        title: String::from("Inter-school Friendly"),
        description: Some(String::from("Let's all go play somewhere!")),
        location: Some(String::from("Somewhere out there")),
        date: DateScalar(date),
        start_time: TimeScalar(time!(9:00)),
        end_time: TimeScalar(time!(12:00)),
        capacity: Some(20),
        registration_deadline: None,
        status: EventStatus::Published,
    }
}

pub fn mock_attendance(
    session_id: Option<i64>,
    event_id: Option<i64>,
    attended: bool,
) -> Attendance {
    Attendance {
        attended,
        session_id,
        event_id,
        user_id: mock_student().user_id,
    }
}
