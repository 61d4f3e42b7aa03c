use cca_hub::models::analytics::aggregate;
use cca_hub::models::event::attendance::Attendance;
use cca_hub::models::event::{Event, EventStatus};
use cca_hub::models::session::Session;
use cca_hub::models::{DateScalar, TimeScalar};
use serde_json::json;
use time::macros::{date, time};

const CLUB_ID: &str = "650000000000000000000001";

fn session(id: i64, title: Option<&str>, date: time::Date) -> Session {
    Session {
        id,
        club_id: CLUB_ID.to_owned(),
        title: title.map(str::to_owned),
        date: DateScalar(date),
        start_time: TimeScalar(time!(15:00)),
        end_time: TimeScalar(time!(17:00)),
        location: None,
    }
}

fn event(id: i64, title: &str, date: time::Date) -> Event {
    Event {
        id,
        club_id: CLUB_ID.to_owned(),
        title: title.to_owned(),
        description: None,
        location: None,
        date: DateScalar(date),
        start_time: TimeScalar(time!(9:00)),
        end_time: TimeScalar(time!(11:00)),
        capacity: None,
        registration_deadline: None,
        status: EventStatus::Completed,
    }
}

fn row(
    user_id: &str,
    session_id: Option<i64>,
    event_id: Option<i64>,
    attended: bool,
) -> Attendance {
    Attendance {
        attended,
        session_id,
        event_id,
        user_id: user_id.to_owned(),
    }
}

#[test]
fn empty_club_serializes_to_zeroes() {
    let analytics = aggregate(0, &[], &[], &[]);

    assert_eq!(
        serde_json::to_value(&analytics).unwrap(),
        json!({
            "memberCount": 0,
            "sessionCount": 0,
            "eventCount": 0,
            "averageAttendance": 0.0,
            "trendData": [],
        })
    );
}

#[test]
fn trend_points_serialize_with_their_public_names() {
    let sessions = vec![
        session(1, None, date!(2024 - 01 - 10)),
        session(2, Some("Fitness test"), date!(2024 - 01 - 24)),
    ];
    let events = vec![event(7, "Zone Finals", date!(2024 - 01 - 17))];
    let rows = vec![
        row("a", Some(1), None, true),
        row("b", Some(1), None, true),
        row("c", Some(1), None, false),
        row("a", None, Some(7), true),
    ];

    let analytics = aggregate(3, &sessions, &events, &rows);

    assert_eq!(
        serde_json::to_value(&analytics).unwrap(),
        json!({
            "memberCount": 3,
            "sessionCount": 2,
            "eventCount": 1,
            "averageAttendance": 75.0,
            "trendData": [
                {
                    "date": "2024-01-10",
                    "title": "Session",
                    "type": "Session",
                    "rate": 66.7,
                    "present": 2,
                    "total": 3,
                },
                {
                    "date": "2024-01-17",
                    "title": "Zone Finals",
                    "type": "Event",
                    "rate": 100.0,
                    "present": 1,
                    "total": 1,
                },
            ],
        })
    );
}

#[test]
fn trend_is_ordered_regardless_of_input_order() {
    let sessions = vec![
        session(3, None, date!(2024 - 03 - 01)),
        session(1, None, date!(2024 - 01 - 01)),
        session(2, None, date!(2024 - 02 - 01)),
    ];
    let rows: Vec<Attendance> = (1..=3).map(|id| row("a", Some(id), None, true)).collect();

    let dates: Vec<DateScalar> = aggregate(1, &sessions, &[], &rows)
        .trend_data
        .iter()
        .map(|point| point.date)
        .collect();

    assert!(dates.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn rows_with_both_or_neither_activity_are_dropped() {
    let sessions = vec![session(1, None, date!(2024 - 01 - 10))];
    let rows = vec![
        row("a", Some(1), None, false),
        row("b", Some(1), Some(9), true),
        row("c", None, None, true),
    ];

    let analytics = aggregate(3, &sessions, &[], &rows);

    assert_eq!(analytics.average_attendance, 0.0);
    assert_eq!(analytics.trend_data[0].total, 1);
}
