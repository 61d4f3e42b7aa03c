use std::collections::HashMap;

use async_graphql::{Enum, SimpleObject};
use serde::Serialize;

use crate::models::event::attendance::{ActivityRef, Attendance};
use crate::models::event::Event;
use crate::models::session::Session;
use crate::models::DateScalar;

pub mod context;

/// Attendance roll-ups for a single club
#[derive(SimpleObject, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClubAnalytics {
    /// How many members the club has
    pub member_count: i64,
    /// How many sessions the club has held or scheduled
    pub session_count: usize,
    /// How many events the club has run or scheduled
    pub event_count: usize,
    /// The percentage of expected attendances that were confirmed
    pub average_attendance: f64,
    /// The attendance rate of each activity, oldest first
    pub trend_data: Vec<TrendPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Enum, Serialize)]
#[graphql(rename_items = "PascalCase")]
pub enum ActivityKind {
    Session,
    Event,
}

/// The attendance rate of one session or event
#[derive(SimpleObject, Serialize, Clone, Debug, PartialEq)]
pub struct TrendPoint {
    pub date: DateScalar,
    pub title: String,
    #[serde(rename = "type")]
    #[graphql(name = "type")]
    pub kind: ActivityKind,
    /// A percentage, to one decimal place
    pub rate: f64,
    pub present: usize,
    pub total: usize,
}

#[derive(Default, Clone, Copy)]
struct Tally {
    present: usize,
    total: usize,
}

impl Tally {
    fn record(&mut self, attended: bool) {
        self.total += 1;
        if attended {
            self.present += 1;
        }
    }

    fn rate(&self) -> f64 {
        percentage_to_tenth(self.present, self.total)
    }
}

/// `present / total` as a percentage, rounded half away from zero to one
/// decimal place. Computed in integer tenths so exact halves round correctly.
pub fn percentage_to_tenth(present: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let (present, total) = (present as u64, total as u64);
    let tenths = (2 * 1000 * present + total) / (2 * total);

    tenths as f64 / 10.0
}

/// Rolls up a club's attendance.
///
/// Rows that belong to both or neither kind of activity are skipped entirely.
/// Activities nobody was expected at are left out of the trend, but still counted.
pub fn aggregate(
    member_count: i64,
    sessions: &[Session],
    events: &[Event],
    attendance: &[Attendance],
) -> ClubAnalytics {
    let mut tallies: HashMap<ActivityRef, Tally> = HashMap::new();
    let mut overall = Tally::default();

    for row in attendance {
        if let Ok(activity) = row.activity() {
            tallies.entry(activity).or_default().record(row.attended);
            overall.record(row.attended);
        }
    }

    let session_points = sessions.iter().filter_map(|session| {
        tallies
            .get(&ActivityRef::Session(session.id))
            .map(|tally| TrendPoint {
                date: session.date,
                title: session.display_title().to_owned(),
                kind: ActivityKind::Session,
                rate: tally.rate(),
                present: tally.present,
                total: tally.total,
            })
    });
    let event_points = events.iter().filter_map(|event| {
        tallies
            .get(&ActivityRef::Event(event.id))
            .map(|tally| TrendPoint {
                date: event.date,
                title: event.title.clone(),
                kind: ActivityKind::Event,
                rate: tally.rate(),
                present: tally.present,
                total: tally.total,
            })
    });

    let mut trend_data: Vec<TrendPoint> = session_points.chain(event_points).collect();
    trend_data.sort_by_key(|point| point.date);

    ClubAnalytics {
        member_count,
        session_count: sessions.len(),
        event_count: events.len(),
        average_attendance: overall.rate(),
        trend_data,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::tests::mock::{mock_attendance, mock_event, mock_session};

    #[test]
    fn empty_club_has_no_trend() {
        let analytics = aggregate(0, &[], &[], &[]);

        assert_eq!(analytics.session_count, 0);
        assert_eq!(analytics.event_count, 0);
        assert_eq!(analytics.average_attendance, 0.0);
        assert!(analytics.trend_data.is_empty());
    }

    #[test]
    fn session_rate_is_rounded_to_one_decimal() {
        let session = mock_session(1, date!(2024 - 01 - 10));
        let rows = vec![
            mock_attendance(Some(1), None, true),
            mock_attendance(Some(1), None, true),
            mock_attendance(Some(1), None, false),
        ];

        let analytics = aggregate(3, &[session], &[], &rows);

        assert_eq!(
            analytics.trend_data,
            vec![TrendPoint {
                date: DateScalar(date!(2024 - 01 - 10)),
                title: "Session".to_owned(),
                kind: ActivityKind::Session,
                rate: 66.7,
                present: 2,
                total: 3,
            }]
        );
        assert_eq!(analytics.average_attendance, 66.7);
    }

    #[test]
    fn one_in_three_rounds_down() {
        let rows = vec![
            mock_attendance(None, Some(4), true),
            mock_attendance(None, Some(4), false),
            mock_attendance(None, Some(4), false),
        ];

        let analytics = aggregate(3, &[], &[mock_event(4, date!(2024 - 02 - 01))], &rows);

        assert_eq!(analytics.trend_data[0].rate, 33.3);
        assert_eq!(analytics.trend_data[0].kind, ActivityKind::Event);
        assert_eq!(analytics.average_attendance, 33.3);
    }

    #[test]
    fn sessions_without_rows_are_counted_but_not_plotted() {
        let sessions = vec![
            mock_session(1, date!(2024 - 01 - 10)),
            mock_session(2, date!(2024 - 01 - 17)),
        ];
        let rows = vec![mock_attendance(Some(1), None, true)];

        let analytics = aggregate(1, &sessions, &[], &rows);

        assert_eq!(analytics.session_count, 2);
        assert_eq!(analytics.trend_data.len(), 1);
        assert_eq!(analytics.average_attendance, 100.0);
    }

    #[test]
    fn trend_is_sorted_by_date_with_sessions_first_on_ties() {
        let sessions = vec![
            mock_session(1, date!(2024 - 03 - 01)),
            mock_session(2, date!(2024 - 01 - 01)),
        ];
        let events = vec![mock_event(3, date!(2024 - 01 - 01))];
        let rows = vec![
            mock_attendance(Some(1), None, true),
            mock_attendance(Some(2), None, false),
            mock_attendance(None, Some(3), true),
        ];

        let analytics = aggregate(1, &sessions, &events, &rows);
        let order: Vec<(DateScalar, ActivityKind)> = analytics
            .trend_data
            .iter()
            .map(|point| (point.date, point.kind))
            .collect();

        assert_eq!(
            order,
            vec![
                (DateScalar(date!(2024 - 01 - 01)), ActivityKind::Session),
                (DateScalar(date!(2024 - 01 - 01)), ActivityKind::Event),
                (DateScalar(date!(2024 - 03 - 01)), ActivityKind::Session),
            ]
        );
    }

    #[test]
    fn malformed_rows_are_ignored() {
        let session = mock_session(1, date!(2024 - 01 - 10));
        let rows = vec![
            mock_attendance(Some(1), None, true),
            mock_attendance(Some(1), Some(2), false),
            mock_attendance(None, None, false),
        ];

        let analytics = aggregate(1, &[session], &[], &rows);

        assert_eq!(analytics.trend_data[0].total, 1);
        assert_eq!(analytics.average_attendance, 100.0);
    }

    #[test]
    fn blank_session_titles_fall_back() {
        let mut session = mock_session(1, date!(2024 - 01 - 10));
        session.title = Some("  ".to_owned());
        let rows = vec![mock_attendance(Some(1), None, true)];

        let analytics = aggregate(1, &[session], &[], &rows);

        assert_eq!(analytics.trend_data[0].title, Session::DEFAULT_TITLE);
    }

    #[test]
    fn aggregation_is_repeatable() {
        let sessions = vec![mock_session(1, date!(2024 - 01 - 10))];
        let events = vec![mock_event(2, date!(2024 - 01 - 05))];
        let rows = vec![
            mock_attendance(Some(1), None, true),
            mock_attendance(None, Some(2), false),
        ];

        assert_eq!(
            aggregate(2, &sessions, &events, &rows),
            aggregate(2, &sessions, &events, &rows)
        );
    }

    #[test]
    fn rounding_goes_half_away_from_zero() {
        assert_eq!(percentage_to_tenth(23, 80), 28.8);
        assert_eq!(percentage_to_tenth(41, 80), 51.3);
        assert_eq!(percentage_to_tenth(51, 80), 63.8);
        assert_eq!(percentage_to_tenth(1, 3), 33.3);
        assert_eq!(percentage_to_tenth(2, 3), 66.7);
        assert_eq!(percentage_to_tenth(5, 5), 100.0);
        assert_eq!(percentage_to_tenth(0, 4), 0.0);
        assert_eq!(percentage_to_tenth(0, 0), 0.0);
    }

    #[test]
    fn exact_half_rates_round_up() {
        let session = mock_session(1, date!(2024 - 01 - 10));
        let rows: Vec<Attendance> = (0..80)
            .map(|index| mock_attendance(Some(1), None, index < 23))
            .collect();

        let analytics = aggregate(80, &[session], &[], &rows);

        assert_eq!(analytics.trend_data[0].rate, 28.8);
        assert_eq!(analytics.trend_data[0].present, 23);
        assert_eq!(analytics.average_attendance, 28.8);
    }
}
