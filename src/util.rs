use time::OffsetDateTime;

use crate::models::DateScalar;

pub fn current_time() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn today() -> DateScalar {
    DateScalar(current_time().date())
}
