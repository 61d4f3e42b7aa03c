//! Club management for a school's co-curricular activities.
//!
//! Students browse and join clubs and register for events, club admins run
//! their club's sessions and events and take attendance, and system admins
//! manage clubs and accounts. The access rules live in
//! [`models::permissions`] and the attendance roll-ups in
//! [`models::analytics`].

pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod models;
pub mod util;

#[cfg(test)]
mod tests;
