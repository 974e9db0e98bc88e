//! Chronological ordering of appointment lists.
//!
//! Records are keyed by their parsed date and time. A record whose date or
//! time does not parse gets [`SortKey::Malformed`], which sorts after every
//! well-formed key; malformed records keep their relative order like any other
//! tie. The key type is totally ordered, so the result is deterministic for
//! any input.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use shared::domain::Appointment;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Scheduled(NaiveDateTime),
    Malformed,
}

fn sort_key(appointment: &Appointment) -> SortKey {
    let date = NaiveDate::parse_from_str(appointment.appointment_date.trim(), DATE_FORMAT);
    let time = TIME_FORMATS.iter().find_map(|format| {
        NaiveTime::parse_from_str(appointment.appointment_time.trim(), format).ok()
    });

    match (date, time) {
        (Ok(date), Some(time)) => SortKey::Scheduled(date.and_time(time)),
        _ => SortKey::Malformed,
    }
}

/// Returns a new list sorted ascending by (date, time). Equal keys keep their
/// input order.
pub fn order(appointments: &[Appointment]) -> Vec<Appointment> {
    let mut keyed: Vec<(SortKey, &Appointment)> = appointments
        .iter()
        .map(|appointment| (sort_key(appointment), appointment))
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    keyed
        .into_iter()
        .map(|(_, appointment)| appointment.clone())
        .collect()
}

#[cfg(test)]
#[path = "tests/ordering_tests.rs"]
mod tests;
