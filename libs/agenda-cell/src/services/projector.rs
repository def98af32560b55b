// libs/agenda-cell/src/services/projector.rs
use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Appointment, SlotTime};
use crate::services::slots::{week_grid, WeekGrid};

/// The at-most-one non-cancelled appointment at an exact grid coordinate.
/// Occupancy is office-scoped: parallel offices serve simultaneous patients.
pub fn occupancy<'a>(
    appointments: &'a [Appointment],
    date: NaiveDate,
    time: SlotTime,
    office: &str,
) -> Option<&'a Appointment> {
    appointments
        .iter()
        .find(|a| a.blocks_slot() && a.occupies(date, time, office))
}

/// Every appointment (any status) at a `(date, time)` pair across offices;
/// cancelled entries stay visible as slot history.
pub fn slot_appointments<'a>(
    appointments: &'a [Appointment],
    date: NaiveDate,
    time: SlotTime,
) -> Vec<&'a Appointment> {
    appointments
        .iter()
        .filter(|a| a.date == date && a.time == time)
        .collect()
}

/// All appointments on a calendar day, any status, ordered by time ascending.
pub fn day_appointments(appointments: &[Appointment], date: NaiveDate) -> Vec<Appointment> {
    let mut day: Vec<Appointment> = appointments
        .iter()
        .filter(|a| a.date == date)
        .cloned()
        .collect();
    day.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.office_ref.cmp(&b.office_ref))
    });
    day
}

/// Occupancy of every grid cell for a displayed week, pre-indexed so cell
/// lookups are constant-time. Rebuilt from the snapshot on each update; an
/// active appointment wins the cell over cancelled history.
pub struct WeekView {
    grid: WeekGrid,
    cells: HashMap<(NaiveDate, SlotTime, String), Appointment>,
}

impl WeekView {
    pub fn project(appointments: &[Appointment], anchor: NaiveDate) -> Self {
        let grid = week_grid(anchor);
        let first = grid.days[0];
        let last = grid.days[grid.days.len() - 1];

        let mut cells: HashMap<(NaiveDate, SlotTime, String), Appointment> = HashMap::new();
        for appointment in appointments {
            if appointment.date < first || appointment.date > last {
                continue;
            }
            let key = (
                appointment.date,
                appointment.time,
                appointment.office_ref.clone(),
            );
            match cells.get(&key) {
                Some(existing) if existing.blocks_slot() => {}
                _ => {
                    cells.insert(key, appointment.clone());
                }
            }
        }

        Self { grid, cells }
    }

    pub fn grid(&self) -> &WeekGrid {
        &self.grid
    }

    /// The appointment shown in a cell, cancelled history included.
    pub fn occupant(&self, date: NaiveDate, time: SlotTime, office: &str) -> Option<&Appointment> {
        self.cells
            .get(&(date, time, office.to_string()))
    }

    /// True if the cell can take a new booking for this office.
    pub fn is_free(&self, date: NaiveDate, time: SlotTime, office: &str) -> bool {
        self.occupant(date, time, office)
            .map_or(true, |a| !a.blocks_slot())
    }

    pub fn appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.cells.values()
    }
}
