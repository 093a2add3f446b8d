// SPDX-License-Identifier: MIT
//
// matching.rs — Which tasks a volunteer should be shown.

use crate::model::{Task, UserProfile};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Filter a task list down to what a volunteer should see: tasks within
/// their travel radius whose category is one of their skills.
///
/// Task status is not part of the filter; claimed and finished tasks
/// pass through and the caller partitions them.
pub fn find_best_tasks(tasks: &[Task], volunteer: &UserProfile) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| {
            haversine_km(
                volunteer.latitude,
                volunteer.longitude,
                t.latitude,
                t.longitude,
            ) <= volunteer.distance
        })
        .filter(|t| volunteer.skills.iter().any(|s| s == &t.category))
        .cloned()
        .collect()
}
