// server/seed.rs — Demo fixtures for a freshly started backend.

use crate::model::{Role, Task, UserProfile};
use anyhow::{Context, Result};

/// Board inventory, kept as the original demo data set shipped it. The
/// capitalized statuses are intentional; they go through the lenient
/// parser like any other legacy record.
const SEED_TASKS: &str = include_str!("seed_tasks.json");

pub fn demo_tasks() -> Result<Vec<Task>> {
    serde_json::from_str(SEED_TASKS).context("bundled seed_tasks.json failed to parse")
}

/// Two accounts for poking at the server by hand: an elder with an empty
/// board and a volunteer whose skills and radius match the Austin-area
/// grocery and driving tasks in the seed set.
pub fn demo_users() -> Vec<UserProfile> {
    vec![
        UserProfile {
            email: "elder@example.com".to_string(),
            first_name: "Alma".to_string(),
            last_name: "Reyes".to_string(),
            phone_number: "512-555-0142".to_string(),
            role: Role::Elder,
            latitude: 30.2672,
            longitude: -97.7431,
            ..Default::default()
        },
        UserProfile {
            email: "volunteer@example.com".to_string(),
            first_name: "Ben".to_string(),
            last_name: "Okafor".to_string(),
            phone_number: "512-555-0177".to_string(),
            role: Role::Volunteer,
            latitude: 30.2672,
            longitude: -97.7431,
            skills: vec!["Groceries".to_string(), "Driving".to_string()],
            distance: 50.0,
            ..Default::default()
        },
    ]
}
