use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Categories offered by the creation wizard.
pub const CATEGORIES: [&str; 6] = [
    "Shopping",
    "Transportation",
    "Home Help",
    "Technology",
    "Companionship",
    "Other",
];

/// Icon name rendered next to a category on the board cards.
///
/// Legacy category labels from older records keep their mappings so the
/// history tab does not degrade.
static CATEGORY_ICONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Shopping", "cart-outline"),
        ("Transportation", "car-outline"),
        ("Home Help", "home-outline"),
        ("Technology", "phone-portrait-outline"),
        ("Companionship", "people-outline"),
        ("Other", "ellipsis-horizontal-circle-outline"),
        ("Errands", "cart-outline"),
        ("Electronics", "phone-portrait-outline"),
        ("Chores", "hammer-outline"),
        ("Events", "calendar-outline"),
    ])
});

pub fn icon_for(category: &str) -> &'static str {
    CATEGORY_ICONS.get(category).copied().unwrap_or("list-outline")
}

/// Status indicator color used by the board cards. Unknown statuses take
/// the pending color.
pub fn status_color(status: &str) -> &'static str {
    match status.to_ascii_lowercase().as_str() {
        "accepted" => "#34C759",
        "completed" => "#8E8E93",
        _ => "#FF9500",
    }
}
