//! Safety advice for weather alert event kinds.

/// Advice used when an event kind has no dedicated entry.
pub const GENERIC_ADVICE: &str =
    "⚠️ Stay alert, follow instructions from local officials, and monitor official weather updates.";

const SAFETY_ADVICE: &[(&str, &str)] = &[
    ("Tornado Warning", "🌪️ Take shelter immediately in a basement or interior room on the lowest floor, away from windows."),
    ("Tornado Watch", "🌪️ Be prepared to take shelter. Review your emergency plan."),
    ("Severe Thunderstorm Warning", "⛈️ Stay indoors, avoid windows, and unplug electronics. Do not drive through flooded roads."),
    ("Severe Thunderstorm Watch", "⛈️ Be alert. Stay informed of changing weather conditions."),
    ("Flash Flood Warning", "🌊 Move to higher ground immediately. Never drive into floodwaters."),
    ("Flash Flood Watch", "🌊 Be aware. Avoid low-lying areas and flooding roads."),
    ("Heat Advisory", "🥵 Stay hydrated, avoid strenuous activity, and check on vulnerable people."),
    ("Winter Storm Warning", "❄️ Stay off roads if possible, keep warm, and have supplies in case of power outage."),
    ("High Wind Warning", "💨 Secure loose objects outdoors, avoid driving high-profile vehicles, and stay indoors."),
    ("Excessive Heat Warning", "🔥 Stay indoors in AC if possible, drink plenty of water, and avoid outdoor activity."),
    ("Hurricane Warning", "🌀 Follow evacuation orders. Move to higher ground, stay indoors away from windows."),
    ("Tropical Storm Warning", "🌧️ Prepare for flooding and strong winds. Stay indoors if possible."),
    ("Wildfire Warning", "🔥 Be ready to evacuate if ordered. Avoid breathing smoke and keep N95 masks if available."),
    ("Dense Fog Advisory", "🌫️ If driving, use low beams, slow down, and allow extra distance."),
    ("Blizzard Warning", "❄️ Avoid travel, stay indoors, and ensure you have food, water, and heat sources."),
];

const EVENT_SHORTHAND: &[(&str, &str)] = &[
    ("tornado", "Tornado Warning"),
    ("twatch", "Tornado Watch"),
    ("tstorm", "Severe Thunderstorm Warning"),
    ("tstormwatch", "Severe Thunderstorm Watch"),
    ("flashflood", "Flash Flood Warning"),
    ("ffwatch", "Flash Flood Watch"),
    ("heat", "Heat Advisory"),
    ("winter", "Winter Storm Warning"),
    ("wind", "High Wind Warning"),
    ("excessiveheat", "Excessive Heat Warning"),
    ("hurricane", "Hurricane Warning"),
    ("tropical", "Tropical Storm Warning"),
    ("wildfire", "Wildfire Warning"),
    ("fog", "Dense Fog Advisory"),
    ("blizzard", "Blizzard Warning"),
];

/// Returns the dedicated advice for `event_kind`, if there is one.
pub fn known_advice(event_kind: &str) -> Option<&'static str> {
    SAFETY_ADVICE
        .iter()
        .find(|(kind, _)| *kind == event_kind.trim())
        .map(|(_, advice)| *advice)
}

/// Returns advice for `event_kind`, falling back to [`GENERIC_ADVICE`].
pub fn safety_advice(event_kind: &str) -> &'static str {
    known_advice(event_kind).unwrap_or(GENERIC_ADVICE)
}

/// Expands a shorthand such as `tstorm` to its event kind (case-insensitive).
pub fn expand_shorthand(shorthand: &str) -> Option<&'static str> {
    let wanted = shorthand.trim().to_lowercase();
    EVENT_SHORTHAND
        .iter()
        .find(|(short, _)| *short == wanted)
        .map(|(_, kind)| *kind)
}

/// All shorthands in display order.
pub fn shorthands() -> impl Iterator<Item = (&'static str, &'static str)> {
    EVENT_SHORTHAND.iter().copied()
}
