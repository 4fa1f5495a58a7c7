/// Keys the provider is asked to fill, in day order.
pub const FORECAST_KEYS: [&str; 5] = ["day1", "day2", "day3", "day4", "day5"];

/// Instruction sent as the single user message.
///
/// The JSON shape is only requested here; nothing enforces it on the reply.
pub fn build_prompt(location: &str) -> String {
    format!(
        r#"Give a five-day weather forecast for {location} in the style of a sports announcer.
Respond ONLY in this strict JSON format:

{{
  "day1": "Exciting Day 1 forecast here...",
  "day2": "Day 2 keeps the action going...",
  "day3": "Midweek heat or chill on Day 3...",
  "day4": "Approaching the weekend with Day 4...",
  "day5": "Final day of the week showdown..."
}}"#
    )
}
