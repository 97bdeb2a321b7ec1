//! Sport-type classification

/// Sport types counted as running
pub const RUNNING_SPORT_TYPES: [&str; 3] = ["Run", "VirtualRun", "TrailRun"];

/// True for the closed set of running sport types; unknown tags are not runs
pub fn is_running_activity(sport_type: &str) -> bool {
    RUNNING_SPORT_TYPES.contains(&sport_type)
}
