pub(crate) const DEFAULT_ADVANCE_THRESHOLD_METERS: f64 = 50.0;
pub(crate) const FALLBACK_NEXT_DIRECTION: &str = "Head to nearest exit point";
pub(crate) const FALLBACK_REMAINING_DISTANCE: f64 = 0.5;
pub(crate) const FALLBACK_ESTIMATED_TIME: f64 = 15.0;
pub(crate) const FALLBACK_SAFETY_INSTRUCTION: &str =
    "Stay on the marked trail, move to the nearest exit point and contact emergency services";
pub(crate) const FALLBACK_ROUTE_ID: &str = "emergency-fallback";
pub(crate) const LIFECYCLE_CHANNEL_CAPACITY: usize = 32;
