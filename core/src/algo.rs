use crate::{
    geometry::GeometryModel,
    structs::{EntityId, Feedback, FeedbackCode, MAX_CLOSENESS},
};

pub const KM_PER_MILE: f64 = 1.60934;

pub fn miles_to_km(miles: f64) -> f64 {
    miles * KM_PER_MILE
}

pub fn km_to_miles(km: f64) -> f64 {
    km / KM_PER_MILE
}

/// `round(100 * exp(-km / lambda_km))`, always within `0..=100`.
pub fn closeness(distance_km: f64, lambda_km: f64) -> u8 {
    let raw = 100. * (-distance_km / lambda_km).exp();
    raw.round().clamp(0., MAX_CLOSENESS as f64) as u8
}

/// The feedback `guess` would receive if `target` were the answer.
/// Adjacency takes precedence over the closeness score.
pub fn encode(
    guess: EntityId,
    target: EntityId,
    model: &GeometryModel,
    lambda_km: f64,
) -> FeedbackCode {
    debug_assert_ne!(guess, target);
    if model.is_adjacent(guess, target) {
        FeedbackCode::Adjacent
    } else {
        FeedbackCode::Closeness(closeness(model.distance(guess, target), lambda_km))
    }
}

/// The reading a player would see on screen: adjacency, or the exact
/// great-circle distance in miles.
pub fn observe(guess: EntityId, target: EntityId, model: &GeometryModel) -> Feedback {
    if model.is_adjacent(guess, target) {
        Feedback::Adjacent
    } else {
        Feedback::Distance {
            miles: km_to_miles(model.distance(guess, target)),
        }
    }
}
