use crate::loading::WeightConfig;
use crate::model::LineTags;

/// Multiplier applied to the planar length of a segment with these tags.
///
/// Footpath types get `trail_type_factor`. On top of that the main trail flag
/// gives `main_trail_factor`; without the flag a matching entry in
/// `name_factors` is used instead.
pub fn weight_factor(tags: &LineTags, config: &WeightConfig) -> f64 {
    let trail_type = if config.trail_types.iter().any(|t| t == tags.highway()) {
        config.trail_type_factor
    } else {
        1.0
    };

    let priority = if tags.main_trail {
        config.main_trail_factor
    } else {
        tags.name
            .as_deref()
            .and_then(|name| config.name_factors.get(name))
            .copied()
            .unwrap_or(1.0)
    };

    trail_type * priority
}
