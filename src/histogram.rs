//! Distance histogram
//!
//! Buckets running activities by distance in fixed 1-mile or 1-km bins.
//! The bin count follows the longest run, capped at [`MAX_BINS`]; runs past
//! the cap land in the last bin. Trailing empty bins are dropped while gaps
//! before the last populated bin are kept.

use crate::classifier::is_running_activity;
use crate::types::{DistanceHistogram, HistogramBin, NormalizedActivity};
use crate::units::{self, METERS_PER_KILOMETER, METERS_PER_MILE};

pub const MAX_BINS: usize = 50;

/// Build the histogram of running distances
pub fn generate_histogram(activities: &[NormalizedActivity], use_miles: bool) -> DistanceHistogram {
    let distances: Vec<f64> = activities
        .iter()
        .filter(|a| is_running_activity(&a.activity.sport_type))
        .map(|a| a.activity.distance)
        .collect();

    if distances.is_empty() {
        return DistanceHistogram::default();
    }

    let bin_width = if use_miles {
        METERS_PER_MILE
    } else {
        METERS_PER_KILOMETER
    };

    let max_distance = distances.iter().copied().fold(0.0_f64, f64::max);
    // Counted in f64 so an absurd distance saturates at the cap instead of overflowing
    let bin_count = ((max_distance / bin_width).ceil() + 1.0).min(MAX_BINS as f64) as usize;

    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| empty_bin(i as f64 * bin_width, (i + 1) as f64 * bin_width))
        .collect();

    for distance in distances {
        let index = (distance / bin_width).floor();
        // Negative or NaN distances have no bin
        if !(index >= 0.0) {
            continue;
        }

        let bin = &mut bins[(index as usize).min(bin_count - 1)];
        bin.count += 1;
        bin.distance += distance;
        bin.distance_miles += units::meters_to_miles(distance);
    }

    let populated = bins.iter().rposition(|b| b.count > 0).map_or(0, |i| i + 1);
    bins.truncate(populated);

    DistanceHistogram { bins }
}

fn empty_bin(start_meters: f64, end_meters: f64) -> HistogramBin {
    HistogramBin {
        range: format_range_miles(start_meters, end_meters),
        range_km: format_range_km(start_meters, end_meters),
        start_meters,
        end_meters,
        count: 0,
        distance: 0.0,
        distance_miles: 0.0,
    }
}

fn format_range_miles(start_meters: f64, end_meters: f64) -> String {
    format!(
        "{:.1}-{:.1} mi",
        units::round_tenth(units::meters_to_miles(start_meters)),
        units::round_tenth(units::meters_to_miles(end_meters))
    )
}

fn format_range_km(start_meters: f64, end_meters: f64) -> String {
    format!(
        "{:.1}-{:.1} km",
        units::round_tenth(units::meters_to_km(start_meters)),
        units::round_tenth(units::meters_to_km(end_meters))
    )
}
