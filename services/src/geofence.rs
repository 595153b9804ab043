//! Geofence evaluation: great-circle distance between a reported coordinate
//! and the registered campus zones. Pure functions, no I/O.

use util::campus::GeoZone;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// The zone closest to the evaluated point.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestZone<'a> {
    pub zone: &'a GeoZone,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceEvaluation<'a> {
    pub inside_any: bool,
    pub nearest: Option<NearestZone<'a>>,
}

/// Haversine great-circle distance in meters.
///
/// Error versus the true geodesic stays within a few meters at campus-scale
/// radii, so no ellipsoidal correction is applied.
pub fn haversine_meters(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> f64 {
    let phi_a = lat_a.to_radians();
    let phi_b = lat_b.to_radians();
    let d_phi = (lat_b - lat_a).to_radians();
    let d_lambda = (lng_b - lng_a).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Evaluates `point` against every zone.
///
/// `inside_any` is true iff the distance to at least one zone centre is
/// within that zone's radius. The reported nearest zone is the closest
/// *matched* zone when inside, otherwise the closest zone overall.
pub fn evaluate(lat: f64, lng: f64, zones: &[GeoZone]) -> GeofenceEvaluation<'_> {
    let mut nearest_overall: Option<NearestZone<'_>> = None;
    let mut nearest_inside: Option<NearestZone<'_>> = None;

    for zone in zones {
        let distance_meters = haversine_meters(lat, lng, zone.lat, zone.lng);
        let candidate = NearestZone {
            zone,
            distance_meters,
        };

        if nearest_overall
            .as_ref()
            .is_none_or(|n| distance_meters < n.distance_meters)
        {
            nearest_overall = Some(candidate.clone());
        }
        if distance_meters <= zone.radius_meters
            && nearest_inside
                .as_ref()
                .is_none_or(|n| distance_meters < n.distance_meters)
        {
            nearest_inside = Some(candidate);
        }
    }

    match nearest_inside {
        Some(nearest) => GeofenceEvaluation {
            inside_any: true,
            nearest: Some(nearest),
        },
        None => GeofenceEvaluation {
            inside_any: false,
            nearest: nearest_overall,
        },
    }
}
