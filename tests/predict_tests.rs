//! Pass prediction tests using a fixed ISS element set.

use chrono::{Duration, TimeZone, Utc};

use pass_stepper::predict::{
    look_angles, next_pass, sample_pass, Observer, PredictError, TleCatalog,
};
use pass_stepper::steps::{build_plan, Resolution};

const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008
";

const DAY: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

fn buenos_aires() -> Observer {
    Observer::new(-34.587353, -58.520116, 25.0)
}

fn epoch() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 7, 12, 21, 16, 0).unwrap()
}

#[test]
fn test_catalog_lookup() {
    let catalog = TleCatalog::parse(ISS_TLE, "iss.tle").unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.find("iss (zarya)").unwrap().norad_id, 25544);
    assert_eq!(catalog.find("25544").unwrap().name, "ISS (ZARYA)");
    assert!(matches!(
        catalog.find("HUBBLE"),
        Err(PredictError::SatelliteNotFound(_))
    ));
}

#[test]
fn test_look_angles_are_in_range() {
    let catalog = TleCatalog::parse(ISS_TLE, "iss.tle").unwrap();
    let iss = catalog.find("25544").unwrap();
    for minutes in (0..180).step_by(7) {
        let angles = look_angles(&buenos_aires(), iss, epoch() + Duration::minutes(minutes)).unwrap();
        assert!((0.0..360.0).contains(&angles.azimuth_deg));
        assert!((-90.0..=90.0).contains(&angles.elevation_deg));
        assert!(angles.range_km > 300.0);
    }
}

#[test]
fn test_next_pass_is_above_threshold() {
    let catalog = TleCatalog::parse(ISS_TLE, "iss.tle").unwrap();
    let iss = catalog.find("25544").unwrap();
    let observer = buenos_aires();
    let pass = next_pass(&observer, iss, epoch(), DAY, 10.0).unwrap();

    assert!(pass.rise > epoch());
    assert!(pass.set > pass.rise);
    assert!(pass.culmination >= pass.rise && pass.culmination <= pass.set);
    assert!(pass.max_elevation_deg >= 10.0);
    assert!(pass.duration_seconds > 0 && pass.duration_seconds < 20 * 60);

    let rise = look_angles(&observer, iss, pass.rise).unwrap();
    assert!(rise.elevation_deg >= 10.0 && rise.elevation_deg < 11.0);
}

#[test]
fn test_pass_in_progress_is_skipped() {
    let catalog = TleCatalog::parse(ISS_TLE, "iss.tle").unwrap();
    let iss = catalog.find("25544").unwrap();
    let observer = buenos_aires();
    let first = next_pass(&observer, iss, epoch(), DAY, 10.0).unwrap();

    let midway = first.rise + Duration::seconds(first.duration_seconds / 2);
    let second = next_pass(&observer, iss, midway, DAY, 10.0).unwrap();
    assert!(second.rise > first.set);
}

#[test]
fn test_sampled_pass_builds_a_plan() {
    let catalog = TleCatalog::parse(ISS_TLE, "iss.tle").unwrap();
    let iss = catalog.find("25544").unwrap();
    let observer = buenos_aires();
    let pass = next_pass(&observer, iss, epoch(), DAY, 10.0).unwrap();
    let samples = sample_pass(&observer, iss, &pass, std::time::Duration::from_secs(1)).unwrap();

    let expected = (pass.set - pass.rise).num_seconds();
    assert!((samples.len() as i64 - expected).abs() <= 1);
    assert!(samples.windows(2).all(|w| w[1].time_s > w[0].time_s));
    assert!(samples.iter().all(|s| s.elevation_deg >= 9.5));

    let plan = build_plan(&samples, Resolution::new(5.0, 5.0)).unwrap();
    assert_eq!(plan.start.orbit_start_unix, pass.rise.timestamp());
    assert!(plan.start.point_count > 0);
    assert!(plan.start.elev_dir_change_ms <= plan.duration_ms());
}

#[test]
fn test_zero_interval_is_rejected() {
    let catalog = TleCatalog::parse(ISS_TLE, "iss.tle").unwrap();
    let iss = catalog.find("25544").unwrap();
    let observer = buenos_aires();
    let pass = next_pass(&observer, iss, epoch(), DAY, 10.0).unwrap();
    assert!(matches!(
        sample_pass(&observer, iss, &pass, std::time::Duration::ZERO),
        Err(PredictError::InvalidDuration(_))
    ));
}
