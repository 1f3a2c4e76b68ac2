//! Process-wide, read-only catalogue of canonical disk profiles.
//!
//! Process-lifetime static state, initialised once via `once_cell`, here
//! a `once_cell::sync::Lazy` map of immutable outcome distributions.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::builders::distribution_from_percentiles;
use crate::error::warn_once;
use crate::outcome::Outcomes;
use crate::result::AccessResult;

/// Canonical disk profile names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiskProfile {
    Ssd,
    Hdd,
}

struct ProfileOutcomes {
    read: Outcomes<AccessResult>,
    write: Outcomes<AccessResult>,
}

fn build_ssd() -> ProfileOutcomes {
    // ~0.1-0.2ms typical, P99 ~2ms, availability ~0.998.
    let read_points = vec![
        (0.0, 0.00005),
        (0.50, 0.00012),
        (0.90, 0.0006),
        (0.99, 0.002),
        (1.0, 0.004),
    ];
    let write_points = vec![
        (0.0, 0.00008),
        (0.50, 0.00018),
        (0.90, 0.0009),
        (0.99, 0.0025),
        (1.0, 0.005),
    ];
    ProfileOutcomes {
        read: distribution_from_percentiles(&read_points, 0.002, None, 20),
        write: distribution_from_percentiles(&write_points, 0.002, None, 20),
    }
}

fn build_hdd() -> ProfileOutcomes {
    // Rotational: tens of ms typical, P99 well over 100ms.
    let read_points = vec![
        (0.0, 0.002),
        (0.50, 0.008),
        (0.90, 0.025),
        (0.99, 0.15),
        (1.0, 0.3),
    ];
    let write_points = vec![
        (0.0, 0.003),
        (0.50, 0.010),
        (0.90, 0.030),
        (0.99, 0.18),
        (1.0, 0.35),
    ];
    ProfileOutcomes {
        read: distribution_from_percentiles(&read_points, 0.005, None, 20),
        write: distribution_from_percentiles(&write_points, 0.005, None, 20),
    }
}

static CATALOG: Lazy<HashMap<&'static str, ProfileOutcomes>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("ssd", build_ssd());
    m.insert("hdd", build_hdd());
    m
});

fn profile_key(profile: DiskProfile) -> &'static str {
    match profile {
        DiskProfile::Ssd => "ssd",
        DiskProfile::Hdd => "hdd",
    }
}

/// Returns the pre-built read-profile distribution for `profile`.
pub fn read_profile(profile: DiskProfile) -> Outcomes<AccessResult> {
    CATALOG.get(profile_key(profile)).unwrap().read.clone()
}

/// Returns the pre-built write-profile distribution for `profile`.
pub fn write_profile(profile: DiskProfile) -> Outcomes<AccessResult> {
    CATALOG.get(profile_key(profile)).unwrap().write.clone()
}

/// Resolves a profile by name, case-insensitively. Unknown names fall back
/// to SSD and are reported once — an unrecognised profile name is a
/// recovery, never fatal.
pub fn resolve_profile_name(name: &str) -> DiskProfile {
    match name.to_ascii_lowercase().as_str() {
        "ssd" => DiskProfile::Ssd,
        "hdd" => DiskProfile::Hdd,
        other => {
            let tag = format!("profiles.unknown.{other}");
            warn_once(&tag, || {
                tracing::warn!(profile = %other, "unknown disk profile, falling back to SSD");
            });
            DiskProfile::Ssd
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    #[test]
    fn ssd_read_profile_sanity() {
        let read = read_profile(DiskProfile::Ssd);
        let availability = metrics::availability(&read);
        assert!((availability - 0.998).abs() < 0.001, "avail={}", availability);
        assert!(metrics::mean_latency(&read) < 0.0002, "mean too high");
        let p99 = metrics::percentile_latency(&read, 0.99);
        assert!(p99 <= 0.003, "p99={}", p99);
    }

    #[test]
    fn hdd_read_slower_than_ssd() {
        let hdd = read_profile(DiskProfile::Hdd);
        let ssd = read_profile(DiskProfile::Ssd);
        assert!(metrics::mean_latency(&hdd) > metrics::mean_latency(&ssd));
        assert!(metrics::percentile_latency(&hdd, 0.99) >= 0.1);
        assert!(metrics::percentile_latency(&ssd, 0.99) <= 0.003);
    }

    #[test]
    fn unknown_profile_falls_back_to_ssd() {
        assert_eq!(resolve_profile_name("nvme-weird"), DiskProfile::Ssd);
        assert_eq!(resolve_profile_name("SSD"), DiskProfile::Ssd);
        assert_eq!(resolve_profile_name("hdd"), DiskProfile::Hdd);
    }
}
