//! Subscription bandwidth usage derived from a profile's usage counters.

use bytesize::ByteSize;

use crate::model::ProfileRecord;

/// Usage totals and the percentage of quota consumed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedTraffic {
    pub used_bytes: u64,
    pub total_bytes: u64,
    /// `used / total * 100`. Not clamped: over-quota profiles exceed 100.
    /// Always finite; `0.0` when there is no quota.
    pub percent_used: f64,
}

impl DerivedTraffic {
    /// Whether the provider reported a quota at all.
    pub fn has_quota(&self) -> bool {
        self.total_bytes > 0
    }

    /// `"12.3 GiB / 100.0 GiB"`, or just the used amount without a quota.
    pub fn label(&self) -> String {
        if self.has_quota() {
            format!(
                "{} / {}",
                ByteSize(self.used_bytes).to_string_as(true),
                ByteSize(self.total_bytes).to_string_as(true)
            )
        } else {
            ByteSize(self.used_bytes).to_string_as(true)
        }
    }
}

/// Compute traffic usage for a profile. Pure.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn compute_traffic(record: &ProfileRecord) -> DerivedTraffic {
    let Some(usage) = record.usage else {
        return DerivedTraffic::default();
    };

    let used = usage.download.saturating_add(usage.upload);
    let total = usage.total;
    let percent = if total > 0 {
        used as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    DerivedTraffic {
        used_bytes: used,
        total_bytes: total,
        percent_used: percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProfileUsage;
    use pretty_assertions::assert_eq;

    fn with_usage(download: u64, upload: u64, total: u64) -> ProfileRecord {
        let mut p = ProfileRecord::remote("R1", "Sub", "https://example.com");
        p.usage = Some(ProfileUsage {
            upload,
            download,
            total,
            expires_at: None,
        });
        p
    }

    #[test]
    fn absent_usage_is_all_zero() {
        let p = ProfileRecord::local("L1", "Local");
        assert_eq!(compute_traffic(&p), DerivedTraffic::default());
    }

    #[test]
    fn half_used() {
        let t = compute_traffic(&with_usage(30, 20, 100));
        assert_eq!(t.used_bytes, 50);
        assert_eq!(t.total_bytes, 100);
        assert!((t.percent_used - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_total_never_divides() {
        for (down, up) in [(0, 0), (1, 0), (u64::MAX, 7)] {
            let t = compute_traffic(&with_usage(down, up, 0));
            assert!(t.percent_used.is_finite());
            assert!(t.percent_used.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn over_quota_is_not_clamped() {
        let t = compute_traffic(&with_usage(150, 50, 100));
        assert!((t.percent_used - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn used_saturates_instead_of_overflowing() {
        let t = compute_traffic(&with_usage(u64::MAX, 1, 10));
        assert_eq!(t.used_bytes, u64::MAX);
        assert!(t.percent_used.is_finite());
    }

    #[test]
    fn label_without_quota_shows_used_only() {
        let t = compute_traffic(&with_usage(1024, 0, 0));
        assert_eq!(t.label(), "1.0 KiB");
    }
}
