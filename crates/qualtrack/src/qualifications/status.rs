//! Derived qualification status. Pure date arithmetic; nothing here touches
//! the store, and nothing here is ever persisted.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::domain::Qualification;

/// How far ahead of the next application deadline a record is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPolicy {
    pub renewal_notice_days: u32,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            renewal_notice_days: 30,
        }
    }
}

/// Derived lifecycle state of a qualification relative to a reference date.
///
/// Expiry wins over the renewal window: a record whose validity already
/// lapsed reports `Expired` even when its deadline is also near.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    Unset,
    Expired,
    RenewalDueSoon,
    Valid,
}

impl StatusLabel {
    pub fn label(self) -> &'static str {
        match self {
            StatusLabel::Unset => "unset",
            StatusLabel::Expired => "expired",
            StatusLabel::RenewalDueSoon => "renewal due soon",
            StatusLabel::Valid => "valid",
        }
    }

    /// Display color token for views, bootstrap-style.
    pub fn color(self) -> &'static str {
        match self {
            StatusLabel::Unset => "secondary",
            StatusLabel::Expired => "danger",
            StatusLabel::RenewalDueSoon => "warning",
            StatusLabel::Valid => "success",
        }
    }

    /// Parses a status filter as supplied by search queries. Accepts either
    /// the serialized token or the human label.
    pub fn parse_filter(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unset" => Some(StatusLabel::Unset),
            "expired" => Some(StatusLabel::Expired),
            "renewal_due_soon" | "renewal due soon" => Some(StatusLabel::RenewalDueSoon),
            "valid" => Some(StatusLabel::Valid),
            _ => None,
        }
    }
}

/// Label plus color, ready for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub status: StatusLabel,
    pub label: &'static str,
    pub color: &'static str,
}

impl From<StatusLabel> for StatusInfo {
    fn from(status: StatusLabel) -> Self {
        Self {
            status,
            label: status.label(),
            color: status.color(),
        }
    }
}

/// Computes the derived status of a qualification. Total over its domain:
/// absent dates degrade to `Unset` instead of erroring.
pub fn status_info(
    valid_until: Option<NaiveDate>,
    next_application_on: Option<NaiveDate>,
    today: NaiveDate,
    policy: &StatusPolicy,
) -> StatusInfo {
    let Some(valid_until) = valid_until else {
        return StatusLabel::Unset.into();
    };

    if valid_until < today {
        return StatusLabel::Expired.into();
    }

    if let Some(deadline) = next_application_on {
        let horizon = today
            .checked_add_days(Days::new(u64::from(policy.renewal_notice_days)))
            .unwrap_or(NaiveDate::MAX);
        if deadline <= horizon {
            return StatusLabel::RenewalDueSoon.into();
        }
    }

    StatusLabel::Valid.into()
}

impl Qualification {
    /// Recomputed on every read against the caller's `today`; never cached.
    pub fn status(&self, today: NaiveDate, policy: &StatusPolicy) -> StatusInfo {
        status_info(self.valid_until, self.next_application_on, today, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn missing_end_date_is_unset_for_any_today() {
        let policy = StatusPolicy::default();
        for today in [day(2000, 1, 1), day(2026, 8, 25), day(2099, 12, 31)] {
            let info = status_info(None, Some(day(2026, 1, 1)), today, &policy);
            assert_eq!(info.status, StatusLabel::Unset);
            assert_eq!(info.label, "unset");
            assert_eq!(info.color, "secondary");
        }
    }

    #[test]
    fn lapsed_validity_is_expired_regardless_of_deadline() {
        let policy = StatusPolicy::default();
        let today = day(2026, 8, 25);
        let info = status_info(
            Some(today - Duration::days(1)),
            Some(today + Duration::days(3)),
            today,
            &policy,
        );
        assert_eq!(info.status, StatusLabel::Expired);
        assert_eq!(info.color, "danger");
    }

    #[test]
    fn deadline_inside_window_flags_renewal() {
        let policy = StatusPolicy::default();
        let today = day(2026, 8, 25);
        let info = status_info(
            Some(today + Duration::days(365)),
            Some(today + Duration::days(10)),
            today,
            &policy,
        );
        assert_eq!(info.status, StatusLabel::RenewalDueSoon);
        assert_eq!(info.label, "renewal due soon");
        assert_eq!(info.color, "warning");
    }

    #[test]
    fn deadline_on_window_edge_still_flags() {
        let policy = StatusPolicy {
            renewal_notice_days: 30,
        };
        let today = day(2026, 8, 25);
        let info = status_info(
            Some(today + Duration::days(365)),
            Some(today + Duration::days(30)),
            today,
            &policy,
        );
        assert_eq!(info.status, StatusLabel::RenewalDueSoon);

        let beyond = status_info(
            Some(today + Duration::days(365)),
            Some(today + Duration::days(31)),
            today,
            &policy,
        );
        assert_eq!(beyond.status, StatusLabel::Valid);
    }

    #[test]
    fn healthy_record_is_valid() {
        let policy = StatusPolicy::default();
        let today = day(2026, 8, 25);
        let info = status_info(Some(today + Duration::days(200)), None, today, &policy);
        assert_eq!(info.status, StatusLabel::Valid);
        assert_eq!(info.color, "success");
    }

    #[test]
    fn status_tracks_a_moving_reference_date() {
        let policy = StatusPolicy::default();
        let end = day(2026, 9, 1);
        let before = status_info(Some(end), None, day(2026, 8, 25), &policy);
        let after = status_info(Some(end), None, day(2026, 9, 2), &policy);
        assert_eq!(before.status, StatusLabel::Valid);
        assert_eq!(after.status, StatusLabel::Expired);
    }

    #[test]
    fn filter_parsing_accepts_both_spellings() {
        assert_eq!(
            StatusLabel::parse_filter("renewal due soon"),
            Some(StatusLabel::RenewalDueSoon)
        );
        assert_eq!(
            StatusLabel::parse_filter("RENEWAL_DUE_SOON"),
            Some(StatusLabel::RenewalDueSoon)
        );
        assert_eq!(StatusLabel::parse_filter("bogus"), None);
    }
}
