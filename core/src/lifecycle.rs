//! Lifecycle event model.
//!
//! A customer moves through five canonical stages:
//!   Account registered > Email confirmed > Client registered
//!     > Client analyzed (approved or denied) > Initial deposit
//!
//! RULES:
//!   - A stage timestamp is only set if its predecessor is set.
//!   - A stage timestamp is never earlier than its predecessor's.
//!   - Approval and denial are mutually exclusive outcomes.
//!   - A deposit requires approval.

use crate::{
    error::{PipelineError, PipelineResult},
    types::CustomerId,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ── Canonical stages ─────────────────────────────────────────────────────────

/// The five ranked stages used by the cohort matrix and the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusLabel {
    Registered,
    EmailConfirmed,
    ProfileCompleted,
    Analyzed,
    Deposited,
}

impl StatusLabel {
    /// All stages in rank order.
    pub const ALL: [StatusLabel; 5] = [
        Self::Registered,
        Self::EmailConfirmed,
        Self::ProfileCompleted,
        Self::Analyzed,
        Self::Deposited,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Self::Registered       => 1,
            Self::EmailConfirmed   => 2,
            Self::ProfileCompleted => 3,
            Self::Analyzed         => 4,
            Self::Deposited        => 5,
        }
    }

    /// Label written to the reporting tables.
    pub fn label(self) -> &'static str {
        match self {
            Self::Registered       => "Account registered",
            Self::EmailConfirmed   => "Email confirmed",
            Self::ProfileCompleted => "Client registered",
            Self::Analyzed         => "Client analyzed (approved or denied)",
            Self::Deposited        => "Initial deposit",
        }
    }
}

/// An ordered (from, to) pair of stages with rank(from) < rank(to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusPair {
    pub from: StatusLabel,
    pub to:   StatusLabel,
}

impl StatusPair {
    pub fn new(from: StatusLabel, to: StatusLabel) -> Option<Self> {
        (from.rank() < to.rank()).then_some(Self { from, to })
    }

    /// The 10 feasible pairs, ordered by (from rank, to rank).
    ///
    /// Cross join of the stage list with itself, filtered on rank.
    pub fn all() -> Vec<StatusPair> {
        StatusLabel::ALL
            .into_iter()
            .flat_map(|from| {
                StatusLabel::ALL
                    .into_iter()
                    .filter_map(move |to| StatusPair::new(from, to))
            })
            .collect()
    }
}

// ── Display status ───────────────────────────────────────────────────────────

/// The `status` column of the customer base table: the latest stage
/// reached, with approval and denial kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayStatus {
    AccountRegistered,
    EmailConfirmed,
    ClientRegistered,
    ClientApproved,
    ClientDenied,
    InitialDeposit,
}

impl DisplayStatus {
    const ALL: [DisplayStatus; 6] = [
        Self::AccountRegistered,
        Self::EmailConfirmed,
        Self::ClientRegistered,
        Self::ClientApproved,
        Self::ClientDenied,
        Self::InitialDeposit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::AccountRegistered => "Account registered",
            Self::EmailConfirmed    => "Email confirmed",
            Self::ClientRegistered  => "Client registered",
            Self::ClientApproved    => "Client approved",
            Self::ClientDenied      => "Client denied",
            Self::InitialDeposit    => "Initial deposit",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

// ── Record ───────────────────────────────────────────────────────────────────

/// One customer's progression through the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleRecord {
    pub id:                   CustomerId,
    pub name:                 String,
    pub address:              String,
    pub birthdate:            NaiveDate,
    pub registered_at:        NaiveDateTime,
    pub email_confirmed_at:   Option<NaiveDateTime>,
    pub profile_completed_at: Option<NaiveDateTime>,
    pub approved_at:          Option<NaiveDateTime>,
    pub denied_at:            Option<NaiveDateTime>,
    pub deposited_at:         Option<NaiveDateTime>,
}

impl LifecycleRecord {
    /// A record that has only registered.
    pub fn registered(
        id: CustomerId,
        name: impl Into<String>,
        address: impl Into<String>,
        birthdate: NaiveDate,
        registered_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            birthdate,
            registered_at,
            email_confirmed_at: None,
            profile_completed_at: None,
            approved_at: None,
            denied_at: None,
            deposited_at: None,
        }
    }

    /// Timestamp of the analysis decision. Approval wins over denial.
    pub fn analyzed_at(&self) -> Option<NaiveDateTime> {
        self.approved_at.or(self.denied_at)
    }

    /// Timestamp at which `status` was reached, if it was.
    pub fn timestamp(&self, status: StatusLabel) -> Option<NaiveDateTime> {
        match status {
            StatusLabel::Registered       => Some(self.registered_at),
            StatusLabel::EmailConfirmed   => self.email_confirmed_at,
            StatusLabel::ProfileCompleted => self.profile_completed_at,
            StatusLabel::Analyzed         => self.analyzed_at(),
            StatusLabel::Deposited        => self.deposited_at,
        }
    }

    /// Stages reached, in rank order, with their timestamps.
    pub fn reached(&self) -> impl Iterator<Item = (StatusLabel, NaiveDateTime)> + '_ {
        StatusLabel::ALL
            .into_iter()
            .filter_map(move |s| self.timestamp(s).map(|ts| (s, ts)))
    }

    /// Latest stage reached; later stages override earlier ones.
    pub fn current_status(&self) -> DisplayStatus {
        if self.deposited_at.is_some() {
            DisplayStatus::InitialDeposit
        } else if self.denied_at.is_some() {
            DisplayStatus::ClientDenied
        } else if self.approved_at.is_some() {
            DisplayStatus::ClientApproved
        } else if self.profile_completed_at.is_some() {
            DisplayStatus::ClientRegistered
        } else if self.email_confirmed_at.is_some() {
            DisplayStatus::EmailConfirmed
        } else {
            DisplayStatus::AccountRegistered
        }
    }

    /// Check every ordering invariant. Returns the first violation.
    pub fn validate(&self) -> PipelineResult<()> {
        let id = self.id;
        check_step(id, "email confirmation", self.email_confirmed_at,
                   "registration", Some(self.registered_at))?;
        check_step(id, "client registration", self.profile_completed_at,
                   "email confirmation", self.email_confirmed_at)?;
        check_step(id, "approval", self.approved_at,
                   "client registration", self.profile_completed_at)?;
        check_step(id, "denial", self.denied_at,
                   "client registration", self.profile_completed_at)?;
        if self.approved_at.is_some() && self.denied_at.is_some() {
            return Err(PipelineError::consistency(id, "both approved and denied"));
        }
        check_step(id, "initial deposit", self.deposited_at,
                   "approval", self.approved_at)?;
        Ok(())
    }
}

fn check_step(
    id: CustomerId,
    step: &str,
    at: Option<NaiveDateTime>,
    prev_step: &str,
    prev_at: Option<NaiveDateTime>,
) -> PipelineResult<()> {
    match (at, prev_at) {
        (None, _) => Ok(()),
        (Some(_), None) => Err(PipelineError::consistency(
            id,
            format!("{step} set without {prev_step}"),
        )),
        (Some(at), Some(prev)) if at < prev => Err(PipelineError::consistency(
            id,
            format!("{step} at {at} precedes {prev_step} at {prev}"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DATETIME_FORMAT;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap()
    }

    fn base() -> LifecycleRecord {
        LifecycleRecord::registered(
            1,
            "Ada Price",
            "12 Elm St, Austin, TX 73301",
            NaiveDate::from_ymd_opt(2001, 5, 4).unwrap(),
            ts("2024-01-01 10:00:00"),
        )
    }

    #[test]
    fn ten_status_pairs_in_rank_order() {
        let pairs = StatusPair::all();
        assert_eq!(pairs.len(), 10);
        assert!(pairs.iter().all(|p| p.from.rank() < p.to.rank()));
        assert_eq!(pairs[0], StatusPair::new(StatusLabel::Registered, StatusLabel::EmailConfirmed).unwrap());
        assert_eq!(pairs[9], StatusPair::new(StatusLabel::Analyzed, StatusLabel::Deposited).unwrap());
        let mut sorted = pairs.clone();
        sorted.sort();
        assert_eq!(sorted, pairs);
    }

    #[test]
    fn status_pair_rejects_same_or_backward_rank() {
        assert!(StatusPair::new(StatusLabel::Analyzed, StatusLabel::Analyzed).is_none());
        assert!(StatusPair::new(StatusLabel::Deposited, StatusLabel::Registered).is_none());
    }

    #[test]
    fn labels_round_trip() {
        let labels: std::collections::HashSet<_> = StatusLabel::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), StatusLabel::ALL.len());
        for s in DisplayStatus::ALL {
            assert_eq!(DisplayStatus::from_label(s.label()), Some(s));
        }
        assert_eq!(DisplayStatus::from_label("Client analyzed"), None);
    }

    #[test]
    fn denied_and_deposited_have_distinct_display_status() {
        let mut denied = base();
        denied.email_confirmed_at = Some(ts("2024-01-02 00:00:00"));
        denied.profile_completed_at = Some(ts("2024-01-03 00:00:00"));
        denied.denied_at = Some(ts("2024-01-04 00:00:00"));
        assert_eq!(denied.current_status(), DisplayStatus::ClientDenied);

        let mut deposited = denied.clone();
        deposited.denied_at = None;
        deposited.approved_at = Some(ts("2024-01-04 00:00:00"));
        deposited.deposited_at = Some(ts("2024-01-05 00:00:00"));
        assert_eq!(deposited.current_status(), DisplayStatus::InitialDeposit);
        assert_ne!(denied.current_status().label(), deposited.current_status().label());
    }

    #[test]
    fn analyzed_prefers_approval() {
        let mut r = base();
        r.approved_at = Some(ts("2024-01-04 00:00:00"));
        r.denied_at = Some(ts("2024-01-03 00:00:00"));
        assert_eq!(r.analyzed_at(), r.approved_at);
    }

    #[test]
    fn validate_accepts_full_chain() {
        let mut r = base();
        r.email_confirmed_at = Some(ts("2024-01-01 10:00:00"));
        r.profile_completed_at = Some(ts("2024-01-02 00:00:00"));
        r.approved_at = Some(ts("2024-01-03 00:00:00"));
        r.deposited_at = Some(ts("2024-01-09 00:00:00"));
        r.validate().unwrap();
        assert_eq!(r.reached().count(), 5);
    }

    #[test]
    fn validate_rejects_out_of_order_timestamp() {
        let mut r = base();
        r.email_confirmed_at = Some(ts("2023-12-31 23:59:59"));
        let err = r.validate().unwrap_err();
        assert!(matches!(err, PipelineError::Consistency { customer_id: 1, .. }), "{err}");
    }

    #[test]
    fn validate_rejects_deposit_without_approval() {
        let mut r = base();
        r.email_confirmed_at = Some(ts("2024-01-02 00:00:00"));
        r.profile_completed_at = Some(ts("2024-01-03 00:00:00"));
        r.denied_at = Some(ts("2024-01-04 00:00:00"));
        r.deposited_at = Some(ts("2024-01-05 00:00:00"));
        assert!(matches!(r.validate(), Err(PipelineError::Consistency { .. })));
    }

    #[test]
    fn validate_rejects_approval_and_denial_together() {
        let mut r = base();
        r.email_confirmed_at = Some(ts("2024-01-02 00:00:00"));
        r.profile_completed_at = Some(ts("2024-01-03 00:00:00"));
        r.approved_at = Some(ts("2024-01-04 00:00:00"));
        r.denied_at = Some(ts("2024-01-04 00:00:00"));
        assert!(matches!(r.validate(), Err(PipelineError::Consistency { .. })));
    }
}
