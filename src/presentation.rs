//! Presentation descriptors for job status badges.
//!
//! The frontend renders each status as a colored badge. The mapping lives
//! here as an exhaustive match so that adding a status variant is a compile
//! error until a badge is chosen for it — there is deliberately no default
//! arm.

use serde::Serialize;

use crate::backend::JobStatus;

// ─────────────────────────────────────────────────────────────────────────────
// Badge Types
// ─────────────────────────────────────────────────────────────────────────────

/// Color role a badge maps onto in the frontend theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Muted,
    Yellow,
    Orange,
    Accent,
    Green,
    Red,
}

/// How one job status is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    /// Badge text, including its marker glyph.
    pub label: &'static str,
    pub tone: BadgeTone,
    /// In-flight statuses pulse; settled ones do not.
    pub animated: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the badge descriptor for a status.
pub fn badge_for(status: JobStatus) -> StatusBadge {
    match status {
        JobStatus::Pending => StatusBadge {
            label: "● PENDING",
            tone: BadgeTone::Muted,
            animated: false,
        },
        JobStatus::Submitted => StatusBadge {
            label: "● SUBMITTED",
            tone: BadgeTone::Yellow,
            animated: true,
        },
        JobStatus::Starting => StatusBadge {
            label: "● STARTING",
            tone: BadgeTone::Orange,
            animated: true,
        },
        JobStatus::Runnable => StatusBadge {
            label: "● RUNNABLE",
            tone: BadgeTone::Yellow,
            animated: true,
        },
        JobStatus::Running => StatusBadge {
            label: "● RUNNING",
            tone: BadgeTone::Accent,
            animated: true,
        },
        JobStatus::Succeeded => StatusBadge {
            label: "✓ COMPLETE",
            tone: BadgeTone::Green,
            animated: false,
        },
        JobStatus::Failed => StatusBadge {
            label: "✗ FAILED",
            tone: BadgeTone::Red,
            animated: false,
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [JobStatus; 7] = [
        JobStatus::Pending,
        JobStatus::Submitted,
        JobStatus::Starting,
        JobStatus::Runnable,
        JobStatus::Running,
        JobStatus::Succeeded,
        JobStatus::Failed,
    ];

    #[test]
    fn every_status_has_a_nonempty_label() {
        for status in ALL_STATUSES {
            let badge = badge_for(status);
            assert!(!badge.label.is_empty(), "empty label for {:?}", status);
        }
    }

    #[test]
    fn only_in_flight_statuses_animate() {
        for status in ALL_STATUSES {
            let badge = badge_for(status);
            let expected = !status.is_terminal() && status != JobStatus::Pending;
            assert_eq!(
                badge.animated, expected,
                "animation wrong for {:?}",
                status
            );
        }
    }

    #[test]
    fn terminal_statuses_use_settled_tones() {
        assert_eq!(badge_for(JobStatus::Succeeded).tone, BadgeTone::Green);
        assert_eq!(badge_for(JobStatus::Failed).tone, BadgeTone::Red);
    }

    #[test]
    fn badge_serializes_for_the_frontend() {
        let json = serde_json::to_value(badge_for(JobStatus::Running)).unwrap();

        assert_eq!(json["label"], "● RUNNING");
        assert_eq!(json["tone"], "accent");
        assert_eq!(json["animated"], true);
    }
}
