use patient_cell::models::{EngagementStatus, UpdateEngagementStatusRequest};
use patient_cell::services::engagement::{needs_admin_notification, plan_status_change};

fn request(status: EngagementStatus, reason: Option<&str>) -> UpdateEngagementStatusRequest {
    UpdateEngagementStatusRequest {
        status,
        changed_by_email: "coordinator@example.com".to_string(),
        change_reason: reason.map(|r| r.to_string()),
    }
}

#[test]
fn test_equal_status_is_a_no_op() {
    let plan = plan_status_change(
        EngagementStatus::Active,
        &request(EngagementStatus::Active, None),
    ).unwrap();

    assert!(!plan.changed);
    assert_eq!(plan.previous_status, EngagementStatus::Active);
    assert_eq!(plan.next_status, EngagementStatus::Active);
}

#[test]
fn test_no_op_does_not_require_a_reason() {
    // Re-submitting the current non-active status without a reason is fine;
    // the reason requirement only guards actual transitions.
    let plan = plan_status_change(
        EngagementStatus::Discharged,
        &request(EngagementStatus::Discharged, None),
    ).unwrap();

    assert!(!plan.changed);
}

#[test]
fn test_non_active_target_requires_a_reason() {
    let result = plan_status_change(
        EngagementStatus::Active,
        &request(EngagementStatus::Unresponsive, None),
    );
    assert!(result.is_err());

    let result = plan_status_change(
        EngagementStatus::Active,
        &request(EngagementStatus::Unresponsive, Some("   ")),
    );
    assert!(result.is_err());

    let plan = plan_status_change(
        EngagementStatus::Active,
        &request(EngagementStatus::Unresponsive, Some("three missed appointments")),
    ).unwrap();
    assert!(plan.changed);
    assert_eq!(plan.next_status, EngagementStatus::Unresponsive);
}

#[test]
fn test_returning_to_active_needs_no_reason() {
    let plan = plan_status_change(
        EngagementStatus::Inactive,
        &request(EngagementStatus::Active, None),
    ).unwrap();

    assert!(plan.changed);
    assert_eq!(plan.previous_status, EngagementStatus::Inactive);
    assert_eq!(plan.next_status, EngagementStatus::Active);
}

#[test]
fn test_any_state_can_reach_any_other_state() {
    let all = [
        EngagementStatus::Active,
        EngagementStatus::Unresponsive,
        EngagementStatus::Discharged,
        EngagementStatus::Transferred,
        EngagementStatus::Inactive,
        EngagementStatus::Deceased,
    ];

    for from in all {
        for to in all {
            if from == to {
                continue;
            }
            let plan = plan_status_change(from, &request(to, Some("chart review")))
                .unwrap_or_else(|e| panic!("{:?} -> {:?} should be legal: {}", from, to, e));
            assert!(plan.changed);
        }
    }
}

#[test]
fn test_changed_by_email_is_mandatory() {
    let mut req = request(EngagementStatus::Discharged, Some("completed treatment"));
    req.changed_by_email = "  ".to_string();

    assert!(plan_status_change(EngagementStatus::Active, &req).is_err());
}

#[test]
fn test_admin_notification_only_for_non_admin_leaving_active() {
    // Non-admin pulling a patient out of active care: notify.
    assert!(needs_admin_notification(
        EngagementStatus::Active,
        EngagementStatus::Unresponsive,
        false,
    ));

    // Admin doing the same: no notification.
    assert!(!needs_admin_notification(
        EngagementStatus::Active,
        EngagementStatus::Unresponsive,
        true,
    ));

    // Moves between non-active states don't notify.
    assert!(!needs_admin_notification(
        EngagementStatus::Unresponsive,
        EngagementStatus::Discharged,
        false,
    ));

    // Reactivation doesn't notify.
    assert!(!needs_admin_notification(
        EngagementStatus::Discharged,
        EngagementStatus::Active,
        false,
    ));
}
