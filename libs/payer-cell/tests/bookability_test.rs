use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use payer_cell::models::{
    ContractStatus, NetworkStatus, Payer, PayerStatus, ProviderPayerContract,
    SupervisionRelationship,
};
use payer_cell::services::bookability::resolve_bookable_providers;
use provider_cell::models::{Provider, ProviderRole};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn payer(requires_attending: bool, allows_supervised: bool) -> Payer {
    Payer {
        id: Uuid::new_v4(),
        name: "Granite State Health Plan".to_string(),
        payer_type: Some("commercial".to_string()),
        state: Some("NH".to_string()),
        status_code: PayerStatus::Approved,
        effective_date: Some(date("2025-01-01")),
        requires_attending,
        allows_supervised,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn provider(first: &str, last: &str, role: ProviderRole) -> Provider {
    Provider {
        id: Uuid::new_v4(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        role,
        npi: None,
        is_active: true,
        is_bookable: true,
        accepts_new_patients: true,
        offers_telehealth: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn contract(
    provider_id: Uuid,
    payer_id: Uuid,
    effective: Option<&str>,
    expiration: Option<&str>,
    bookable_from: Option<&str>,
) -> ProviderPayerContract {
    ProviderPayerContract {
        id: Uuid::new_v4(),
        provider_id,
        payer_id,
        status: ContractStatus::InNetwork,
        effective_date: effective.map(date),
        expiration_date: expiration.map(date),
        bookable_from_date: bookable_from.map(date),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn supervision(
    supervisor_id: Uuid,
    supervisee_id: Uuid,
    payer_id: Uuid,
    start: Option<&str>,
) -> SupervisionRelationship {
    SupervisionRelationship {
        id: Uuid::new_v4(),
        supervisor_id,
        supervisee_id,
        payer_id,
        is_active: true,
        start_date: start.map(date),
        end_date: None,
        created_at: Utc::now(),
    }
}

#[test]
fn test_effective_window_boundaries_are_inclusive() {
    let c = contract(Uuid::new_v4(), Uuid::new_v4(), Some("2025-03-01"), Some("2025-09-30"), None);

    assert!(!c.covers(date("2025-02-28")));
    assert!(c.covers(date("2025-03-01")));
    assert!(c.covers(date("2025-09-30")));
    assert!(!c.covers(date("2025-10-01")));
}

#[test]
fn test_contract_without_effective_date_never_covers() {
    let c = contract(Uuid::new_v4(), Uuid::new_v4(), None, None, None);
    assert!(!c.covers(date("2025-06-01")));
}

#[test]
fn test_bookable_from_date_gates_the_effective_window() {
    let c = contract(Uuid::new_v4(), Uuid::new_v4(), Some("2025-01-01"), None, Some("2025-04-01"));

    assert!(c.covers(date("2025-02-01")));
    assert!(!c.bookable_on(date("2025-03-31")));
    assert!(!c.is_effective_on(date("2025-03-31")));
    assert!(c.is_effective_on(date("2025-04-01")));
}

#[test]
fn test_terminated_contract_is_never_effective() {
    let mut c = contract(Uuid::new_v4(), Uuid::new_v4(), Some("2025-01-01"), None, None);
    c.status = ContractStatus::Terminated;
    assert!(!c.is_effective_on(date("2025-06-01")));
}

#[test]
fn test_direct_bookability_without_attending_requirement() {
    let p = payer(false, false);
    let psychiatrist = provider("Maya", "Okafor", ProviderRole::Psychiatrist);
    let contracts = vec![contract(psychiatrist.id, p.id, Some("2025-01-01"), None, None)];

    let resolution = resolve_bookable_providers(
        &p, &[psychiatrist.clone()], &contracts, &[], date("2025-06-01"),
    );

    assert_eq!(resolution.bookable.len(), 1);
    let entry = &resolution.bookable[0];
    assert_eq!(entry.provider_id, psychiatrist.id);
    assert_eq!(entry.network_status, NetworkStatus::InNetwork);
    assert_eq!(entry.billing_provider_id, psychiatrist.id);
    assert_eq!(entry.rendering_provider_id, psychiatrist.id);
    assert!(entry.supervising_attendings.is_empty());
}

#[test]
fn test_resident_is_supervised_bookable_under_contracted_attending() {
    // Payer P requires an attending and allows supervised billing. Attending
    // A holds an in_network contract effective 2025-01-01 with no expiration;
    // resident R has an active supervision link to A starting 2025-01-01.
    // On 2025-06-01, R must be returned tagged supervised with A's name.
    let p = payer(true, true);
    let attending = provider("Alice", "Arnett", ProviderRole::Attending);
    let resident = provider("Rafael", "Reyes", ProviderRole::Resident);

    let contracts = vec![contract(attending.id, p.id, Some("2025-01-01"), None, None)];
    let supervisions = vec![supervision(attending.id, resident.id, p.id, Some("2025-01-01"))];

    let resolution = resolve_bookable_providers(
        &p,
        &[attending.clone(), resident.clone()],
        &contracts,
        &supervisions,
        date("2025-06-01"),
    );

    let entry = resolution.bookable.iter()
        .find(|b| b.provider_id == resident.id)
        .expect("resident should be bookable");

    assert_eq!(entry.network_status, NetworkStatus::Supervised);
    assert_eq!(entry.supervising_attendings, vec!["Alice Arnett".to_string()]);
    assert_eq!(entry.billing_provider_id, attending.id);
    assert_eq!(entry.rendering_provider_id, resident.id);
}

#[test]
fn test_supervised_bookability_requires_both_payer_flags() {
    let attending = provider("Alice", "Arnett", ProviderRole::Attending);
    let resident = provider("Rafael", "Reyes", ProviderRole::Resident);

    for (requires, allows) in [(true, false), (false, true), (false, false)] {
        let p = payer(requires, allows);
        let contracts = vec![contract(attending.id, p.id, Some("2025-01-01"), None, None)];
        let supervisions = vec![supervision(attending.id, resident.id, p.id, Some("2025-01-01"))];

        let resolution = resolve_bookable_providers(
            &p,
            &[attending.clone(), resident.clone()],
            &contracts,
            &supervisions,
            date("2025-06-01"),
        );

        assert!(
            !resolution.bookable.iter().any(|b| b.provider_id == resident.id),
            "resident should not be supervised-bookable with requires_attending={} allows_supervised={}",
            requires, allows
        );
    }
}

#[test]
fn test_supervising_provider_is_directly_bookable_under_attending_requirement() {
    // When the payer requires an attending, a contracted provider qualifies
    // directly only because they supervise someone.
    let p = payer(true, true);
    let attending = provider("Alice", "Arnett", ProviderRole::Attending);
    let solo = provider("Sam", "Singh", ProviderRole::Psychiatrist);
    let resident = provider("Rafael", "Reyes", ProviderRole::Resident);

    let contracts = vec![
        contract(attending.id, p.id, Some("2025-01-01"), None, None),
        contract(solo.id, p.id, Some("2025-01-01"), None, None),
    ];
    let supervisions = vec![supervision(attending.id, resident.id, p.id, Some("2025-01-01"))];

    let resolution = resolve_bookable_providers(
        &p,
        &[attending.clone(), solo.clone(), resident.clone()],
        &contracts,
        &supervisions,
        date("2025-06-01"),
    );

    let direct: Vec<Uuid> = resolution.bookable.iter()
        .filter(|b| b.network_status == NetworkStatus::InNetwork)
        .map(|b| b.provider_id)
        .collect();

    assert!(direct.contains(&attending.id));
    assert!(!direct.contains(&solo.id));
}

#[test]
fn test_expired_supervisor_contract_excludes_resident() {
    let p = payer(true, true);
    let attending = provider("Alice", "Arnett", ProviderRole::Attending);
    let resident = provider("Rafael", "Reyes", ProviderRole::Resident);

    let contracts = vec![contract(
        attending.id, p.id, Some("2024-01-01"), Some("2025-01-31"), None,
    )];
    let supervisions = vec![supervision(attending.id, resident.id, p.id, Some("2024-01-01"))];

    let resolution = resolve_bookable_providers(
        &p,
        &[attending.clone(), resident.clone()],
        &contracts,
        &supervisions,
        date("2025-06-01"),
    );

    assert!(resolution.bookable.is_empty());
}

#[test]
fn test_inactive_supervision_excludes_resident() {
    let p = payer(true, true);
    let attending = provider("Alice", "Arnett", ProviderRole::Attending);
    let resident = provider("Rafael", "Reyes", ProviderRole::Resident);

    let contracts = vec![contract(attending.id, p.id, Some("2025-01-01"), None, None)];
    let mut link = supervision(attending.id, resident.id, p.id, Some("2025-01-01"));
    link.is_active = false;

    let resolution = resolve_bookable_providers(
        &p,
        &[attending.clone(), resident.clone()],
        &contracts,
        &[link],
        date("2025-06-01"),
    );

    assert!(!resolution.bookable.iter().any(|b| b.provider_id == resident.id));
}

#[test]
fn test_flag_blocked_provider_is_reported_not_silently_dropped() {
    let p = payer(false, false);
    let mut blocked = provider("Noah", "Park", ProviderRole::Psychiatrist);
    blocked.accepts_new_patients = false;

    let contracts = vec![contract(blocked.id, p.id, Some("2025-01-01"), None, None)];

    let resolution = resolve_bookable_providers(
        &p, &[blocked.clone()], &contracts, &[], date("2025-06-01"),
    );

    assert!(resolution.bookable.is_empty());
    assert_eq!(resolution.blocked_by_flags.len(), 1);
    let diag = &resolution.blocked_by_flags[0];
    assert_eq!(diag.provider_id, blocked.id);
    assert!(diag.is_active);
    assert!(diag.is_bookable);
    assert!(!diag.accepts_new_patients);
}

#[test]
fn test_flag_blocked_resident_is_not_supervised_bookable() {
    let p = payer(true, true);
    let attending = provider("Alice", "Arnett", ProviderRole::Attending);
    let mut resident = provider("Rafael", "Reyes", ProviderRole::Resident);
    resident.is_bookable = false;

    let contracts = vec![contract(attending.id, p.id, Some("2025-01-01"), None, None)];
    let supervisions = vec![supervision(attending.id, resident.id, p.id, Some("2025-01-01"))];

    let resolution = resolve_bookable_providers(
        &p,
        &[attending.clone(), resident.clone()],
        &contracts,
        &supervisions,
        date("2025-06-01"),
    );

    assert!(!resolution.bookable.iter().any(|b| b.provider_id == resident.id));
}

#[test]
fn test_multiple_supervisors_are_aggregated_sorted_by_name() {
    let p = payer(true, true);
    let first = provider("Alice", "Arnett", ProviderRole::Attending);
    let second = provider("Bruno", "Zhang", ProviderRole::Attending);
    let resident = provider("Rafael", "Reyes", ProviderRole::Resident);

    let contracts = vec![
        contract(first.id, p.id, Some("2025-01-01"), None, None),
        contract(second.id, p.id, Some("2025-01-01"), None, None),
    ];
    let supervisions = vec![
        supervision(second.id, resident.id, p.id, Some("2025-01-01")),
        supervision(first.id, resident.id, p.id, Some("2025-01-01")),
    ];

    let resolution = resolve_bookable_providers(
        &p,
        &[first.clone(), second.clone(), resident.clone()],
        &contracts,
        &supervisions,
        date("2025-06-01"),
    );

    let entry = resolution.bookable.iter()
        .find(|b| b.provider_id == resident.id)
        .expect("resident should be bookable");

    assert_eq!(
        entry.supervising_attendings,
        vec!["Alice Arnett".to_string(), "Bruno Zhang".to_string()]
    );
}

#[test]
fn test_results_sorted_by_last_then_first_name() {
    let p = payer(false, false);
    let a = provider("Zoe", "Abbott", ProviderRole::Psychiatrist);
    let b = provider("Ana", "Torres", ProviderRole::Psychiatrist);
    let c = provider("Ben", "Torres", ProviderRole::Psychiatrist);

    let contracts = vec![
        contract(b.id, p.id, Some("2025-01-01"), None, None),
        contract(c.id, p.id, Some("2025-01-01"), None, None),
        contract(a.id, p.id, Some("2025-01-01"), None, None),
    ];

    let resolution = resolve_bookable_providers(
        &p, &[a.clone(), b.clone(), c.clone()], &contracts, &[], date("2025-06-01"),
    );

    let names: Vec<String> = resolution.bookable.iter().map(|b| b.full_name()).collect();
    assert_eq!(names, vec!["Zoe Abbott", "Ana Torres", "Ben Torres"]);
}
