//! End-to-end reconciliation tests: raw webhook body → adapter → service →
//! in-memory stores.

#![allow(clippy::expect_used)] // Test code uses expect for clear failure messages

use chrono::Duration;
use comicvault_billing::adapters::paystack::PaystackEvent;
use comicvault_billing::adapters::paypal::PayPalWebhook;
use comicvault_billing::mocks::{FixedClock, MockDayPassStore, MockEntitlementStore};
use comicvault_billing::{
    AnonymousSessionId, BillingEnvironment, Clock, DayPassTracker, Entitlement, EntitlementStatus,
    PaymentEvent, PaymentProvider, ProviderRefs, ReconcileOutcome, ReconciliationService, Tier,
    UserId,
};
use serde_json::json;
use std::sync::Arc;

struct Harness {
    service: ReconciliationService<MockEntitlementStore, MockDayPassStore>,
    tracker: DayPassTracker<MockEntitlementStore, MockDayPassStore>,
    entitlements: MockEntitlementStore,
    clock: FixedClock,
}

fn harness() -> Harness {
    let clock = FixedClock::default();
    let entitlements = MockEntitlementStore::new();
    let env = BillingEnvironment::new(entitlements.clone(), MockDayPassStore::new())
        .with_clock(Arc::new(clock.clone()));

    Harness {
        service: ReconciliationService::new(env.clone()),
        tracker: DayPassTracker::new(env),
        entitlements,
        clock,
    }
}

fn paypal_event(body: &serde_json::Value) -> PaymentEvent {
    PayPalWebhook::parse(body.to_string().as_bytes())
        .expect("valid PayPal webhook")
        .event
        .into_payment_event()
        .expect("modelled PayPal event")
}

fn paystack_event(body: &serde_json::Value) -> PaymentEvent {
    PaystackEvent::parse(body.to_string().as_bytes())
        .expect("valid Paystack webhook")
        .into_payment_event()
        .expect("modelled Paystack event")
}

#[tokio::test]
async fn test_anonymous_capture_grants_three_hour_pass() {
    let h = harness();
    let session = AnonymousSessionId::new();
    let custom_id = json!({ "session_id": session.to_string(), "is_anonymous": true, "plan_type": "daypass" });

    let outcome = h
        .service
        .apply(paypal_event(&json!({
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": {
                "id": "CAP-1",
                "custom_id": custom_id.to_string(),
                "supplementary_data": { "related_ids": { "order_id": "ORDER-1" } }
            }
        })))
        .await;

    assert_eq!(
        outcome,
        ReconcileOutcome::DayPassGranted {
            session_id: session,
            expires_at: h.clock.now() + Duration::hours(3),
        }
    );
    assert!(h.tracker.is_active(session).await.expect("store"));

    h.clock.advance(Duration::hours(3));
    assert!(!h.tracker.is_active(session).await.expect("store"));
}

#[tokio::test]
async fn test_subscription_created_for_known_user() {
    let h = harness();
    let user = UserId::new();
    h.entitlements.add_user(user);

    let outcome = h
        .service
        .apply(paypal_event(&json!({
            "event_type": "BILLING.SUBSCRIPTION.CREATED",
            "resource": { "id": "I-SUB1", "custom_id": user.to_string() }
        })))
        .await;
    assert!(matches!(outcome, ReconcileOutcome::Applied { .. }));

    let stored = h.entitlements.snapshot(user).expect("profile");
    assert_eq!(stored.tier, Tier::Member);
    assert_eq!(stored.status, EntitlementStatus::Active);
    assert_eq!(stored.expires_at, Some(h.clock.now() + Duration::days(7)));
    assert_eq!(
        stored.refs,
        ProviderRefs::PayPal {
            order_id: None,
            subscription_id: Some("I-SUB1".to_string()),
        }
    );
}

#[tokio::test]
async fn test_activated_twice_is_idempotent() {
    let h = harness();
    let user = UserId::new();
    h.entitlements.add_user(user);
    let body = json!({
        "event_type": "BILLING.SUBSCRIPTION.ACTIVATED",
        "resource": { "id": "I-SUB2", "custom_id": user.to_string() }
    });

    h.service.apply(paypal_event(&body)).await;
    let first = h.entitlements.snapshot(user).expect("profile");
    h.service.apply(paypal_event(&body)).await;
    let second = h.entitlements.snapshot(user).expect("profile");

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_subscription_event_resolved_by_stored_reference() {
    let h = harness();
    let user = UserId::new();
    h.entitlements.set(
        user,
        Entitlement {
            tier: Tier::Member,
            status: EntitlementStatus::Active,
            expires_at: Some(h.clock.now() + Duration::days(2)),
            refs: ProviderRefs::PayPal {
                order_id: None,
                subscription_id: Some("I-SUB3".to_string()),
            },
        },
    );

    let outcome = h
        .service
        .apply(paypal_event(&json!({
            "event_type": "BILLING.SUBSCRIPTION.CANCELLED",
            "resource": { "id": "I-SUB3" }
        })))
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Applied { user_id, .. } if user_id == user));
    assert_eq!(
        h.entitlements.snapshot(user).expect("profile").status,
        EntitlementStatus::Cancelled
    );
}

#[tokio::test]
async fn test_unresolved_subject_is_dropped_without_mutation() {
    let h = harness();
    let bystander = UserId::new();
    h.entitlements.add_user(bystander);

    let outcome = h
        .service
        .apply(paypal_event(&json!({
            "event_type": "BILLING.SUBSCRIPTION.EXPIRED",
            "resource": { "id": "I-UNKNOWN" }
        })))
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Dropped { .. }));
    assert_eq!(h.entitlements.snapshot(bystander), Some(Entitlement::default()));
}

#[test]
fn test_unknown_event_kind_has_no_canonical_event() {
    let webhook = PayPalWebhook::parse(
        json!({ "event_type": "PAYMENT.SALE.REFUNDED", "resource": { "id": "X" } })
            .to_string()
            .as_bytes(),
    )
    .expect("envelope parses");
    assert!(webhook.event.into_payment_event().is_none());

    let paystack = PaystackEvent::parse(br#"{"event":"subscription.not_renew","data":{}}"#)
        .expect("envelope parses");
    assert!(paystack.into_payment_event().is_none());
}

#[tokio::test]
async fn test_paystack_day_pass_charge_for_user() {
    let h = harness();
    let user = UserId::new();
    h.entitlements.add_user(user);

    h.service
        .apply(paystack_event(&json!({
            "event": "charge.success",
            "data": {
                "reference": "ref_u1",
                "status": "success",
                "metadata": { "user_id": user.to_string(), "plan_type": "daypass", "plan_name": "Day Pass" },
                "customer": { "customer_code": "CUS_u1" }
            }
        })))
        .await;

    let stored = h.entitlements.snapshot(user).expect("profile");
    assert_eq!(stored.tier, Tier::DayPass);
    assert_eq!(stored.status, EntitlementStatus::Active);
    assert_eq!(stored.expires_at, Some(h.clock.now() + Duration::hours(3)));
    assert_eq!(stored.payment_provider(), PaymentProvider::Paystack);
}

#[tokio::test]
async fn test_paystack_lifecycle_by_customer_code() {
    let h = harness();
    let user = UserId::new();
    h.entitlements.add_user(user);

    // First charge stores the customer code.
    h.service
        .apply(paystack_event(&json!({
            "event": "charge.success",
            "data": {
                "reference": "ref_m1",
                "status": "success",
                "metadata": { "user_id": user.to_string(), "plan_type": "member" },
                "customer": { "customer_code": "CUS_m1" }
            }
        })))
        .await;

    // subscription.create carries no metadata; resolved through the customer code.
    h.service
        .apply(paystack_event(&json!({
            "event": "subscription.create",
            "data": { "subscription_code": "SUB_m1", "customer": { "customer_code": "CUS_m1" } }
        })))
        .await;

    let stored = h.entitlements.snapshot(user).expect("profile");
    assert_eq!(stored.tier, Tier::Member);
    assert_eq!(stored.refs.paystack_subscription_code(), Some("SUB_m1"));

    // A later renewal charge without plan metadata stays a membership.
    h.clock.advance(Duration::days(7));
    h.service
        .apply(paystack_event(&json!({
            "event": "charge.success",
            "data": {
                "reference": "ref_m2",
                "status": "success",
                "metadata": "",
                "customer": { "customer_code": "CUS_m1" }
            }
        })))
        .await;

    let renewed = h.entitlements.snapshot(user).expect("profile");
    assert_eq!(renewed.tier, Tier::Member);
    assert_eq!(renewed.expires_at, Some(h.clock.now() + Duration::days(7)));
}

#[tokio::test]
async fn test_payment_failed_leaves_entitlement_unchanged() {
    let h = harness();
    let user = UserId::new();
    let member = Entitlement {
        tier: Tier::Member,
        status: EntitlementStatus::Active,
        expires_at: Some(h.clock.now() + Duration::days(1)),
        refs: ProviderRefs::Paystack {
            reference: None,
            subscription_code: Some("SUB_f1".to_string()),
            customer_code: None,
        },
    };
    h.entitlements.set(user, member.clone());

    let outcome = h
        .service
        .apply(paystack_event(&json!({
            "event": "invoice.payment_failed",
            "data": { "subscription": { "subscription_code": "SUB_f1" } }
        })))
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
    assert_eq!(h.entitlements.snapshot(user), Some(member));
}

#[tokio::test]
async fn test_store_failure_is_reported_not_raised() {
    let h = harness();
    let user = UserId::new();
    h.entitlements.add_user(user);
    h.entitlements.fail_writes(true);

    let outcome = h
        .service
        .apply(paypal_event(&json!({
            "event_type": "BILLING.SUBSCRIPTION.CREATED",
            "resource": { "id": "I-SUB4", "custom_id": user.to_string() }
        })))
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Failed(_)));
    assert!(!outcome.is_settled());
    assert_eq!(h.entitlements.snapshot(user), Some(Entitlement::default()));
}

#[tokio::test]
async fn test_anonymous_subject_on_subscription_event_is_dropped() {
    let h = harness();
    let session = AnonymousSessionId::new();
    let custom_id = json!({ "session_id": session.to_string(), "is_anonymous": true });

    let outcome = h
        .service
        .apply(paypal_event(&json!({
            "event_type": "BILLING.SUBSCRIPTION.CREATED",
            "resource": { "id": "I-ANON", "custom_id": custom_id.to_string() }
        })))
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Dropped { .. }));
    assert!(!h.tracker.is_active(session).await.expect("store"));
}
