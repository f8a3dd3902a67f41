//! End-to-end dispatch scenarios for WebSub subscriber services.
//!
//! These tests drive the dispatcher through both phases the way a host does
//! and check each outcome a hub request can produce.

use std::collections::HashSet;

use proptest::prelude::*;
use rstest::rstest;
use websub_dispatcher::{
    ErrorKind, Payload, RequestContext, ResolutionOutcome, ResourceDispatcher, Scalar,
    ServiceRegistry, TopicStrategy, RESOURCE_NAME_ON_INTENT_VERIFICATION,
    RESOURCE_NAME_ON_SUBSCRIPTION_DENIED,
};

fn handlers(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn payload(pairs: &[(&str, &str)]) -> Payload {
    pairs.iter().map(|(k, v)| (*k, Scalar::from(*v))).collect()
}

fn header_registry() -> ServiceRegistry {
    ServiceRegistry::builder(TopicStrategy::ByHeader)
        .topic_header("Topic")
        .header_resource("news", "onNews")
        .build()
        .expect("valid registry")
}

fn combined_registry() -> ServiceRegistry {
    ServiceRegistry::builder(TopicStrategy::ByHeaderAndPayloadKey)
        .topic_header("X-Topic")
        .header_and_payload_key_resource("issues", "action", "opened", "onIssueOpened")
        .header_and_payload_key_resource("issues", "action", "closed", "onIssueClosed")
        .header_resource("issues", "onIssue")
        .header_resource("pulls", "onPull")
        .payload_key_resource("action", "labeled", "onLabeled")
        .build()
        .expect("valid registry")
}

#[test]
fn test_header_strategy_dispatches_without_body() {
    let registry = header_registry();
    let mut ctx = RequestContext::new("POST").with_header("Topic", "news");

    let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&["onNews"]));

    assert_eq!(outcome, ResolutionOutcome::Dispatch("onNews".to_string()));
    assert!(!ctx.is_deferred());
    assert!(ctx.payload().is_none());
}

#[test]
fn test_header_strategy_unmapped_topic() {
    let registry = header_registry();
    let mut ctx = RequestContext::new("POST").with_header("Topic", "sports");

    let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&["onNews"]));

    match outcome {
        ResolutionOutcome::Error(e) => {
            assert_eq!(e.kind, ErrorKind::NoMatchingResource);
            assert_eq!(e.status_hint, 404);
            assert!(e.message.contains("sports"));
        }
        other => panic!("Expected NoMatchingResource, got {other:?}"),
    }
}

#[test]
fn test_header_strategy_mapped_but_unregistered_handler() {
    let registry = header_registry();
    let mut ctx = RequestContext::new("POST").with_header("Topic", "news");

    let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&[]));

    match outcome {
        ResolutionOutcome::Error(e) => {
            assert_eq!(e.kind, ErrorKind::ResourceNotFound);
            assert_eq!(e.message, "no handler named onNews for method POST");
        }
        other => panic!("Expected ResourceNotFound, got {other:?}"),
    }
}

#[test]
fn test_payload_key_strategy_two_phase() {
    let registry = ServiceRegistry::builder(TopicStrategy::ByPayloadKey)
        .payload_key_resource("type", "create", "onCreate")
        .build()
        .expect("valid registry");
    let handlers = handlers(&["onCreate"]);
    let dispatcher = ResourceDispatcher::new();

    let mut ctx = RequestContext::new("POST");
    assert_eq!(
        dispatcher.dispatch(&mut ctx, &registry, &handlers),
        ResolutionOutcome::Defer
    );
    assert!(ctx.is_deferred());

    ctx.supply_payload(payload(&[("type", "create")]));
    assert_eq!(
        dispatcher.dispatch(&mut ctx, &registry, &handlers),
        ResolutionOutcome::Dispatch("onCreate".to_string())
    );
}

#[test]
fn test_payload_never_supplied_after_deferral() {
    let registry = ServiceRegistry::builder(TopicStrategy::ByPayloadKey)
        .payload_key_resource("type", "create", "onCreate")
        .build()
        .expect("valid registry");
    let handlers = handlers(&["onCreate"]);
    let dispatcher = ResourceDispatcher::new();

    let mut ctx = RequestContext::new("POST");
    assert_eq!(
        dispatcher.dispatch(&mut ctx, &registry, &handlers),
        ResolutionOutcome::Defer
    );

    // Neither the second nor any later call may defer again
    for _ in 0..2 {
        let outcome = dispatcher.dispatch(&mut ctx, &registry, &handlers);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::BadRequest));
    }
}

#[rstest]
#[case("hub.mode=denied")]
#[case("hub.mode=Denied")]
#[case("hub.mode=DENIED")]
#[case("hub.topic=t&hub.mode=dEnIeD")]
fn test_denial_without_handler_is_unhandled(#[case] query: &str) {
    let registry = header_registry();
    let mut ctx = RequestContext::new("GET").with_query(query);

    let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&["onNews"]));

    assert_eq!(outcome, ResolutionOutcome::Unhandled);
}

#[test]
fn test_denial_with_handler_dispatches() {
    let registry = header_registry();
    let mut ctx = RequestContext::new("GET").with_query("hub.mode=denied&hub.reason=policy");

    let outcome = ResourceDispatcher::new().dispatch(
        &mut ctx,
        &registry,
        &handlers(&[RESOURCE_NAME_ON_SUBSCRIPTION_DENIED]),
    );

    assert_eq!(
        outcome,
        ResolutionOutcome::Dispatch(RESOURCE_NAME_ON_SUBSCRIPTION_DENIED.to_string())
    );
}

#[test]
fn test_accepted_without_handler_auto_verifies_fallback_topic() {
    let registry = ServiceRegistry::builder(TopicStrategy::None)
        .fallback_topic("mytopic")
        .build()
        .expect("valid registry");
    let mut ctx =
        RequestContext::new("GET").with_query("hub.mode=accepted&hub.topic=mytopic&hub.challenge=x");

    let outcome =
        ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&["onNotification"]));

    assert_eq!(outcome, ResolutionOutcome::AutoVerify("mytopic".to_string()));
}

#[test]
fn test_accepted_without_handler_prefers_annotated_target() {
    let registry = ServiceRegistry::builder(TopicStrategy::None)
        .verification_target("annotated")
        .fallback_topic("mytopic")
        .build()
        .expect("valid registry");
    let mut ctx = RequestContext::new("GET").with_query("hub.mode=ACCEPTED");

    let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&[]));

    assert_eq!(outcome, ResolutionOutcome::AutoVerify("annotated".to_string()));
}

#[test]
fn test_accepted_with_handler_dispatches() {
    let registry = header_registry();
    let mut ctx = RequestContext::new("GET").with_query("hub.mode=accepted");

    let outcome = ResourceDispatcher::new().dispatch(
        &mut ctx,
        &registry,
        &handlers(&[RESOURCE_NAME_ON_INTENT_VERIFICATION]),
    );

    assert_eq!(
        outcome.handler_name(),
        Some(RESOURCE_NAME_ON_INTENT_VERIFICATION)
    );
}

#[rstest]
#[case(Some("hub.mode=unknown"))]
#[case(Some("hub.mode=subscribe"))]
#[case(Some("hub.mode="))]
#[case(Some("hub.topic=t"))]
#[case(Some(""))]
#[case(None)]
fn test_unsupported_or_missing_mode_is_bad_request(#[case] query: Option<&str>) {
    let registry = header_registry();
    let mut ctx = RequestContext::new("GET");
    if let Some(query) = query {
        ctx = ctx.with_query(query);
    }

    let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&[]));

    match outcome {
        ResolutionOutcome::Error(e) => {
            assert_eq!(e.kind, ErrorKind::BadRequest);
            assert_eq!(e.status_hint, 400);
            assert_eq!(e.message, "unsupported or missing verification mode");
        }
        other => panic!("Expected BadRequest, got {other:?}"),
    }
}

#[rstest]
#[case::topic_scoped_payload_match(&[("action", "opened")], "onIssueOpened")]
#[case::falls_back_to_header_map(&[("action", "edited")], "onIssue")]
#[case::header_map_before_payload_map(&[("action", "labeled")], "onIssue")]
fn test_combined_strategy_for_mapped_topic(
    #[case] body: &[(&str, &str)],
    #[case] expected: &str,
) {
    let registry = combined_registry();
    let handlers = handlers(&["onIssueOpened", "onIssueClosed", "onIssue", "onLabeled", "onPull"]);
    let dispatcher = ResourceDispatcher::new();
    let mut ctx = RequestContext::new("POST").with_header("X-Topic", "issues");

    assert_eq!(
        dispatcher.dispatch(&mut ctx, &registry, &handlers),
        ResolutionOutcome::Defer
    );
    ctx.supply_payload(payload(body));

    assert_eq!(
        dispatcher.dispatch(&mut ctx, &registry, &handlers),
        ResolutionOutcome::Dispatch(expected.to_string())
    );
}

#[rstest]
#[case::unknown_topic_uses_payload_map(Some("releases"), "onLabeled")]
#[case::missing_header_uses_payload_map(None, "onLabeled")]
#[case::plain_header_topic(Some("pulls"), "onPull")]
fn test_combined_strategy_fallbacks(#[case] topic: Option<&str>, #[case] expected: &str) {
    let registry = combined_registry();
    let handlers = handlers(&["onIssueOpened", "onIssue", "onLabeled", "onPull"]);
    let mut ctx = RequestContext::new("POST").with_payload(payload(&[("action", "labeled")]));
    if let Some(topic) = topic {
        ctx = ctx.with_header("x-topic", topic);
    }

    let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers);

    assert_eq!(outcome, ResolutionOutcome::Dispatch(expected.to_string()));
}

#[test]
fn test_combined_strategy_exhausted_fallbacks() {
    let registry = combined_registry();
    let mut ctx = RequestContext::new("POST")
        .with_header("X-Topic", "releases")
        .with_payload(payload(&[("action", "published")]));

    let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&["onIssue"]));

    match outcome {
        ResolutionOutcome::Error(e) => {
            assert_eq!(e.kind, ErrorKind::NoMatchingResource);
            assert_eq!(
                e.message,
                "Matching resource not found for dispatching based on Header and Payload Key"
            );
        }
        other => panic!("Expected NoMatchingResource, got {other:?}"),
    }
}

#[test]
fn test_combined_strategy_without_plain_maps() {
    let registry = ServiceRegistry::builder(TopicStrategy::ByHeaderAndPayloadKey)
        .topic_header("X-Topic")
        .header_and_payload_key_resource("issues", "action", "opened", "onIssueOpened")
        .build()
        .expect("valid registry");
    let mut ctx = RequestContext::new("POST")
        .with_header("X-Topic", "issues")
        .with_payload(payload(&[("action", "closed")]));

    let outcome =
        ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&["onIssueOpened"]));

    assert_eq!(outcome.error_kind(), Some(ErrorKind::NoMatchingResource));
}

#[test]
fn test_phase_one_needs_no_body_for_get() {
    let registry = ServiceRegistry::builder(TopicStrategy::ByPayloadKey)
        .payload_key_resource("type", "create", "onCreate")
        .build()
        .expect("valid registry");
    let mut ctx = RequestContext::new("GET").with_query("hub.mode=denied");

    let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&[]));

    assert_eq!(outcome, ResolutionOutcome::Unhandled);
    assert!(!ctx.is_deferred());
}

proptest! {
    #[test]
    fn prop_dispatch_is_deterministic_with_materialized_payload(
        action in "[a-z]{1,8}",
        topic in prop_oneof![Just("issues".to_string()), Just("pulls".to_string()), "[a-z]{1,8}"],
    ) {
        let registry = combined_registry();
        let handlers = handlers(&["onIssueOpened", "onIssueClosed", "onIssue", "onLabeled", "onPull"]);
        let dispatcher = ResourceDispatcher::new();
        let ctx = RequestContext::new("POST")
            .with_header("X-Topic", topic.as_str())
            .with_payload(payload(&[("action", action.as_str())]));

        let mut first = ctx.clone();
        let mut second = ctx.clone();
        let a = dispatcher.dispatch(&mut first, &registry, &handlers);
        let b = dispatcher.dispatch(&mut second, &registry, &handlers);

        prop_assert_eq!(&a, &b);
        prop_assert!(a.is_terminal());
        prop_assert_eq!(first, ctx);
    }

    #[test]
    fn prop_hub_mode_case_is_ignored(mask in proptest::collection::vec(any::<bool>(), 6)) {
        let mode: String = "denied"
            .chars()
            .zip(mask)
            .map(|(c, upper)| if upper { c.to_ascii_uppercase() } else { c })
            .collect();
        let registry = header_registry();
        let mut ctx = RequestContext::new("GET").with_query(format!("hub.mode={mode}"));

        let outcome = ResourceDispatcher::new().dispatch(&mut ctx, &registry, &handlers(&[]));

        prop_assert_eq!(outcome, ResolutionOutcome::Unhandled);
    }
}
