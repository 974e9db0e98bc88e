use super::*;
use crate::test_support::{service, FakeCatalogApi};

#[tokio::test]
async fn loads_services_once_per_session() {
    let api = Arc::new(FakeCatalogApi::ok(vec![service(1, "Haircut"), service(2, "Massage")]));
    let catalog = ServiceCatalog::new(api.clone());

    let first = catalog.load().await;
    let second = catalog.load().await;

    assert_eq!(first.len(), 2);
    assert_eq!(second, first);
    assert_eq!(api.calls(), 1);
    assert_eq!(catalog.state(), CatalogState::Loaded(first));
}

#[tokio::test]
async fn failure_leaves_catalog_empty_without_retry() {
    let api = Arc::new(FakeCatalogApi::failing("catalog offline"));
    let catalog = ServiceCatalog::new(api.clone());

    let services = catalog.load().await;

    assert!(services.is_empty());
    assert_eq!(api.calls(), 1);
    assert_eq!(catalog.state(), CatalogState::Unavailable);

    catalog.load().await;
    assert_eq!(api.calls(), 1, "a failed one-shot load is not repeated");
}

#[tokio::test]
async fn empty_catalog_offers_single_disabled_choice() {
    let catalog = ServiceCatalog::new(Arc::new(FakeCatalogApi::failing("catalog offline")));
    catalog.load().await;

    let choices = catalog.choices();

    assert_eq!(
        choices,
        vec![ServiceChoice::Placeholder, ServiceChoice::NoneAvailable]
    );
    assert_eq!(choices.iter().filter(|choice| choice.is_disabled()).count(), 1);
    assert!(choices.iter().all(|choice| choice.value().is_none()));
}

#[tokio::test]
async fn loaded_catalog_lists_placeholder_then_services() {
    let catalog = ServiceCatalog::new(Arc::new(FakeCatalogApi::ok(vec![service(4, "Nails")])));
    catalog.load().await;

    let choices = catalog.choices();

    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0], ServiceChoice::Placeholder);
    assert_eq!(choices[1].value(), Some(ServiceId(4)));
    assert!(!choices[1].is_disabled());
}

#[tokio::test]
async fn retry_policy_retries_until_success() {
    let api = Arc::new(FakeCatalogApi::scripted(vec![
        Err("timeout".into()),
        Err("timeout".into()),
        Ok(vec![service(1, "Haircut")]),
    ]));
    let catalog = ServiceCatalog::new(api.clone()).with_retry(RetryPolicy {
        attempts: 3,
        delay: Duration::from_millis(1),
    });

    let services = catalog.load().await;

    assert_eq!(services, vec![service(1, "Haircut")]);
    assert_eq!(api.calls(), 3);
}

#[tokio::test]
async fn concurrent_load_does_not_issue_second_request() {
    let api = Arc::new(FakeCatalogApi::ok(vec![service(1, "Haircut")]));
    let gate = api.hold();
    let catalog = ServiceCatalog::new(api.clone());

    let (first, second) = tokio::join!(catalog.load(), async {
        tokio::task::yield_now().await;
        assert_eq!(catalog.state(), CatalogState::Loading);
        let second = catalog.load().await;
        gate.add_permits(1);
        second
    });

    assert_eq!(first.len(), 1);
    assert!(second.is_empty(), "caller that raced the load sees the empty catalog");
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn catalog_is_empty_before_load() {
    let catalog = ServiceCatalog::new(Arc::new(FakeCatalogApi::ok(Vec::new())));

    assert_eq!(catalog.state(), CatalogState::NotLoaded);
    assert!(catalog.services().is_empty());
}
