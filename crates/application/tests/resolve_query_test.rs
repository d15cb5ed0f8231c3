mod helpers;

use dohgate_application::use_cases::ResolveQueryUseCase;
use dohgate_domain::{DomainError, ResolutionRequest};
use helpers::MockRecordLookup;
use std::sync::Arc;

fn mx_lookup() -> MockRecordLookup {
    MockRecordLookup::new().with_mx(
        "example.com",
        &[(10, "mail1.example.com."), (20, "mail2.example.com.")],
    )
}

#[tokio::test]
async fn test_mx_scenario() {
    let use_case = ResolveQueryUseCase::new(Arc::new(mx_lookup()), 1800);
    let request = ResolutionRequest::new("example.com", "mx");

    let response = use_case.execute(&request).await.unwrap();

    assert_eq!(response.status, 0);
    assert_eq!(response.question.len(), 1);
    assert_eq!(response.question[0].name, "example.com");
    assert_eq!(response.question[0].record_type, 15);
    assert_eq!(response.answer.len(), 2);
    assert_eq!(response.answer[0].data, "10 mail1.example.com");
    assert_eq!(response.answer[1].data, "20 mail2.example.com");
    assert!(response.answer.iter().all(|a| a.ttl == 1800));
    assert!(response.answer.iter().all(|a| a.record_type == 15));
}

#[tokio::test]
async fn test_configured_ttl_is_used() {
    let use_case = ResolveQueryUseCase::new(Arc::new(mx_lookup()), 42);

    let response = use_case
        .execute(&ResolutionRequest::new("example.com", "15"))
        .await
        .unwrap();

    assert!(response.answer.iter().all(|a| a.ttl == 42));
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let use_case = ResolveQueryUseCase::new(Arc::new(mx_lookup()), 1800);
    let request = ResolutionRequest::new("example.com", "MX");

    let first = use_case.execute(&request).await.unwrap();
    let second = use_case.execute(&request).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unsupported_type_error() {
    let use_case = ResolveQueryUseCase::new(Arc::new(MockRecordLookup::new()), 1800);

    let result = use_case
        .execute(&ResolutionRequest::new("example.com", "hinfo"))
        .await;

    assert_eq!(
        result,
        Err(DomainError::UnsupportedType("hinfo".to_string()))
    );
}

#[tokio::test]
async fn test_nxdomain_error() {
    let use_case = ResolveQueryUseCase::new(Arc::new(MockRecordLookup::new()), 1800);

    let result = use_case
        .execute(&ResolutionRequest::new("missing.example.com", "a"))
        .await;

    assert!(matches!(result, Err(DomainError::NxDomain(_))));
}
