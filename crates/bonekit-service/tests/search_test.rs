//! Integration tests for criteria search.

mod helpers;

use bonekit_core::ErrorKind;
use bonekit_core::types::SearchCriteria;

async fn seeded() -> bonekit_service::GenericService<helpers::Person, bonekit_database::SqlContext> {
    let service = helpers::service().await;
    helpers::seed(
        &service,
        &[
            ("Ann", 30),
            ("Joanna", 18),
            ("Hannah", 12),
            ("Bob", 9),
            ("Carl", 45),
        ],
    )
    .await;
    service
}

#[tokio::test]
async fn test_at_least_filters_by_age() {
    let service = seeded().await;
    let found = service
        .search(&[SearchCriteria::new("age", ">", 18)])
        .await
        .unwrap();

    let mut names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Ann", "Carl", "Joanna"]);
    assert!(found.iter().all(|p| p.age >= 18));
}

#[tokio::test]
async fn test_range_criteria_are_anded_and_inclusive() {
    let service = seeded().await;
    let found = service
        .search(&[
            SearchCriteria::new("age", ">", 10),
            SearchCriteria::new("age", "<", 30),
        ])
        .await
        .unwrap();

    let mut names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Ann", "Hannah", "Joanna"]);
    assert!(found.iter().all(|p| (10..=30).contains(&p.age)));
}

#[tokio::test]
async fn test_match_on_text_field_is_substring() {
    let service = seeded().await;
    let found = service
        .search(&[SearchCriteria::new("name", ":", "ann")])
        .await
        .unwrap();

    assert!(!found.is_empty());
    assert!(found.iter().all(|p| p.name.to_lowercase().contains("ann")));
    assert!(found.iter().any(|p| p.name == "Joanna"));
    assert!(found.iter().any(|p| p.name == "Hannah"));
    assert!(found.iter().all(|p| p.name != "Bob" && p.name != "Carl"));
}

#[tokio::test]
async fn test_match_on_non_text_field_is_exact() {
    let service = seeded().await;
    let found = service
        .search(&[SearchCriteria::new("age", ":", 30)])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Ann");

    let found = service
        .search(&[SearchCriteria::new("age", ":", "ann")])
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_unrecognized_operation_is_ignored() {
    let service = seeded().await;
    let unfiltered = service.search(&[]).await.unwrap();
    let ignored = service
        .search(&[SearchCriteria::new("x", "~", 1)])
        .await
        .unwrap();

    assert_eq!(unfiltered.len(), 5);
    assert_eq!(ignored, unfiltered);
}

#[tokio::test]
async fn test_unknown_field_is_invalid_argument() {
    let service = seeded().await;
    let err = service
        .search(&[SearchCriteria::new("salary", ">", 1)])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
}
