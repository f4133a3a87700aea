//! Repository conformance suite.
//!
//! Backends call [`run_repository_conformance_tests`] from their own
//! test modules with a fresh, empty store and a factory producing
//! distinct unpersisted entities. The suite asserts the contract every
//! [`Repository`] implementation must honor, so memory and SQL backends
//! stay interchangeable under the gateway.

use syncline_core::{Entity, EntityId, PageRequest};

use crate::error::RecordError;
use crate::repository::Repository;

/// Run the full conformance suite against a fresh store.
///
/// `make(n)` must return an unpersisted entity (`id == None`) that is
/// distinguishable from `make(m)` for `n != m`.
///
/// # Errors
///
/// Returns an error if any conformance check fails.
pub async fn run_repository_conformance_tests<E, F>(
    repo: &dyn Repository<E>,
    mut make: F,
) -> Result<(), RecordError>
where
    E: Entity,
    F: FnMut(usize) -> E,
{
    test_save_assigns_id(repo, &mut make).await?;
    test_find_missing_is_none(repo).await?;
    test_update_in_place(repo, &mut make).await?;
    test_update_missing_is_not_found(repo, &mut make).await?;
    test_delete_reports_existence(repo, &mut make).await?;
    test_page_math(repo, &mut make).await?;
    Ok(())
}

async fn test_save_assigns_id<E: Entity>(
    repo: &dyn Repository<E>,
    make: &mut impl FnMut(usize) -> E,
) -> Result<(), RecordError> {
    let saved = repo.save(make(0)).await?;
    let id = saved.id().expect("save must assign an id");

    let found = repo.find_by_id(id).await?;
    assert!(found.is_some(), "saved row must be readable by id");
    assert_eq!(found.unwrap().id(), Some(id));
    Ok(())
}

async fn test_find_missing_is_none<E: Entity>(
    repo: &dyn Repository<E>,
) -> Result<(), RecordError> {
    let found = repo.find_by_id(EntityId(i64::MAX)).await?;
    assert!(found.is_none(), "find on a missing id must return None");
    Ok(())
}

async fn test_update_in_place<E: Entity>(
    repo: &dyn Repository<E>,
    make: &mut impl FnMut(usize) -> E,
) -> Result<(), RecordError> {
    let saved = repo.save(make(1)).await?;
    let id = saved.id().unwrap();
    let before = repo.find_all().await?.len();

    let updated = repo.save(saved).await?;
    assert_eq!(updated.id(), Some(id), "update must keep the id");

    let after = repo.find_all().await?.len();
    assert_eq!(before, after, "update must not create a second row");
    Ok(())
}

async fn test_update_missing_is_not_found<E: Entity>(
    repo: &dyn Repository<E>,
    make: &mut impl FnMut(usize) -> E,
) -> Result<(), RecordError> {
    let mut ghost = make(2);
    ghost.set_id(EntityId(i64::MAX - 1));

    let result = repo.save(ghost).await;
    assert!(
        matches!(result, Err(RecordError::NotFound { .. })),
        "updating a missing id must fail with NotFound"
    );
    Ok(())
}

async fn test_delete_reports_existence<E: Entity>(
    repo: &dyn Repository<E>,
    make: &mut impl FnMut(usize) -> E,
) -> Result<(), RecordError> {
    let saved = repo.save(make(3)).await?;
    let id = saved.id().unwrap();

    let existed = repo.delete_by_id(id).await?;
    assert!(existed, "delete of an existing row must return true");
    assert!(repo.find_by_id(id).await?.is_none());

    let existed = repo.delete_by_id(id).await?;
    assert!(!existed, "delete of a missing row must return false");
    Ok(())
}

async fn test_page_math<E: Entity>(
    repo: &dyn Repository<E>,
    make: &mut impl FnMut(usize) -> E,
) -> Result<(), RecordError> {
    let before = repo.find_all().await?.len() as u64;
    for n in 10..17 {
        repo.save(make(n)).await?;
    }

    let page = repo.find_page(&PageRequest::of(0, 3)).await?;
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.total, before + 7);

    let last = repo
        .find_page(&PageRequest::of((before as u32 + 6) / 3, 3))
        .await?;
    assert!(!last.items.is_empty(), "last page must not be empty");
    Ok(())
}
