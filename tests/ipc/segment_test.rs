/*!
 * Shared Segment Tests
 * Segment lifetime and the result layout across two mappings
 */

use build_relay::ipc::{SharedResult, SharedSegment, ShmError};
use build_relay::ReturnCode;
use pretty_assertions::assert_eq;

fn unique(tag: &str) -> String {
    format!("/build-relay-it-{}-{}", tag, std::process::id())
}

#[test]
fn test_recreate_after_drop_is_zeroed() {
    let name = unique("recreate");

    let first = SharedSegment::create(&name, SharedResult::SIZE).unwrap();
    let shared = SharedResult::new(&first).unwrap();
    shared.mark_started();
    shared.store_return_code(ReturnCode::BuildFailed);
    drop(shared);
    drop(first);

    let second = SharedSegment::create(&name, SharedResult::SIZE).unwrap();
    let shared = SharedResult::new(&second).unwrap();
    assert!(!shared.is_started());
    assert_eq!(shared.raw_return_code(), 0);
}

#[test]
fn test_create_refuses_existing_name() {
    let name = unique("exclusive");
    let _owner = SharedSegment::create(&name, SharedResult::SIZE).unwrap();
    assert_eq!(
        SharedSegment::create(&name, SharedResult::SIZE).unwrap_err(),
        ShmError::AlreadyExists(name.clone())
    );
}

#[test]
fn test_open_after_creator_gone() {
    let name = unique("gone");
    drop(SharedSegment::create(&name, SharedResult::SIZE).unwrap());
    assert!(SharedSegment::open(&name, SharedResult::SIZE).unwrap().is_none());
}

#[test]
fn test_reader_sees_writer() {
    let name = unique("visible");
    let owner = SharedSegment::create(&name, SharedResult::SIZE).unwrap();
    let main_view = SharedResult::new(&owner).unwrap();
    main_view.initialize();

    let opened = SharedSegment::open(&name, SharedResult::SIZE)
        .unwrap()
        .unwrap();
    let final_view = SharedResult::new(&opened).unwrap();

    assert!(!main_view.is_started());
    assert_eq!(main_view.return_code(), ReturnCode::WrapperCrashed);

    final_view.mark_started();
    final_view.store_return_code(ReturnCode::Ok);

    assert!(main_view.is_started());
    assert_eq!(main_view.return_code(), ReturnCode::Ok);
}

#[test]
fn test_stale_name_can_be_unlinked() {
    let name = unique("stale");
    let owner = SharedSegment::create(&name, SharedResult::SIZE).unwrap();
    let view = SharedResult::new(&owner).unwrap();

    assert!(SharedSegment::unlink(&name).unwrap());
    assert!(!SharedSegment::unlink(&name).unwrap());
    assert!(SharedSegment::open(&name, SharedResult::SIZE).unwrap().is_none());

    // The existing mapping outlives its name
    view.store_return_code(ReturnCode::Ok);
    assert_eq!(view.return_code(), ReturnCode::Ok);
}
