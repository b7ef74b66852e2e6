/*!
 * Named Mutex Tests
 */

use build_relay::ipc::{MutexError, NamedMutex};
use tempfile::TempDir;

#[test]
fn test_second_handle_is_refused_until_release() {
    let dir = TempDir::new().unwrap();
    let mut first = NamedMutex::new("relay-contended", dir.path()).unwrap();
    let mut second = NamedMutex::new("relay-contended", dir.path()).unwrap();

    assert!(first.try_lock().unwrap());
    assert!(!second.try_lock().unwrap());
    assert!(!second.is_locked());

    first.unlock().unwrap();
    assert!(second.try_lock().unwrap());
}

#[test]
fn test_drop_releases() {
    let dir = TempDir::new().unwrap();
    {
        let mut held = NamedMutex::new("relay-dropped", dir.path()).unwrap();
        assert!(held.try_lock().unwrap());
    }
    let mut next = NamedMutex::new("relay-dropped", dir.path()).unwrap();
    assert!(next.try_lock().unwrap());
}

#[test]
fn test_relock_same_handle_is_noop() {
    let dir = TempDir::new().unwrap();
    let mut mutex = NamedMutex::new("relay-relock", dir.path()).unwrap();
    assert!(mutex.try_lock().unwrap());
    assert!(mutex.try_lock().unwrap());
    mutex.unlock().unwrap();
    mutex.unlock().unwrap();
    assert!(!mutex.is_locked());
}

#[test]
fn test_names_do_not_interfere() {
    let dir = TempDir::new().unwrap();
    let mut a = NamedMutex::new("relay-a", dir.path()).unwrap();
    let mut b = NamedMutex::new("relay-b", dir.path()).unwrap();
    assert!(a.try_lock().unwrap());
    assert!(b.try_lock().unwrap());
}

#[test]
fn test_lock_file_location() {
    let dir = TempDir::new().unwrap();
    let mut mutex = NamedMutex::new("relay-path", dir.path()).unwrap();
    assert_eq!(mutex.path(), dir.path().join("relay-path.lock"));
    assert!(!mutex.path().exists());
    mutex.try_lock().unwrap();
    assert!(mutex.path().exists());
}

#[test]
fn test_invalid_names() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        NamedMutex::new("", dir.path()),
        Err(MutexError::InvalidName(_))
    ));
    assert!(matches!(
        NamedMutex::new("a/b", dir.path()),
        Err(MutexError::InvalidName(_))
    ));
}

#[test]
fn test_missing_lock_dir_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut mutex = NamedMutex::new("relay-nodir", &dir.path().join("absent")).unwrap();
    assert!(matches!(mutex.try_lock(), Err(MutexError::Open { .. })));
}
