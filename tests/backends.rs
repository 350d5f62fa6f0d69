use std::thread;

use kvcache::{CacheError, MemoryStore, Result, SledStore, StoreBackend};
use tempfile::TempDir;

fn sled_store() -> Result<(TempDir, SledStore)> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let store = SledStore::open(temp_dir.path())?;
    Ok((temp_dir, store))
}

fn check_set_get<S: StoreBackend>(store: S) -> Result<()> {
    assert_eq!(store.get("key1")?, None);
    store.set("key1", b"value1")?;
    store.set("key2", b"")?;
    assert_eq!(store.get("key1")?, Some(b"value1".to_vec()));
    assert_eq!(store.get("key2")?, Some(Vec::new()));

    store.set("key1", b"value2")?;
    assert_eq!(store.get("key1")?, Some(b"value2".to_vec()));
    Ok(())
}

fn check_incr<S: StoreBackend>(store: S) -> Result<()> {
    assert_eq!(store.incr("counter")?, 1);
    assert_eq!(store.incr("counter")?, 2);
    assert_eq!(store.get("counter")?, Some(b"2".to_vec()));

    store.set("preset", b"10")?;
    assert_eq!(store.incr("preset")?, 11);

    store.set("text", b"ten")?;
    assert!(matches!(store.incr("text"), Err(CacheError::NotAnInteger)));
    Ok(())
}

fn check_lists<S: StoreBackend>(store: S) -> Result<()> {
    assert_eq!(store.lrange("list", 0, -1)?, Vec::<Vec<u8>>::new());
    assert_eq!(store.rpush("list", b"a")?, 1);
    assert_eq!(store.rpush("list", b"b")?, 2);
    assert_eq!(store.rpush("list", b"c")?, 3);

    assert_eq!(
        store.lrange("list", 0, -1)?,
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
    );
    assert_eq!(store.lrange("list", 1, 1)?, vec![b"b".to_vec()]);
    assert_eq!(store.lrange("list", -2, 10)?, vec![b"b".to_vec(), b"c".to_vec()]);
    assert!(store.lrange("list", 5, 10)?.is_empty());
    Ok(())
}

fn check_long_list<S: StoreBackend>(store: S) -> Result<()> {
    for i in 0..3000 {
        assert_eq!(store.rpush("history", i.to_string().as_bytes())?, i + 1);
    }

    let items = store.lrange("history", 0, -1)?;
    assert_eq!(items.len(), 3000);
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item, i.to_string().as_bytes());
    }

    assert_eq!(
        store.lrange("history", -2, -1)?,
        vec![b"2998".to_vec(), b"2999".to_vec()]
    );
    assert_eq!(store.lrange("history", 255, 256)?, vec![b"255".to_vec(), b"256".to_vec()]);

    // a neighbouring list is unaffected
    store.rpush("history2", b"x")?;
    assert_eq!(store.lrange("history", 0, -1)?.len(), 3000);
    Ok(())
}

fn check_set_discards_list<S: StoreBackend>(store: S) -> Result<()> {
    store.rpush("list", b"a")?;
    store.rpush("list", b"b")?;
    store.rpush("list2", b"kept")?;
    store.set("list", b"string")?;
    store.set("list", b"string again")?;

    assert!(matches!(store.rpush("list", b"c"), Err(CacheError::WrongType)));
    store.flushdb()?;
    assert_eq!(store.rpush("list", b"c")?, 1);
    assert_eq!(store.lrange("list", 0, -1)?, vec![b"c".to_vec()]);

    store.flushdb()?;
    store.rpush("list", b"a")?;
    store.rpush("list2", b"kept")?;
    store.set("list", b"string")?;
    assert_eq!(store.lrange("list2", 0, -1)?, vec![b"kept".to_vec()]);
    Ok(())
}

fn check_concurrent_updates<S: StoreBackend>(store: S) -> Result<()> {
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || -> Result<()> {
                for i in 0..50 {
                    store.incr("counter")?;
                    store.rpush("list", format!("{t}-{i}").as_bytes())?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread panicked")?;
    }

    assert_eq!(store.get("counter")?, Some(b"400".to_vec()));
    let items = store.lrange("list", 0, -1)?;
    assert_eq!(items.len(), 400);

    // every thread's pushes land in the order it made them
    for t in 0..8 {
        let own: Vec<_> = items
            .iter()
            .filter(|item| item.starts_with(format!("{t}-").as_bytes()))
            .collect();
        assert_eq!(own.len(), 50);
        for (i, item) in own.iter().enumerate() {
            assert_eq!(item.as_slice(), format!("{t}-{i}").as_bytes());
        }
    }
    Ok(())
}

fn check_wrong_type<S: StoreBackend>(store: S) -> Result<()> {
    store.set("string", b"x")?;
    store.rpush("list", b"x")?;

    assert!(matches!(store.rpush("string", b"y"), Err(CacheError::WrongType)));
    assert!(matches!(store.lrange("string", 0, -1), Err(CacheError::WrongType)));
    assert!(matches!(store.get("list"), Err(CacheError::WrongType)));
    assert!(matches!(store.incr("list"), Err(CacheError::WrongType)));

    // set replaces a list
    store.set("list", b"now a string")?;
    assert_eq!(store.get("list")?, Some(b"now a string".to_vec()));
    Ok(())
}

fn check_exists_and_flush<S: StoreBackend>(store: S) -> Result<()> {
    store.set("string", b"x")?;
    store.rpush("list", b"x")?;
    assert!(store.exists("string")?);
    assert!(store.exists("list")?);
    assert!(!store.exists("missing")?);

    store.flushdb()?;
    assert!(!store.exists("string")?);
    assert!(!store.exists("list")?);
    assert_eq!(store.get("string")?, None);
    Ok(())
}

#[test]
fn memory_set_get() -> Result<()> {
    check_set_get(MemoryStore::new())
}

#[test]
fn memory_incr() -> Result<()> {
    check_incr(MemoryStore::new())
}

#[test]
fn memory_lists() -> Result<()> {
    check_lists(MemoryStore::new())
}

#[test]
fn memory_wrong_type() -> Result<()> {
    check_wrong_type(MemoryStore::new())
}

#[test]
fn memory_exists_and_flush() -> Result<()> {
    check_exists_and_flush(MemoryStore::new())
}

#[test]
fn memory_long_list() -> Result<()> {
    check_long_list(MemoryStore::new())
}

#[test]
fn memory_set_discards_list() -> Result<()> {
    check_set_discards_list(MemoryStore::new())
}

#[test]
fn memory_concurrent_updates() -> Result<()> {
    check_concurrent_updates(MemoryStore::new())
}

#[test]
fn memory_clones_share_data() -> Result<()> {
    let store = MemoryStore::new();
    let other = store.clone();
    store.set("key", b"value")?;
    assert_eq!(other.get("key")?, Some(b"value".to_vec()));
    Ok(())
}

#[test]
fn sled_set_get() -> Result<()> {
    let (_dir, store) = sled_store()?;
    check_set_get(store)
}

#[test]
fn sled_incr() -> Result<()> {
    let (_dir, store) = sled_store()?;
    check_incr(store)
}

#[test]
fn sled_lists() -> Result<()> {
    let (_dir, store) = sled_store()?;
    check_lists(store)
}

#[test]
fn sled_wrong_type() -> Result<()> {
    let (_dir, store) = sled_store()?;
    check_wrong_type(store)
}

#[test]
fn sled_exists_and_flush() -> Result<()> {
    let (_dir, store) = sled_store()?;
    check_exists_and_flush(store)
}

#[test]
fn sled_long_list() -> Result<()> {
    let (_dir, store) = sled_store()?;
    check_long_list(store)
}

#[test]
fn sled_set_discards_list() -> Result<()> {
    let (_dir, store) = sled_store()?;
    check_set_discards_list(store)
}

#[test]
fn sled_concurrent_updates() -> Result<()> {
    let (_dir, store) = sled_store()?;
    check_concurrent_updates(store)
}

// Should survive a reopen of the database.
#[test]
fn sled_persists_values_and_lists() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");

    let store = SledStore::open(temp_dir.path())?;
    store.set("key", b"value")?;
    store.incr("counter")?;
    store.rpush("list", b"a")?;
    store.rpush("list", b"b")?;
    drop(store);

    let store = SledStore::open(temp_dir.path())?;
    assert_eq!(store.get("key")?, Some(b"value".to_vec()));
    assert_eq!(store.incr("counter")?, 2);
    assert_eq!(store.rpush("list", b"c")?, 3);
    assert_eq!(
        store.lrange("list", 0, -1)?,
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
    );
    Ok(())
}
