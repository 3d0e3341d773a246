/// Resolution cache tests
///
/// These tests verify that the cache:
/// - Answers only while a schema built from the document is alive
/// - Keys entries by the exact (namespace, location, base URI) request
/// - Is shared by clones and by nothing else
use std::sync::Arc;

use xsd_model::{CacheConfig, CacheKey, Collection, ResolutionCache};

use crate::common::mocks::CountingResolver;

const LEAF: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="leaf" type="xs:string"/>
</xs:schema>"#;

#[test]
fn test_entry_lives_with_collection() {
    let cache = ResolutionCache::new(&CacheConfig { max_entries: 16 });
    let resolver = Arc::new(CountingResolver::new().with_document("leaf.xsd", LEAF));
    let key = CacheKey::new("", "leaf.xsd", None);

    {
        let mut collection = Collection::new()
            .with_resolver(resolver.clone())
            .with_cache(cache.clone());
        collection.read_location("leaf.xsd", None).unwrap().unwrap();

        assert!(cache.contains(&key));
        assert_eq!(cache.stats().live_entries, 1);
    }

    // The collection held the only strong reference
    assert!(!cache.contains(&key));
    assert!(cache.get(&key).is_none());
}

#[test]
fn test_key_is_the_exact_request() {
    let cache = ResolutionCache::default();
    let resolver = Arc::new(CountingResolver::new().with_document("dir/leaf.xsd", LEAF));
    let mut collection = Collection::new()
        .with_resolver(resolver)
        .with_cache(cache.clone());

    collection.read_location("leaf.xsd", Some("dir/main.xsd")).unwrap().unwrap();

    assert!(cache.contains(&CacheKey::new("", "leaf.xsd", Some("dir/main.xsd"))));
    assert!(!cache.contains(&CacheKey::new("", "dir/leaf.xsd", None)));
    assert!(!cache.contains(&CacheKey::new("", "leaf.xsd", None)));
}

#[test]
fn test_collection_without_cache_always_resolves() {
    let resolver = Arc::new(CountingResolver::new().with_document("leaf.xsd", LEAF));

    let mut first = Collection::new().with_resolver(resolver.clone());
    first.read_location("leaf.xsd", None).unwrap();
    let mut second = Collection::new().with_resolver(resolver.clone());
    second.read_location("leaf.xsd", None).unwrap();

    assert!(first.cache().is_none());
    assert_eq!(resolver.call_count(), 2);
}

#[test]
fn test_set_cache_replaces_and_returns_previous() {
    let cache = ResolutionCache::default();
    let mut collection = Collection::new().with_cache(cache);

    let previous = collection.set_cache(None);
    assert!(previous.is_some());
    assert!(collection.cache().is_none());
}
