// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Eventually consistent object lookup.
//!
//! A user often creates a secret and the object referencing it right after each
//! other. The referencing request can then arrive before the informer cache has seen
//! the secret, so a cache miss is not trusted immediately:
//!
//! 1. read the cache; a hit or any error other than not-found is final,
//! 2. wait a short, bounded time and read the cache again,
//! 3. read the API server; its answer is final, including not-found.

use super::{Client, Lister, Result};
use crate::api::core::Resource;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Runs the three lookup stages with arbitrary cache and live readers.
pub async fn get_with_fallback<T, C, L, F>(
    kind: &str,
    namespace: &str,
    name: &str,
    wait: Duration,
    cached: C,
    live: L,
) -> Result<T>
where
    C: Fn() -> Result<T>,
    L: FnOnce() -> F,
    F: Future<Output = Result<T>>,
{
    match cached() {
        Err(err) if err.is_not_found() => {}
        result => return result,
    }

    debug!(kind, namespace, name, ?wait, "object not found in cache, waiting for cache to settle");
    sleep(wait).await;

    match cached() {
        Err(err) if err.is_not_found() => {}
        result => return result,
    }

    debug!(kind, namespace, name, "object still not in cache, reading from API server");
    live().await
}

/// Resolves one object through its lister, falling back to the live client.
pub async fn lookup<T: Resource>(
    lister: &dyn Lister<T>,
    client: &dyn Client<T>,
    wait: Duration,
    namespace: &str,
    name: &str,
) -> Result<T> {
    get_with_fallback(
        T::KIND,
        namespace,
        name,
        wait,
        || lister.get(namespace, name),
        || client.get(namespace, name),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Error, Store};
    use crate::api::core::Secret;
    use std::sync::Arc;
    use tokio::time::Instant;

    const WAIT: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_does_not_wait() {
        let cache = Store::from_objects(vec![Secret::new("garden-dev", "creds")]);
        let live: Store<Secret> = Store::new();

        let start = Instant::now();
        for _ in 0..2 {
            let secret = lookup(&cache, &live, WAIT, "garden-dev", "creds").await.unwrap();
            assert_eq!(secret.metadata.name, "creds");
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(cache.get_calls(), 2);
        assert_eq!(live.get_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_miss_runs_every_stage() {
        let cache: Store<Secret> = Store::new();
        let live = Store::from_objects(vec![Secret::new("garden-dev", "creds")]);

        let start = Instant::now();
        for _ in 0..2 {
            let secret = lookup(&cache, &live, WAIT, "garden-dev", "creds").await.unwrap();
            assert_eq!(secret.metadata.name, "creds");
        }

        assert!(start.elapsed() >= WAIT * 2);
        assert_eq!(cache.get_calls(), 4);
        assert_eq!(live.get_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_catches_up_during_wait() {
        let cache: Arc<Store<Secret>> = Arc::new(Store::new());
        let live: Store<Secret> = Store::new();

        let writer = {
            let cache = cache.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(10)).await;
                cache.add(Secret::new("garden-dev", "creds"));
            })
        };

        let secret = lookup(cache.as_ref(), &live, WAIT, "garden-dev", "creds")
            .await
            .unwrap();
        writer.await.unwrap();

        assert_eq!(secret.metadata.name, "creds");
        assert_eq!(cache.get_calls(), 2);
        assert_eq!(live.get_calls(), 0);
    }

    #[tokio::test]
    async fn test_live_not_found_is_final() {
        let cache: Store<Secret> = Store::new();
        let live: Store<Secret> = Store::new();

        let err = lookup(&cache, &live, Duration::ZERO, "garden-dev", "creds")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(live.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_error_fails_immediately() {
        let cache: Store<Secret> = Store::new();
        cache.fail_with(Error::Other("cache unavailable".to_string()));
        let live = Store::from_objects(vec![Secret::new("garden-dev", "creds")]);

        let err = lookup(&cache, &live, WAIT, "garden-dev", "creds")
            .await
            .unwrap_err();
        assert_eq!(err, Error::Other("cache unavailable".to_string()));
        assert_eq!(cache.get_calls(), 1);
        assert_eq!(live.get_calls(), 0);
    }
}
