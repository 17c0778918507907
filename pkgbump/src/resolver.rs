use crate::error::ResolveError;
use crate::npm::NpmClient;
use pkgbump_core::Version;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Lookup outcome per requested package name
pub type Resolutions = HashMap<String, Result<Version, ResolveError>>;

/// Bounded concurrent registry lookups. Each lookup writes only its own
/// result slot.
pub struct VersionResolver {
    client: NpmClient,
    concurrency: usize,
}

impl VersionResolver {
    pub fn new(client: NpmClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency,
        }
    }

    /// Resolve every name in `names` (expected unique) with at most
    /// `concurrency` requests in flight. `progress` receives
    /// `(completed, total)` after each lookup.
    pub async fn resolve_all<P>(&self, names: &[String], progress: P) -> Resolutions
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        let client = self.client.clone();
        fan_out(
            names,
            self.concurrency,
            move |name| {
                let client = client.clone();
                async move { client.resolve(&name).await }
            },
            progress,
        )
        .await
    }
}

/// Run `lookup` once per name with at most `limit` lookups running at any
/// instant. A failed lookup never cancels the others, and every name gets
/// exactly one entry in the returned map.
pub async fn fan_out<T, F, Fut, P>(
    names: &[String],
    limit: usize,
    lookup: F,
    progress: P,
) -> HashMap<String, Result<T, ResolveError>>
where
    T: Send + 'static,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, ResolveError>> + Send + 'static,
    P: Fn(usize, usize) + Send + Sync + 'static,
{
    let total = names.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let progress = Arc::new(progress);
    let completed = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::with_capacity(total);

    for name in names {
        let lookup = lookup(name.clone());
        let semaphore = Arc::clone(&semaphore);
        let progress = Arc::clone(&progress);
        let completed = Arc::clone(&completed);

        let task = tokio::spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => lookup.await,
                Err(_) => Err(ResolveError::Network("lookup pool closed".to_string())),
            };

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(done, total);

            result
        });

        tasks.push((name.clone(), task));
    }

    let mut results = HashMap::with_capacity(total);
    for (name, task) in tasks {
        let result = match task.await {
            Ok(result) => result,
            Err(e) => Err(ResolveError::Network(format!("lookup task failed: {e}"))),
        };
        if let Err(e) = &result {
            tracing::warn!(package = %name, error = %e, "lookup failed");
        }
        results.insert(name, result);
    }

    results
}
