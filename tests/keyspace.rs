use {
    async_trait::async_trait,
    peercache::{
        ByteView,
        CacheError,
        CacheResult,
        Keyspace,
        KeyspaceBuilder,
        KeyspaceRegistry,
        PeerGetter,
        PeerPicker,
        Request,
        Response,
        Source,
        SourceError,
        SourceFn,
    },
    std::{
        collections::HashMap,
        sync::{
            Arc,
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    },
};

fn db() -> HashMap<&'static str, &'static str> {
    HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")])
}

/// Source over `db()` counting loads per key.
fn counting_source() -> (
    SourceFn<impl Fn(&str) -> Result<Vec<u8>, SourceError> + Send + Sync>,
    Arc<Mutex<HashMap<String, usize>>>,
) {
    let counts = Arc::new(Mutex::new(HashMap::new()));
    let loads = counts.clone();
    let source = SourceFn::new(move |key: &str| -> Result<Vec<u8>, SourceError> {
        match db().get(key) {
            Some(value) => {
                *loads.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
                Ok(value.as_bytes().to_vec())
            }
            None => Err(format!("{key} not exist").into()),
        }
    });
    (source, counts)
}

#[tokio::test]
async fn loads_once_then_hits() {
    let (source, counts) = counting_source();
    let scores = Keyspace::new("scores", 2 << 10, source);

    for (key, value) in db() {
        let view = scores.get(key).await.expect("failed to get value from source");
        assert_eq!(view.to_string(), value);

        scores.get(key).await.unwrap();
        assert_eq!(counts.lock().unwrap()[key], 1, "cache {key} miss");
    }

    let err = scores.get("unknown").await.unwrap_err();
    assert!(matches!(err, CacheError::Source(_)));
    assert_eq!(err.to_string(), "source failure: unknown not exist");
}

#[tokio::test]
async fn empty_key_is_rejected() {
    let (source, counts) = counting_source();
    let scores = Keyspace::new("scores", 2 << 10, source);

    assert!(matches!(scores.get("").await, Err(CacheError::InvalidKey)));
    assert!(counts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failures_are_not_cached() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let source = SourceFn::new(move |_key: &str| -> Result<Vec<u8>, SourceError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Err("backend down".into())
    });
    let keyspace = Keyspace::new("flaky", 1024, source);

    assert!(keyspace.get("k").await.is_err());
    assert!(keyspace.get("k").await.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert!(keyspace.cached("k").is_none());
}

#[tokio::test]
async fn evicted_keys_are_reloaded() {
    let (source, counts) = counting_source();
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = evicted.clone();

    // Room for exactly one "Tom"/"630" sized entry.
    let scores = KeyspaceBuilder::new("scores", 7, source)
        .on_evict(move |key, _| sink.lock().unwrap().push(key.to_string()))
        .build();

    scores.get("Tom").await.unwrap();
    scores.get("Sam").await.unwrap();
    assert!(scores.cached("Tom").is_none());
    assert_eq!(scores.cached("Sam").unwrap().to_string(), "567");
    assert_eq!(*evicted.lock().unwrap(), ["Tom"]);

    scores.get("Tom").await.unwrap();
    assert_eq!(counts.lock().unwrap()["Tom"], 2);
}

struct SlowSource {
    loads: AtomicUsize,
}

#[async_trait]
impl Source for SlowSource {
    async fn load(&self, key: &str) -> Result<Vec<u8>, SourceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(format!("value of {key}").into_bytes())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_load_once() {
    let source = Arc::new(SlowSource {
        loads: AtomicUsize::new(0),
    });
    let keyspace = Arc::new(Keyspace::new("slow", 1024, ArcSource(source.clone())));

    let handles = (0..16)
        .map(|_| {
            let keyspace = keyspace.clone();
            tokio::spawn(async move { keyspace.get("X").await })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().to_string(), "value of X");
    }
    assert_eq!(source.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_caller_does_not_fail_waiters() {
    let source = Arc::new(SlowSource {
        loads: AtomicUsize::new(0),
    });
    let keyspace = Arc::new(Keyspace::new("slow", 1024, ArcSource(source.clone())));

    let first = {
        let keyspace = keyspace.clone();
        tokio::spawn(async move { keyspace.get("X").await })
    };
    while source.loads.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    let second = {
        let keyspace = keyspace.clone();
        tokio::spawn(async move { keyspace.get("X").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    first.abort();

    // The second caller takes over the load.
    assert_eq!(second.await.unwrap().unwrap().to_string(), "value of X");
    assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    assert!(keyspace.cached("X").is_some());
}

/// Lets a test keep a handle on a source it gives away.
struct ArcSource<S>(Arc<S>);

#[async_trait]
impl<S: Source> Source for ArcSource<S> {
    async fn load(&self, key: &str) -> Result<Vec<u8>, SourceError> {
        self.0.load(key).await
    }
}

/// Routes every key to a single fake remote peer.
struct RemotePeer {
    getter: Arc<FakeGetter>,
}

impl PeerPicker for RemotePeer {
    fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
        Some(self.getter.clone() as Arc<dyn PeerGetter>)
    }
}

struct FakeGetter {
    requests: Mutex<Vec<Request>>,
    fail: bool,
}

#[async_trait]
impl PeerGetter for FakeGetter {
    async fn get(&self, request: &Request) -> CacheResult<Response> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(CacheError::PeerTransport {
                peer: "fake".to_string(),
                reason: "server returned: 500 Internal Server Error".to_string(),
            });
        }
        Ok(Response {
            value: format!("remote {}", request.key).into_bytes(),
        })
    }
}

fn remote_keyspace(fail: bool) -> (Keyspace, Arc<FakeGetter>, Arc<Mutex<HashMap<String, usize>>>) {
    let getter = Arc::new(FakeGetter {
        requests: Mutex::new(Vec::new()),
        fail,
    });
    let (source, counts) = counting_source();
    let keyspace = KeyspaceBuilder::new("scores", 2 << 10, source)
        .peers(Arc::new(RemotePeer {
            getter: getter.clone(),
        }))
        .build();
    (keyspace, getter, counts)
}

#[tokio::test]
async fn remote_values_are_not_stored_locally() {
    let (keyspace, getter, counts) = remote_keyspace(false);

    let value = keyspace.get("Tom").await.unwrap();
    assert_eq!(value, ByteView::from("remote Tom"));
    assert!(keyspace.cached("Tom").is_none());

    // Not cached, so the next lookup goes to the peer again.
    keyspace.get("Tom").await.unwrap();
    assert_eq!(*getter.requests.lock().unwrap(), [
        Request::new("scores", "Tom"),
        Request::new("scores", "Tom"),
    ]);
    assert!(counts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn peer_failure_has_no_local_fallback() {
    let (keyspace, _getter, counts) = remote_keyspace(true);

    let err = keyspace.get("Tom").await.unwrap_err();
    assert!(matches!(err, CacheError::PeerTransport { .. }));
    assert!(counts.lock().unwrap().is_empty());
    assert!(keyspace.cached("Tom").is_none());
}

#[test]
fn registry_names_are_unique() {
    let mut registry = KeyspaceRegistry::new();
    let (source, _) = counting_source();
    let scores = registry
        .register(Keyspace::new("scores", 1024, source))
        .unwrap();
    assert_eq!(scores.name(), "scores");
    assert_eq!(scores.capacity(), 1024);

    let (source, _) = counting_source();
    let err = registry
        .register(Keyspace::new("scores", 2048, source))
        .err().unwrap();
    assert!(matches!(err, CacheError::DuplicateKeyspace(ref name) if name == "scores"));

    assert_eq!(registry.len(), 1);
    assert!(registry.get("scores").is_some());
    assert!(registry.get("missing").is_none());
}
