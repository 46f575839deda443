use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use repo_content::{
    BackendConnection, BackendConnector, BackendError, ContextError, DirectoryList, ErrorKind, FileSet,
    Operation, RepoService, Repos, Repository, RepositoryResolver, RequestContext, ResolveError,
};

const REPO_URL: &str = "https://example.com/repo.git";

#[derive(Default)]
struct Counters {
    resolves: AtomicUsize,
    connects: AtomicUsize,
    requests: AtomicUsize,
    closes: AtomicUsize,
}

fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

struct FakeResolver {
    known: HashMap<String, Repository>,
    counters: Arc<Counters>,
}

#[async_trait]
impl RepositoryResolver for FakeResolver {
    async fn resolve(&self, _ctx: &RequestContext, repo_url: &str) -> Result<Repository, ResolveError> {
        self.counters.resolves.fetch_add(1, Ordering::SeqCst);
        self.known
            .get(repo_url)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(repo_url.to_string()))
    }
}

#[derive(Clone, Default)]
struct Behavior {
    fail_connect: bool,
    fail_request: bool,
    fail_close: bool,
    hang_request: bool,
    files: FileSet,
    directories: DirectoryList,
}

struct FakeConnector {
    behavior: Behavior,
    counters: Arc<Counters>,
}

#[async_trait]
impl BackendConnector for FakeConnector {
    async fn new_connection(&self) -> Result<Box<dyn BackendConnection>, BackendError> {
        if self.behavior.fail_connect {
            return Err(BackendError::Other("connection refused".to_string()));
        }
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            behavior: self.behavior.clone(),
            counters: self.counters.clone(),
        }))
    }
}

struct FakeConnection {
    behavior: Behavior,
    counters: Arc<Counters>,
}

impl FakeConnection {
    async fn request(&self, repo: &Repository) -> Result<(), BackendError> {
        self.counters.requests.fetch_add(1, Ordering::SeqCst);
        assert_eq!(repo.username.as_deref(), Some("deploy"));
        if self.behavior.hang_request {
            std::future::pending::<()>().await;
        }
        if self.behavior.fail_request {
            return Err(BackendError::RevisionNotFound("nope".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BackendConnection for FakeConnection {
    async fn request_files(
        &self,
        _ctx: &RequestContext,
        repo: &Repository,
        _revision: &str,
        _pattern: &str,
    ) -> Result<FileSet, BackendError> {
        self.request(repo).await?;
        Ok(self.behavior.files.clone())
    }

    async fn request_directories(
        &self,
        _ctx: &RequestContext,
        repo: &Repository,
        _revision: &str,
    ) -> Result<DirectoryList, BackendError> {
        self.request(repo).await?;
        Ok(self.behavior.directories.clone())
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_close {
            Err(BackendError::Other("close failed".to_string()))
        } else {
            Ok(())
        }
    }
}

fn service(behavior: Behavior) -> (RepoService, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let repo = Repository {
        username: Some("deploy".to_string()),
        password: Some("secret".to_string()),
        ..Repository::new(REPO_URL)
    };
    let resolver = FakeResolver {
        known: HashMap::from([(REPO_URL.to_string(), repo)]),
        counters: counters.clone(),
    };
    let connector = FakeConnector {
        behavior,
        counters: counters.clone(),
    };
    (
        RepoService::new(Arc::new(resolver), Arc::new(connector)),
        counters,
    )
}

fn yaml_files() -> FileSet {
    HashMap::from([
        ("a.yaml".to_string(), b"x: 1".to_vec()),
        ("b.yaml".to_string(), b"y: 2".to_vec()),
    ])
}

#[tokio::test]
async fn test_get_files_returns_backend_file_set() {
    let (service, counters) = service(Behavior {
        files: yaml_files(),
        ..Default::default()
    });

    let files = service
        .get_files(&RequestContext::background(), REPO_URL, "main", "*.yaml")
        .await
        .unwrap();

    assert_eq!(files, yaml_files());
    assert_eq!(count(&counters.resolves), 1);
    assert_eq!(count(&counters.connects), 1);
    assert_eq!(count(&counters.requests), 1);
    assert_eq!(count(&counters.closes), 1);
}

#[tokio::test]
async fn test_get_directories_returns_backend_list() {
    let (service, counters) = service(Behavior {
        directories: vec!["apps".to_string(), "infra".to_string()],
        ..Default::default()
    });

    let mut dirs = service
        .get_directories(&RequestContext::background(), REPO_URL, "deadbeef")
        .await
        .unwrap();
    dirs.sort();

    assert_eq!(dirs, vec!["apps", "infra"]);
    assert_eq!(count(&counters.closes), 1);
}

#[tokio::test]
async fn test_unknown_repository_never_connects() {
    let (service, counters) = service(Behavior::default());
    let unknown = "https://example.com/unregistered.git";

    let err = service
        .get_files(&RequestContext::background(), unknown, "main", "*.yaml")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert_eq!(err.operation(), Operation::GetFiles);
    assert_eq!(err.repo_url(), unknown);
    assert!(err.to_string().contains("repository not found"));
    assert_eq!(count(&counters.connects), 0);

    let err = service
        .get_directories(&RequestContext::background(), unknown, "main")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert_eq!(count(&counters.connects), 0);
    assert_eq!(count(&counters.requests), 0);
}

#[tokio::test]
async fn test_connection_failure_sends_no_request() {
    let (service, counters) = service(Behavior {
        fail_connect: true,
        ..Default::default()
    });

    let err = service
        .get_directories(&RequestContext::background(), REPO_URL, "main")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(err.operation(), Operation::GetDirectories);
    assert_eq!(count(&counters.resolves), 1);
    assert_eq!(count(&counters.requests), 0);
    assert_eq!(count(&counters.closes), 0);
}

#[tokio::test]
async fn test_request_failure_still_closes_connection() {
    let (service, counters) = service(Behavior {
        fail_request: true,
        files: yaml_files(),
        ..Default::default()
    });

    let err = service
        .get_files(&RequestContext::background(), REPO_URL, "nope", "*.yaml")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BackendRequest);
    assert!(err.to_string().contains("revision not found"));
    assert_eq!(count(&counters.closes), 1);
}

#[tokio::test]
async fn test_failed_close_does_not_change_result() {
    let (service, counters) = service(Behavior {
        fail_close: true,
        files: yaml_files(),
        ..Default::default()
    });

    let files = service
        .get_files(&RequestContext::background(), REPO_URL, "main", "*.yaml")
        .await
        .unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(count(&counters.closes), 1);
}

#[tokio::test]
async fn test_closes_match_acquisitions_across_calls() {
    let (healthy, counters) = service(Behavior {
        files: yaml_files(),
        ..Default::default()
    });
    let (failing, failing_counters) = service(Behavior {
        fail_request: true,
        ..Default::default()
    });
    let ctx = RequestContext::background();

    for i in 0..10 {
        let _ = healthy.get_files(&ctx, REPO_URL, "main", "*.yaml").await;
        let _ = healthy.get_directories(&ctx, "https://example.com/missing.git", "main").await;
        let _ = failing.get_directories(&ctx, REPO_URL, &format!("rev-{}", i)).await;
    }

    assert_eq!(count(&counters.connects), 10);
    assert_eq!(count(&counters.closes), 10);
    assert_eq!(count(&failing_counters.connects), 10);
    assert_eq!(count(&failing_counters.closes), 10);
}

#[tokio::test]
async fn test_concurrent_calls_share_one_service() {
    let (service, counters) = service(Behavior {
        files: yaml_files(),
        ..Default::default()
    });
    let service: Arc<dyn Repos> = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .get_files(&RequestContext::background(), REPO_URL, "main", "*.yaml")
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), yaml_files());
    }
    assert_eq!(count(&counters.connects), 8);
    assert_eq!(count(&counters.closes), 8);
}

#[tokio::test]
async fn test_cancellation_mid_request_releases_connection() {
    let (service, counters) = service(Behavior {
        hang_request: true,
        ..Default::default()
    });
    let ctx = RequestContext::background();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = service.get_files(&ctx, REPO_URL, "main", "*.yaml").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BackendRequest);
    assert_eq!(err.context_error(), Some(ContextError::Cancelled));
    assert_eq!(count(&counters.requests), 1);
    assert_eq!(count(&counters.closes), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_mid_request_releases_connection() {
    let (service, counters) = service(Behavior {
        hang_request: true,
        ..Default::default()
    });
    let ctx = RequestContext::with_timeout(Duration::from_secs(5));

    let err = service.get_directories(&ctx, REPO_URL, "main").await.unwrap_err();

    assert_eq!(err.context_error(), Some(ContextError::DeadlineExceeded));
    assert_eq!(count(&counters.closes), 1);
}

#[tokio::test]
async fn test_dropped_call_releases_connection() {
    let (service, counters) = service(Behavior {
        hang_request: true,
        ..Default::default()
    });
    let ctx = RequestContext::background();

    let call = service.get_files(&ctx, REPO_URL, "main", "*.yaml");
    let timed_out = tokio::time::timeout(Duration::from_millis(20), call).await;

    assert!(timed_out.is_err());
    assert_eq!(count(&counters.connects), 1);
    assert_eq!(count(&counters.closes), 1);
}

#[tokio::test]
async fn test_cancelled_before_start_resolves_nothing() {
    let (service, counters) = service(Behavior::default());
    let ctx = RequestContext::background();
    ctx.cancel();

    let err = service.get_files(&ctx, REPO_URL, "main", "*").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    assert_eq!(count(&counters.resolves), 0);
    assert_eq!(count(&counters.connects), 0);
}
