//! Compile-job queue adapter and worker loop behavior

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use styledash::compiler::CompileOptions;
use styledash::config::Repository;
use styledash::queue::{
    CompileJobConsumer, MemoryTransport, QueueTransport, enqueue_compile_job,
};
use styledash::reconciler::ReconcileOptions;
use styledash::store::{ComponentStore, MemoryStore, RepositoryStore};
use styledash::worker::{WorkerContext, run_worker};
use tempfile::TempDir;

const COMPILE_QUEUE: &str = "compile-repo";

const BUTTON_SOURCE: &str = r#"
import React from 'react';

export default class Button extends React.Component {
  render() {
    return <button>{this.props.label}</button>;
  }
}
"#;

fn git(path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap_or_else(|_| panic!("git {args:?} failed to run"));
    assert!(output.status.success(), "git {args:?} failed");
}

fn create_component_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path();
    git(path, &["init"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "user.email", "test@example.com"]);
    fs::write(path.join("package.json"), r#"{"name": "fixture"}"#).unwrap();
    fs::create_dir_all(path.join("src")).unwrap();
    fs::write(path.join("src/Button.jsx"), BUTTON_SOURCE).unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);
    dir
}

fn write_stub_node(dir: &Path) -> String {
    let stub = dir.join("stub-node");
    fs::write(&stub, "#!/bin/sh\necho 'stub bundle'\n").unwrap();
    let mut perm = fs::metadata(&stub).unwrap().permissions();
    perm.set_mode(0o755);
    fs::set_permissions(&stub, perm).unwrap();
    stub.display().to_string()
}

fn local_repository(id: &str, clone_source: &Path) -> Repository {
    let mut repository = Repository::new(id, format!("repo-{id}"), "acme", id);
    repository.clone_url = Some(clone_source.to_string_lossy().to_string());
    repository
}

#[tokio::test]
async fn test_consumer_drops_messages_that_cannot_succeed() {
    let transport = Arc::new(MemoryTransport::new());
    let store = Arc::new(MemoryStore::new());

    // Unparsable payload, payload without a repository id, and a job for a
    // repository that no longer exists
    transport
        .publish(COMPILE_QUEUE, b"not json at all".to_vec())
        .await
        .unwrap();
    transport
        .publish(COMPILE_QUEUE, br#"{"repositoryID": ""}"#.to_vec())
        .await
        .unwrap();
    enqueue_compile_job(transport.as_ref(), "deleted-repo")
        .await
        .unwrap();
    transport.close();

    let handled = Arc::new(AtomicUsize::new(0));
    let handled_ref = Arc::clone(&handled);

    let consumer = CompileJobConsumer::new(
        Arc::clone(&transport) as Arc<dyn QueueTransport>,
        store,
    );
    consumer
        .run(|job| {
            let handled = Arc::clone(&handled_ref);
            async move {
                handled.fetch_add(1, Ordering::SeqCst);
                job.ack.ack().await.unwrap();
            }
        })
        .await
        .unwrap();

    // Nothing reached the handler, and every message was acknowledged
    assert_eq!(handled.load(Ordering::SeqCst), 0);
    assert_eq!(transport.pending(COMPILE_QUEUE), 0);
    assert_eq!(transport.in_flight_count(), 0);
}

#[tokio::test]
async fn test_consumer_processes_one_message_at_a_time() {
    let transport = Arc::new(MemoryTransport::new());
    let store = Arc::new(MemoryStore::new());
    for i in 0..3 {
        let id = format!("repo-{i}");
        store.add_repository(Repository::new(
            id.as_str(),
            id.as_str(),
            "acme",
            id.as_str(),
        ));
        enqueue_compile_job(transport.as_ref(), &id).await.unwrap();
    }
    transport.close();

    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let active_ref = Arc::clone(&active);
    let peak_ref = Arc::clone(&peak);

    let consumer = CompileJobConsumer::new(
        Arc::clone(&transport) as Arc<dyn QueueTransport>,
        store,
    );
    consumer
        .run(|job| {
            let active = Arc::clone(&active_ref);
            let peak = Arc::clone(&peak_ref);
            async move {
                let current = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                job.ack.ack().await.unwrap();
            }
        })
        .await
        .unwrap();

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(transport.in_flight_count(), 0);
}

#[tokio::test]
async fn test_worker_compiles_and_reconciles_a_job() {
    let stub_dir = TempDir::new().unwrap();
    let source = create_component_repo();

    let store = Arc::new(MemoryStore::new());
    store.add_repository(local_repository("repo-1", source.path()));

    let transport = Arc::new(MemoryTransport::new());
    enqueue_compile_job(transport.as_ref(), "repo-1")
        .await
        .unwrap();
    transport.close();

    let ctx = WorkerContext {
        transport: Arc::clone(&transport) as Arc<dyn QueueTransport>,
        repositories: Arc::clone(&store) as Arc<dyn RepositoryStore>,
        components: Arc::clone(&store) as Arc<dyn ComponentStore>,
        compile_options: CompileOptions {
            node_binary: write_stub_node(stub_dir.path()),
            npm_binary: "true".to_string(),
            ..CompileOptions::default()
        },
        reconcile_options: ReconcileOptions::default(),
    };
    run_worker(ctx).await.unwrap();

    let persisted = store.list_components("repo-1").await.unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].filepath, "/src/Button.jsx");
    assert_eq!(persisted[0].compiled_bundle, "stub bundle\n");
    assert_eq!(transport.in_flight_count(), 0);
}

#[tokio::test]
async fn test_worker_acknowledges_failed_compilations() {
    let store = Arc::new(MemoryStore::new());
    let mut repository = Repository::new("repo-1", "doomed", "acme", "doomed");
    repository.clone_url = Some("/path/that/does/not/exist/repo.git".to_string());
    store.add_repository(repository);

    let transport = Arc::new(MemoryTransport::new());
    enqueue_compile_job(transport.as_ref(), "repo-1")
        .await
        .unwrap();
    transport.close();

    let ctx = WorkerContext {
        transport: Arc::clone(&transport) as Arc<dyn QueueTransport>,
        repositories: Arc::clone(&store) as Arc<dyn RepositoryStore>,
        components: Arc::clone(&store) as Arc<dyn ComponentStore>,
        compile_options: CompileOptions::default(),
        reconcile_options: ReconcileOptions::default(),
    };
    // The worker finishes cleanly: the failure is logged, the message acked,
    // nothing persisted, and no retry happens
    run_worker(ctx).await.unwrap();

    assert_eq!(store.component_count(), 0);
    assert_eq!(transport.pending(COMPILE_QUEUE), 0);
    assert_eq!(transport.in_flight_count(), 0);
}

#[tokio::test]
async fn test_worker_refresh_updates_existing_components() {
    let stub_dir = TempDir::new().unwrap();
    let source = create_component_repo();

    let store = Arc::new(MemoryStore::new());
    store.add_repository(local_repository("repo-1", source.path()));

    let compile_options = CompileOptions {
        node_binary: write_stub_node(stub_dir.path()),
        npm_binary: "true".to_string(),
        ..CompileOptions::default()
    };

    // Two jobs for the same repository, processed sequentially: the second
    // run updates the existing row instead of duplicating it
    let transport = Arc::new(MemoryTransport::new());
    enqueue_compile_job(transport.as_ref(), "repo-1").await.unwrap();
    enqueue_compile_job(transport.as_ref(), "repo-1").await.unwrap();
    transport.close();

    let saved = Arc::new(Mutex::new(Vec::new()));
    let saved_ref = Arc::clone(&saved);
    let mut reconcile_options = ReconcileOptions::default();
    reconcile_options.on_component_saved = Some(Arc::new(move |component, is_new| {
        saved_ref.lock().unwrap().push((component.filepath.clone(), is_new));
    }));

    let ctx = WorkerContext {
        transport: Arc::clone(&transport) as Arc<dyn QueueTransport>,
        repositories: Arc::clone(&store) as Arc<dyn RepositoryStore>,
        components: Arc::clone(&store) as Arc<dyn ComponentStore>,
        compile_options,
        reconcile_options,
    };
    run_worker(ctx).await.unwrap();

    assert_eq!(store.component_count(), 1);
    assert_eq!(
        saved.lock().unwrap().as_slice(),
        &[
            ("/src/Button.jsx".to_string(), true),
            ("/src/Button.jsx".to_string(), false),
        ]
    );
}
