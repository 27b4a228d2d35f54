//! End-to-end runs of a `System` with scripted probes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cmon::domain::models::context::{GlobSet, RunContext};
use cmon::domain::models::measurement::{Measurement, MeasurementSubject};
use cmon::domain::models::status::Status;
use cmon::domain::models::subject::{Server, Subject, SubjectInfo, SubjectKind};
use cmon::domain::ports::probe::{Probe, ProbeAction, ProbeMeta};
use cmon::services::export::result_lines;
use cmon::services::{Dashboard, StandardTests, System, TestSuite};
use cmon::DomainError;

/// Reports a fixed status per subject id and counts its calls.
struct Scripted {
    by_subject: HashMap<String, Status>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(entries: &[(&str, Status)]) -> Arc<Self> {
        Arc::new(Self {
            by_subject: entries.iter().map(|(id, s)| ((*id).to_string(), *s)).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ProbeAction for Scripted {
    async fn measure(&self, subject: &Subject, _: &RunContext) -> anyhow::Result<Measurement> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Measurement::new(
            self.by_subject.get(subject.id()).copied().unwrap_or(Status::Good),
        ))
    }
}

struct Unreachable;

#[async_trait]
impl ProbeAction for Unreachable {
    async fn measure(&self, subject: &Subject, _: &RunContext) -> anyhow::Result<Measurement> {
        anyhow::bail!("connection refused by {}", subject.id())
    }
}

fn server(id: &str) -> Subject {
    Subject::Server(Arc::new(Server::new(SubjectInfo::new(id), format!("{id}.local"))))
}

fn probe(name: &str, action: Arc<dyn ProbeAction>) -> Probe {
    Probe::new(ProbeMeta::new(name, name, "", SubjectKind::Server), action)
}

fn system(standard: StandardTests, suites: Vec<TestSuite>) -> System {
    System::new(None, standard, vec![Dashboard::new("main", None, suites)]).unwrap()
}

#[tokio::test]
async fn test_good_good_failed_is_mixed() {
    let ping = Scripted::new(&[("a", Status::Good), ("b", Status::Good), ("c", Status::Failed)]);
    let standard = StandardTests::new()
        .with(SubjectKind::Server, vec![probe("ping", ping)])
        .unwrap();
    let suite = TestSuite::new(
        "servers",
        None,
        SubjectKind::Server,
        vec![server("a"), server("b"), server("c")],
    )
    .unwrap();

    let result = system(standard, vec![suite]).run(&RunContext::new()).await;

    assert_eq!(result.status, Status::Mixed);
    let suite = &result.children[0].children[0];
    assert_eq!(suite.status, Status::Mixed);
    let statuses: Vec<Status> = suite.children.iter().map(|c| c.status).collect();
    assert_eq!(statuses, [Status::Good, Status::Good, Status::Failed]);
}

#[tokio::test]
async fn test_empty_suite_is_pruned() {
    let standard = StandardTests::new()
        .with(SubjectKind::Server, vec![probe("ping", Scripted::new(&[]))])
        .unwrap();
    let empty = TestSuite::new("nothing", None, SubjectKind::Server, Vec::new()).unwrap();
    let full = TestSuite::new("hosts", None, SubjectKind::Server, vec![server("a")]).unwrap();

    let result = system(standard, vec![empty, full]).run(&RunContext::new()).await;

    let dashboard = &result.children[0];
    assert_eq!(dashboard.children.len(), 1);
    assert!(matches!(
        dashboard.children[0].subject,
        Some(MeasurementSubject::TestSuite { ref name, .. }) if name == "hosts"
    ));
    assert_eq!(result.status, Status::Good);
}

#[tokio::test]
async fn test_only_empty_suites_prunes_dashboard() {
    let empty = TestSuite::new("nothing", None, SubjectKind::Server, Vec::new()).unwrap();
    let result = system(StandardTests::new(), vec![empty])
        .run(&RunContext::new())
        .await;
    assert!(result.children.is_empty());
    assert_eq!(result.status, Status::NotApplicable);
}

#[tokio::test]
async fn test_include_tests_runs_only_matching_probes() {
    let ping = Scripted::new(&[]);
    let mounts = Scripted::new(&[]);
    let standard = StandardTests::new()
        .with(
            SubjectKind::Server,
            vec![probe("ping", ping.clone()), probe("mounts", mounts.clone())],
        )
        .unwrap();
    let suite = TestSuite::new("hosts", None, SubjectKind::Server, vec![server("webhost")]).unwrap();
    let ctx = RunContext::new().with_include_tests(GlobSet::new(["ping"]).unwrap());

    let result = system(standard, vec![suite]).run(&ctx).await;

    assert_eq!(ping.calls.load(Ordering::SeqCst), 1);
    assert_eq!(mounts.calls.load(Ordering::SeqCst), 0);
    assert_eq!(result_lines(&result), ["Server.webhost.ping=good"]);
}

#[tokio::test]
async fn test_include_subjects_filters_subjects() {
    let ping = Scripted::new(&[]);
    let standard = StandardTests::new()
        .with(SubjectKind::Server, vec![probe("ping", ping.clone())])
        .unwrap();
    let suite = TestSuite::new(
        "hosts",
        None,
        SubjectKind::Server,
        vec![server("web1"), server("web2"), server("db1")],
    )
    .unwrap();
    let ctx = RunContext::new().with_include_subjects(GlobSet::new(["WEB*"]).unwrap());

    let result = system(standard, vec![suite]).run(&ctx).await;

    assert_eq!(ping.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        result_lines(&result),
        ["Server.web1.ping=good", "Server.web2.ping=good"]
    );
}

#[tokio::test]
async fn test_wildcard_filter_is_identity() {
    let build = || {
        let standard = StandardTests::new()
            .with(
                SubjectKind::Server,
                vec![probe("ping", Scripted::new(&[("b", Status::Failed)]))],
            )
            .unwrap();
        let suite =
            TestSuite::new("hosts", None, SubjectKind::Server, vec![server("a"), server("b")])
                .unwrap();
        system(standard, vec![suite])
    };

    let plain = build().run(&RunContext::new()).await;
    let filtered = build()
        .run(
            &RunContext::new()
                .with_include_tests(GlobSet::new(["*"]).unwrap())
                .with_include_subjects(GlobSet::new(["*"]).unwrap()),
        )
        .await;

    assert_eq!(result_lines(&plain), result_lines(&filtered));
    assert_eq!(plain.status, filtered.status);
}

#[tokio::test]
async fn test_connection_error_is_isolated() {
    let ping = Scripted::new(&[]);
    let standard = StandardTests::new()
        .with(
            SubjectKind::Server,
            vec![probe("aliveness", Arc::new(Unreachable)), probe("ping", ping.clone())],
        )
        .unwrap();
    let suite = TestSuite::new("hosts", None, SubjectKind::Server, vec![server("a")]).unwrap();

    let result = system(standard, vec![suite]).run(&RunContext::new()).await;

    assert_eq!(ping.calls.load(Ordering::SeqCst), 1);
    let lines = result_lines(&result);
    assert_eq!(
        lines,
        [
            "Server.a.aliveness=error",
            "Server.a.aliveness.error=ERROR: connection refused by a",
            "Server.a.ping=good",
        ]
    );
    assert_eq!(result.status, Status::Mixed);
}

#[tokio::test]
async fn test_unimportant_subject_does_not_affect_suite() {
    let ping = Scripted::new(&[("flaky", Status::Failed)]);
    let standard = StandardTests::new()
        .with(SubjectKind::Server, vec![probe("ping", ping)])
        .unwrap();
    let flaky = Subject::Server(Arc::new(Server::new(
        SubjectInfo::new("flaky").with_important(false),
        "flaky.local",
    )));
    let suite = TestSuite::new("hosts", None, SubjectKind::Server, vec![server("a"), flaky]).unwrap();

    let result = system(standard, vec![suite]).run(&RunContext::new()).await;

    assert_eq!(result.status, Status::Good);
    // Still reported.
    assert!(result_lines(&result).contains(&"Server.flaky.ping=failed".to_string()));
}

#[tokio::test]
async fn test_subject_without_probes_is_not_applicable_node() {
    let suite = TestSuite::new("hosts", None, SubjectKind::Server, vec![server("bare")]).unwrap();
    let result = system(StandardTests::new(), vec![suite])
        .run(&RunContext::new())
        .await;

    let node = result.find_testable("bare").unwrap();
    assert_eq!(node.status, Status::NotApplicable);
    assert!(node.children.is_empty());
}

#[test]
fn test_kind_mismatch_rejected_before_run() {
    let calls = Scripted::new(&[]);
    let login = Probe::new(
        ProbeMeta::new("login", "Login", "", SubjectKind::Database),
        calls.clone(),
    );
    let bad = Subject::Server(Arc::new(Server::new(
        SubjectInfo::new("a").with_tests(vec![login]),
        "a.local",
    )));
    let suite = TestSuite::new("hosts", None, SubjectKind::Server, vec![bad]).unwrap();

    let err = System::new(None, StandardTests::new(), vec![Dashboard::new("d", None, vec![suite])])
        .unwrap_err();

    assert!(matches!(err, DomainError::ProbeKindMismatch { .. }));
    assert_eq!(calls.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_mixed_suite_rejected() {
    let db_host = Arc::new(Server::new(SubjectInfo::new("h"), "h"));
    let db = Subject::Database(Arc::new(cmon::domain::models::subject::Database {
        info: SubjectInfo::new("db"),
        engine: cmon::domain::models::subject::DatabaseEngine::Postgres,
        host: db_host,
        database: None,
        port: None,
        user: None,
        password: None,
    }));
    let err = TestSuite::new("mixed", None, SubjectKind::Server, vec![server("a"), db]).unwrap_err();
    assert!(matches!(err, DomainError::MixedSuite { .. }));
}

#[tokio::test]
async fn test_subject_order_preserved_under_concurrency() {
    let ping = Scripted::new(&[]);
    let standard = StandardTests::new()
        .with(SubjectKind::Server, vec![probe("ping", ping)])
        .unwrap();
    let ids: Vec<String> = (0..20).map(|i| format!("s{i:02}")).collect();
    let suite = TestSuite::new(
        "many",
        None,
        SubjectKind::Server,
        ids.iter().map(|id| server(id)).collect(),
    )
    .unwrap();

    let result = system(standard, vec![suite])
        .run(&RunContext::new().with_max_concurrency(4))
        .await;

    let expected: Vec<String> = ids.iter().map(|id| format!("Server.{id}.ping=good")).collect();
    assert_eq!(result_lines(&result), expected);
}
