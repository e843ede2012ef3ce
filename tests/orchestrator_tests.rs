use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use educompare::filters::ResultFilters;
use educompare::model::{Course, SpellCheck, TrendingSearch};
use educompare::{
    BackendError, ClientConfig, CourseBackend, Operation, Orchestrator, OrchestratorHandle,
    SpellFailurePolicy, ViewState,
};

const PATIENCE: Duration = Duration::from_secs(60);

/// A canned answer, delivered after `delay`
#[derive(Clone)]
struct Reply<T> {
    delay: Duration,
    outcome: Result<T, String>,
}

impl<T> Reply<T> {
    fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(value),
        }
    }

    fn fail(reason: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(reason.to_string()),
        }
    }

    fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct Script {
    suggest: HashMap<String, Reply<Vec<String>>>,
    spelling: HashMap<String, Reply<SpellCheck>>,
    search: HashMap<String, Reply<Vec<Course>>>,
    pages: HashMap<u32, Reply<Vec<Course>>>,
    usage: HashMap<String, Reply<()>>,
    calls: Vec<String>,
}

/// In-memory backend answering from a script that tests can edit mid-session
#[derive(Clone, Default)]
struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    fn edit(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.script.lock().unwrap());
    }

    fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn lookup<T: Clone>(
        &self,
        call: String,
        pick: impl FnOnce(&Script) -> Option<Reply<T>>,
        fallback: T,
    ) -> Reply<T> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(call);
        pick(&*script).unwrap_or(Reply::ok(fallback))
    }
}

async fn deliver<T>(operation: Operation, reply: Reply<T>) -> Result<T, BackendError> {
    tokio::time::sleep(reply.delay).await;
    reply
        .outcome
        .map_err(|reason| BackendError::Unavailable { operation, reason })
}

impl CourseBackend for ScriptedBackend {
    async fn suggest(&self, word: &str) -> Result<Vec<String>, BackendError> {
        let reply = self.lookup(format!("suggest:{word}"), |s| s.suggest.get(word).cloned(), vec![]);
        deliver(Operation::Suggest, reply).await
    }

    async fn validate_spelling(&self, word: &str) -> Result<SpellCheck, BackendError> {
        let reply = self.lookup(
            format!("validate:{word}"),
            |s| s.spelling.get(word).cloned(),
            SpellCheck::correct(),
        );
        deliver(Operation::Validate, reply).await
    }

    async fn search(&self, text: &str) -> Result<Vec<Course>, BackendError> {
        let reply = self.lookup(format!("search:{text}"), |s| s.search.get(text).cloned(), vec![]);
        deliver(Operation::Search, reply).await
    }

    async fn record_usage(&self, word: &str) -> Result<(), BackendError> {
        let reply = self.lookup(format!("usage:{word}"), |s| s.usage.get(word).cloned(), ());
        deliver(Operation::RecordUsage, reply).await
    }

    async fn catalog_page(&self, page: u32, _size: u32) -> Result<Vec<Course>, BackendError> {
        let reply = self.lookup(format!("page:{page}"), |s| s.pages.get(&page).cloned(), vec![]);
        deliver(Operation::CatalogPage, reply).await
    }

    async fn trending(&self) -> Result<Vec<TrendingSearch>, BackendError> {
        let reply = self.lookup("trending".to_string(), |_| None, vec![]);
        deliver(Operation::Trending, reply).await
    }
}

fn course(id: &str, platform: &str) -> Course {
    Course::new(id, format!("Course {id}")).with_platform(platform)
}

fn start(backend: &ScriptedBackend) -> OrchestratorHandle {
    Orchestrator::spawn(backend.clone(), ClientConfig::default())
}

fn is_results(view: &ViewState) -> bool {
    matches!(view, ViewState::ResultsReady { .. })
}

fn result_ids(view: &ViewState) -> Vec<String> {
    match view {
        ViewState::ResultsReady { courses, .. } => courses.iter().map(|c| c.id.clone()).collect(),
        other => panic!("expected results, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_mount_loads_first_catalog_page() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.pages
            .insert(1, Reply::ok(vec![course("a", "edX"), course("b", "Udemy")]));
    });
    let handle = start(&backend);

    let view = handle
        .wait_until(PATIENCE, |v| {
            matches!(v, ViewState::DefaultListing { items, .. } if !items.is_empty())
        })
        .await?;

    assert_eq!(
        view,
        ViewState::DefaultListing {
            page: 1,
            items: vec![course("a", "edX"), course("b", "Udemy")]
        }
    );
    assert_eq!(backend.calls(), vec!["page:1"]);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_latest_suggestions_win() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.suggest.insert(
            "py".into(),
            Reply::ok(vec!["python".into()]).after(Duration::from_secs(3)),
        );
        s.suggest.insert(
            "pyt".into(),
            Reply::ok(vec!["pytorch".into()]).after(Duration::from_secs(1)),
        );
    });
    let handle = start(&backend);

    handle.set_query("py").await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.set_query("pyt").await?;

    let view = handle
        .wait_until(PATIENCE, |v| matches!(v, ViewState::AutocompleteVisible { .. }))
        .await?;
    assert_eq!(
        view,
        ViewState::AutocompleteVisible {
            suggestions: vec!["pytorch".into()]
        }
    );

    // Well past the slower lookup
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(handle.view(), view);
    assert_eq!(backend.count("suggest:py"), 1);
    assert_eq!(backend.count("suggest:pyt"), 1);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_single_character_does_not_suggest() -> Result<()> {
    let backend = ScriptedBackend::default();
    let handle = start(&backend);

    handle.set_query("p").await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(handle.view(), ViewState::Idle);
    assert!(!backend.calls().iter().any(|c| c.starts_with("suggest:")));
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_correct_spelling_searches_and_records_usage_once() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.search.insert(
            "python".into(),
            Reply::ok(vec![course("p1", "Coursera"), course("p2", "edX")])
                .after(Duration::from_secs(1)),
        );
    });
    let handle = start(&backend);

    handle.set_query("python").await?;
    handle.submit().await?;

    let view = handle.wait_until(PATIENCE, is_results).await?;
    assert_eq!(result_ids(&view), vec!["p1", "p2"]);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let calls = backend.calls();
    let validated = calls.iter().position(|c| c == "validate:python").unwrap();
    let searched = calls.iter().position(|c| c == "search:python").unwrap();
    assert!(validated < searched);
    assert_eq!(backend.count("search:python"), 1);
    assert_eq!(backend.count("usage:python"), 1);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_usage_recording_never_touches_results() -> Result<()> {
    for usage in [
        Reply::fail("frequency store down").after(Duration::from_secs(5)),
        Reply::ok(()).after(Duration::from_secs(30)),
    ] {
        let backend = ScriptedBackend::default();
        backend.edit(|s| {
            s.search.insert(
                "rust".into(),
                Reply::ok(vec![course("r1", "edX")]).after(Duration::from_secs(1)),
            );
            s.usage.insert("rust".into(), usage);
        });
        let handle = start(&backend);

        handle.set_query("rust").await?;
        handle.submit().await?;

        // Arrives with the search, not after the slower bookkeeping call
        let view = handle.wait_until(Duration::from_secs(2), is_results).await?;
        assert_eq!(result_ids(&view), vec!["r1"]);

        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(handle.view(), view);
        assert_eq!(backend.count("usage:rust"), 1);
        handle.shutdown().await?;
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_submit_text_goes_straight_to_validation() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.search
            .insert("rust".into(), Reply::ok(vec![course("r1", "edX")]));
    });
    let handle = start(&backend);

    handle.submit_text("rust").await?;
    let view = handle.wait_until(PATIENCE, is_results).await?;

    assert_eq!(result_ids(&view), vec!["r1"]);
    assert!(!backend.calls().iter().any(|c| c.starts_with("suggest:")));
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_misspelling_waits_for_correction() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.spelling
            .insert("pyhton".into(), Reply::ok(SpellCheck::misspelled("python")));
        s.search
            .insert("python".into(), Reply::ok(vec![course("p1", "Udemy")]));
    });
    let handle = start(&backend);

    handle.set_query("pyhton").await?;
    handle.submit().await?;

    let view = handle
        .wait_until(PATIENCE, |v| matches!(v, ViewState::CorrectionNeeded { .. }))
        .await?;
    assert_eq!(
        view,
        ViewState::CorrectionNeeded {
            original: "pyhton".into(),
            suggestion: "python".into()
        }
    );
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!backend.calls().iter().any(|c| c.starts_with("search:")));

    handle.accept_correction().await?;
    let view = handle.wait_until(PATIENCE, is_results).await?;
    assert_eq!(result_ids(&view), vec!["p1"]);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.count("validate:python"), 1);
    assert_eq!(backend.count("usage:python"), 1);
    assert_eq!(backend.count("usage:pyhton"), 0);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_accepting_suggestion_runs_search() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.suggest
            .insert("ru".into(), Reply::ok(vec!["rust".into(), "ruby".into()]));
        s.search
            .insert("ruby".into(), Reply::ok(vec![course("rb", "Udemy")]));
    });
    let handle = start(&backend);

    handle.set_query("ru").await?;
    handle
        .wait_until(PATIENCE, |v| matches!(v, ViewState::AutocompleteVisible { .. }))
        .await?;
    handle.accept_suggestion(1).await?;

    let view = handle.wait_until(PATIENCE, is_results).await?;
    assert_eq!(result_ids(&view), vec!["rb"]);
    assert_eq!(backend.count("validate:ruby"), 1);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_prev_on_first_page_sends_nothing() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.pages.insert(1, Reply::ok(vec![course("a", "edX")]));
        s.pages.insert(2, Reply::ok(vec![course("b", "edX")]));
    });
    let handle = start(&backend);

    handle.prev_page().await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.calls(), vec!["page:1"]);

    handle.next_page().await?;
    let view = handle
        .wait_until(PATIENCE, |v| matches!(v, ViewState::DefaultListing { page: 2, .. }))
        .await?;
    assert_eq!(
        view,
        ViewState::DefaultListing {
            page: 2,
            items: vec![course("b", "edX")]
        }
    );
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_failed_page_keeps_current_listing() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.pages.insert(1, Reply::ok(vec![course("a", "edX")]));
        s.pages.insert(2, Reply::fail("catalog offline"));
    });
    let handle = start(&backend);
    handle
        .wait_until(PATIENCE, |v| {
            matches!(v, ViewState::DefaultListing { items, .. } if !items.is_empty())
        })
        .await?;

    handle.next_page().await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(backend.count("page:2"), 1);
    assert_eq!(
        handle.view(),
        ViewState::DefaultListing {
            page: 1,
            items: vec![course("a", "edX")]
        }
    );
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_results_for_abandoned_query_are_dropped() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.search.insert(
            "python".into(),
            Reply::ok(vec![course("p1", "edX")]).after(Duration::from_secs(3)),
        );
    });
    let handle = start(&backend);

    handle.set_query("python").await?;
    handle.submit().await?;
    handle.wait_until(PATIENCE, ViewState::is_loading).await?;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.count("search:python"), 1);
    handle.set_query("rust").await?;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(handle.view(), ViewState::Idle);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_spelling_timeout_searches_unchecked() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.spelling.insert(
            "golang".into(),
            Reply::ok(SpellCheck::correct()).after(Duration::from_secs(30)),
        );
        s.search
            .insert("golang".into(), Reply::ok(vec![course("g1", "Udemy")]));
    });
    let handle = start(&backend);

    handle.set_query("golang").await?;
    handle.submit().await?;

    let view = handle.wait_until(PATIENCE, is_results).await?;
    assert_eq!(result_ids(&view), vec!["g1"]);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_fail_closed_blocks_until_retry() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.spelling
            .insert("golang".into(), Reply::fail("spellchecker down"));
        s.search
            .insert("golang".into(), Reply::ok(vec![course("g1", "Udemy")]));
    });
    let config = ClientConfig::default().with_spell_failure_policy(SpellFailurePolicy::FailClosed);
    let handle = Orchestrator::spawn(backend.clone(), config);

    handle.set_query("golang").await?;
    handle.submit().await?;
    let view = handle
        .wait_until(PATIENCE, |v| matches!(v, ViewState::Blocked { .. }))
        .await?;
    assert!(matches!(view, ViewState::Blocked { ref query, .. } if query == "golang"));
    assert_eq!(backend.count("search:golang"), 0);

    backend.edit(|s| {
        s.spelling.remove("golang");
    });
    handle.retry().await?;

    let view = handle.wait_until(PATIENCE, is_results).await?;
    assert_eq!(result_ids(&view), vec!["g1"]);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_can_be_retried() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.search.insert("rust".into(), Reply::fail("search down"));
    });
    let handle = start(&backend);

    handle.set_query("rust").await?;
    handle.submit().await?;
    let view = handle.wait_until(PATIENCE, is_results).await?;
    assert_eq!(
        view,
        ViewState::ResultsReady {
            query: "rust".into(),
            courses: vec![],
            total: 0,
            retryable: true
        }
    );

    backend.edit(|s| {
        s.search
            .insert("rust".into(), Reply::ok(vec![course("r1", "edX")]));
    });
    handle.retry().await?;

    let view = handle
        .wait_until(PATIENCE, |v| {
            matches!(v, ViewState::ResultsReady { retryable: false, .. })
        })
        .await?;
    assert_eq!(result_ids(&view), vec!["r1"]);
    assert_eq!(backend.count("search:rust"), 2);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_filters_narrow_results_without_searching() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.search.insert(
            "data".into(),
            Reply::ok(vec![
                course("d1", "Coursera"),
                course("d2", "Udemy"),
                course("d3", "Coursera"),
            ]),
        );
    });
    let handle = start(&backend);

    handle.set_query("data").await?;
    handle.submit().await?;
    handle.wait_until(PATIENCE, is_results).await?;

    let mut filters = ResultFilters::default();
    filters.toggle_platform("coursera");
    handle.set_filters(filters).await?;

    let view = handle
        .wait_until(PATIENCE, |v| {
            matches!(v, ViewState::ResultsReady { courses, .. } if courses.len() == 2)
        })
        .await?;
    assert_eq!(result_ids(&view), vec!["d1", "d3"]);
    assert!(matches!(view, ViewState::ResultsReady { total: 3, .. }));
    assert_eq!(backend.count("search:data"), 1);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_clearing_query_returns_to_catalog() -> Result<()> {
    let backend = ScriptedBackend::default();
    backend.edit(|s| {
        s.pages.insert(1, Reply::ok(vec![course("a", "edX")]));
        s.search
            .insert("rust".into(), Reply::ok(vec![course("r1", "edX")]));
    });
    let handle = start(&backend);

    handle.set_query("rust").await?;
    handle.submit().await?;
    handle.wait_until(PATIENCE, is_results).await?;

    handle.set_query("").await?;
    let view = handle
        .wait_until(PATIENCE, |v| {
            matches!(v, ViewState::DefaultListing { items, .. } if !items.is_empty())
        })
        .await?;
    assert!(matches!(view, ViewState::DefaultListing { page: 1, .. }));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.count("page:1"), 2);
    handle.shutdown().await
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_view_channel() -> Result<()> {
    let backend = ScriptedBackend::default();
    let handle = start(&backend);
    let mut views = handle.subscribe();

    handle.shutdown().await?;

    views.borrow_and_update();
    assert!(views.changed().await.is_err());
    Ok(())
}
