use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use ladder::{Direction, Level, NavState};
use semantic_pinch::backend::{BackendRequest, FragmentStream, TextBackend};
use semantic_pinch::navigator::TEXT_SEED;
use semantic_pinch::{
    seed_state, LadderKind, NavigationOutcome, Navigator, TransformEngine, TransformError,
    Transformer, USER_FAILURE_MESSAGE,
};
use tokio::sync::Notify;

/// Streams a fixed script per target level and records every request.
#[derive(Default)]
struct ScriptedBackend {
    requests: Mutex<Vec<(String, Level, Level)>>,
    fail_with_status: Option<u16>,
}

fn script(to: Level) -> Vec<&'static str> {
    match to {
        Level::Emoji => vec!["🔋"],
        Level::Word => vec!["Power", "house"],
        Level::Paragraph => vec![
            "Mitochondria generate ",
            "most of the cell's energy. ",
            "They turn nutrients into ATP. ",
            "Without them, cells stall.",
        ],
        Level::Article => vec!["Intro.\n\n", "Body.\n\n", "Outro."],
        _ => vec!["The cell runs on mitochondria."],
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open_stream(
        &self,
        request: &BackendRequest<'_>,
    ) -> Result<FragmentStream, TransformError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.content.to_string(), request.from, request.to));
        if let Some(status) = self.fail_with_status {
            return Err(TransformError::Http {
                status,
                body: "upstream unavailable".into(),
            });
        }
        let items: Vec<Result<String, TransformError>> =
            script(request.to).into_iter().map(|f| Ok(f.to_string())).collect();
        Ok(stream::iter(items).boxed())
    }
}

fn engine_navigator(backend: Arc<ScriptedBackend>) -> Navigator<TransformEngine> {
    Navigator::new(
        seed_state(LadderKind::Text).unwrap(),
        TransformEngine::new(backend),
    )
}

#[tokio::test]
async fn sentence_to_paragraph_streams_and_commits() {
    let backend = Arc::new(ScriptedBackend::default());
    let nav = engine_navigator(backend.clone());

    let mut partials: Vec<String> = Vec::new();
    let outcome = nav
        .navigate(Direction::Down, &mut |p: &str| partials.push(p.to_string()))
        .await
        .unwrap();

    let NavigationOutcome::Moved { from, to, text } = outcome else {
        panic!("expected a move, got {outcome:?}");
    };
    assert_eq!((from, to), (Level::Sentence, Level::Paragraph));
    assert!(text.matches(['.', '!', '?']).count() >= 2);

    // Sentence-end flushes plus the residual flush, each extending the last.
    assert!(partials.len() >= 2);
    for pair in partials.windows(2) {
        assert!(pair[1].starts_with(&pair[0]), "{:?} !⊂ {:?}", pair[0], pair[1]);
    }
    assert_eq!(partials.last(), Some(&text));

    let snap = nav.snapshot();
    assert_eq!(snap.current_index(), 3);
    assert_eq!(snap.current_content(), text);
    assert_eq!(snap.last_error(), None);

    let requests = backend.requests.lock().unwrap();
    assert_eq!(
        *requests,
        vec![(TEXT_SEED.to_string(), Level::Sentence, Level::Paragraph)]
    );
}

async fn step(nav: &Navigator<TransformEngine>, direction: Direction) -> (Level, Level) {
    match nav.navigate(direction, &mut |_: &str| {}).await.unwrap() {
        NavigationOutcome::Moved { from, to, text } => {
            assert!(!text.trim().is_empty(), "{from} → {to} produced blank text");
            assert!(nav.snapshot().ladder().are_adjacent(from, to));
            (from, to)
        }
        other => panic!("expected a move {direction}, got {other:?}"),
    }
}

#[tokio::test]
async fn walk_every_adjacent_pair_and_clamp() {
    let backend = Arc::new(ScriptedBackend::default());
    let nav = engine_navigator(backend.clone());
    let mut sink = |_: &str| {};

    let mut moves = Vec::new();
    for _ in 0..2 {
        moves.push(step(&nav, Direction::Up).await);
    }
    assert_eq!(nav.snapshot().current_level(), Level::Emoji);
    assert_eq!(
        nav.navigate(Direction::Up, &mut sink).await.unwrap(),
        NavigationOutcome::Boundary
    );

    for _ in 0..4 {
        moves.push(step(&nav, Direction::Down).await);
    }
    assert_eq!(nav.snapshot().current_level(), Level::Article);
    assert_eq!(nav.snapshot().current_content(), "Intro.\n\nBody.\n\nOutro.");
    assert_eq!(
        nav.navigate(Direction::Down, &mut sink).await.unwrap(),
        NavigationOutcome::Boundary
    );

    for _ in 0..4 {
        moves.push(step(&nav, Direction::Up).await);
    }
    assert_eq!(nav.snapshot().current_level(), Level::Emoji);

    // Every ordered adjacent pair went through the engine; boundaries never did.
    use Level::*;
    for pair in [
        (Emoji, Word),
        (Word, Sentence),
        (Sentence, Paragraph),
        (Paragraph, Article),
        (Article, Paragraph),
        (Paragraph, Sentence),
        (Sentence, Word),
        (Word, Emoji),
    ] {
        assert!(moves.contains(&pair), "missing move {:?} → {:?}", pair.0, pair.1);
    }
    assert_eq!(backend.requests.lock().unwrap().len(), 10);
    assert_eq!(nav.snapshot().cache().len(), 5);
}

/// Streams nothing but whitespace.
struct BlankBackend;

#[async_trait]
impl TextBackend for BlankBackend {
    fn name(&self) -> &'static str {
        "blank"
    }

    async fn open_stream(
        &self,
        _request: &BackendRequest<'_>,
    ) -> Result<FragmentStream, TransformError> {
        let items: Vec<Result<String, TransformError>> = vec![Ok("\n\n".into()), Ok(" ".into())];
        Ok(stream::iter(items).boxed())
    }
}

#[tokio::test]
async fn whitespace_only_result_is_not_committed() {
    let nav = Navigator::new(
        seed_state(LadderKind::Text).unwrap(),
        TransformEngine::new(Arc::new(BlankBackend)),
    );

    let err = nav
        .navigate(Direction::Down, &mut |_: &str| {})
        .await
        .unwrap_err();
    assert!(matches!(err, TransformError::EmptyResult(_)));

    let snap = nav.snapshot();
    assert_eq!(snap.current_level(), Level::Sentence);
    assert_eq!(snap.current_content(), TEXT_SEED);
    assert_eq!(snap.display(), TEXT_SEED);
    assert_eq!(snap.cached(Level::Paragraph), None);
}

#[tokio::test]
async fn failure_reverts_and_reports_once() {
    let backend = Arc::new(ScriptedBackend {
        fail_with_status: Some(503),
        ..ScriptedBackend::default()
    });
    let nav = engine_navigator(backend);

    let err = nav
        .navigate(Direction::Down, &mut |_: &str| {})
        .await
        .unwrap_err();
    assert!(matches!(err, TransformError::Http { status: 503, .. }));
    assert!(!err.is_fatal());

    let snap = nav.snapshot();
    assert_eq!(snap.current_level(), Level::Sentence);
    assert_eq!(snap.display(), TEXT_SEED);
    assert_eq!(snap.last_error(), Some(USER_FAILURE_MESSAGE));
    assert_eq!(snap.cached(Level::Paragraph), None);
    assert_eq!(nav.nav_state(), NavState::Idle);
}

/// Emits one partial, then waits for `release` before finishing.
struct GatedTransformer {
    release: Arc<Notify>,
    started: Arc<Notify>,
    calls: AtomicUsize,
}

#[async_trait]
impl Transformer for GatedTransformer {
    async fn transform(
        &self,
        _source: &str,
        _from: Level,
        to: Level,
        on_partial: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        on_partial("Half way. ");
        self.started.notify_one();
        self.release.notified().await;
        Ok(format!("Half way. Done at {to}."))
    }
}

fn gated() -> (Arc<Navigator<GatedTransformer>>, Arc<Notify>, Arc<Notify>) {
    let release = Arc::new(Notify::new());
    let started = Arc::new(Notify::new());
    let nav = Navigator::new(
        seed_state(LadderKind::Text).unwrap(),
        GatedTransformer {
            release: release.clone(),
            started: started.clone(),
            calls: AtomicUsize::new(0),
        },
    );
    (Arc::new(nav), release, started)
}

#[tokio::test]
async fn input_during_transform_is_dropped() {
    let (nav, release, started) = gated();

    let first = tokio::spawn({
        let nav = nav.clone();
        async move { nav.navigate(Direction::Down, &mut |_: &str| {}).await }
    });
    started.notified().await;

    assert_eq!(nav.nav_state(), NavState::Transforming);
    assert_eq!(nav.snapshot().display(), "Half way. ");
    assert_eq!(
        nav.navigate(Direction::Up, &mut |_: &str| {}).await.unwrap(),
        NavigationOutcome::Busy
    );
    assert!(!nav.edit("ignored"));

    release.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, NavigationOutcome::Moved { to: Level::Paragraph, .. }));
    assert_eq!(nav.transformer().calls.load(Ordering::SeqCst), 1);
    assert_eq!(nav.snapshot().current_level(), Level::Paragraph);
    assert_eq!(nav.nav_state(), NavState::Idle);
}

#[tokio::test]
async fn abandoned_transform_returns_to_idle() {
    let (nav, _release, _started) = gated();

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        nav.navigate(Direction::Down, &mut |_: &str| {}),
    )
    .await;
    assert!(result.is_err(), "gated transform should time out");

    assert_eq!(nav.nav_state(), NavState::Idle);
    let snap = nav.snapshot();
    assert_eq!(snap.current_level(), Level::Sentence);
    assert_eq!(snap.display(), TEXT_SEED);
    assert!(nav.edit("Cells are small"));
}
