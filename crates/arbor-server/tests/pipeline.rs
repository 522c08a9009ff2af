//! End-to-end pipeline tests over a small blog application.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arbor_server::prelude::*;
use futures::executor::block_on;
use serde_json::json;

/// Post page whose props reflect server-side like state, so a response
/// tree shows whether a mutation ran before rendering.
struct PostPage {
    slug: &'static str,
    likes: Arc<AtomicUsize>,
}

impl Unit for PostPage {
    fn name(&self) -> &str {
        "post-page"
    }

    fn props(&self) -> serde_json::Value {
        json!({
            "slug": self.slug,
            "likes": self.likes.load(Ordering::SeqCst),
        })
    }
}

fn blog_handler(likes: Arc<AtomicUsize>) -> RequestHandler {
    let components = ComponentRegistry::new()
        .layout("/", StaticUnit::new("root-layout"))
        .layout("/blog", StaticUnit::new("blog-layout"))
        .page("/", StaticUnit::new("home-page"))
        .page(
            "/blog/post-1",
            PostPage {
                slug: "post-1",
                likes: Arc::clone(&likes),
            },
        );

    let like_counter = Arc::clone(&likes);
    let actions = ActionTable::new()
        .action(
            "blog/like",
            FnAction(move |_args: Vec<ActionValue>| {
                let count = like_counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(json!({"likes": count}))
            }),
        )
        .action(
            "auth/login",
            FnAction(|args: Vec<ActionValue>| {
                let fields = args[0].as_json().cloned().unwrap_or_default();
                Ok(json!({"welcome": fields["username"]}))
            }),
        );

    RequestHandler::builder()
        .components(components)
        .actions(actions)
        .renderer(
            ShellDocumentRenderer::new(Shell::new(HeadContent::new("Blog")))
                .with_bootstrap("/assets/bootstrap.js"),
        )
        .config(ServerConfig::new("blog"))
        .build()
}

fn body_lines(response: StreamingResponse) -> Vec<serde_json::Value> {
    let body = block_on(response.collect_body()).unwrap();
    String::from_utf8(body)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn merged_payload(response: StreamingResponse) -> serde_json::Value {
    let mut merged = json!({});
    for line in body_lines(response) {
        for (k, v) in line.as_object().unwrap() {
            merged[k] = v.clone();
        }
    }
    merged
}

// === Route resolution ===

#[test]
fn nested_route_composes_layouts_outermost_first() {
    let handler = blog_handler(Arc::new(AtomicUsize::new(0)));
    let ctx = RequestContext::for_url(Method::Get, "/blog/post-1?__rsc");
    let response = block_on(handler.handle(ctx)).unwrap();
    assert_eq!(response.status, 200);

    let payload = merged_payload(response);
    assert_eq!(payload["root"]["unit"], "root-layout");
    assert_eq!(payload["root"]["child"]["unit"], "blog-layout");
    assert_eq!(payload["root"]["child"]["child"]["unit"], "post-page");
    assert_eq!(payload["root"]["child"]["child"]["props"]["slug"], "post-1");
}

#[test]
fn unknown_route_is_not_found_inside_root_layout() {
    let handler = blog_handler(Arc::new(AtomicUsize::new(0)));
    let ctx = RequestContext::for_url(Method::Get, "/no/such/path?__rsc");
    let response = block_on(handler.handle(ctx)).unwrap();
    assert_eq!(response.status, 200);

    let payload = merged_payload(response);
    assert_eq!(payload["root"]["unit"], "root-layout");
    assert_eq!(payload["root"]["child"]["unit"], "not-found");
}

// === Single round trip ===

#[test]
fn direct_action_mutates_then_renders_in_one_response() {
    let likes = Arc::new(AtomicUsize::new(0));
    let handler = blog_handler(Arc::clone(&likes));

    let ctx = RequestContext::for_url(Method::Post, "/blog/post-1?__rsc")
        .with_header(ACTION_HEADER, "blog/like")
        .with_header("content-type", "text/plain")
        .with_body(r#"["post-1"]"#);
    let response = block_on(handler.handle(ctx)).unwrap();
    let payload = merged_payload(response);

    // The return value and the freshly rendered tree arrive together, and
    // the tree already reflects the mutation.
    assert_eq!(payload["returnValue"]["likes"], 1);
    assert_eq!(
        payload["root"]["child"]["child"]["props"]["likes"],
        1,
        "tree must be rendered after the action ran"
    );
    assert!(payload.get("formState").is_none());
}

#[test]
fn progressive_submission_resumes_form_state() {
    let handler = blog_handler(Arc::new(AtomicUsize::new(0)));
    let ctx = RequestContext::for_url(Method::Post, "/?__rsc")
        .with_header("content-type", "application/x-www-form-urlencoded")
        .with_body("$action=auth/login&username=ada");
    let response = block_on(handler.handle(ctx)).unwrap();
    let payload = merged_payload(response);

    assert_eq!(payload["formState"]["value"]["welcome"], "ada");
    assert_eq!(payload["formState"]["fields"]["username"], "ada");
    assert!(payload.get("returnValue").is_none());
}

// === Transport negotiation ===

#[test]
fn raw_response_sets_component_content_type() {
    let handler = blog_handler(Arc::new(AtomicUsize::new(0)));
    let ctx = RequestContext::for_url(Method::Get, "/?__rsc");
    let response = block_on(handler.handle(ctx)).unwrap();
    assert_eq!(
        response.header("content-type"),
        Some("text/x-component;charset=utf-8")
    );
    assert_eq!(response.header("vary"), Some("accept"));
}

#[test]
fn document_client_receives_html_document() {
    let handler = blog_handler(Arc::new(AtomicUsize::new(0)));
    let ctx = RequestContext::for_url(Method::Get, "/blog/post-1")
        .with_header("accept", "text/html,application/xhtml+xml");
    let response = block_on(handler.handle(ctx)).unwrap();
    assert_eq!(response.header("content-type"), Some("text/html"));
    assert_eq!(response.header("vary"), Some("accept"));

    let html = String::from_utf8(block_on(response.collect_body()).unwrap()).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("application/x-component"));
    assert!(html.contains("post-page"));
    assert!(html.contains("bootstrap.js"));
    assert!(html.ends_with("</html>"));
}

#[test]
fn nojs_marker_simulates_script_disabled_client() {
    let handler = blog_handler(Arc::new(AtomicUsize::new(0)));
    let ctx = RequestContext::for_url(Method::Get, "/?__nojs")
        .with_header("accept", "text/html");
    let response = block_on(handler.handle(ctx)).unwrap();
    let html = String::from_utf8(block_on(response.collect_body()).unwrap()).unwrap();
    assert!(!html.contains("bootstrap.js"));
}

#[test]
fn rsc_marker_wins_even_for_document_clients() {
    let handler = blog_handler(Arc::new(AtomicUsize::new(0)));
    let ctx = RequestContext::for_url(Method::Get, "/?__rsc").with_header("accept", "text/html");
    let response = block_on(handler.handle(ctx)).unwrap();
    assert_eq!(
        response.header("content-type"),
        Some("text/x-component;charset=utf-8")
    );
}

// === Lifecycle observation ===

/// Records every phase the pipeline reports.
struct PhaseRecorder {
    phases: Arc<Mutex<Vec<PipelinePhase>>>,
}

impl LifecycleObserver for PhaseRecorder {
    fn on_phase(&self, phase: PipelinePhase, _elapsed: Duration) {
        self.phases.lock().unwrap().push(phase);
    }
}

#[test]
fn observer_sees_every_phase_through_completion() {
    let phases = Arc::new(Mutex::new(Vec::new()));
    let handler = RequestHandler::builder()
        .components(ComponentRegistry::new().page("/", StaticUnit::new("home-page")))
        .observer(PhaseRecorder {
            phases: Arc::clone(&phases),
        })
        .build();

    let ctx = RequestContext::for_url(Method::Get, "/?__rsc");
    let timing = ctx.timing.clone();
    let response = block_on(handler.handle(ctx)).unwrap();
    // Completion is reported only once the body has been drained.
    assert!(!phases.lock().unwrap().contains(&PipelinePhase::Completion));
    block_on(response.collect_body()).unwrap();

    assert_eq!(
        *phases.lock().unwrap(),
        vec![
            PipelinePhase::Start,
            PipelinePhase::ActionDispatched,
            PipelinePhase::RouteResolved,
            PipelinePhase::PayloadAssembled,
            PipelinePhase::Streaming,
            PipelinePhase::Completion,
        ]
    );
    // The producer marked first_chunk on the timing shared with the caller.
    assert!(timing.time_to_first_byte().is_some());
    assert!(timing.time_to("complete").is_some());
}

#[test]
fn observer_sees_error_phase_when_dispatch_fails() {
    let phases = Arc::new(Mutex::new(Vec::new()));
    let handler = RequestHandler::builder()
        .observer(PhaseRecorder {
            phases: Arc::clone(&phases),
        })
        .build();

    let ctx = RequestContext::for_url(Method::Post, "/?__rsc")
        .with_header(ACTION_HEADER, "blog/unknown")
        .with_body("[]");
    block_on(handler.handle(ctx)).unwrap_err();

    let phases = phases.lock().unwrap();
    assert_eq!(phases.first(), Some(&PipelinePhase::Start));
    assert!(matches!(phases.last(), Some(PipelinePhase::Error(_))));
}

// === Failure propagation ===

#[test]
fn unknown_action_fails_the_request() {
    let handler = blog_handler(Arc::new(AtomicUsize::new(0)));
    let ctx = RequestContext::for_url(Method::Post, "/?__rsc")
        .with_header(ACTION_HEADER, "blog/unknown")
        .with_body("[]");
    let err = block_on(handler.handle(ctx)).unwrap_err();
    assert!(matches!(
        err,
        HandlerError::Action(ActionError::UnknownAction(_))
    ));
}

#[test]
fn corrupt_direct_body_fails_with_client_hint() {
    let handler = blog_handler(Arc::new(AtomicUsize::new(0)));
    let ctx = RequestContext::for_url(Method::Post, "/?__rsc")
        .with_header(ACTION_HEADER, "blog/like")
        .with_body("not json at all");
    let err = block_on(handler.handle(ctx)).unwrap_err();
    assert_eq!(err.status_hint(), 400);
}
