//! Demo blog on the Arbor pipeline.
//!
//! A small site with nested layouts, a post list, per-post like counts
//! mutated by a direct action, and a login form that works without client
//! script via the progressive protocol.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arbor_server::prelude::*;
use serde_json::json;

/// In-memory post store shared between pages and actions.
#[derive(Debug, Default)]
pub struct PostStore {
    likes: Mutex<HashMap<String, u64>>,
}

impl PostStore {
    /// Current like count for a post.
    pub fn likes(&self, slug: &str) -> u64 {
        *self.likes.lock().unwrap().get(slug).unwrap_or(&0)
    }

    /// Record one like and return the new count.
    pub fn like(&self, slug: &str) -> u64 {
        let mut likes = self.likes.lock().unwrap();
        let count = likes.entry(slug.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

const POSTS: &[(&str, &str)] = &[
    ("hello-arbor", "Hello, Arbor"),
    ("streaming-trees", "Streaming trees to the client"),
];

/// Page listing all posts as cards.
struct HomePage {
    store: Arc<PostStore>,
}

impl Unit for HomePage {
    fn name(&self) -> &str {
        "home-page"
    }

    fn props(&self) -> serde_json::Value {
        let posts: Vec<_> = POSTS
            .iter()
            .map(|(slug, title)| {
                json!({
                    "slug": slug,
                    "title": title,
                    "likes": self.store.likes(slug),
                })
            })
            .collect();
        json!({ "posts": posts })
    }
}

/// A single post with its live like count.
struct PostPage {
    slug: String,
    title: String,
    store: Arc<PostStore>,
}

impl Unit for PostPage {
    fn name(&self) -> &str {
        "post-page"
    }

    fn props(&self) -> serde_json::Value {
        json!({
            "slug": self.slug,
            "title": self.title,
            "likes": self.store.likes(&self.slug),
        })
    }
}

fn components(store: &Arc<PostStore>) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new()
        .layout(
            "/",
            StaticUnit::new("site-layout").with_props(json!({
                "header": {"title": "My Site", "nav": ["/", "/blog", "/login"]},
                "footer": "Powered by Arbor",
            })),
        )
        .layout("/blog", StaticUnit::new("blog-layout"))
        .page(
            "/",
            HomePage {
                store: Arc::clone(store),
            },
        )
        .page("/login", StaticUnit::new("login-page"));

    for (slug, title) in POSTS {
        registry = registry.register(
            &format!("/blog/{}", slug),
            UnitKind::Page,
            Arc::new(PostPage {
                slug: slug.to_string(),
                title: title.to_string(),
                store: Arc::clone(store),
            }),
        );
    }
    registry
}

fn actions(store: &Arc<PostStore>) -> ActionTable {
    let like_store = Arc::clone(store);
    ActionTable::new()
        .action(
            "post/like",
            FnAction(move |args: Vec<ActionValue>| {
                let slug = args
                    .first()
                    .and_then(ActionValue::as_json)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        ActionError::DecodeFailure("like action needs a post slug".into())
                    })?;
                Ok(json!({ "slug": slug, "likes": like_store.like(slug) }))
            }),
        )
        .action(
            "auth/login",
            FnAction(|args: Vec<ActionValue>| {
                let fields = args
                    .first()
                    .and_then(ActionValue::as_json)
                    .cloned()
                    .unwrap_or_default();
                let username = fields["username"].as_str().unwrap_or("");
                if username.is_empty() {
                    // Redisplayed by the form state, not a request failure.
                    return Ok(json!({ "ok": false, "error": "username is required" }));
                }
                Ok(json!({ "ok": true, "user": username }))
            }),
        )
}

/// Build the demo application handler.
pub fn blog_app() -> (RequestHandler, Arc<PostStore>) {
    let store = Arc::new(PostStore::default());
    let handler = RequestHandler::builder()
        .components(components(&store))
        .actions(actions(&store))
        .renderer(
            ShellDocumentRenderer::new(
                Shell::new(
                    HeadContent::new("My Site")
                        .with_meta("viewport", "width=device-width, initial-scale=1")
                        .with_stylesheet("/assets/site.css"),
                )
                .with_body_start("<body>\n<div id=\"app\" data-app=\"blog\">\n"),
            )
            .with_bootstrap("/assets/bootstrap.js"),
        )
        .config(ServerConfig::new("blog-demo"))
        .build();
    (handler, store)
}
