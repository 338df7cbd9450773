//! End-to-end behavior of the content graph through the public API.

use rayon::prelude::*;
use serde_json::{Value, json};
use sitegraph::store::Internal;
use sitegraph::utils::slug::slugify;
use sitegraph::{
    CollectionOptions, Filter, Node, PageSpec, Query, Store, StoreConfig, StoreError, create_reference,
    evaluate,
};
use std::sync::Arc;

fn quiet_store() -> Store {
    let mut config = StoreConfig::default();
    config.log.quiet = true;
    Store::with_config(config)
}

#[test]
fn slug_route_paths_follow_slug_or_title() {
    let mut store = quiet_store();
    let mut pages = store
        .add_collection("Page", CollectionOptions::default().with_route("/:slug"))
        .unwrap();

    let inputs = [
        json!({"id": "1", "title": "Hello World"}),
        json!({"id": "2", "title": "Ignored", "slug": "Custom Slug"}),
        json!({"id": "3", "title": "Crème Brûlée, à la carte!"}),
        json!({"id": "4", "title": "  spaced   out  "}),
    ];

    for input in inputs {
        let expected = {
            let source = input.get("slug").or_else(|| input.get("title")).unwrap();
            format!("/{}", slugify(source.as_str().unwrap()))
        };
        let node = pages
            .add_node(sitegraph::NodeInput::from_value(input).unwrap())
            .unwrap();
        assert_eq!(node.path.as_deref(), Some(expected.as_str()));
    }
}

#[test]
fn post_date_route() {
    let mut store = quiet_store();
    let mut posts = store
        .add_collection(
            "Post",
            CollectionOptions::default().with_route("/:year/:month/:day/:slug"),
        )
        .unwrap();

    let node = posts
        .add_node(
            sitegraph::NodeInput::new()
                .field("date", "2018-09-04T23:20:33.918Z")
                .field("title", "Lorem Ipsum"),
        )
        .unwrap();
    assert_eq!(node.path.as_deref(), Some("/2018/09/04/lorem-ipsum"));
}

#[test]
fn get_node_round_trips_processed_fields() {
    let mut store = quiet_store();
    let mut posts = store
        .add_collection("Post", CollectionOptions::default())
        .unwrap();

    let input = sitegraph::NodeInput::new()
        .id("1")
        .field("title", "Hello")
        .field("tags", json!(["a", "b"]))
        .field("meta", json!({"cover": "./cover.png"}))
        .origin("/site/content/hello.md");
    posts.add_node(input).unwrap();

    let node = posts.get_node("1").unwrap();
    assert_eq!(
        Value::Object(node.fields.clone()),
        json!({
            "title": "Hello",
            "tags": ["a", "b"],
            "meta": {"cover": "/site/content/cover.png"},
        })
    );
    assert_eq!(node.internal.origin.as_deref(), Some("/site/content/hello.md"));
}

#[test]
fn author_book_backlinks() {
    let mut store = quiet_store();
    store
        .add_collection("Author", CollectionOptions::default())
        .unwrap()
        .add_node(sitegraph::NodeInput::new().id("2").field("name", "Ada"))
        .unwrap();

    store
        .add_collection("Book", CollectionOptions::default())
        .unwrap()
        .add_node(
            sitegraph::NodeInput::new()
                .id("b1")
                .field("title", "Notes")
                .field("author", create_reference("Author", "2")),
        )
        .unwrap();

    let result = store.query_backlinks("Author", "2", &Query::new());
    assert_eq!(result.ids(), ["b1"]);
    assert_eq!(result.items[0].type_name, "Book");

    store.collection_mut("Book").unwrap().remove_node("b1");
    assert!(store.query_backlinks("Author", "2", &Query::new()).items.is_empty());
}

#[test]
fn nested_and_cyclic_references() {
    let mut store = quiet_store();
    let mut people = store
        .add_collection("Person", CollectionOptions::default())
        .unwrap();
    people
        .add_node(
            sitegraph::NodeInput::new()
                .id("a")
                .field("profile", json!({"friends": [create_reference("Person", "b")]})),
        )
        .unwrap();
    people
        .add_node(
            sitegraph::NodeInput::new()
                .id("b")
                .field("bestFriend", create_reference("Person", "a")),
        )
        .unwrap();

    let ids = |id: &str| -> Vec<String> {
        store
            .backlinks("Person", id)
            .map(|node| node.id.clone())
            .collect()
    };
    assert_eq!(ids("a"), ["b"]);
    assert_eq!(ids("b"), ["a"]);
}

#[test]
fn union_reference_reaches_every_type() {
    let mut store = quiet_store();
    store
        .add_collection("Link", CollectionOptions::default())
        .unwrap()
        .add_node(
            sitegraph::NodeInput::new()
                .id("l1")
                .field("target", sitegraph::Reference::union(["Post", "Page"], "7")),
        )
        .unwrap();

    assert_eq!(store.backlinks("Post", "7").count(), 1);
    assert_eq!(store.backlinks("Page", "7").count(), 1);
    assert_eq!(store.backlinks("Post", "8").count(), 0);
}

#[test]
fn price_between_filter() {
    let mut store = quiet_store();
    let mut products = store
        .add_collection("Product", CollectionOptions::default().with_sort_by("price"))
        .unwrap();
    for price in [99, 199, 149, 119] {
        products
            .add_node(sitegraph::NodeInput::new().field("price", price))
            .unwrap();
    }

    let query = Query::from_value(&json!({"filter": {"price": {"between": [120, 150]}}})).unwrap();
    let result = products.find(&query);
    assert_eq!(result.total_count, 1);
    assert_eq!(result.items[0].fields["price"], json!(149));
}

#[test]
fn update_preserves_unmentioned_fields() {
    let mut store = quiet_store();
    let mut posts = store
        .add_collection("Post", CollectionOptions::default())
        .unwrap();
    posts
        .add_node(
            sitegraph::NodeInput::new()
                .id("1")
                .field("title", "Hello")
                .field("excerpt", "Short")
                .field("draft", true),
        )
        .unwrap();

    let before = posts.get_node("1").unwrap().clone();
    let after = posts
        .update_node(sitegraph::NodeInput::new().id("1").field("draft", false))
        .unwrap();

    assert_eq!(after.fields["draft"], json!(false));
    for (key, value) in &before.fields {
        if key != "draft" {
            assert_eq!(after.fields.get(key), Some(value), "field `{key}` changed");
        }
    }
    assert!(after.internal.last_modified > before.internal.last_modified);
}

#[test]
fn missing_transformer_aborts_add() {
    let mut store = quiet_store();
    let mut posts = store
        .add_collection("Post", CollectionOptions::default())
        .unwrap();
    let err = posts
        .add_node(sitegraph::NodeInput::new().content("text/markdown", "# Title"))
        .unwrap_err();

    assert!(matches!(
        &err,
        StoreError::MissingTransformer { type_name, mime_type }
            if type_name == "Post" && mime_type == "text/markdown"
    ));
    assert!(!err.is_recoverable());
    assert!(posts.is_empty());
}

#[test]
fn custom_transformer_supplies_fields() {
    struct FrontMatter;

    impl sitegraph::Transformer for FrontMatter {
        fn mime_types(&self) -> &[&str] {
            &["text/markdown"]
        }

        fn parse(&self, content: &str) -> anyhow::Result<sitegraph::store::FieldMap> {
            let mut fields = sitegraph::store::FieldMap::new();
            let (head, body) = content.split_once("\n---\n").unwrap_or(("", content));
            for line in head.lines() {
                if let Some((key, value)) = line.split_once(':') {
                    fields.insert(key.trim().to_owned(), json!(value.trim()));
                }
            }
            fields.insert("content".into(), json!(body.trim()));
            Ok(fields)
        }
    }

    let mut store = quiet_store();
    store.register_transformer(Arc::new(FrontMatter));
    let mut posts = store
        .add_collection("Post", CollectionOptions::default().with_route("/blog/:slug"))
        .unwrap();

    let node = posts
        .add_node(
            sitegraph::NodeInput::new()
                .content("text/markdown", "id: 9\ntitle: From Markdown\n---\nBody text"),
        )
        .unwrap();

    assert_eq!(node.id, "9");
    assert_eq!(node.path.as_deref(), Some("/blog/from-markdown"));
    assert_eq!(node.fields["content"], json!("Body text"));
}

#[test]
fn empty_pagination_has_one_page() {
    let query = Query::new().page(PageSpec::new().per_page(10));
    let result = evaluate(Vec::<&Node>::new(), &query, &sitegraph::query::PlainFields, "date");
    assert_eq!(result.total_count, 0);
    assert!(result.items.is_empty());
    assert_eq!(result.page_info.total_pages, 1);
}

#[test]
fn evaluate_is_idempotent() {
    let mut store = quiet_store();
    let mut posts = store
        .add_collection("Post", CollectionOptions::default())
        .unwrap();
    for i in 0..25 {
        posts
            .add_node(
                sitegraph::NodeInput::new()
                    .id(i.to_string())
                    .field("date", format!("2020-01-{:02}", i % 28 + 1))
                    .field("n", i % 3),
            )
            .unwrap();
    }

    let query = Query::from_value(&json!({
        "filter": {"n": {"in": [0, 2]}},
        "perPage": 4,
        "page": 2,
    }))
    .unwrap();

    let collection = store.collection("Post").unwrap();
    let first = collection.find(&query);
    let second = collection.find(&query);
    assert_eq!(first.ids(), second.ids());
    assert_eq!(first.total_count, second.total_count);
    assert_eq!(first.page_info, second.page_info);
}

#[test]
fn shared_store_concurrent_reads() {
    let mut store = quiet_store();
    let mut posts = store
        .add_collection("Post", CollectionOptions::default().with_sort_by("n"))
        .unwrap();
    for i in 0..100 {
        posts
            .add_node(sitegraph::NodeInput::new().id(i.to_string()).field("n", i))
            .unwrap();
    }

    let shared = store.into_shared();
    let writer = Arc::clone(&shared);
    std::thread::spawn(move || {
        writer
            .write()
            .collection_mut("Post")
            .unwrap()
            .add_node(sitegraph::NodeInput::new().id("100").field("n", 100))
            .unwrap();
    })
    .join()
    .unwrap();

    let store = shared.read();
    let posts = store.collection("Post").unwrap();
    let counts: Vec<usize> = (0..16)
        .into_par_iter()
        .map(|page| {
            let query = Query::new().page(PageSpec::new().per_page(10).page(page + 1));
            posts.find(&query).items.len()
        })
        .collect();

    assert_eq!(counts.iter().sum::<usize>(), 101);
    assert_eq!(posts.find(&Query::new()).items[0].id, "100");
}

#[test]
fn store_from_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join(sitegraph::CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        r#"
        [log]
        quiet = true

        [permalinks]
        trailing_slash = true

        [collections.Post]
        route = "/blog/:slug"
        refs = { author = "Author" }
        "#,
    )
    .unwrap();

    let config = StoreConfig::from_path(&path).unwrap();
    let mut store = Store::from_config(config).unwrap();
    let mut posts = store.collection_mut("Post").unwrap();
    let node = posts
        .add_node(
            sitegraph::NodeInput::new()
                .id("1")
                .field("title", "Hi")
                .field("author", "ada"),
        )
        .unwrap();
    assert_eq!(node.path.as_deref(), Some("/blog/hi/"));

    let referrers: Vec<&str> = store.backlinks("Author", "ada").map(|n| n.id.as_str()).collect();
    assert_eq!(referrers, ["1"]);
}

#[test]
fn remove_by_filter_is_silent_when_empty() {
    let mut store = quiet_store();
    let mut posts = store
        .add_collection("Post", CollectionOptions::default())
        .unwrap();
    posts.add_node(sitegraph::NodeInput::new().id("1")).unwrap();

    let before = store.last_modified();
    let removed = store
        .collection_mut("Post")
        .unwrap()
        .remove_node(Filter::new().eq("id", "nope"));
    assert!(removed.is_empty());
    assert_eq!(store.last_modified(), before);
    assert_eq!(store.collection("Post").unwrap().len(), 1);
}

#[test]
fn node_serializes_flat() {
    let mut store = quiet_store();
    let mut posts = store
        .add_collection("Post", CollectionOptions::default().with_route("/:slug"))
        .unwrap();
    let node = posts
        .add_node(sitegraph::NodeInput::new().id("1").field("title", "Hi"))
        .unwrap();

    let value = serde_json::to_value(node).unwrap();
    assert_eq!(value["id"], json!("1"));
    assert_eq!(value["typeName"], json!("Post"));
    assert_eq!(value["title"], json!("Hi"));
    assert_eq!(value["path"], json!("/hi"));
    assert!(value["internal"]["lastModified"].as_u64().unwrap() > 0);

    let default_internal = Internal::default();
    assert_eq!(default_internal.last_modified, 0);
}

#[test]
fn bare_relative_asset_path_resolves_against_origin() {
    let mut store = quiet_store();
    let mut posts = store
        .add_collection("Post", CollectionOptions::default())
        .unwrap();
    let node = posts
        .add_node(
            sitegraph::NodeInput::new()
                .id("1")
                .field("cover", "images/cover.png")
                .field("summary", "Plain text, no asset.")
                .origin("/site/content/posts/a.md"),
        )
        .unwrap();

    assert_eq!(node.fields["cover"], json!("/site/content/posts/images/cover.png"));
    assert_eq!(node.fields["summary"], json!("Plain text, no asset."));
}
