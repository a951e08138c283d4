//! Full pipeline: render, register, dispatch, publish, replay
//!
//! Exercises the path a real deployment takes: the server renders a page
//! and registers the query behind it, a client subscribes using the
//! channels found in the markup, a data change dispatches a recorded
//! transformation, and the client replays it to converge on the server's
//! view.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use weft_markup::{extract_templates, parse, render, NodeArena};
use weft_presenter::{DataObject, Presenter};
use weft_realtime::{
    apply, subscriptions_in, Broker, Dispatcher, MutationHandlers, MutationRegistration,
    MutationRegistry, QuerySource, RealtimeConfig, RealtimeError,
};
use weft_transform::{ChannelAddress, Recorder, Transformation};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const PAGE: &str = concat!(
    r#"<section data-c="scope:post;mutation:changed">"#,
    r#"<div data-b="post"><h1 data-b="title"></h1></div>"#,
    r#"</section>"#,
);

struct Store {
    posts: Mutex<Vec<DataObject>>,
}

impl Store {
    fn new(posts: Vec<DataObject>) -> Self {
        Self {
            posts: Mutex::new(posts),
        }
    }
}

impl QuerySource for Store {
    fn run(
        &self,
        query: &str,
        _args: &[serde_json::Value],
    ) -> Result<Vec<DataObject>, RealtimeError> {
        match query {
            "posts.all" => Ok(self.posts.lock().clone()),
            other => Err(RealtimeError::QueryFailed {
                query: other.to_string(),
                reason: "unknown query".to_string(),
            }),
        }
    }
}

fn post(id: i64, title: &str) -> DataObject {
    DataObject::new().with_scalar("id", id).with_scalar("title", title)
}

fn server_page(posts: &[DataObject]) -> NodeArena {
    let mut arena = parse(PAGE).unwrap();
    let root = arena.root();
    extract_templates(&mut arena, root);
    let section = arena.node(root).children[0];
    let mut presenter = Presenter::new(&mut arena);
    let outcome = presenter.present(&["post"], posts).unwrap();
    assert!(outcome.is_clean());
    // Correlate the region with the transformations it will receive.
    presenter.stamp_transform_id(section, "posts");
    drop(presenter);
    arena
}

fn handlers() -> MutationHandlers {
    let handlers = MutationHandlers::new();
    handlers.insert("changed", |recorder: &mut Recorder, data: &[DataObject]| {
        recorder.scope("post", |sub| {
            sub.present(data.to_vec());
        });
    });
    handlers
}

fn registration() -> MutationRegistration {
    MutationRegistration {
        scope: "post".to_string(),
        mutation: "changed".to_string(),
        query: "posts.all".to_string(),
        query_args: vec![],
        address: ChannelAddress::new("post", "changed"),
        transform_id: "posts".to_string(),
    }
}

#[tokio::test]
async fn data_change_converges_client_on_server_view() {
    init_tracing();
    let initial = vec![post(1, "first")];
    let server = server_page(&initial);

    // The client bootstraps from the server's rendered output; template
    // markers survive the round trip through real markup.
    let mut client = parse(&render(&server)).unwrap();

    let store = Arc::new(Store::new(initial));
    let registry = Arc::new(MutationRegistry::new());
    let broker = Arc::new(Broker::new(&RealtimeConfig::new()));
    registry.register(registration());
    let dispatcher = Dispatcher::new(
        Arc::clone(&registry),
        handlers(),
        Arc::clone(&broker),
        Arc::clone(&store) as Arc<dyn QuerySource>,
    );

    // The client subscribes with exactly what the markup advertises.
    let channels = subscriptions_in(&client);
    assert_eq!(channels, vec!["scope:post;mutation:changed".to_string()]);
    let mut rx = broker.subscribe(&channels[0]);

    // Data changes; the dispatcher re-runs the query and publishes.
    store.posts.lock().push(post(2, "second"));
    assert_eq!(dispatcher.on_change("post"), 1);

    let message = rx.recv().await.unwrap();
    assert_eq!(message.channel, "scope:post;mutation:changed");

    // Wire round trip, then replay on the client.
    let wire = message.transformation.encode().unwrap();
    let received = Transformation::decode(&wire).unwrap();
    assert!(apply(&mut client, &received));

    // The client now matches a server that presented the same data.
    let fresh = vec![post(1, "first"), post(2, "second")];
    let converged = server_page(&fresh);
    assert_eq!(render(&converged), render(&client));
}

#[tokio::test]
async fn qualified_channels_do_not_cross_deliver() {
    let broker = Broker::new(&RealtimeConfig::new());
    let address = ChannelAddress::new("post", "changed").with_qualifier("id");

    let one = address.build(&[post(1, "a")]);
    let two = address.build(&[post(2, "b")]);
    assert_ne!(one, two);

    let mut rx_one = broker.subscribe(&one);
    let _rx_two = broker.subscribe(&two);

    assert_eq!(broker.publish(&one, Recorder::new().finalize("t1")), 1);
    assert_eq!(rx_one.recv().await.unwrap().transformation.id, "t1");
    assert!(rx_one.try_recv().is_err());
}

#[tokio::test]
async fn repeated_dispatches_arrive_in_order() {
    let store = Arc::new(Store::new(vec![post(1, "v1")]));
    let registry = Arc::new(MutationRegistry::new());
    let broker = Arc::new(Broker::new(&RealtimeConfig::new()));
    registry.register(registration());
    let dispatcher = Dispatcher::new(
        Arc::clone(&registry),
        handlers(),
        Arc::clone(&broker),
        Arc::clone(&store) as Arc<dyn QuerySource>,
    );
    let mut rx = broker.subscribe("scope:post;mutation:changed");

    for title in ["v2", "v3", "v4"] {
        *store.posts.lock() = vec![post(1, title)];
        dispatcher.on_change("post");
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        let message = rx.recv().await.unwrap();
        if let weft_transform::Op::Present(objects) = &message.transformation.calls[0].nested[0][0].op
        {
            seen.push(objects[0].get("title").map(weft_presenter::Value::display));
        }
    }
    assert_eq!(
        seen,
        vec![
            Some("v2".to_string()),
            Some("v3".to_string()),
            Some("v4".to_string())
        ]
    );
}

#[tokio::test]
async fn deregistered_region_stops_publishing() {
    let store = Arc::new(Store::new(vec![post(1, "a")]));
    let registry = Arc::new(MutationRegistry::new());
    let broker = Arc::new(Broker::new(&RealtimeConfig::new()));
    registry.register(registration());
    let dispatcher = Dispatcher::new(
        Arc::clone(&registry),
        handlers(),
        Arc::clone(&broker),
        Arc::clone(&store) as Arc<dyn QuerySource>,
    );
    let _rx = broker.subscribe("scope:post;mutation:changed");

    assert_eq!(dispatcher.on_change("post"), 1);
    assert_eq!(registry.deregister("posts"), 1);
    assert_eq!(dispatcher.on_change("post"), 0);
}
