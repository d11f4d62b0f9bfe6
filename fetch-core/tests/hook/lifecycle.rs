use fetch_core::{
    CyclePhase, FetchController, HookConfig, RequestConfig, RequestState,
};
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;
use test_helpers::{MockTransport, advance, run_local, spawn_hook};

use crate::Item;

#[tokio::test(start_paused = true)]
async fn changing_url_aborts_previous_request() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport
            .respond("/items/1", 100, json!({ "id": 1 }))
            .respond("/items/2", 50, json!({ "id": 2 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        advance(10).await;
        app.hook.render("/items/2", &RequestConfig::get());

        let first = &transport.calls_to("/items/1")[0];
        let second = &transport.calls_to("/items/2")[0];
        assert!(first.signal.is_aborted());
        assert!(!second.signal.is_aborted());

        advance(60).await;
        assert_eq!(app.hook.state().data, Some(Item { id: 2 }));

        advance(100).await;
        let state = app.hook.state();
        assert_eq!(state.data, Some(Item { id: 2 }));
        assert_eq!(state.phase, CyclePhase::Success);
        assert_eq!(transport.call_count(), 2);
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn changing_options_starts_new_cycle() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items", 30, json!({ "id": 1 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items", &RequestConfig::get().query("page", 1));
        app.hook.render("/items", &RequestConfig::get().query("page", 1));
        assert_eq!(transport.call_count(), 1);

        app.hook.render("/items", &RequestConfig::get().query("page", 2));
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].signal.is_aborted());
        assert_eq!(calls[1].config.params, vec![("page".into(), "2".into())]);
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn rerender_with_same_inputs_does_not_refetch() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items/1", 10, json!({ "id": 1 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        for _ in 0..3 {
            app.hook.render("/items/1", &RequestConfig::get());
            advance(20).await;
        }

        assert_eq!(transport.call_count(), 1);
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn detach_aborts_and_freezes_state() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items/1", 100, json!({ "id": 1 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        advance(10).await;
        let before = app.hook.state();
        let notified = app.notification_count();

        app.hook.detach();
        assert!(transport.calls()[0].signal.is_aborted());

        advance(200).await;
        assert_eq!(app.hook.state(), before);
        assert_eq!(app.notification_count(), notified);

        // Later renders neither fetch nor change state.
        app.hook.render("/items/2", &RequestConfig::get());
        advance(200).await;
        assert_eq!(transport.call_count(), 1);
        assert_eq!(app.hook.state(), before);
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dropping_hook_aborts_request() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items/1", 100, json!({ "id": 1 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        drop(app);

        assert!(transport.calls()[0].signal.is_aborted());
        advance(200).await;
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stale_cycle_ignoring_abort_cannot_overwrite() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport
            .respond_ignoring_abort("/slow", 100, json!({ "id": 1 }))
            .respond("/fast", 10, json!({ "id": 2 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/slow", &RequestConfig::get());
        advance(5).await;
        app.hook.render("/fast", &RequestConfig::get());
        advance(200).await;

        let state = app.hook.state();
        assert_eq!(state.data, Some(Item { id: 2 }));
        assert!(!state.loading);
        assert_eq!(state.phase, CyclePhase::Success);
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn superseded_abort_does_not_clear_loading() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport
            .respond("/items/1", 100, json!({ "id": 1 }))
            .respond("/items/2", 100, json!({ "id": 2 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        advance(10).await;
        app.hook.render("/items/2", &RequestConfig::get());

        // The first cycle settles as aborted right away, but must not
        // report the second cycle as finished.
        advance(10).await;
        let state = app.hook.state();
        assert!(state.loading);
        assert_eq!(state.phase, CyclePhase::Loading);
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancel_settles_current_cycle_as_aborted() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items/1", 100, json!({ "id": 1 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        advance(10).await;
        app.hook.controller().cancel();
        advance(1).await;

        let state = app.hook.state();
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.data, None);
        assert_eq!(state.phase, CyclePhase::Aborted);
    })
    .await;

    Ok(())
}

/// Count the notifications a listener receives.
fn counter() -> (Rc<Cell<u32>>, impl Fn(&RequestState<Item>) + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (count, move |_: &RequestState<Item>| c.set(c.get() + 1))
}

#[tokio::test(start_paused = true)]
async fn listener_can_detach_while_notified() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items/1", 10, json!({ "id": 1 }));
        let controller = FetchController::<Item>::new(
            Rc::new(transport.clone()),
            HookConfig::default(),
        );

        let detaching = controller.clone();
        controller.subscribe(move |s: &RequestState<Item>| {
            if s.data.is_some() {
                detaching.detach();
            }
        });
        let (later, count_later) = counter();
        controller.subscribe(count_later);

        // Driven inline so a panic inside the cycle fails the test.
        controller.activate("/items/1", &RequestConfig::get()).await;

        assert!(controller.is_detached());
        assert_eq!(controller.state().data, Some(Item { id: 1 }));
        // Loading only; the success pass stopped at the detach.
        assert_eq!(later.get(), 1);

        controller.activate("/items/1", &RequestConfig::get()).await;
        controller.notify();
        assert_eq!(later.get(), 1);
        assert_eq!(transport.call_count(), 1);
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn listener_can_subscribe_while_notified() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items/1", 10, json!({ "id": 1 }));
        let controller = FetchController::<Item>::new(
            Rc::new(transport.clone()),
            HookConfig::default(),
        );

        let (added, count_added) = counter();
        let count_added = Rc::new(count_added);
        let subscribing = controller.clone();
        let subscribed = Cell::new(false);
        controller.subscribe(move |_: &RequestState<Item>| {
            if !subscribed.replace(true) {
                let count_added = count_added.clone();
                subscribing.subscribe(move |s| count_added(s));
            }
        });

        controller.activate("/items/1", &RequestConfig::get()).await;

        // Subscribed during the loading pass, so only sees success.
        assert_eq!(added.get(), 1);
        assert_eq!(controller.state().phase, CyclePhase::Success);
        controller.detach();
    })
    .await;

    Ok(())
}
