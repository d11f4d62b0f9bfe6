use fetch_core::{CyclePhase, FetchError, HookConfig, RequestConfig, StaleData};
use serde_json::json;
use test_helpers::{MockTransport, TestHook, advance, run_local, spawn_hook};

use crate::Item;

/// Render `/items/1`, then refetch it once the first cycle settled.
async fn fetch_twice(app: &TestHook<Item>) {
    app.hook.render("/items/1", &RequestConfig::get());
    advance(20).await;

    app.hook.refetch();
    advance(701).await;
    app.hook.render("/items/1", &RequestConfig::get());
    advance(20).await;
}

#[tokio::test(start_paused = true)]
async fn success_sets_data_and_clears_loading() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items/1", 50, json!({ "id": 1 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        assert_eq!(app.hook.state().phase, CyclePhase::Loading);

        advance(49).await;
        assert!(app.hook.state().loading);

        advance(2).await;
        let state = app.hook.state();
        assert_eq!(state.data, Some(Item { id: 1 }));
        assert_eq!(state.error, None);
        assert!(!state.loading);
        assert_eq!(state.phase, CyclePhase::Success);
        assert!(!app.hook.controller().is_in_flight());
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn abort_error_is_swallowed() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.fail(
            "/items/1",
            10,
            FetchError::other("AbortError", "The user aborted a request."),
        );
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        advance(20).await;

        let state = app.hook.state();
        assert_eq!(state.error, None);
        assert_eq!(state.data, None);
        assert!(!state.loading);
        assert_eq!(state.phase, CyclePhase::Aborted);
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn network_error_keeps_stale_data() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        let network_error = FetchError::other("NetworkError", "socket closed");
        transport
            .respond("/items/1", 10, json!({ "id": 1 }))
            .fail("/items/1", 10, network_error.clone());
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        fetch_twice(&app).await;

        let state = app.hook.state();
        assert_eq!(transport.call_count(), 2);
        assert_eq!(state.error, Some(network_error));
        assert_eq!(state.data, Some(Item { id: 1 }));
        assert!(!state.loading);
        assert_eq!(state.phase, CyclePhase::Failed);
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn clear_policy_drops_stale_data_on_error() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport
            .respond("/items/1", 10, json!({ "id": 1 }))
            .fail("/items/1", 10, FetchError::Network("offline".into()));
        let config = HookConfig::default().with_stale_data(StaleData::Clear);
        let app = spawn_hook::<Item>(&transport, config);

        fetch_twice(&app).await;

        let state = app.hook.state();
        assert_eq!(state.data, None);
        let name = state.error.as_ref().map(|e| e.name());
        assert_eq!(name, Some("NetworkError"));
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn error_survives_loading_until_next_success() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport
            .fail("/items/1", 10, FetchError::Timeout)
            .respond("/items/1", 10, json!({ "id": 1 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        advance(20).await;
        assert_eq!(app.hook.state().error, Some(FetchError::Timeout));

        app.hook.refetch();
        advance(701).await;
        let rendered = app.hook.render("/items/1", &RequestConfig::get());
        assert!(rendered.loading);
        assert_eq!(rendered.error, Some(FetchError::Timeout));

        advance(20).await;
        let state = app.hook.state();
        assert_eq!(state.error, None);
        assert_eq!(state.data, Some(Item { id: 1 }));
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn undecodable_payload_is_a_decode_error() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items/1", 10, json!("not an item"));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        advance(20).await;

        let error = app.hook.state().error.expect("decode error recorded");
        assert_eq!(error.name(), "DecodeError");
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn http_errors_carry_status() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/missing", &RequestConfig::get());
        advance(1).await;

        let error = app.hook.state().error.expect("status error recorded");
        assert_eq!(error.status(), Some(404));
        assert!(!error.is_abort());
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn request_config_reaches_transport() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items", 10, json!({ "id": 3 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());
        let config = RequestConfig::get()
            .header("Authorization", "Bearer abc")
            .query("id", 3);

        app.hook.render("/items", &config);

        let call = transport.last_call().expect("request sent");
        assert_eq!(call.config, config);
        assert!(!call.signal.is_aborted());
    })
    .await;

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn every_applied_change_is_notified() -> anyhow::Result<()> {
    run_local(async {
        let transport = MockTransport::new();
        transport.respond("/items/1", 10, json!({ "id": 1 }));
        let app = spawn_hook::<Item>(&transport, HookConfig::default());

        app.hook.render("/items/1", &RequestConfig::get());
        advance(20).await;

        let phases: Vec<_> = app
            .notifications
            .borrow()
            .iter()
            .map(|s| s.phase)
            .collect();
        assert_eq!(phases, vec![CyclePhase::Loading, CyclePhase::Success]);
    })
    .await;

    Ok(())
}
