use fetch_core::{
    FetchController, FetchHookReturn, Refetch, RequestConfig, RequestState,
    TriggerToken,
};
use serde::de::DeserializeOwned;
use std::rc::Rc;
use yew::prelude::*;

use crate::{FetchContext, GlooScheduler};

/// Fetch `url` for the lifetime of the calling component.
///
/// Fetches on mount and whenever `url`, `options` or the refetch trigger
/// change, aborting the request in flight first. `refetch` is debounced by
/// the configured window (700ms by default) and keeps its identity across
/// renders. Errors never propagate out of the hook; they are reported in
/// `error`, while cancelled requests are not reported at all.
///
/// The transport and hook configuration come from the nearest
/// `ContextProvider<FetchContext>`, or [`FetchContext::default`] if there is
/// none.
///
/// # Example
///
/// ```rust,ignore
/// #[function_component]
/// fn ItemView(props: &ItemProps) -> Html {
///     let item = use_fetch::<Item>(format!("/items/{}", props.id), None);
///     let onclick = {
///         let refetch = item.refetch.clone();
///         Callback::from(move |_| refetch.call())
///     };
///
///     match (&item.data, &item.error) {
///         (_, Some(error)) => html! { <p>{error.to_string()}</p> },
///         (Some(item), None) => html! {
///             <button {onclick}>{&item.name}</button>
///         },
///         (None, None) => html! { <p>{"Loading item..."}</p> },
///     }
/// }
/// ```
#[hook]
pub fn use_fetch<T>(
    url: String,
    options: Option<RequestConfig>,
) -> FetchHookReturn<T>
where
    T: DeserializeOwned + Clone + 'static,
{
    let provided = use_context::<FetchContext>();
    let context = use_memo((), move |_| provided.unwrap_or_default());
    use_fetch_with(url, options, (*context).clone())
}

/// Like [`use_fetch`], with an explicit transport and configuration.
///
/// `context` is read on the first render only.
#[hook]
pub fn use_fetch_with<T>(
    url: String,
    options: Option<RequestConfig>,
    context: FetchContext,
) -> FetchHookReturn<T>
where
    T: DeserializeOwned + Clone + 'static,
{
    let state = use_state(RequestState::<T>::default);
    let trigger = use_state(TriggerToken::default);

    let controller = {
        let setter = state.setter();
        use_memo((), move |_| {
            let controller =
                FetchController::new(context.transport, context.config);
            controller.subscribe(move |s: &RequestState<T>| {
                setter.set(s.clone())
            });
            controller
        })
    };

    // One debounced refetch for the component's lifetime.
    let refetch = {
        let controller = controller.clone();
        let setter = trigger.setter();
        use_memo((), move |_| {
            Refetch::for_controller(
                &*controller,
                Rc::new(GlooScheduler),
                move |_, next| setter.set(next),
            )
        })
    };

    // Fetch on mount and when the inputs or trigger change
    {
        let controller = controller.clone();
        use_effect_with(
            (url, options, *trigger),
            move |(url, options, _)| {
                let options = options.clone().unwrap_or_default();
                let cycle = controller.activate(url, &options);
                yew::platform::spawn_local(cycle);
                move || controller.cancel()
            },
        );
    }

    // Detach on unmount
    {
        let controller = controller.clone();
        let refetch = refetch.clone();
        use_effect_with((), move |_| {
            move || {
                refetch.close();
                controller.detach();
            }
        });
    }

    FetchHookReturn::new((*state).clone(), (*refetch).clone())
}
