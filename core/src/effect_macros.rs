//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants from
//! inside reducers.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use brewstand_core::async_effect;
///
/// async_effect! {
///     match documents.fetch_all("bases").await {
///         Ok(docs) => Some(BrewAction::BasesFetched { docs }),
///         Err(error) => Some(BrewAction::FetchFailed { error: error.to_string() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Stream` from any `Stream` of actions
///
/// # Example
///
/// ```rust,ignore
/// use brewstand_core::stream_effect;
///
/// stream_effect!(snapshots.map(|records| BrewAction::Snapshot { records }))
/// ```
#[macro_export]
macro_rules! stream_effect {
    ($stream:expr) => {
        $crate::effect::Effect::Stream(::std::boxed::Box::pin($stream))
    };
}
