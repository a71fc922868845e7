/// A `Future` that is `Send`. Callback traits use this as their return type so handlers can
/// move the future onto a spawned task.
macro_rules! future_send {
    ($t:ty) => {
        impl ::core::future::Future<Output = $t> + Send
    };
}

pub(crate) use future_send;
