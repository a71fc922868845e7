//! The `Transformer` service handler.

use crate::callback::{BytesTransform, CallContext, StringTransform, Unconfigured};
use crate::interop::{callback_fault_to_status, into_tonic_status};
use crate::proto::transform::transform_payload::Content;
use crate::proto::transform::{TransformPayload, TransformResponse};
use crate::service::transform::TransformRpc;
use crate::tracing_shim::{debug, info_span, Instrument as _};
use crate::RpcResponse;
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Dispatches each `Transform` call to a string or a bytes callback, depending on which
/// variant the payload carries.
///
/// Either side may be left [`Unconfigured`], in which case payloads of that kind are answered
/// with `UNIMPLEMENTED`. The callback runs on its own task: a panic there becomes `INTERNAL`
/// for that call and nothing else.
#[must_use]
#[derive(Debug)]
pub struct TransformHandler<S = Unconfigured, B = Unconfigured> {
    string: Arc<S>,
    bytes: Arc<B>,
}

impl TransformHandler {
    /// A handler with neither callback configured.
    #[inline]
    pub fn new() -> Self {
        Self {
            string: Arc::new(Unconfigured),
            bytes: Arc::new(Unconfigured),
        }
    }
}

impl Default for TransformHandler {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<S, B> TransformHandler<S, B> {
    /// Use `callback` for string payloads.
    #[inline]
    pub fn with_string<S2>(self, callback: S2) -> TransformHandler<S2, B>
    where
        S2: StringTransform,
    {
        TransformHandler {
            string: Arc::new(callback),
            bytes: self.bytes,
        }
    }

    /// Use `callback` for byte payloads.
    #[inline]
    pub fn with_bytes<B2>(self, callback: B2) -> TransformHandler<S, B2>
    where
        B2: BytesTransform,
    {
        TransformHandler {
            string: self.string,
            bytes: Arc::new(callback),
        }
    }

    /// The string callback.
    #[inline]
    pub fn string_callback(&self) -> &S {
        &self.string
    }

    /// The bytes callback.
    #[inline]
    pub fn bytes_callback(&self) -> &B {
        &self.bytes
    }
}

impl<S, B> TransformHandler<S, B>
where
    S: StringTransform,
    B: BytesTransform,
{
    /// Run the callback matching the payload's variant on a fresh task.
    async fn dispatch(&self, content: Content, context: CallContext) -> Result<Content, Status> {
        let result = match content {
            Content::StringContent(payload) => {
                let callback = Arc::clone(&self.string);
                let task = async move {
                    callback
                        .transform(payload, &context)
                        .await
                        .map(Content::StringContent)
                };
                tokio::spawn(task.instrument(info_span!("string_transform")))
                    .await
                    .map_err(into_tonic_status)?
            }
            Content::BytesContent(payload) => {
                let callback = Arc::clone(&self.bytes);
                let task = async move {
                    callback
                        .transform(payload, &context)
                        .await
                        .map(Content::BytesContent)
                };
                tokio::spawn(task.instrument(info_span!("bytes_transform")))
                    .await
                    .map_err(into_tonic_status)?
            }
        };
        result.map_err(callback_fault_to_status)
    }
}

#[tonic::async_trait]
impl<S, B> TransformRpc for TransformHandler<S, B>
where
    S: StringTransform,
    B: BytesTransform,
{
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    async fn transform(&self, request: Request<TransformPayload>) -> RpcResponse<TransformResponse> {
        let context = CallContext::from_request(&request);
        let Some(content) = request.into_inner().content else {
            debug!("rejecting empty payload");
            return Err(Status::invalid_argument(
                "payload must carry either string_content or bytes_content",
            ));
        };

        let content = self.dispatch(content, context).await?;
        Ok(Response::new(TransformResponse {
            result: Some(TransformPayload {
                content: Some(content),
            }),
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::callback::{Counter, Echo};
    use crate::error::CallbackError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tonic::Code;

    fn string(s: &str) -> Request<TransformPayload> {
        Request::new(TransformPayload {
            content: Some(Content::StringContent(s.to_owned())),
        })
    }

    fn bytes(b: &[u8]) -> Request<TransformPayload> {
        Request::new(TransformPayload {
            content: Some(Content::BytesContent(b.to_vec())),
        })
    }

    fn content(response: Response<TransformResponse>) -> Option<Content> {
        response.into_inner().result?.content
    }

    /// Counts its invocations and uppercases.
    #[derive(Debug, Default)]
    struct Tally(AtomicUsize);

    impl StringTransform for Tally {
        async fn transform(
            &self,
            payload: String,
            _context: &CallContext,
        ) -> Result<String, CallbackError> {
            let _previous = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(payload.to_uppercase())
        }
    }

    struct Panics;

    impl BytesTransform for Panics {
        async fn transform(
            &self,
            _payload: Vec<u8>,
            _context: &CallContext,
        ) -> Result<Vec<u8>, CallbackError> {
            panic!("callback blew up")
        }
    }

    struct Fails(CallbackError);

    impl StringTransform for Fails {
        async fn transform(
            &self,
            _payload: String,
            _context: &CallContext,
        ) -> Result<String, CallbackError> {
            Err(self.0.clone())
        }
    }

    #[tokio::test]
    async fn echoes_strings() -> Result<(), Status> {
        let handler = TransformHandler::new().with_string(Echo);
        let response = handler.transform(string("hello")).await?;
        assert_eq!(
            content(response),
            Some(Content::StringContent("hello".to_owned()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn echoes_bytes() -> Result<(), Status> {
        let handler = TransformHandler::new().with_bytes(Echo);
        let response = handler.transform(bytes(&[0, 1, 2, 255])).await?;
        assert_eq!(
            content(response),
            Some(Content::BytesContent(vec![0, 1, 2, 255]))
        );
        Ok(())
    }

    #[tokio::test]
    async fn invokes_callback_once_per_call() -> Result<(), Status> {
        let handler = TransformHandler::new().with_string(Tally::default());
        for (n, input) in ["a", "bc", ""].into_iter().enumerate() {
            let response = handler.transform(string(input)).await?;
            assert_eq!(
                content(response),
                Some(Content::StringContent(input.to_uppercase()))
            );
            assert_eq!(handler.string_callback().0.load(Ordering::SeqCst), n + 1);
        }
        Ok(())
    }

    #[tokio::test]
    async fn unconfigured_kind_is_unimplemented() {
        let handler = TransformHandler::new().with_string(Tally::default());
        let status = handler.transform(bytes(b"raw")).await.err();
        assert_eq!(status.map(|s| s.code()), Some(Code::Unimplemented));
        assert_eq!(handler.string_callback().0.load(Ordering::SeqCst), 0);

        let handler = TransformHandler::new().with_bytes(Echo);
        let status = handler.transform(string("text")).await.err();
        assert_eq!(status.map(|s| s.code()), Some(Code::Unimplemented));
    }

    #[tokio::test]
    async fn empty_payload_is_invalid() {
        let handler = TransformHandler::new().with_string(Echo).with_bytes(Echo);
        let status = handler
            .transform(Request::new(TransformPayload { content: None }))
            .await
            .err();
        assert_eq!(status.map(|s| s.code()), Some(Code::InvalidArgument));
    }

    #[tokio::test]
    async fn panics_become_internal() {
        let handler = TransformHandler::new().with_bytes(Panics);
        let status = handler.transform(bytes(b"boom")).await.err();
        assert_eq!(status.map(|s| s.code()), Some(Code::Internal));
    }

    #[tokio::test]
    async fn callback_errors_become_internal() {
        for err in [
            CallbackError::Internal("db down".into()),
            CallbackError::InvalidArgument("bad".into()),
            CallbackError::NotExist { key: "k".into() },
        ] {
            let handler = TransformHandler::new().with_string(Fails(err));
            let status = handler.transform(string("x")).await.err();
            assert_eq!(status.map(|s| s.code()), Some(Code::Internal));
        }

        let handler =
            TransformHandler::new().with_string(Fails(CallbackError::NotImplemented("no".into())));
        let status = handler.transform(string("x")).await.err();
        assert_eq!(status.map(|s| s.code()), Some(Code::Unimplemented));
    }

    #[tokio::test]
    async fn counter_tags_sequential_calls() -> Result<(), Status> {
        let handler = TransformHandler::new().with_string(Counter::default());
        for (input, expected) in [("a", "1 a"), ("b", "2 b"), ("c", "3 c")] {
            let response = handler.transform(string(input)).await?;
            assert_eq!(
                content(response),
                Some(Content::StringContent(expected.to_owned()))
            );
        }
        Ok(())
    }
}
