#![allow(dead_code)]

use etl_grpc::proto::transform::transform_payload::Content;
use etl_grpc::proto::transform::{TransformPayload, TransformResponse};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A directory under the system temp dir, unique to this test, removed on drop.
#[derive(Debug)]
pub(crate) struct TempRoot(PathBuf);

impl TempRoot {
    pub(crate) fn new(name: &str) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(std::env::temp_dir().join(format!(
            "etl-grpc-{name}-{}-{n}",
            std::process::id()
        )))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _result = std::fs::remove_dir_all(&self.0);
    }
}

pub(crate) fn string(s: &str) -> TransformPayload {
    TransformPayload {
        content: Some(Content::StringContent(s.to_owned())),
    }
}

pub(crate) fn bytes(b: &[u8]) -> TransformPayload {
    TransformPayload {
        content: Some(Content::BytesContent(b.to_vec())),
    }
}

pub(crate) fn content(response: tonic::Response<TransformResponse>) -> Option<Content> {
    response.into_inner().result?.content
}
