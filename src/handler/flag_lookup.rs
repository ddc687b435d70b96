//! Flag lookup handler
//!
//! Turns a `code` parameter into flag text or the uniform 404. Causes stay
//! typed up to [`FlagLookupHandler::respond`], where every failure collapses
//! into the same response. Nothing here logs.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::config::Config;
use crate::flags::{CodeError, CodeParam, FlagCode, FlagStore, LookupError};
use crate::http;

/// Why a request did not produce a flag
#[derive(Debug, thiserror::Error)]
pub enum LookupFailure {
    #[error("invalid code: {0}")]
    InvalidCode(#[from] CodeError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Resolves codes against a [`FlagStore`] and renders responses
#[derive(Debug, Clone)]
pub struct FlagLookupHandler {
    store: FlagStore,
    cache_control: String,
    default_content_type: String,
}

impl FlagLookupHandler {
    pub fn new(store: FlagStore, max_age: u32, default_content_type: impl Into<String>) -> Self {
        Self {
            store,
            cache_control: format!("public, max-age={max_age}"),
            default_content_type: default_content_type.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FlagStore::new(config.flags.dir.clone()),
            config.flags.max_age,
            config.http.default_content_type.clone(),
        )
    }

    pub const fn store(&self) -> &FlagStore {
        &self.store
    }

    /// Validate the parameter, then read the flag.
    ///
    /// Validation always completes before a path is built.
    pub async fn resolve(&self, param: CodeParam) -> Result<String, LookupFailure> {
        let code = FlagCode::parse(param)?;
        Ok(self.store.lookup(&code).await?)
    }

    /// Render a lookup outcome; all failures become 404 with `❔`
    pub fn respond(
        &self,
        outcome: Result<String, LookupFailure>,
        is_head: bool,
    ) -> Response<Full<Bytes>> {
        match outcome {
            Ok(flag) => http::build_flag_response(flag, &self.cache_control, is_head),
            Err(_) => self.not_found(is_head),
        }
    }

    pub fn not_found(&self, is_head: bool) -> Response<Full<Bytes>> {
        http::build_not_found_response(&self.default_content_type, is_head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn handler_with(files: &[(&str, &str)]) -> (TempDir, FlagLookupHandler) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let store = FlagStore::new(Some(dir.path().to_path_buf()));
        (dir, FlagLookupHandler::new(store, 86_400, "text/html; charset=utf-8"))
    }

    fn one(raw: &str) -> CodeParam {
        CodeParam::One(raw.to_string())
    }

    async fn handle(handler: &FlagLookupHandler, param: CodeParam) -> Response<Full<Bytes>> {
        let outcome = handler.resolve(param).await;
        handler.respond(outcome, false)
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_found() {
        let (_dir, handler) = handler_with(&[("FR", "🇫🇷\n")]);
        let resp = handle(&handler, one("fr")).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(resp.headers()["cache-control"], "public, max-age=86400");
        assert_eq!(body_string(resp).await, "🇫🇷");
    }

    #[tokio::test]
    async fn test_resolve_keeps_cause() {
        let (_dir, handler) = handler_with(&[]);
        assert!(matches!(
            handler.resolve(CodeParam::Absent).await,
            Err(LookupFailure::InvalidCode(CodeError::Missing))
        ));
        assert!(matches!(
            handler.resolve(CodeParam::Many(2)).await,
            Err(LookupFailure::InvalidCode(CodeError::MultipleValues(2)))
        ));
        assert!(matches!(
            handler.resolve(one("usa")).await,
            Err(LookupFailure::InvalidCode(CodeError::Length(3)))
        ));
        assert!(matches!(
            handler.resolve(one("zz")).await,
            Err(LookupFailure::Lookup(LookupError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_every_failure_looks_the_same() {
        let (_dir, handler) = handler_with(&[]);
        let params = [
            CodeParam::Absent,
            CodeParam::Many(3),
            CodeParam::Malformed,
            one(""),
            one("u"),
            one("usa"),
            one(".."),
            one("zz"),
        ];
        for param in params {
            let resp = handle(&handler, param.clone()).await;
            assert_eq!(resp.status(), 404, "{param:?}");
            assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
            assert!(resp.headers().get("cache-control").is_none());
            assert_eq!(body_string(resp).await, "❔", "{param:?}");
        }
    }

    #[tokio::test]
    async fn test_custom_max_age() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("NL"), "🇳🇱").unwrap();
        let handler = FlagLookupHandler::new(
            FlagStore::new(Some(dir.path().to_path_buf())),
            60,
            "text/plain",
        );
        let resp = handle(&handler, one("nl")).await;
        assert_eq!(resp.headers()["cache-control"], "public, max-age=60");
    }
}
