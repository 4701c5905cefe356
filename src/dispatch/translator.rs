//! Handler invocation and outcome translation.
//!
//! # Responsibilities
//! - Resolve arguments and await the bound handler with them
//! - Lend the response state to the handler's context argument, then take it back
//! - Copy a `StatusResult` (status, body, redirect) onto the response state
//! - Set a plain reply as the body verbatim
//! - Convert HTTP-aware handler errors; pass everything else through untouched

use crate::controller::Invoker;
use crate::dispatch::context::{Exchange, ResponseHandle, ResponseState};
use crate::dispatch::error::DispatchError;
use crate::dispatch::reply::{HandlerError, Reply};
use crate::dispatch::resolver::ParamResolver;

/// Resolve arguments, invoke the handler and write its outcome into the exchange.
///
/// Edits the handler makes through its context argument land on the exchange
/// before the outcome is applied, so a returned reply wins over them.
pub async fn invoke(exchange: &mut Exchange, resolver: &ParamResolver, invoker: &Invoker) -> Result<(), DispatchError> {
    let response = ResponseHandle::new(std::mem::take(&mut exchange.response));
    let outcome = match resolver.resolve(&exchange.request, &response) {
        Ok(args) => Ok(invoker(args).await),
        Err(e) => {
            tracing::debug!(handler = %resolver.handler(), error = %e, "Parameter resolution failed");
            Err(e)
        }
    };
    exchange.response = response.into_inner();
    translate(outcome?, &mut exchange.response)
}

/// Apply a handler outcome to the response state.
pub fn translate(outcome: Result<Reply, HandlerError>, response: &mut ResponseState) -> Result<(), DispatchError> {
    match outcome {
        Ok(Reply::Status(result)) => {
            response.set_status(result.status_code);
            response.set_body(result.body);
            if let Some(url) = result.redirect_url {
                response.redirect(url);
            }
            Ok(())
        }
        Ok(Reply::Plain(body)) => {
            response.set_body(body);
            Ok(())
        }
        Err(HandlerError::Http(e)) => Err(DispatchError::Handler(e)),
        Err(HandlerError::Other(e)) => Err(DispatchError::Unclassified(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
    use serde_json::{json, Value};

    use crate::controller::HandlerFuture;
    use crate::dispatch::context::RequestContext;
    use crate::dispatch::reply::{HttpError, StatusResult};
    use crate::dispatch::resolver::{Argument, Arguments, ResolveOptions};
    use crate::metadata::ParamMetadata;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct DiskError;

    fn exchange(uri: &'static str) -> Exchange {
        Exchange::new(RequestContext::new(Method::GET, Uri::from_static(uri)))
    }

    fn resolver(params: Vec<ParamMetadata>) -> ParamResolver {
        ParamResolver::new("handler", params, ResolveOptions::default()).unwrap()
    }

    #[test]
    fn test_plain_reply_keeps_default_status() {
        let mut response = ResponseState::new();
        translate(Ok(Reply::Plain(json!({"id": 1}))), &mut response).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), &json!({"id": 1}));

        let mut response = ResponseState::new();
        translate(Ok(Reply::empty()), &mut response).unwrap();
        assert_eq!(response.body(), &Value::Null);
    }

    #[test]
    fn test_status_result_with_redirect() {
        let mut response = ResponseState::new();
        let result = StatusResult::redirect(StatusCode::FOUND, "/login");
        translate(Ok(result.into()), &mut response).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.location(), Some("/login"));
    }

    #[test]
    fn test_status_result_without_redirect() {
        let mut response = ResponseState::new();
        let result = StatusResult::new(StatusCode::CREATED, json!({"id": 9}));
        translate(Ok(result.into()), &mut response).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body(), &json!({"id": 9}));
        assert!(response.location().is_none());
    }

    #[test]
    fn test_http_error_is_classified() {
        let mut response = ResponseState::new();
        let err = translate(Err(HttpError::forbidden("forbidden").into()), &mut response).unwrap_err();
        assert!(matches!(&err, DispatchError::Handler(e) if e.status() == StatusCode::FORBIDDEN));
        assert_eq!(err.to_string(), "forbidden");
    }

    #[test]
    fn test_other_error_propagates_unchanged() {
        let mut response = ResponseState::new();
        let err = translate(Err(HandlerError::other(DiskError)), &mut response).unwrap_err();
        match err {
            DispatchError::Unclassified(inner) => assert!(inner.downcast_ref::<DiskError>().is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoke_passes_args_in_order() {
        let invoker: Invoker = Arc::new(|args: Arguments| -> HandlerFuture {
            Box::pin(async move {
                let values: Vec<Value> = args
                    .iter()
                    .map(|a| match a {
                        Argument::Value(v) => v.clone(),
                        _ => Value::Null,
                    })
                    .collect();
                Ok(Reply::Plain(Value::Array(values)))
            })
        });
        let mut ex = exchange("/?a=1&c=x");
        let r = resolver(vec![
            ParamMetadata::query("a"),
            ParamMetadata::query("b"),
            ParamMetadata::query("c"),
        ]);
        invoke(&mut ex, &r, &invoker).await.unwrap();
        assert_eq!(ex.response.body(), &json!(["1", null, "x"]));
    }

    #[tokio::test]
    async fn test_context_edits_survive_and_reply_body_wins() {
        let invoker: Invoker = Arc::new(|args: Arguments| -> HandlerFuture {
            Box::pin(async move {
                let ctx = args.context(0)?;
                ctx.set_status(StatusCode::ACCEPTED);
                ctx.set_header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
                ctx.set_body(json!("from context"));
                Ok::<_, HandlerError>(Reply::Plain(json!("from reply")))
            })
        });
        let mut ex = exchange("/");
        ex.response
            .headers_mut()
            .insert("x-before", HeaderValue::from_static("kept"));

        invoke(&mut ex, &resolver(vec![ParamMetadata::context()]), &invoker)
            .await
            .unwrap();

        assert_eq!(ex.response.status(), StatusCode::ACCEPTED);
        assert_eq!(ex.response.body(), &json!("from reply"));
        assert_eq!(ex.response.headers_mut()[header::CACHE_CONTROL], "no-store");
        assert_eq!(ex.response.headers_mut()["x-before"], "kept");
    }

    #[tokio::test]
    async fn test_context_edits_kept_when_handler_fails() {
        let invoker: Invoker = Arc::new(|args: Arguments| -> HandlerFuture {
            Box::pin(async move {
                args.context(0)?
                    .set_header(header::RETRY_AFTER, HeaderValue::from_static("30"));
                Err::<Reply, HandlerError>(HttpError::new(StatusCode::SERVICE_UNAVAILABLE, "busy").into())
            })
        });
        let mut ex = exchange("/");

        let err = invoke(&mut ex, &resolver(vec![ParamMetadata::context()]), &invoker)
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ex.response.headers_mut()[header::RETRY_AFTER], "30");
    }
}
