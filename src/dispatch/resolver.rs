//! Parameter resolution.
//!
//! Turns a handler's ordered parameter metadata into the ordered argument
//! list for one request. Resolution is synchronous and never mutates the
//! request; the first failing parameter aborts the whole list. Context
//! parameters receive a [`HandlerContext`] sharing the route's response.

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dispatch::context::{HandlerContext, RequestContext, ResponseHandle};
use crate::dispatch::error::{ClientError, DispatchError};
use crate::dispatch::reply::HttpError;
use crate::metadata::{ConfigurationError, ParamMetadata, ParamSource, SchemaType};

/// Knobs that shape resolution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Status for a structured parameter whose text is not valid JSON.
    pub malformed_argument_status: StatusCode,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            malformed_argument_status: StatusCode::UNAUTHORIZED,
        }
    }
}

/// One resolved argument.
#[derive(Debug, Clone)]
pub enum Argument {
    /// Optional parameter with no (or a falsy) raw value.
    Absent,
    Value(Value),
    Context(HandlerContext),
}

/// Resolved arguments in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments(Vec<Argument>);

impl Arguments {
    pub fn new(args: Vec<Argument>) -> Self {
        Self(args)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.0.iter()
    }

    pub fn argument(&self, index: usize) -> Option<&Argument> {
        self.0.get(index)
    }

    /// Raw value at `index`; `None` when absent or a context.
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.0.get(index) {
            Some(Argument::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Deserialize the argument at `index`, failing when it is absent.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, HttpError> {
        self.optional(index)?
            .ok_or_else(|| HttpError::bad_request(format!("argument {} is missing", index)))
    }

    /// Deserialize the argument at `index`, `None` when it is absent.
    pub fn optional<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, HttpError> {
        match self.0.get(index) {
            None | Some(Argument::Absent) => Ok(None),
            Some(Argument::Value(v)) => serde_json::from_value::<T>(v.clone())
                .map(Some)
                .map_err(|e| HttpError::bad_request(format!("invalid argument {}: {}", index, e))),
            Some(Argument::Context(_)) => Err(HttpError::internal(format!(
                "argument {} is the request context",
                index
            ))),
        }
    }

    pub fn context(&self, index: usize) -> Result<&HandlerContext, HttpError> {
        match self.0.get(index) {
            Some(Argument::Context(ctx)) => Ok(ctx),
            _ => Err(HttpError::internal(format!(
                "argument {} is not the request context",
                index
            ))),
        }
    }
}

impl IntoIterator for Arguments {
    type Item = Argument;
    type IntoIter = std::vec::IntoIter<Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Resolver bound to one handler's parameter list.
#[derive(Debug, Clone)]
pub struct ParamResolver {
    handler: String,
    params: Vec<ParamMetadata>,
    options: ResolveOptions,
}

impl ParamResolver {
    /// Fails when an object-typed parameter has no validator.
    pub fn new(
        handler: impl Into<String>,
        params: Vec<ParamMetadata>,
        options: ResolveOptions,
    ) -> Result<Self, ConfigurationError> {
        let handler = handler.into();
        if let Some(param) = params.iter().find(|p| {
            p.source != ParamSource::Context && p.schema == SchemaType::Object && p.validator.is_none()
        }) {
            return Err(ConfigurationError::MissingValidator {
                handler,
                param: param.name.clone(),
            });
        }
        Ok(Self {
            handler,
            params,
            options,
        })
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn params(&self) -> &[ParamMetadata] {
        &self.params
    }

    /// One argument per parameter, same order. Context parameters write to `response`.
    pub fn resolve(&self, ctx: &RequestContext, response: &ResponseHandle) -> Result<Arguments, DispatchError> {
        self.params
            .iter()
            .map(|param| self.resolve_one(ctx, response, param))
            .collect::<Result<Vec<_>, _>>()
            .map(Arguments)
    }

    fn resolve_one(
        &self,
        ctx: &RequestContext,
        response: &ResponseHandle,
        param: &ParamMetadata,
    ) -> Result<Argument, DispatchError> {
        let name = param.name.as_str();
        let raw = match param.source {
            ParamSource::Query => ctx.query_param(name).cloned(),
            ParamSource::Path => ctx.path_param(name).map(|v| Value::String(v.to_string())),
            ParamSource::Body => ctx.body_field(name).cloned(),
            ParamSource::Header => ctx.header(name).map(|v| Value::String(v.to_string())),
            ParamSource::Context => {
                return Ok(Argument::Context(HandlerContext::new(ctx.clone(), response.clone())));
            }
        };

        let raw = match raw {
            Some(v) if !is_falsy(&v) => v,
            _ if param.required => {
                return Err(ClientError::new(StatusCode::BAD_REQUEST, format!("{} is required", name)).into());
            }
            _ => return Ok(Argument::Absent),
        };

        let value = match raw {
            Value::String(text) if param.schema.is_structured() => {
                serde_json::from_str(&text).map_err(|e| {
                    ClientError::new(
                        self.options.malformed_argument_status,
                        format!("invalid argument \"{}\": {}", name, e),
                    )
                })?
            }
            other => other,
        };

        if param.schema != SchemaType::Object {
            return Ok(Argument::Value(value));
        }
        let Some(validator) = &param.validator else {
            return Err(ConfigurationError::MissingValidator {
                handler: self.handler.clone(),
                param: name.to_string(),
            }
            .into());
        };
        validator
            .validate(value)
            .map(Argument::Value)
            .map_err(|message| ClientError::new(StatusCode::BAD_REQUEST, message).into())
    }
}

/// Null, `false`, zero and the empty string count as missing.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
