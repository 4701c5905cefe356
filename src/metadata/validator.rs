//! Structured validators attached to object-typed parameters.
//!
//! The engine only invokes a validator and interprets success or failure;
//! compiling schemas is left to `jsonschema` or to serde types.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Checks a raw structured value and returns its normalized form.
pub trait Validator: Send + Sync + 'static {
    /// `Err` carries a message suitable for a 400 response.
    fn validate(&self, value: Value) -> Result<Value, String>;
}

impl<F> Validator for F
where
    F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
{
    fn validate(&self, value: Value) -> Result<Value, String> {
        self(value)
    }
}

/// Validator backed by a compiled JSON Schema. Valid values pass through unchanged.
pub struct JsonSchemaValidator {
    inner: jsonschema::Validator,
}

impl JsonSchemaValidator {
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let inner = jsonschema::validator_for(schema).map_err(|e| e.to_string())?;
        Ok(Self { inner })
    }
}

impl Validator for JsonSchemaValidator {
    fn validate(&self, value: Value) -> Result<Value, String> {
        if let Err(e) = self.inner.validate(&value) {
            return Err(e.to_string());
        }
        Ok(value)
    }
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator").finish_non_exhaustive()
    }
}

/// Validator that round-trips the value through `T`.
///
/// Unknown fields are dropped and serde defaults filled in, so the output is
/// the normalized form of the input.
pub struct TypedValidator<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedValidator<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Validator for TypedValidator<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn validate(&self, value: Value) -> Result<Value, String> {
        let typed: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
        serde_json::to_value(typed).map_err(|e| e.to_string())
    }
}
