//! Actions and typed action creators
//!
//! An [`Action`] is an immutable event record: a discriminator (`kind`, the
//! action "type"), an optional payload and a passthrough set of extra fields
//! for actions that arrive from foreign dispatch sources as JSON.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::StoreError;

/// Discriminator of the action used to seed state at store construction
pub const INIT_ACTION_TYPE: &str = "@@store/INIT";

/// Anything that can travel as an action payload
///
/// Implemented for every `'static` type with a `Debug` representation, so that
/// dispatched actions can always be logged.
pub trait Payload: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Immutable event record driving a state transition
#[derive(Clone)]
pub struct Action {
    kind: Rc<str>,
    payload: Option<Rc<dyn Payload>>,
    meta: Map<String, Value>,
}

impl Action {
    /// Action without payload
    pub fn new(kind: impl Into<Rc<str>>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
            meta: Map::new(),
        }
    }

    /// Action carrying `payload`
    pub fn with_payload<P: Payload>(kind: impl Into<Rc<str>>, payload: P) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(Rc::new(payload)),
            meta: Map::new(),
        }
    }

    /// The action used for the reducer's seeding call
    pub fn init() -> Self {
        Self::new(INIT_ACTION_TYPE)
    }

    /// Build an action from a JSON object of the shape
    /// `{ "type": "...", "payload": ..., ...extra }`.
    ///
    /// The payload is kept as a [`serde_json::Value`]; all other fields end up
    /// in [`Action::meta`]. A `case_with::<P>` slice case only sees payloads of
    /// type `P`, so cases meant to accept these actions are registered with
    /// [`SliceBuilder::case_with_json`](crate::SliceBuilder::case_with_json)
    /// (or take `Value` directly).
    pub fn from_json(value: Value) -> Result<Self, StoreError> {
        let Value::Object(mut fields) = value else {
            return Err(StoreError::InvalidAction(
                "action must be a JSON object".to_string(),
            ));
        };

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => {
                return Err(StoreError::InvalidAction(format!(
                    "action type must be a primitive, got {}",
                    other
                )))
            }
            None => {
                return Err(StoreError::InvalidAction(
                    "action is missing its `type` field".to_string(),
                ))
            }
        };

        let mut action = match fields.remove("payload") {
            Some(payload) => Action::with_payload(kind, payload),
            None => Action::new(kind),
        };
        action.meta = fields;
        Ok(action)
    }

    /// The discriminator
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Payload narrowed to `P`, if present and of that type
    pub fn payload<P: Any>(&self) -> Option<&P> {
        self.payload
            .as_deref()
            .and_then(|payload| payload.as_any().downcast_ref::<P>())
    }

    /// Extra fields carried along for interop
    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Action");
        out.field("type", &self.kind);
        match &self.payload {
            Some(payload) => out.field("payload", payload),
            None => out.field("payload", &format_args!("undefined")),
        };
        if !self.meta.is_empty() {
            out.field("meta", &self.meta);
        }
        out.finish()
    }
}

/// Typed constructor for actions of one discriminator
///
/// `P` is the payload type; creators for payload-less actions use `()`.
pub struct ActionCreator<P = ()> {
    kind: Rc<str>,
    _payload: PhantomData<fn(P)>,
}

impl<P> ActionCreator<P> {
    pub(crate) fn new(kind: Rc<str>) -> Self {
        Self {
            kind,
            _payload: PhantomData,
        }
    }

    /// The discriminator every action from this creator carries
    pub fn action_type(&self) -> &str {
        &self.kind
    }

    /// Whether `action` was produced by this creator (discriminator match)
    pub fn matches(&self, action: &Action) -> bool {
        *self.kind == *action.kind
    }
}

impl<P: Payload> ActionCreator<P> {
    /// Create an action carrying `payload`
    pub fn with(&self, payload: P) -> Action {
        Action {
            kind: self.kind.clone(),
            payload: Some(Rc::new(payload)),
            meta: Map::new(),
        }
    }

    /// Narrow the payload of `action` to `P`
    ///
    /// Returns `None` unless the discriminator matches and the payload has the
    /// expected type.
    pub fn payload_of<'a>(&self, action: &'a Action) -> Option<&'a P> {
        if !self.matches(action) {
            return None;
        }
        action.payload::<P>()
    }

    pub(crate) fn payload_type() -> TypeId {
        TypeId::of::<P>()
    }
}

impl ActionCreator<()> {
    /// Create a payload-less action
    pub fn create(&self) -> Action {
        Action {
            kind: self.kind.clone(),
            payload: None,
            meta: Map::new(),
        }
    }
}

impl<P> Clone for ActionCreator<P> {
    fn clone(&self) -> Self {
        Self::new(self.kind.clone())
    }
}

impl<P> fmt::Debug for ActionCreator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator")
            .field("type", &self.kind)
            .field("payload", &std::any::type_name::<P>())
            .finish()
    }
}
