//! Transformation instructions and wire format
//!
//! The operation vocabulary is a closed set shared by the recording and
//! replay sides, so both agree at compile time instead of by convention.
//! Unrecognized operation names survive deserialization as [`Op::Unknown`],
//! letting an older client skip vocabulary a newer server added.
//!
//! Wire shape: `{ "id": <correlation id>, "calls": [[op, [args...],
//! [nested_groups...]], ...] }`, where each nested group is itself a list of
//! calls of the same shape.

use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use weft_presenter::DataObject;

/// One recordable view operation with typed arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Bind one object into the current view
    Bind(DataObject),
    /// Present a collection against the current site
    Present(Vec<DataObject>),
    /// Switch the current view to another version
    Use(String),
    /// Append markup as last children
    Append(String),
    /// Prepend markup as first children
    Prepend(String),
    /// Remove the current view
    Remove,
    /// Set one attribute part
    Attr {
        /// Part name (`class`, `style`, a boolean, or a plain attribute)
        name: String,
        /// Part value
        value: String,
    },
    /// Narrow to a nested scope by name
    Scope(String),
    /// Narrow to a prop by name
    Prop(String),
    /// Run nested instructions once per object, in order
    Repeat(Vec<DataObject>),
    /// Vocabulary this side does not know; skipped at replay
    Unknown {
        /// Operation name as received
        name: String,
        /// Raw arguments as received
        args: Vec<serde_json::Value>,
    },
}

impl Op {
    /// Wire name of this operation
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Bind(_) => "bind",
            Self::Present(_) => "present",
            Self::Use(_) => "use",
            Self::Append(_) => "append",
            Self::Prepend(_) => "prepend",
            Self::Remove => "remove",
            Self::Attr { .. } => "attr",
            Self::Scope(_) => "scope",
            Self::Prop(_) => "prop",
            Self::Repeat(_) => "repeat",
            Self::Unknown { name, .. } => name,
        }
    }

    /// Wire argument list of this operation
    #[must_use]
    pub fn args(&self) -> Vec<serde_json::Value> {
        fn json<T: Serialize>(value: &T) -> serde_json::Value {
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
        }
        match self {
            Self::Bind(object) => vec![json(object)],
            Self::Present(objects) | Self::Repeat(objects) => vec![json(objects)],
            Self::Use(name) | Self::Append(name) | Self::Prepend(name) | Self::Scope(name)
            | Self::Prop(name) => {
                vec![serde_json::Value::String(name.clone())]
            }
            Self::Remove => Vec::new(),
            Self::Attr { name, value } => vec![
                serde_json::Value::String(name.clone()),
                serde_json::Value::String(value.clone()),
            ],
            Self::Unknown { args, .. } => args.clone(),
        }
    }

    /// Decode a wire operation, degrading to [`Op::Unknown`] on bad shapes
    #[must_use]
    pub fn from_wire(name: &str, args: Vec<serde_json::Value>) -> Self {
        fn one<T: for<'de> Deserialize<'de>>(args: &[serde_json::Value]) -> Option<T> {
            serde_json::from_value(args.first()?.clone()).ok()
        }
        let decoded = match name {
            "bind" => one(&args).map(Self::Bind),
            "present" => one(&args).map(Self::Present),
            "use" => one(&args).map(Self::Use),
            "append" => one(&args).map(Self::Append),
            "prepend" => one(&args).map(Self::Prepend),
            "remove" => Some(Self::Remove),
            "attr" => match (one::<String>(&args), args.get(1)) {
                (Some(attr), Some(serde_json::Value::String(value))) => Some(Self::Attr {
                    name: attr,
                    value: value.clone(),
                }),
                _ => None,
            },
            "scope" => one(&args).map(Self::Scope),
            "prop" => one(&args).map(Self::Prop),
            "repeat" => one(&args).map(Self::Repeat),
            _ => None,
        };
        decoded.unwrap_or_else(|| Self::Unknown {
            name: name.to_string(),
            args,
        })
    }
}

/// One call record: an operation plus its nested instruction groups
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// The operation
    pub op: Op,
    /// One nested group per iterated data element, recorded in data order
    pub nested: Vec<Vec<Call>>,
}

impl Call {
    /// Call with no nested groups
    #[inline]
    #[must_use]
    pub fn leaf(op: Op) -> Self {
        Self {
            op,
            nested: Vec::new(),
        }
    }
}

impl Serialize for Call {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(self.op.name())?;
        seq.serialize_element(&self.op.args())?;
        seq.serialize_element(&self.nested)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Call {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
        let mut parts = raw.into_iter();
        let name = match parts.next() {
            Some(serde_json::Value::String(name)) => name,
            _ => return Err(D::Error::custom("call operation must be a string")),
        };
        let args: Vec<serde_json::Value> = match parts.next() {
            Some(serde_json::Value::Array(args)) => args,
            None => Vec::new(),
            _ => return Err(D::Error::custom("call arguments must be an array")),
        };
        let nested: Vec<Vec<Call>> = match parts.next() {
            Some(value) => serde_json::from_value(value).map_err(D::Error::custom)?,
            None => Vec::new(),
        };
        Ok(Self {
            op: Op::from_wire(&name, args),
            nested,
        })
    }
}

/// A serialized set of recorded view operations tied to one rendered region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    /// Correlation id matching the region's `data-t` attribute
    pub id: String,
    /// Ordered call records
    pub calls: Vec<Call>,
}

impl Transformation {
    /// Encode to the JSON wire message
    ///
    /// # Errors
    /// Returns [`TransformError::Wire`](crate::error::TransformError) when
    /// serialization fails.
    pub fn encode(&self) -> Result<String, crate::error::TransformError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the JSON wire message
    ///
    /// # Errors
    /// Returns [`TransformError::Wire`](crate::error::TransformError) on
    /// malformed payloads. Unknown operation names are not an error.
    pub fn decode(payload: &str) -> Result<Self, crate::error::TransformError> {
        Ok(serde_json::from_str(payload)?)
    }
}
