//! Marshaled arguments passed to resolver methods.

use async_graphql::Value;

use crate::context::ResContext;
use crate::instance::ModelInstance;

static NULL_ARG: ArgValue = ArgValue::Null;

/// One positional argument after marshaling.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Not supplied, or not resolvable to a model.
    Null,
    /// A scalar argument, passed through unchanged.
    Scalar(Value),
    /// A model-typed argument filled from its input object.
    Model(ModelInstance),
    /// A list argument, marshaled element-wise.
    List(Vec<ArgValue>),
}

impl ArgValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Scalar(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_model(&self) -> Option<&ModelInstance> {
        match self {
            Self::Model(instance) => Some(instance),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Arguments of one resolver method call.
///
/// `args` holds one entry per declared parameter (padded with
/// [`ArgValue::Null`]); the request context comes last, as `context`.
#[derive(Debug, Clone)]
pub struct CallArgs {
    pub args: Vec<ArgValue>,
    pub context: ResContext,
}

impl CallArgs {
    /// Positional argument `index`; out-of-range reads as null.
    #[must_use]
    pub fn get(&self, index: usize) -> &ArgValue {
        self.args.get(index).unwrap_or(&NULL_ARG)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_reads_null() {
        let call = CallArgs {
            args: vec![ArgValue::Scalar(Value::from("x"))],
            context: ResContext::default(),
        };
        assert_eq!(call.get(0).as_str(), Some("x"));
        assert!(call.get(3).is_null());
    }

    #[test]
    fn test_accessors() {
        let model = ArgValue::Model(ModelInstance::new("Pet").with("id", 1));
        assert_eq!(model.as_model().map(ModelInstance::class), Some("Pet"));
        assert!(model.as_scalar().is_none());

        let number = ArgValue::Scalar(Value::Number(async_graphql::Number::from_f64(2.5).unwrap()));
        assert_eq!(number.as_f64(), Some(2.5));

        let list = ArgValue::List(vec![ArgValue::Null]);
        assert_eq!(list.as_list().map(<[ArgValue]>::len), Some(1));
    }
}
