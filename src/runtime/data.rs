use super::errors::Failure;
use serde::Serialize;

/// Result of applying a matcher at some offset
pub type Outcome<T> = Result<Success<T>, Failure>;

/// Successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success<T> {
    /// Produced value
    pub value: T,

    /// Offset right after the matched input
    pub end: usize,
}

impl<T> Success<T> {
    /// Create a new success
    pub fn new(value: T, end: usize) -> Self {
        Self { value, end }
    }

    /// Transform the success' value, keeping its end offset
    pub fn map<U>(self, func: impl FnOnce(T) -> U) -> Success<U> {
        Success {
            value: func(self.value),
            end: self.end,
        }
    }
}

impl<'a> Success<&'a str> {
    /// Detach a matched slice from the subject
    pub fn into_owned(self) -> Success<String> {
        self.map(str::to_owned)
    }
}

/// Byte range in a source text, `start` inclusive and `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Get the span's length
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Value produced by interpreted matchers and mappers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Optional pattern that did not match
    Absent,

    /// Matched text
    Str(String),

    /// Offset (produced by the `start`, `end`, `$startN` and `$endN` mapper keywords)
    Int(usize),

    /// Repetition results, and `[..]` lists built by mappers
    List(Vec<Value>),

    /// Captures of an alternative or projection of a group
    Tuple(Vec<Value>),

    /// Node built by a mapper call (`kind(children...)`)
    Node {
        kind: String,
        span: Span,
        children: Vec<Value>,
    },
}

impl Value {
    /// Build a value out of a list of captures
    ///
    /// A single capture is returned as-is, several ones as a tuple.
    pub fn tuple(mut values: Vec<Value>) -> Self {
        if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Tuple(values)
        }
    }

    /// Flatten the value to the text it is made of
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Value::Absent => {}
            Value::Str(string) => out.push_str(string),
            Value::Int(int) => out.push_str(&int.to_string()),
            Value::List(values) | Value::Tuple(values) => {
                for value in values {
                    value.push_text(out);
                }
            }
            Value::Node { children, .. } => {
                for child in children {
                    child.push_text(out);
                }
            }
        }
    }

    /// Get the value as a string slice, if it is a plain string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(string) => Some(string),
            _ => None,
        }
    }

    /// Check if the value is an absent optional
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// Get the elements of a list, tuple or node
    pub fn items(&self) -> &[Value] {
        match self {
            Value::List(values) | Value::Tuple(values) => values,
            Value::Node { children, .. } => children,
            Value::Absent | Value::Str(_) | Value::Int(_) => &[],
        }
    }

    /// Get the kind of a node
    pub fn kind(&self) -> Option<&str> {
        match self {
            Value::Node { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Concatenate two values (the mappers' `+` operator)
    ///
    /// Two lists are joined into a list, anything else is joined as text.
    pub fn concat(self, other: Value) -> Value {
        match (self, other) {
            (Value::List(mut left), Value::List(right)) => {
                left.extend(right);
                Value::List(left)
            }
            (left, right) => Value::Str(left.text() + &right.text()),
        }
    }
}

impl From<&str> for Value {
    fn from(string: &str) -> Self {
        Value::Str(string.to_owned())
    }
}

impl From<String> for Value {
    fn from(string: String) -> Self {
        Value::Str(string)
    }
}

impl From<usize> for Value {
    fn from(int: usize) -> Self {
        Value::Int(int)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Tuple(vec![])
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Absent)
    }
}

macro_rules! impl_tuple_into_value {
    ($($ty: ident $var: ident),+) => {
        impl<$($ty: Into<Value>),+> From<($($ty,)+)> for Value {
            fn from(($($var,)+): ($($ty,)+)) -> Self {
                Value::Tuple(vec![$($var.into()),+])
            }
        }
    };
}

impl_tuple_into_value!(A a, B b);
impl_tuple_into_value!(A a, B b, C c);
impl_tuple_into_value!(A a, B b, C c, D d);
impl_tuple_into_value!(A a, B b, C c, D d, E e);
impl_tuple_into_value!(A a, B b, C c, D d, E e, F f);
impl_tuple_into_value!(A a, B b, C c, D d, E e, F f, G g);
impl_tuple_into_value!(A a, B b, C c, D d, E e, F f, G g, H h);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_capture_is_not_wrapped() {
        assert_eq!(Value::tuple(vec!["a".into()]), Value::from("a"));
        assert_eq!(
            Value::tuple(vec!["a".into(), "b".into()]),
            Value::Tuple(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn text_flattens_everything() {
        let value = Value::Tuple(vec![
            "a".into(),
            Value::List(vec!["b".into(), Value::Absent, "c".into()]),
            Value::Node {
                kind: "n".into(),
                span: Span::new(0, 1),
                children: vec!["d".into()],
            },
        ]);

        assert_eq!(value.text(), "abcd");
    }

    #[test]
    fn concat_joins_lists_or_text() {
        let lists = Value::List(vec!["a".into()]).concat(Value::List(vec!["b".into()]));
        assert_eq!(lists, Value::List(vec!["a".into(), "b".into()]));

        let text = Value::from("a").concat(Value::List(vec!["b".into(), "c".into()]));
        assert_eq!(text, Value::from("abc"));
    }

    #[test]
    fn converts_from_host_values() {
        assert_eq!(Value::from(None::<String>), Value::Absent);
        assert_eq!(
            Value::from(("a", vec!["b", "c"])),
            Value::Tuple(vec![
                "a".into(),
                Value::List(vec!["b".into(), "c".into()])
            ])
        );
    }

    #[test]
    fn serializes_untagged() {
        let value = Value::Tuple(vec!["a".into(), Value::Absent, Value::Int(3)]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"["a",null,3]"#);
    }
}
