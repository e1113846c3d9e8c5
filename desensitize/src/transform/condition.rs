use crate::value::Value;

/// Decides whether a marked value requires desensitizing.
pub trait Condition: Send + Sync {
    fn test(&self, value: &Value) -> bool;
}

impl<F> Condition for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn test(&self, value: &Value) -> bool {
        self(value)
    }
}

/// Passes every value. Registered as `always`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

impl Condition for Always {
    fn test(&self, _value: &Value) -> bool {
        true
    }
}

/// Passes values that are present and non-empty. Registered as `non_empty`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonEmpty;

impl Condition for NonEmpty {
    fn test(&self, value: &Value) -> bool {
        value.is_present()
    }
}

#[cfg(test)]
mod tests {
    use super::{Condition, NonEmpty};
    use crate::value::Value;

    #[test]
    fn non_empty_rejects_null_and_empty() {
        assert!(!NonEmpty.test(&Value::Null));
        assert!(!NonEmpty.test(&Value::from("")));
        assert!(NonEmpty.test(&Value::from("123456")));
        assert!(NonEmpty.test(&Value::Int(0)));
    }

    #[test]
    fn closures_are_conditions() {
        let long = |value: &Value| value.as_str().is_some_and(|s| s.len() > 3);
        assert!(long.test(&Value::from("abcd")));
        assert!(!long.test(&Value::from("abc")));
    }
}
