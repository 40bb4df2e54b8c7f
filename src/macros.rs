/// Build a `Vec<sea_query::Value>` from mixed argument types, for WHERE fragments
/// with more than one placeholder type.
///
/// ```
/// use lifeguard_criteria::{values, Value};
///
/// let args = values!["alice", 30, true];
/// assert_eq!(args, vec![Value::from("alice"), Value::from(30), Value::from(true)]);
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}
