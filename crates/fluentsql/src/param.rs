//! Bound argument values.
//!
//! Arguments travel next to the SQL text in their string form, in the exact
//! left-to-right order of the `?` markers they belong to.

use std::fmt;

/// A value bound to a `?` placeholder, kept in its string form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Param(pub(crate) String);

impl Param {
    /// Create a new parameter from any supported scalar.
    pub fn new(value: impl Into<Param>) -> Self {
        value.into()
    }

    /// The string form passed to the executor.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the parameter and return its string form.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! param_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Param(value.to_string())
                }
            }
        )*
    };
}

param_from_display!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char, &str,
    &String,
);

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param(value)
    }
}

// SQLite has no boolean storage class.
impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param(if value { "1" } else { "0" }.to_string())
    }
}

/// Build a `Vec<Param>` from values of mixed types.
///
/// # Example
/// ```ignore
/// let args = fluentsql::params![42, "smith", true];
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Param::from($value)),+]
    };
}

/// An ordered collection of parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based index.
    pub fn push(&mut self, value: impl Into<Param>) -> usize {
        self.params.push(value.into());
        self.params.len()
    }

    /// Add a pre-wrapped Param and return its 1-based index.
    pub fn push_param(&mut self, param: Param) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over the parameters in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.params.iter()
    }

    /// Borrow the parameters as a slice.
    pub fn as_slice(&self) -> &[Param] {
        &self.params
    }

    /// Extend this list with another list's parameters.
    pub fn extend(&mut self, other: &ParamList) {
        self.params.extend(other.params.iter().cloned());
    }

    /// Extend this list with parameters from an iterator.
    pub fn extend_params(&mut self, params: impl IntoIterator<Item = Param>) {
        self.params.extend(params);
    }

    /// Convert into the string arguments handed to an executor.
    pub fn into_strings(self) -> Vec<String> {
        self.params.into_iter().map(Param::into_string).collect()
    }
}

impl IntoIterator for ParamList {
    type Item = Param;
    type IntoIter = std::vec::IntoIter<Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.into_iter()
    }
}
