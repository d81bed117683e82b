//! Domain identifier types with normalization
//!
//! Source files spell the same code in several ways (`NOC_12345`, `1234`,
//! `"21232.0"` from a spreadsheet cell). These newtypes hold the canonical
//! form that every store key is built from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of a classification unit-group code
pub const CLASSIFICATION_CODE_WIDTH: usize = 5;

const CODE_PREFIXES: [&str; 3] = ["NOC_", "NOC-", "NOC "];

/// Classification unit-group code newtype wrapper
///
/// Always exactly [`CLASSIFICATION_CODE_WIDTH`] ASCII digits.
///
/// # Examples
///
/// ```
/// use noc_seeder::domain::ids::ClassificationCode;
///
/// let code = ClassificationCode::normalize("NOC_1234").unwrap();
/// assert_eq!(code.as_str(), "01234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassificationCode(String);

impl ClassificationCode {
    /// Normalizes a raw code into its canonical form
    ///
    /// Strips a known prefix, a trailing spreadsheet `.0` and surrounding
    /// whitespace, then left-pads with zeros.
    ///
    /// # Errors
    ///
    /// Returns an error if the remaining text is empty, contains anything
    /// other than digits, or is wider than a code.
    pub fn normalize(raw: &str) -> Result<Self, String> {
        let mut code = raw.trim();
        for prefix in CODE_PREFIXES {
            if let Some(head) = code.get(..prefix.len()) {
                if head.eq_ignore_ascii_case(prefix) {
                    code = code[prefix.len()..].trim();
                    break;
                }
            }
        }
        let code = strip_numeric_suffix(code);

        if code.is_empty() {
            return Err(format!("Classification code is empty (raw: '{raw}')"));
        }
        if !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Classification code '{raw}' is not numeric"));
        }
        if code.len() > CLASSIFICATION_CODE_WIDTH {
            return Err(format!(
                "Classification code '{raw}' is longer than {CLASSIFICATION_CODE_WIDTH} digits"
            ));
        }

        Ok(Self(format!("{code:0>width$}", width = CLASSIFICATION_CODE_WIDTH)))
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ClassificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClassificationCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl AsRef<str> for ClassificationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Economic region code newtype wrapper
///
/// Region codes arrive as numbers or numeric-looking strings; the canonical
/// form drops a trailing `.0` and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionCode(String);

impl RegionCode {
    /// Creates a region code from raw cell text
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty after trimming.
    pub fn normalize(raw: &str) -> Result<Self, String> {
        let code = strip_numeric_suffix(raw.trim());
        if code.is_empty() {
            return Err("Economic region code cannot be empty".to_string());
        }
        Ok(Self(code.to_string()))
    }

    /// Returns the region code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RegionCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

/// Spreadsheet exports render integer cells as `3510.0`
fn strip_numeric_suffix(value: &str) -> &str {
    match value.split_once('.') {
        Some((whole, fraction))
            if !whole.is_empty()
                && whole.chars().all(|c| c.is_ascii_digit())
                && !fraction.is_empty()
                && fraction.chars().all(|c| c == '0') =>
        {
            whole
        }
        _ => value,
    }
}
