//! Purpose: Validated bus object paths shared by every binding of a composed object.
//! Exports: `ObjectPath`.
//! Role: Reject malformed addresses before anything touches the connection.
//! Invariants: Paths start with `/`; `/` alone is the root; no empty or trailing elements.
//! Invariants: Elements contain only ASCII letters, digits, and `_`.

use std::fmt;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct ObjectPath(String);

impl ObjectPath {
    pub fn parse(path: impl Into<String>) -> Result<Self, Error> {
        let path = path.into();
        validate(&path).map_err(|reason| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid object path: {reason}"))
                .with_hint("Object paths look like `/org/example/Thing`.")
                .with_path(path.clone())
        })?;
        Ok(Self(path))
    }

    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Appends one element, e.g. `/org/example` + `item0`.
    pub fn join(&self, element: &str) -> Result<Self, Error> {
        if self.is_root() {
            Self::parse(format!("/{element}"))
        } else {
            Self::parse(format!("{}/{element}", self.0))
        }
    }
}

fn validate(path: &str) -> Result<(), &'static str> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err("must start with '/'");
    };
    if rest.is_empty() {
        return Ok(());
    }
    for element in rest.split('/') {
        if element.is_empty() {
            return Err("empty path element");
        }
        if !element
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
        {
            return Err("elements may only contain [A-Za-z0-9_]");
        }
    }
    Ok(())
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ObjectPath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
