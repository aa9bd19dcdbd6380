//! Client-side routes between the three screens.

use std::fmt;
use std::str::FromStr;

/// Screen addressed by a path: `/`, `/:id` or `/:id/edit`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Catalog,
    Detail(String),
    Annotate(String),
}

impl Route {
    /// Parse a path. Unknown shapes fall back to the catalog.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path
            .trim()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [id] => Route::Detail(id.to_string()),
            [id, "edit"] => Route::Annotate(id.to_string()),
            _ => Route::Catalog,
        }
    }
}

impl FromStr for Route {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Route::parse(s))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Catalog => write!(f, "/"),
            Route::Detail(id) => write!(f, "/{}", id),
            Route::Annotate(id) => write!(f, "/{}/edit", id),
        }
    }
}
