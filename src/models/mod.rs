//! Data types exchanged with the page backend.

mod locale;
mod page;
mod tag;

pub use locale::{LocaleEntry, LocaleError, LocaleTable, LocaleValues};
pub use page::{NewPage, Page};
pub use tag::Tag;
