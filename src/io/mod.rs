/*!
# IO utilities

Flat CSV persistence of records and documents, see [schema] for the column layout.

[LangFiles] splits documents into one file per language.
!*/
mod langfiles;
pub mod reader;
pub mod schema;
pub mod writer;

pub use langfiles::{lang_path, LangFiles};
pub use reader::{read_documents, read_records};
pub use schema::Layout;
pub use writer::{append_records, write_documents, write_records, write_table};
