mod builtin;
mod category;
mod loader;
mod schema;

pub use builtin::{builtin_dictionary, BUILTIN_PATTERN_VERSION};
pub use category::{
    Category, CategoryId, CategoryKind, PatternEntry, PatternTable, SourceKind, TableStats,
};
pub use loader::{DictionaryLoader, DictionarySource, LoadError, LoadResult};
pub use schema::{CategorySpec, DictionaryFile, TermSpec, DICTIONARY_VERSION, MAX_WEIGHT, MIN_WEIGHT};
