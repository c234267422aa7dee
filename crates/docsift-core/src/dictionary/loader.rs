use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::builtin::{builtin_dictionary, BUILTIN_ORIGIN, BUILTIN_PATTERN_VERSION};
use super::category::{Category, CategoryId, CategoryKind, PatternEntry, PatternTable, SourceKind};
use super::schema::{CategorySpec, DictionaryFile, TermSpec, DICTIONARY_VERSION, MAX_WEIGHT, MIN_WEIGHT};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No dictionary sources given")]
    NoSources,

    #[error("Dictionary sources contain no patterns")]
    Empty,

    #[error("No dictionary files in {}", .0.display())]
    EmptyDirectory(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed dictionary {origin}: {source}")]
    Malformed {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Unsupported dictionary version {found} in {origin} (expected {expected})")]
    UnsupportedVersion {
        origin: String,
        found: u32,
        expected: u32,
    },

    #[error("Category with empty name in {0}")]
    EmptyCategoryName(String),

    #[error("Empty term in category {0}")]
    EmptyTerm(String),

    #[error("Weight {weight} for {subject} in category {category} is outside 1.0..=4.0")]
    WeightOutOfRange {
        category: String,
        subject: String,
        weight: f64,
    },

    #[error("Category {category} redefined as {found} (previously {existing})")]
    KindConflict {
        category: String,
        existing: String,
        found: String,
    },

    #[error("Category {category} tagged {field} {found:?} (previously {existing:?})")]
    TagConflict {
        category: String,
        field: &'static str,
        existing: String,
        found: String,
    },

    #[error("Keyword category {0} has no domain or document type tag")]
    UntaggedKeyword(String),

    #[error("Conflicting weights for {text:?} in category {category}: {first} vs {second}")]
    ConflictingWeight {
        category: String,
        text: String,
        first: f64,
        second: f64,
    },

    #[error("{text:?} in category {category} is listed both as a term and a pattern")]
    ConflictingSourceKind { category: String, text: String },
}

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug, Clone)]
pub enum DictionarySource {
    File(PathBuf),
    /// Every `*.json` file in the directory, in file-name order.
    Directory(PathBuf),
    Inline {
        origin: String,
        file: DictionaryFile,
    },
}

impl DictionarySource {
    /// A path source: directories load every dictionary inside them.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            Self::Directory(path)
        } else {
            Self::File(path)
        }
    }
}

pub struct DictionaryLoader {
    sources: Vec<DictionarySource>,
    builtin_patterns: bool,
}

impl DictionaryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            builtin_patterns: true,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: DictionarySource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn add_source(&mut self, source: DictionarySource) {
        self.sources.push(source);
    }

    #[must_use]
    pub fn with_inline(self, origin: impl Into<String>, file: DictionaryFile) -> Self {
        self.with_source(DictionarySource::Inline {
            origin: origin.into(),
            file,
        })
    }

    #[must_use]
    pub fn with_builtin_patterns(mut self, enabled: bool) -> Self {
        self.builtin_patterns = enabled;
        self
    }

    pub fn load(self) -> LoadResult<PatternTable> {
        if self.sources.is_empty() {
            return Err(LoadError::NoSources);
        }

        let mut builder = TableBuilder::default();

        for source in self.sources {
            match source {
                DictionarySource::File(path) => {
                    let file = read_file(&path)?;
                    builder.add_file(&path.display().to_string(), file)?;
                }
                DictionarySource::Directory(dir) => {
                    for path in dictionary_files(&dir)? {
                        let file = read_file(&path)?;
                        builder.add_file(&path.display().to_string(), file)?;
                    }
                }
                DictionarySource::Inline { origin, file } => builder.add_file(&origin, file)?,
            }
        }

        if self.builtin_patterns {
            builder.add_file(BUILTIN_ORIGIN, builtin_dictionary())?;
        }

        let table = builder.finish()?;
        let stats = table.stats();
        tracing::info!(
            categories = stats.categories,
            exact = stats.exact_entries,
            regex = stats.regex_entries,
            builtin_version = self.builtin_patterns.then_some(BUILTIN_PATTERN_VERSION),
            "Loaded pattern dictionaries"
        );

        Ok(table)
    }
}

impl Default for DictionaryLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> LoadResult<DictionaryFile> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::Malformed {
        origin: path.display().to_string(),
        source,
    })
}

fn dictionary_files(dir: &Path) -> LoadResult<Vec<PathBuf>> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(LoadError::EmptyDirectory(dir.to_path_buf()));
    }

    paths.sort();
    Ok(paths)
}

#[derive(Default)]
struct TableBuilder {
    categories: Vec<Category>,
    by_name: HashMap<String, CategoryId>,
    entries: Vec<PatternEntry>,
    entry_index: HashMap<(String, CategoryId), usize>,
}

impl TableBuilder {
    fn add_file(&mut self, origin: &str, file: DictionaryFile) -> LoadResult<()> {
        if file.version != DICTIONARY_VERSION {
            return Err(LoadError::UnsupportedVersion {
                origin: origin.to_string(),
                found: file.version,
                expected: DICTIONARY_VERSION,
            });
        }

        for spec in file.categories {
            self.add_category(origin, spec)?;
        }

        Ok(())
    }

    fn add_category(&mut self, origin: &str, spec: CategorySpec) -> LoadResult<()> {
        let name = spec.name.trim().to_string();
        if name.is_empty() {
            return Err(LoadError::EmptyCategoryName(origin.to_string()));
        }

        check_weight(&name, "category weight", spec.weight)?;

        if spec.kind == CategoryKind::Keyword
            && spec.domain.is_none()
            && spec.document_type.is_none()
        {
            return Err(LoadError::UntaggedKeyword(name));
        }

        let id = self.resolve_category(&name, &spec)?;

        for term in &spec.terms {
            self.add_entry(&name, id, term, spec.weight, SourceKind::Exact)?;
        }
        for pattern in &spec.patterns {
            self.add_entry(&name, id, pattern, spec.weight, SourceKind::Regex)?;
        }

        Ok(())
    }

    /// Returns the id for `name`, creating the category or merging tags into
    /// an existing one of the same kind.
    fn resolve_category(&mut self, name: &str, spec: &CategorySpec) -> LoadResult<CategoryId> {
        let Some(&id) = self.by_name.get(name) else {
            let id = CategoryId(self.categories.len() as u32);
            self.categories.push(Category {
                id,
                name: Arc::from(name),
                kind: spec.kind.clone(),
                weight: spec.weight,
                domain: spec.domain.clone(),
                document_type: spec.document_type.clone(),
            });
            self.by_name.insert(name.to_string(), id);
            return Ok(id);
        };

        let existing = &mut self.categories[id.index()];
        if existing.kind != spec.kind {
            return Err(LoadError::KindConflict {
                category: name.to_string(),
                existing: existing.kind.to_string(),
                found: spec.kind.to_string(),
            });
        }

        merge_tag(name, "domain", &mut existing.domain, spec.domain.as_ref())?;
        merge_tag(
            name,
            "document_type",
            &mut existing.document_type,
            spec.document_type.as_ref(),
        )?;

        Ok(id)
    }

    fn add_entry(
        &mut self,
        category_name: &str,
        category: CategoryId,
        term: &TermSpec,
        fallback_weight: f64,
        source_kind: SourceKind,
    ) -> LoadResult<()> {
        let text = term.text();
        if text.trim().is_empty() {
            return Err(LoadError::EmptyTerm(category_name.to_string()));
        }

        let weight = term.weight_or(fallback_weight);
        check_weight(category_name, text, weight)?;

        let key = (text.to_string(), category);
        if let Some(&idx) = self.entry_index.get(&key) {
            let existing = &self.entries[idx];
            if existing.source_kind != source_kind {
                return Err(LoadError::ConflictingSourceKind {
                    category: category_name.to_string(),
                    text: text.to_string(),
                });
            }
            if existing.weight.total_cmp(&weight).is_ne() {
                return Err(LoadError::ConflictingWeight {
                    category: category_name.to_string(),
                    text: text.to_string(),
                    first: existing.weight,
                    second: weight,
                });
            }
            return Ok(());
        }

        self.entry_index.insert(key, self.entries.len());
        self.entries.push(PatternEntry {
            text: text.to_string(),
            category,
            weight,
            source_kind,
        });

        Ok(())
    }

    fn finish(self) -> LoadResult<PatternTable> {
        if self.entries.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(PatternTable::new(self.categories, self.entries))
    }
}

fn check_weight(category: &str, subject: &str, weight: f64) -> LoadResult<()> {
    if weight.is_finite() && (MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
        Ok(())
    } else {
        Err(LoadError::WeightOutOfRange {
            category: category.to_string(),
            subject: subject.to_string(),
            weight,
        })
    }
}

fn merge_tag(
    category: &str,
    field: &'static str,
    existing: &mut Option<String>,
    found: Option<&String>,
) -> LoadResult<()> {
    match (existing.as_ref(), found) {
        (Some(current), Some(new)) if current != new => Err(LoadError::TagConflict {
            category: category.to_string(),
            field,
            existing: current.clone(),
            found: new.clone(),
        }),
        (None, Some(new)) => {
            *existing = Some(new.clone());
            Ok(())
        }
        _ => Ok(()),
    }
}
