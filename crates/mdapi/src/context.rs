//! resolved variables and `{{name}}` placeholder substitution
use indexmap::IndexMap;

/// Directory of the document
pub const CURRENT_DIR: &str = "CURDIR";
/// File name of the document without extension
pub const CURRENT_FILE: &str = "CURFILE";
/// Directory the action writes its results into
pub const RESULT_DIR: &str = "RESULTDIR";

pub const RESERVED: [&str; 3] = [CURRENT_DIR, CURRENT_FILE, RESULT_DIR];

/// Variable name to resolved value
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ResolvedContext {
    values: IndexMap<String, String>,
}

impl ResolvedContext {
    /// Context seeded with the reserved entries
    pub fn seeded(current_dir: &str, current_file: &str, result_dir: &str) -> Self {
        let mut context = Self::default();
        context.insert(CURRENT_DIR, current_dir);
        context.insert(CURRENT_FILE, current_file);
        context.insert(RESULT_DIR, result_dir);
        context
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Set `name`, replacing (in place) an existing value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn current_dir(&self) -> Option<&str> {
        self.get(CURRENT_DIR)
    }

    pub fn current_file(&self) -> Option<&str> {
        self.get(CURRENT_FILE)
    }

    pub fn result_dir(&self) -> Option<&str> {
        self.get(RESULT_DIR)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResolvedContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut context = Self::default();
        for (name, value) in iter {
            context.insert(name, value);
        }
        context
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ResolvedContext {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Replace every `{{name}}` whose name is in `context` by its value
///
/// Single pass: substituted values are not scanned again and unknown placeholders stay as they are.
pub fn substitute(template: &str, context: &ResolvedContext) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);
        rest = &rest[start..];

        let candidate = rest[OPEN.len()..]
            .find(CLOSE)
            .map(|end| &rest[OPEN.len()..OPEN.len() + end]);

        match candidate.and_then(|name| Some((name, context.get(name)?))) {
            Some((name, value)) => {
                output.push_str(value);
                rest = &rest[OPEN.len() + name.len() + CLOSE.len()..];
            }
            None => {
                // not a known placeholder, keep the brace and rescan from the next one
                output.push('{');
                rest = &rest[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Names of `{{name}}` placeholders that `context` can not substitute
pub fn unresolved_placeholders<'t>(template: &'t str, context: &ResolvedContext) -> Vec<&'t str> {
    let mut unresolved = vec![];
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        rest = &rest[start + OPEN.len()..];
        let Some(end) = rest.find(CLOSE) else {
            break;
        };

        let name = &rest[..end];
        if !name.is_empty() && !name.contains(OPEN) && !context.contains(name) {
            unresolved.push(name);
        }
    }

    unresolved
}
