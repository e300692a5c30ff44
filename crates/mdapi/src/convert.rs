//! named string converters
//!
//! A component declared as `### name:trim:base64` pipes its computed value through `trim` and then `base64`.
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes escaped in a query component, everything but `A-Za-z0-9-_.~`
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub type Converter = fn(&str) -> Result<String, ConvertError>;

/// Registry of converters, looked up by name
#[derive(Debug, Clone)]
pub struct Converters {
    converters: indexmap::IndexMap<&'static str, Converter>,
}

impl Converters {
    /// Registry holding every converter shipped with mdapi
    pub fn builtin() -> Self {
        let mut converters = Self {
            converters: Default::default(),
        };

        converters.register("trim", |s| Ok(s.trim().to_string()));
        converters.register("upper", |s| Ok(s.to_uppercase()));
        converters.register("lower", |s| Ok(s.to_lowercase()));
        converters.register("urlencode", |s| {
            let parts: Vec<String> = s
                .split(' ')
                .map(|part| utf8_percent_encode(part, QUERY_COMPONENT).to_string())
                .collect();
            Ok(parts.join("+"))
        });
        converters.register("base64", |s| {
            Ok(base64::engine::general_purpose::STANDARD.encode(s))
        });
        converters.register("base64decode", |s| {
            let bytes = base64::engine::general_purpose::STANDARD.decode(s)?;
            Ok(String::from_utf8(bytes)?)
        });
        converters.register("shell_single", |s| Ok(s.replace('\'', r"'\''")));
        converters.register("shell_double", |s| {
            let mut escaped = String::with_capacity(s.len());
            for c in s.chars() {
                if matches!(c, '\\' | '"' | '$' | '`') {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            Ok(escaped)
        });

        converters
    }

    /// Add a converter, replacing one registered under the same name
    pub fn register(&mut self, name: &'static str, converter: Converter) {
        self.converters.insert(name, converter);
    }

    pub fn get(&self, name: &str) -> Option<Converter> {
        self.converters.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.converters.keys().copied()
    }

    /// Apply `chain` to `value`, step by step; the first failing step aborts
    pub fn apply<S: AsRef<str>>(&self, value: String, chain: &[S]) -> Result<String, ConvertError> {
        chain.iter().try_fold(value, |value, name| {
            let name = name.as_ref();
            let converter = self
                .get(name)
                .ok_or_else(|| ConvertError::UnknownConverter(name.to_string()))?;
            tracing::trace!(converter = name, "applying converter");
            converter(&value)
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("Unknown converter {0:?}")]
    UnknownConverter(String),
    #[error("Invalid base64 input")]
    Base64(#[from] base64::DecodeError),
    #[error("Decoded value is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
