//! Built-in language modules and the registry that hands them out.

pub mod css;
pub mod javascript;
pub mod xml;

use std::path::Path;
use std::rc::Rc;

use crate::error::{EditorError, Result};
use crate::parse::Language;

pub use css::Css;
pub use javascript::JavaScript;
pub use xml::Xml;

/// Lookup of language modules by name or file extension. A missing module
/// is a hard error: the editor cannot highlight without one.
pub struct LanguageRegistry {
    languages: Vec<Rc<dyn Language>>,
}

impl LanguageRegistry {
    pub fn empty() -> Self {
        Self {
            languages: Vec::new(),
        }
    }

    /// Registry pre-loaded with the built-in languages.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Rc::new(JavaScript));
        registry.register(Rc::new(Xml));
        registry.register(Rc::new(Css));
        registry
    }

    pub fn register(&mut self, language: Rc<dyn Language>) {
        self.languages.push(language);
    }

    pub fn by_name(&self, name: &str) -> Result<Rc<dyn Language>> {
        self.languages
            .iter()
            .find(|l| l.name() == name)
            .cloned()
            .ok_or_else(|| EditorError::UnknownLanguage(name.to_string()))
    }

    /// Pick a language from a file path's extension.
    pub fn detect(&self, path: &Path) -> Option<Rc<dyn Language>> {
        let ext = path.extension()?.to_str()?;
        self.languages
            .iter()
            .find(|l| l.extensions().contains(&ext))
            .cloned()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        let registry = LanguageRegistry::with_builtins();
        assert_eq!(registry.by_name("javascript").unwrap().name(), "javascript");
        assert!(matches!(
            registry.by_name("cobol"),
            Err(EditorError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_detect_by_extension() {
        let registry = LanguageRegistry::with_builtins();
        let lang = registry.detect(Path::new("index.html")).unwrap();
        assert_eq!(lang.name(), "xml");
        assert!(registry.detect(Path::new("README.txt")).is_none());
        assert!(registry.detect(Path::new("noext")).is_none());
    }
}
