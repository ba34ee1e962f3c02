//! Limelight — an incremental syntax-highlighting and auto-indentation
//! engine for embeddable code editors.
//!
//! The document lives as a sequence of per-line tokenized fragments.
//! Edits mark fragments dirty; a budgeted background pass resumes a
//! language parser from the nearest per-line checkpoint, replays its
//! tokens against the existing fragments, and patches only what actually
//! changed. Untouched fragments keep their identity, so cursors,
//! selections and whatever else the host hangs off them survive
//! re-highlighting.
//!
//! # Structure
//!
//! - `document/` — the fragment model: arena-backed fragment sequence and
//!   the character stream parsers read it through
//! - `parse/` — the language-independent parser contract and the
//!   continuation-stack machinery grammars are built from
//! - `engine/` — the reconciling highlight pass, the dirty-set scheduler,
//!   the indentation engine and selection-anchor remapping
//! - `lang/` — built-in language modules (JavaScript, XML/HTML, CSS) and
//!   the registry
//! - `editor` — the facade a host embeds
//!
//! # Example
//!
//! ```
//! use limelight::{Editor, EditorConfig, LanguageRegistry, PassOutcome};
//!
//! let registry = LanguageRegistry::with_builtins();
//! let mut editor = Editor::with_registry(&registry, EditorConfig::default()).unwrap();
//! editor.import_text("if (x) {\n  y;\n}");
//! while editor.run_highlight_pass().unwrap() == PassOutcome::Reschedule {}
//! assert_eq!(editor.export_text(), "if (x) {\n  y;\n}");
//! ```

pub mod config;
pub mod document;
pub mod editor;
pub mod engine;
pub mod error;
pub mod lang;
pub mod parse;

// Re-exports for convenient external access
pub use config::EditorConfig;
pub use document::{Fragment, FragmentId, FragmentSeq};
pub use editor::Editor;
pub use engine::{AnchorSet, PassOutcome, PassReport, SelectionTracker};
pub use error::{EditorError, Result};
pub use lang::LanguageRegistry;
pub use parse::{Checkpoint, Language, Style, Token, TokenParser};
