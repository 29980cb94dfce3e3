//! Universal kinds shared by every language.

use crate::kind::{Capabilities, Language, TypeHandle};
use crate::registry::TypeRegistry;
use crate::token_set::TokenSet;

/// The language-independent kinds, registered under `Language::ANY`.
#[derive(Clone, Debug)]
pub struct CommonKinds {
    pub white_space: TypeHandle,
    pub bad_character: TypeHandle,
    pub error_element: TypeHandle,
    pub new_line_indent: TypeHandle,
    whitespace_set: TokenSet,
    whitespace_or_error: TokenSet,
}

impl CommonKinds {
    /// Register the common kinds into `registry`.
    ///
    /// Call once per registry; a second call registers a second copy.
    pub fn register(registry: &TypeRegistry) -> Self {
        let white_space = registry.register("WHITE_SPACE", Language::ANY, Capabilities::LEAF);
        let bad_character = registry.register("BAD_CHARACTER", Language::ANY, Capabilities::LEAF);
        let error_element =
            registry.register("ERROR_ELEMENT", Language::ANY, Capabilities::COMPOSITE);
        let new_line_indent =
            registry.register("NEW_LINE_INDENT", Language::ANY, Capabilities::LEAF);

        let whitespace_set = TokenSet::create(&[white_space.clone()]);
        let whitespace_or_error = TokenSet::create(&[
            white_space.clone(),
            bad_character.clone(),
            error_element.clone(),
        ]);
        CommonKinds {
            white_space,
            bad_character,
            error_element,
            new_line_indent,
            whitespace_set,
            whitespace_or_error,
        }
    }

    /// Common kinds of `TypeRegistry::global()`.
    pub fn global() -> &'static CommonKinds {
        &crate::registry::global_state().1
    }

    /// The cached `{WHITE_SPACE}` set.
    pub fn whitespace_set(&self) -> &TokenSet {
        &self.whitespace_set
    }

    /// `{WHITE_SPACE, BAD_CHARACTER, ERROR_ELEMENT}`.
    pub fn whitespace_or_error(&self) -> &TokenSet {
        &self.whitespace_or_error
    }
}
