//! Kind identities: `TypeHandle` and the values it is built from.
//!
//! A kind names one lexical or syntactic category (a keyword, a block, a
//! whole file). Every kind gets a dense `KindIndex` from the registry at
//! construction time; equality, hashing and set membership all go through
//! that identity, never through the debug name.
//!
//! # Key Types
//!
//! - [`TypeHandle`] - Shared, immutable handle to one kind
//! - [`KindSpec`] - Builder describing a kind before registration
//! - [`Capabilities`] - Node-construction strategy flags
//! - [`Language`] / [`OwnerId`] - Opaque tags for language and owning extension

mod behavior;
mod capability;

pub use behavior::{ContentParser, CustomParser, ParseRequest, ReparseRequest, ReparseRules};
pub use capability::Capabilities;

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Dense index of a registered kind.
///
/// `0` is the reserved NULL kind. `u16::MAX` marks handles that were never
/// registered. Indices are only meaningful within one process.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct KindIndex(u16);

impl KindIndex {
    /// The reserved NULL kind.
    pub const NULL: KindIndex = KindIndex(0);

    /// Sentinel for handles built with `construct_unregistered`.
    pub const UNREGISTERED: KindIndex = KindIndex(u16::MAX);

    /// Largest index the registry will hand out.
    pub const MAX: KindIndex = KindIndex(0x7FFE);

    #[inline]
    pub const fn new(raw: u16) -> Self {
        KindIndex(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Get the index as a table position.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_registered(self) -> bool {
        self.0 != u16::MAX
    }
}

impl fmt::Debug for KindIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_registered() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#unregistered")
        }
    }
}

/// Opaque language tag.
///
/// `Language::ANY` is used for universal kinds such as whitespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Language(Cow<'static, str>);

impl Language {
    /// The language of kinds that belong to no language in particular.
    pub const ANY: Language = Language(Cow::Borrowed("ANY"));

    pub const fn new(id: &'static str) -> Self {
        Language(Cow::Borrowed(id))
    }

    /// Language tag for ids only known at runtime (loaded extensions).
    pub fn from_string(id: String) -> Self {
        Language(Cow::Owned(id))
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn is_any(&self) -> bool {
        *self == Self::ANY
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({})", self.0)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies the extension that registered a kind.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OwnerId(Cow<'static, str>);

impl OwnerId {
    /// Owner of built-in kinds. Never unloaded.
    pub const CORE: OwnerId = OwnerId(Cow::Borrowed("core"));

    pub const fn new(id: &'static str) -> Self {
        OwnerId(Cow::Borrowed(id))
    }

    pub fn from_string(id: String) -> Self {
        OwnerId(Cow::Owned(id))
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerId({})", self.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Description of a kind before it is registered.
///
/// # Example
/// ```ignore
/// let block = registry.register_spec(
///     KindSpec::new("BLOCK", RUST)
///         .capabilities(Capabilities::COMPOSITE | Capabilities::REPARSEABLE)
///         .content_parser(Arc::new(parse_block))
///         .reparse_rules(Arc::new(BlockRules)),
/// );
/// ```
#[derive(Clone)]
pub struct KindSpec {
    pub(crate) name: Cow<'static, str>,
    pub(crate) language: Language,
    pub(crate) capabilities: Capabilities,
    pub(crate) owner: OwnerId,
    pub(crate) left_bound: bool,
    pub(crate) content_parser: Option<Arc<dyn ContentParser>>,
    pub(crate) reparse_rules: Option<Arc<dyn ReparseRules>>,
    pub(crate) custom_parser: Option<Arc<dyn CustomParser>>,
}

impl KindSpec {
    pub fn new(name: impl Into<Cow<'static, str>>, language: Language) -> Self {
        KindSpec {
            name: name.into(),
            language,
            capabilities: Capabilities::empty(),
            owner: OwnerId::CORE,
            left_bound: false,
            content_parser: None,
            reparse_rules: None,
            custom_parser: None,
        }
    }

    #[must_use]
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn owner(mut self, owner: OwnerId) -> Self {
        self.owner = owner;
        self
    }

    /// Empty nodes of this kind attach to the preceding token across trivia.
    #[must_use]
    pub fn left_bound(mut self, left_bound: bool) -> Self {
        self.left_bound = left_bound;
        self
    }

    #[must_use]
    pub fn content_parser(mut self, parser: Arc<dyn ContentParser>) -> Self {
        self.content_parser = Some(parser);
        self
    }

    #[must_use]
    pub fn reparse_rules(mut self, rules: Arc<dyn ReparseRules>) -> Self {
        self.reparse_rules = Some(rules);
        self
    }

    #[must_use]
    pub fn custom_parser(mut self, parser: Arc<dyn CustomParser>) -> Self {
        self.custom_parser = Some(parser);
        self
    }
}

struct KindData {
    index: KindIndex,
    debug_name: Cow<'static, str>,
    language: Language,
    capabilities: Capabilities,
    left_bound: bool,
    owner: OwnerId,
    content_parser: Option<Arc<dyn ContentParser>>,
    reparse_rules: Option<Arc<dyn ReparseRules>>,
    custom_parser: Option<Arc<dyn CustomParser>>,
}

/// Shared handle to an immutable kind.
///
/// Cloning is a reference-count bump. Two handles are equal only if they
/// come from the same construction; handles from different registries never
/// compare equal even when their indices coincide.
#[derive(Clone)]
pub struct TypeHandle(Arc<KindData>);

impl TypeHandle {
    /// Build a handle for `index` from a spec with already-normalized capabilities.
    pub(crate) fn from_spec(index: KindIndex, spec: KindSpec, capabilities: Capabilities) -> Self {
        TypeHandle(Arc::new(KindData {
            index,
            debug_name: spec.name,
            language: spec.language,
            capabilities,
            left_bound: spec.left_bound,
            owner: spec.owner,
            content_parser: spec.content_parser,
            reparse_rules: spec.reparse_rules,
            custom_parser: spec.custom_parser,
        }))
    }

    /// Build a handle that is never registered.
    ///
    /// Useful for throwaway kinds in tests and tools. Such handles are never
    /// members of any `TokenSet` and cannot be found in a registry.
    pub fn unregistered(name: impl Into<Cow<'static, str>>, language: Language) -> Self {
        Self::from_spec(
            KindIndex::UNREGISTERED,
            KindSpec::new(name, language),
            Capabilities::empty(),
        )
    }

    #[inline]
    pub fn index(&self) -> KindIndex {
        self.0.index
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        self.0.index.is_registered()
    }

    /// Human-readable name, for diagnostics only.
    pub fn debug_name(&self) -> &str {
        &self.0.debug_name
    }

    pub(crate) fn debug_name_cow(&self) -> &Cow<'static, str> {
        &self.0.debug_name
    }

    pub fn language(&self) -> &Language {
        &self.0.language
    }

    pub fn owner(&self) -> &OwnerId {
        &self.0.owner
    }

    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.0.capabilities
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.0.capabilities.contains(Capabilities::LEAF)
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        self.0.capabilities.contains(Capabilities::COMPOSITE)
    }

    #[inline]
    pub fn is_file_root(&self) -> bool {
        self.0.capabilities.contains(Capabilities::FILE_ROOT)
    }

    #[inline]
    pub fn is_lazy_parseable(&self) -> bool {
        self.0.capabilities.contains(Capabilities::LAZY_PARSEABLE)
    }

    #[inline]
    pub fn is_reparseable(&self) -> bool {
        self.0.capabilities.contains(Capabilities::REPARSEABLE)
    }

    #[inline]
    pub fn is_custom_parsing(&self) -> bool {
        self.0.capabilities.contains(Capabilities::CUSTOM_PARSING)
    }

    /// Whether an empty node of this kind binds to its left neighbor.
    #[inline]
    pub fn is_left_bound(&self) -> bool {
        self.0.left_bound
    }

    pub fn content_parser(&self) -> Option<&dyn ContentParser> {
        self.0.content_parser.as_deref()
    }

    pub fn reparse_rules(&self) -> Option<&dyn ReparseRules> {
        self.0.reparse_rules.as_deref()
    }

    pub fn custom_parser(&self) -> Option<&dyn CustomParser> {
        self.0.custom_parser.as_deref()
    }

    /// See `ReparseRules::reuse_collapsed_tokens`. False for kinds without rules.
    pub fn reuse_collapsed_tokens(&self) -> bool {
        self.is_lazy_parseable()
            && self
                .reparse_rules()
                .is_some_and(|rules| rules.reuse_collapsed_tokens())
    }

    /// Language used to parse a node of this kind inside a `file_language` file.
    pub fn resolved_language<'a>(&'a self, file_language: &'a Language) -> &'a Language {
        if self.0.language.is_any() {
            file_language
        } else {
            &self.0.language
        }
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.index.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.0.debug_name, self.0.index)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.debug_name)
    }
}
