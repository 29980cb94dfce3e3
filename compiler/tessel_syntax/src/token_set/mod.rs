//! Sets of kinds with O(1) membership testing.
//!
//! A `TokenSet` is either closed (a packed bit vector of kind indices), open
//! (a predicate over kinds), or a hybrid of both. Open and hybrid sets match
//! kinds that register after the set was built, which is why
//! `get_types` rescans the live registry for them on every call instead of
//! caching a result.
//!
//! # Example
//! ```ignore
//! let keywords = TokenSet::create(&[kw_fn.clone(), kw_let.clone()]);
//! let trivia = TokenSet::or_set(&[CommonKinds::global().whitespace_set().clone(), comments]);
//!
//! if trivia.contains(&kind) {
//!     // O(1) for closed sets
//! }
//! ```

mod bits;

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::KindError;
use crate::kind::TypeHandle;
use crate::registry::TypeRegistry;
use bits::KindBits;

type Predicate = Arc<dyn Fn(&TypeHandle) -> bool + Send + Sync>;

enum Repr {
    Closed(KindBits),
    Open(Predicate),
    Hybrid(KindBits, Predicate),
}

/// Immutable set of kinds. Cloning is a reference-count bump.
#[derive(Clone)]
pub struct TokenSet(Arc<Repr>);

impl TokenSet {
    fn from_parts(bits: KindBits, predicate: Option<Predicate>) -> Self {
        let repr = match predicate {
            None => Repr::Closed(bits),
            Some(predicate) if bits.is_empty() => Repr::Open(predicate),
            Some(predicate) => Repr::Hybrid(bits, predicate),
        };
        TokenSet(Arc::new(repr))
    }

    fn bits(&self) -> Option<&KindBits> {
        match &*self.0 {
            Repr::Closed(bits) | Repr::Hybrid(bits, _) => Some(bits),
            Repr::Open(_) => None,
        }
    }

    fn predicate(&self) -> Option<&Predicate> {
        match &*self.0 {
            Repr::Open(predicate) | Repr::Hybrid(_, predicate) => Some(predicate),
            Repr::Closed(_) => None,
        }
    }

    fn bits_or_empty(&self) -> KindBits {
        self.bits().cloned().unwrap_or_default()
    }

    /// The shared empty set.
    pub fn empty() -> TokenSet {
        static EMPTY: OnceLock<TokenSet> = OnceLock::new();
        EMPTY
            .get_or_init(|| TokenSet::from_parts(KindBits::default(), None))
            .clone()
    }

    /// The set of every registered kind, including kinds registered later.
    pub fn any() -> TokenSet {
        static ANY: OnceLock<TokenSet> = OnceLock::new();
        ANY.get_or_init(|| TokenSet::for_all_matching(|_| true))
            .clone()
    }

    /// Closed set of `kinds`.
    ///
    /// # Errors
    /// Returns `KindError::Unregistered` if any handle was never registered.
    pub fn try_create(kinds: &[TypeHandle]) -> Result<TokenSet, KindError> {
        if let Some(kind) = kinds.iter().find(|kind| !kind.is_registered()) {
            return Err(KindError::Unregistered {
                name: kind.debug_name().to_owned().into(),
            });
        }
        let bits = KindBits::from_indices(kinds.iter().map(|kind| kind.index().index()));
        Ok(TokenSet::from_parts(bits, None))
    }

    /// Closed set of `kinds`.
    ///
    /// # Panics
    /// Panics if any handle was never registered; building a set from an
    /// unregistered handle is a programming error.
    pub fn create(kinds: &[TypeHandle]) -> TokenSet {
        Self::try_create(kinds).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Open set of every kind matching `predicate`, now or in the future.
    pub fn for_all_matching(
        predicate: impl Fn(&TypeHandle) -> bool + Send + Sync + 'static,
    ) -> TokenSet {
        TokenSet::from_parts(KindBits::default(), Some(Arc::new(predicate)))
    }

    /// Membership test. Unregistered handles are never members.
    #[inline]
    pub fn contains(&self, kind: &TypeHandle) -> bool {
        if !kind.is_registered() {
            return false;
        }
        match &*self.0 {
            Repr::Closed(bits) => bits.contains(kind.index().index()),
            Repr::Open(predicate) => predicate(kind),
            Repr::Hybrid(bits, predicate) => {
                bits.contains(kind.index().index()) || predicate(kind)
            }
        }
    }

    /// Union of `sets`. Predicates combine with OR.
    pub fn or_set(sets: &[TokenSet]) -> TokenSet {
        match sets {
            [] => return TokenSet::empty(),
            [single] => return single.clone(),
            _ => {}
        }
        let bits = sets
            .iter()
            .filter_map(TokenSet::bits)
            .fold(KindBits::default(), |acc, bits| acc.union(bits));
        let mut predicates: Vec<Predicate> = sets
            .iter()
            .filter_map(TokenSet::predicate)
            .cloned()
            .collect();
        let predicate: Option<Predicate> = match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Arc::new(move |kind: &TypeHandle| {
                predicates.iter().any(|p| p(kind))
            })),
        };
        TokenSet::from_parts(bits, predicate)
    }

    /// Intersection of the closed components of `a` and `b`.
    ///
    /// When both have a predicate the result's predicate requires both.
    /// When only one has a predicate, that predicate is carried over as is:
    /// a side without a predicate constrains nothing beyond its bits.
    pub fn and_set(a: &TokenSet, b: &TokenSet) -> TokenSet {
        let bits = a.bits_or_empty().intersection(&b.bits_or_empty());
        let predicate: Option<Predicate> = match (a.predicate(), b.predicate()) {
            (None, None) => None,
            (Some(p), None) | (None, Some(p)) => Some(Arc::clone(p)),
            (Some(p), Some(q)) => {
                let (p, q) = (Arc::clone(p), Arc::clone(q));
                Some(Arc::new(move |kind: &TypeHandle| p(kind) && q(kind)))
            }
        };
        TokenSet::from_parts(bits, predicate)
    }

    /// Members of `a` that are not members of `b`.
    ///
    /// When `b` has a predicate, membership in `b` is evaluated per lookup,
    /// since `b` may match kinds registered after this call.
    pub fn and_not(a: &TokenSet, b: &TokenSet) -> TokenSet {
        if b.predicate().is_some() {
            let (a, b) = (a.clone(), b.clone());
            return TokenSet::for_all_matching(move |kind| a.contains(kind) && !b.contains(kind));
        }
        let b_bits = b.bits_or_empty();
        let bits = a.bits_or_empty().difference(&b_bits);
        let predicate: Option<Predicate> = a.predicate().map(|p| {
            let p = Arc::clone(p);
            let excluded = b_bits.clone();
            Arc::new(move |kind: &TypeHandle| {
                p(kind) && !excluded.contains(kind.index().index())
            }) as Predicate
        });
        TokenSet::from_parts(bits, predicate)
    }

    /// True when the set has no closed members and no predicate.
    pub fn is_empty(&self) -> bool {
        match &*self.0 {
            Repr::Closed(bits) => bits.is_empty(),
            Repr::Open(_) | Repr::Hybrid(..) => false,
        }
    }

    /// Whether membership depends on a predicate.
    pub fn is_open(&self) -> bool {
        self.predicate().is_some()
    }

    /// Indices of the closed component, ascending.
    pub fn iter_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits().into_iter().flat_map(|bits| bits.iter())
    }

    /// Live member kinds of `registry`, ascending by index.
    ///
    /// Closed sets resolve their bits directly and skip tombstones. Sets
    /// with a predicate rescan the whole registry on every call.
    pub fn get_types(&self, registry: &TypeRegistry) -> Vec<TypeHandle> {
        match &*self.0 {
            Repr::Closed(bits) => bits
                .iter()
                .filter_map(|index| registry.find(index).ok())
                .collect(),
            Repr::Open(_) | Repr::Hybrid(..) => registry.enumerate(|kind| self.contains(kind)),
        }
    }

    /// Human-readable list of members for diagnostics.
    ///
    /// Returns a string like "`A`, `B`, or `C`", or "nothing" for an empty set.
    pub fn format_kinds(&self, registry: &TypeRegistry) -> String {
        let kinds = self.get_types(registry);
        match kinds.as_slice() {
            [] => "nothing".to_string(),
            [single] => format!("`{single}`"),
            [first, second] => format!("`{first}` or `{second}`"),
            [rest @ .., last] => {
                let rest_str = rest
                    .iter()
                    .map(|kind| format!("`{kind}`"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{rest_str}, or `{last}`")
            }
        }
    }
}

impl Default for TokenSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("indices", &self.iter_indices().collect::<Vec<_>>())
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
