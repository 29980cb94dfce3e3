//! Reparse decisions on a small indentation-sensitive language.
//!
//! A file is a sequence of lines; consecutive indented lines form a BLOCK.
//! A block may be reparsed on its own only while every line stays indented
//! deeper than the first line of its parent.

use super::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tessel_syntax::{
    Capabilities, CharTable, GreenNode, KindSpec, Language, NodeId, NodeRef, ParseFailure,
    ParseRequest, RegistryConfig, ReparseRequest, ReparseRules, Span, SyntaxTree, TextEdit,
    TypeHandle, TypeRegistry,
};

const PY: Language = Language::new("py");
const SOURCE: &str = "def f:\n  a\n  b\n";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Indent,
    Panic,
    Invalid,
    NeedsContext,
}

/// Resolution context that permits local reparses in `Mode::NeedsContext`.
struct AllowLocal;

struct IndentRules {
    mode: Mode,
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

impl ReparseRules for IndentRules {
    fn is_reparseable(&self, request: &ReparseRequest<'_>) -> bool {
        match self.mode {
            Mode::Panic => panic!("hook exploded"),
            Mode::NeedsContext if request.context.downcast_ref::<AllowLocal>().is_none() => {
                return false;
            }
            _ => {}
        }
        let parent_indent = request
            .parent
            .map_or(0, |parent| indent(&parent.text()));
        request.new_text.ends_with('\n')
            && request
                .new_text
                .split_inclusive('\n')
                .all(|line| !line.trim().is_empty() && indent(line) > parent_indent)
    }

    fn is_valid_reparse(&self, _old: NodeRef<'_>, _new: &GreenNode) -> bool {
        self.mode != Mode::Invalid
    }
}

struct Py {
    file: TypeHandle,
    block: TypeHandle,
    line: TypeHandle,
    table: CharTable,
}

impl Py {
    fn new(mode: Mode, lazy_blocks: bool) -> Self {
        let registry = TypeRegistry::new(RegistryConfig::default());
        let line = registry.register("LINE", PY, Capabilities::LEAF);

        let block_parser = {
            let line = line.clone();
            move |request: &ParseRequest<'_>| -> Result<GreenNode, ParseFailure> {
                Ok(block_node(request.kind, &line, request.text, request.char_table))
            }
        };
        let block = registry.register_spec(
            KindSpec::new("BLOCK", PY)
                .capabilities(Capabilities::COMPOSITE | Capabilities::REPARSEABLE)
                .content_parser(Arc::new(block_parser))
                .reparse_rules(Arc::new(IndentRules { mode })),
        );

        let file_parser = {
            let (line, block) = (line.clone(), block.clone());
            move |request: &ParseRequest<'_>| -> Result<GreenNode, ParseFailure> {
                Ok(file_node(
                    request.kind,
                    &block,
                    &line,
                    request.text,
                    request.char_table,
                    lazy_blocks,
                ))
            }
        };
        let file = registry.register_spec(
            KindSpec::new("FILE", PY)
                .capabilities(Capabilities::FILE_ROOT)
                .content_parser(Arc::new(file_parser)),
        );
        Py {
            file,
            block,
            line,
            table: CharTable::new(),
        }
    }

    fn parse(&self, text: &str) -> SyntaxTree {
        let request = ParseRequest {
            kind: &self.file,
            text,
            language: &PY,
            char_table: &self.table,
            cached_lexemes: None,
        };
        let green = self.file.content_parser().unwrap().parse_contents(&request).unwrap();
        SyntaxTree::from_green(&green, PY)
    }

    fn ctx(&self) -> ReparseContext<'_> {
        ReparseContext::new(&self.table)
    }

    fn block_id(&self, tree: &SyntaxTree) -> NodeId {
        *tree
            .children(tree.root())
            .iter()
            .find(|&&id| tree.kind(id) == Some(&self.block))
            .unwrap()
    }
}

fn block_node(block: &TypeHandle, line: &TypeHandle, text: &str, table: &CharTable) -> GreenNode {
    let lines = text
        .split_inclusive('\n')
        .map(|l| GreenNode::token(line.clone(), table.intern(l)))
        .collect();
    GreenNode::node(block.clone(), lines)
}

fn file_node(
    file: &TypeHandle,
    block: &TypeHandle,
    line: &TypeHandle,
    text: &str,
    table: &CharTable,
    lazy_blocks: bool,
) -> GreenNode {
    let mut children = Vec::new();
    let mut pending = String::new();
    let flush = |pending: &mut String, children: &mut Vec<GreenNode>| {
        if pending.is_empty() {
            return;
        }
        children.push(if lazy_blocks {
            GreenNode::chameleon(block.clone(), table.intern(pending))
        } else {
            block_node(block, line, pending, table)
        });
        pending.clear();
    };
    for l in text.split_inclusive('\n') {
        if indent(l) > 0 {
            pending.push_str(l);
        } else {
            flush(&mut pending, &mut children);
            children.push(GreenNode::token(line.clone(), table.intern(l)));
        }
    }
    flush(&mut pending, &mut children);
    GreenNode::node(file.clone(), children)
}

fn green(tree: &SyntaxTree) -> GreenNode {
    tree.to_green(tree.root()).unwrap()
}

#[test]
fn test_local_reparse_inside_block() {
    let py = Py::new(Mode::Indent, false);
    let mut tree = py.parse(SOURCE);
    let root = tree.root();
    let header = tree.children(root)[0];
    let block = py.block_id(&tree);
    let edit = TextEdit::insert(10, "x");

    let mut reparser = IncrementalReparser::default();
    let outcome = reparser.reparse(&mut tree, &edit, &py.ctx()).unwrap();

    let ReparsePath::Local { replaced, inserted } = outcome.path else {
        panic!("expected a local reparse, got {:?}", outcome.path);
    };
    assert_eq!(replaced, block);
    assert_eq!(
        outcome.trace,
        vec![
            ReparseState::Stable,
            ReparseState::EditPending,
            ReparseState::Classifying { node: block },
            ReparseState::LocalReparse { node: block },
            ReparseState::Stable,
        ]
    );
    assert_eq!(tree.full_text(), "def f:\n  ax\n  b\n");
    assert_eq!(green(&tree), green(&py.parse("def f:\n  ax\n  b\n")));

    // Nodes outside the replaced subtree keep their ids.
    assert_eq!(tree.root(), root);
    assert_eq!(tree.children(root), &[header, inserted]);
    assert_eq!(tree.text(header).as_deref(), Some("def f:\n"));
    assert!(tree.is_detached(block));
}

#[test]
fn test_dedent_forces_full_reparse() {
    let py = Py::new(Mode::Indent, false);
    let mut tree = py.parse(SOURCE);
    let block = py.block_id(&tree);
    let edit = TextEdit::delete(Span::new(11, 13));

    let mut reparser = IncrementalReparser::default();
    let outcome = reparser.reparse(&mut tree, &edit, &py.ctx()).unwrap();

    assert_eq!(outcome.fallback_reason(), Some(&FallbackReason::RejectedUpToRoot));
    assert_eq!(
        outcome.trace,
        vec![
            ReparseState::Stable,
            ReparseState::EditPending,
            ReparseState::Classifying { node: block },
            ReparseState::FullReparse {
                reason: FallbackReason::RejectedUpToRoot
            },
            ReparseState::Stable,
        ]
    );
    let expected = py.parse("def f:\n  a\nb\n");
    assert_eq!(green(&tree), green(&expected));
    assert_eq!(tree.children(tree.root()).len(), 3);
}

#[test]
fn test_edit_outside_reparseable_node() {
    let py = Py::new(Mode::Indent, false);
    let tree = py.parse(SOURCE);
    let reparser = IncrementalReparser::default();
    assert_eq!(
        reparser.classify(&tree, &TextEdit::insert(2, "e"), &py.ctx()),
        Classification::Full(FallbackReason::NoReparseableAncestor)
    );
    // An insertion at the block's first byte lands between nodes.
    assert_eq!(
        reparser.classify(&tree, &TextEdit::insert(7, "  "), &py.ctx()),
        Classification::Full(FallbackReason::NoReparseableAncestor)
    );
}

#[test]
fn test_classify_does_not_touch_tree() {
    let py = Py::new(Mode::Indent, false);
    let tree = py.parse(SOURCE);
    let before = green(&tree);
    let block = py.block_id(&tree);

    let reparser = IncrementalReparser::default();
    let classification = reparser.classify(&tree, &TextEdit::insert(10, "x"), &py.ctx());
    let Classification::Local {
        target,
        candidate,
        attempts,
    } = classification
    else {
        panic!("expected a local classification");
    };
    assert_eq!(target, block);
    assert_eq!(attempts, 1);
    assert_eq!(candidate.text(), "  ax\n  b\n");
    assert_eq!(green(&tree), before);
    assert_eq!(reparser.stats().local_count, 0);
}

#[test]
fn test_hook_panic_falls_back() {
    let py = Py::new(Mode::Panic, false);
    let mut tree = py.parse(SOURCE);
    let mut reparser = IncrementalReparser::default();
    let outcome = reparser
        .reparse(&mut tree, &TextEdit::insert(10, "x"), &py.ctx())
        .unwrap();
    assert_eq!(
        outcome.fallback_reason(),
        Some(&FallbackReason::HookPanicked {
            kind: "BLOCK".to_owned()
        })
    );
    assert_eq!(tree.full_text(), "def f:\n  ax\n  b\n");
}

#[test]
#[should_panic(expected = "hook exploded")]
fn test_hook_panic_propagates_when_not_caught() {
    let py = Py::new(Mode::Panic, false);
    let tree = py.parse(SOURCE);
    let reparser = IncrementalReparser::new(ReparseConfig {
        catch_panics: false,
        ..ReparseConfig::default()
    });
    let _ = reparser.classify(&tree, &TextEdit::insert(10, "x"), &py.ctx());
}

#[test]
fn test_invalid_reparse_falls_back() {
    let py = Py::new(Mode::Invalid, false);
    let tree = py.parse(SOURCE);
    let reparser = IncrementalReparser::default();
    assert_eq!(
        reparser.classify(&tree, &TextEdit::insert(10, "x"), &py.ctx()),
        Classification::Full(FallbackReason::InvalidReparse {
            kind: "BLOCK".to_owned()
        })
    );
}

#[test]
fn test_resolution_context_reaches_hook() {
    let py = Py::new(Mode::NeedsContext, false);
    let tree = py.parse(SOURCE);
    let reparser = IncrementalReparser::default();
    let edit = TextEdit::insert(10, "x");

    assert_eq!(
        reparser.classify(&tree, &edit, &py.ctx()),
        Classification::Full(FallbackReason::RejectedUpToRoot)
    );
    let allow = AllowLocal;
    let ctx = py.ctx().with_resolve(&allow);
    assert!(matches!(
        reparser.classify(&tree, &edit, &ctx),
        Classification::Local { .. }
    ));
}

#[test]
fn test_chameleon_target_stays_lazy() {
    let py = Py::new(Mode::Indent, true);
    let mut tree = py.parse(SOURCE);
    let block = py.block_id(&tree);
    assert!(tree.is_chameleon(block));

    let mut reparser = IncrementalReparser::default();
    let outcome = reparser
        .reparse(&mut tree, &TextEdit::insert(10, "x"), &py.ctx())
        .unwrap();
    let ReparsePath::Local { inserted, .. } = outcome.path else {
        panic!("expected a local reparse");
    };
    assert!(tree.is_chameleon(inserted));
    assert_eq!(tree.text(inserted).as_deref(), Some("  ax\n  b\n"));

    tree.expand(inserted, &py.table).unwrap();
    assert_eq!(
        tree.to_green(inserted).unwrap(),
        GreenNode::node(
            py.block.clone(),
            vec![
                GreenNode::token(py.line.clone(), Arc::from("  ax\n")),
                GreenNode::token(py.line.clone(), Arc::from("  b\n")),
            ]
        )
    );
}

#[test]
fn test_walk_limit() {
    let py = Py::new(Mode::Indent, false);
    let tree = py.parse(SOURCE);
    let reparser = IncrementalReparser::new(ReparseConfig {
        max_ancestor_walk: 0,
        ..ReparseConfig::default()
    });
    assert_eq!(
        reparser.classify(&tree, &TextEdit::insert(10, "x"), &py.ctx()),
        Classification::Full(FallbackReason::WalkLimitReached)
    );
}

#[test]
fn test_edit_out_of_bounds_leaves_tree_untouched() {
    let py = Py::new(Mode::Indent, false);
    let mut tree = py.parse(SOURCE);
    let before = green(&tree);
    let edit = TextEdit::delete(Span::new(14, 40));

    let mut reparser = IncrementalReparser::default();
    assert_eq!(
        reparser.classify(&tree, &edit, &py.ctx()),
        Classification::Full(FallbackReason::EditOutOfBounds)
    );
    assert_eq!(
        reparser.reparse(&mut tree, &edit, &py.ctx()),
        Err(ReparseError::EditOutOfBounds {
            range: Span::new(14, 40),
            len: 15
        })
    );
    assert_eq!(green(&tree), before);
    assert_eq!(reparser.stats().full_count, 0);
}

#[test]
fn test_inverted_edit_range_is_out_of_bounds() {
    let py = Py::new(Mode::Indent, false);
    let mut tree = py.parse(SOURCE);
    let before = green(&tree);
    let edit = TextEdit::replace(Span::new(10, 9), "x");

    let mut reparser = IncrementalReparser::default();
    assert_eq!(
        reparser.classify(&tree, &edit, &py.ctx()),
        Classification::Full(FallbackReason::EditOutOfBounds)
    );
    assert_eq!(
        reparser.reparse(&mut tree, &edit, &py.ctx()),
        Err(ReparseError::EditOutOfBounds {
            range: Span::new(10, 9),
            len: 15
        })
    );
    assert_eq!(green(&tree), before);
}

#[test]
fn test_full_reparse_needs_root_parser() {
    let py = Py::new(Mode::Indent, false);
    let registry = TypeRegistry::new(RegistryConfig::default());
    let bare = registry.register("BARE", PY, Capabilities::FILE_ROOT);
    let mut tree = SyntaxTree::from_green(
        &GreenNode::node(bare, vec![GreenNode::token(py.line.clone(), Arc::from("x\n"))]),
        PY,
    );

    let mut reparser = IncrementalReparser::default();
    assert_eq!(
        reparser.reparse(&mut tree, &TextEdit::insert(1, "y"), &py.ctx()),
        Err(ReparseError::NoRootParser {
            kind: "BARE".to_owned()
        })
    );
    assert_eq!(tree.full_text(), "x\n");
}

#[test]
fn test_stats_track_paths() {
    let py = Py::new(Mode::Indent, false);
    let mut tree = py.parse(SOURCE);
    let mut reparser = IncrementalReparser::default();
    let ctx = py.ctx();

    reparser.reparse(&mut tree, &TextEdit::insert(10, "x"), &ctx).unwrap();
    reparser.reparse(&mut tree, &TextEdit::insert(2, "e"), &ctx).unwrap();
    reparser.reparse(&mut tree, &TextEdit::insert(10, "y"), &ctx).unwrap();
    reparser
        .reparse(&mut tree, &TextEdit::delete(Span::new(8, 10)), &ctx)
        .unwrap();

    let stats = reparser.stats();
    assert_eq!(stats.local_count, 2);
    assert_eq!(stats.full_count, 2);
    assert_eq!(stats.fallbacks_for(&FallbackReason::NoReparseableAncestor), 1);
    assert_eq!(stats.fallbacks_for(&FallbackReason::RejectedUpToRoot), 1);
    assert!((stats.reuse_rate() - 50.0).abs() < f64::EPSILON);
    assert_eq!(tree.full_text(), "deef f:\nyax\n  b\n");
}

#[test]
fn test_state_transitions() {
    use ReparseState::{Classifying, EditPending, FullReparse, LocalReparse, Stable};
    let node = Py::new(Mode::Indent, false).parse(SOURCE).root();
    let full = FullReparse {
        reason: FallbackReason::RejectedUpToRoot,
    };

    assert!(Stable.can_transition_to(&EditPending));
    assert!(EditPending.can_transition_to(&Classifying { node }));
    assert!(EditPending.can_transition_to(&full));
    assert!(Classifying { node }.can_transition_to(&Classifying { node }));
    assert!(Classifying { node }.can_transition_to(&LocalReparse { node }));
    assert!(LocalReparse { node }.can_transition_to(&Stable));
    assert!(LocalReparse { node }.can_transition_to(&full));
    assert!(full.can_transition_to(&Stable));

    assert!(!Stable.can_transition_to(&LocalReparse { node }));
    assert!(!EditPending.can_transition_to(&LocalReparse { node }));
    assert!(!full.can_transition_to(&Classifying { node }));
    assert!(!Stable.can_transition_to(&Stable));
}

#[test]
fn test_fallback_reason_codes_are_distinct() {
    let reasons = [
        FallbackReason::NoReparseableAncestor,
        FallbackReason::RejectedUpToRoot,
        FallbackReason::WalkLimitReached,
        FallbackReason::EditOutOfBounds,
        FallbackReason::NoContentParser { kind: String::new() },
        FallbackReason::ParseFailed(String::new()),
        FallbackReason::CandidateMismatch(String::new()),
        FallbackReason::InvalidReparse { kind: String::new() },
        FallbackReason::HookPanicked { kind: String::new() },
        FallbackReason::SpliceFailed(String::new()),
    ];
    let mut codes: Vec<_> = reasons.iter().map(FallbackReason::code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), reasons.len());
}
