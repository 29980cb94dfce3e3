//! A brace language for reparse tests.
//!
//! ```text
//! file  := item*
//! item  := IDENT MARK | WS | block | ERROR('}')
//! block := '{' (IDENT MARK | WS | block)* (ANCHOR '}')? END
//! ```
//!
//! MARK, ANCHOR and END are empty nodes. ANCHOR is left-bound, the other
//! two follow the trivia around them.
//!
//! A block missing its `}` runs to the end of the file. A stray `}` at file
//! level is wrapped in an ERROR node. BLOCK is reparseable whenever its new
//! text is still one self-delimited block.

use std::sync::{Arc, OnceLock};

use tessel_reparse::ReparseContext;
use tessel_syntax::{
    Capabilities, CharTable, GreenNode, KindSpec, Language, NodeRef, ParseFailure, ParseRequest,
    RegistryConfig, ReparseRequest, ReparseRules, SyntaxTree, TokenSet, TreeBuilder, TreeError,
    TypeHandle, TypeRegistry,
};

pub const BRACES: Language = Language::new("braces");

#[derive(Clone)]
struct Leaves {
    ident: TypeHandle,
    ws: TypeHandle,
    lbrace: TypeHandle,
    rbrace: TypeHandle,
    error: TypeHandle,
    mark: TypeHandle,
    anchor: TypeHandle,
    end: TypeHandle,
    trivia: TokenSet,
}

pub struct Braces {
    pub file: TypeHandle,
    pub block: TypeHandle,
    pub end: TypeHandle,
    pub table: CharTable,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tok {
    Ident,
    Ws,
    LBrace,
    RBrace,
}

fn lex(text: &str) -> Vec<(Tok, &str)> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let (tok, len) = match c {
            '{' => (Tok::LBrace, 1),
            '}' => (Tok::RBrace, 1),
            c if c.is_whitespace() => (
                Tok::Ws,
                rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len()),
            ),
            _ => (
                Tok::Ident,
                rest.find(|c: char| c.is_whitespace() || c == '{' || c == '}')
                    .unwrap_or(rest.len()),
            ),
        };
        tokens.push((tok, &rest[..len]));
        rest = &rest[len..];
    }
    tokens
}

struct Parser<'t, 'b> {
    leaves: &'t Leaves,
    block: &'t TypeHandle,
    tokens: Vec<(Tok, &'t str)>,
    pos: usize,
    builder: TreeBuilder<'b>,
}

impl Parser<'_, '_> {
    fn bump(&mut self, kind: &TypeHandle) -> Result<(), TreeError> {
        let (_, text) = self.tokens[self.pos];
        self.pos += 1;
        self.builder.token(kind, text)
    }

    fn empty(&mut self, kind: &TypeHandle) -> Result<(), TreeError> {
        self.builder.start_node(kind.clone());
        self.builder.finish_node()
    }

    fn items(&mut self, top_level: bool) -> Result<(), TreeError> {
        let leaves = self.leaves;
        while let Some(&(tok, _)) = self.tokens.get(self.pos) {
            match tok {
                Tok::Ident => {
                    self.bump(&leaves.ident)?;
                    self.empty(&leaves.mark)?;
                }
                Tok::Ws => self.bump(&leaves.ws)?,
                Tok::LBrace => self.block()?,
                Tok::RBrace if top_level => {
                    self.builder.start_node(leaves.error.clone());
                    self.bump(&leaves.rbrace)?;
                    self.builder.finish_node()?;
                }
                Tok::RBrace => return Ok(()),
            }
        }
        Ok(())
    }

    fn block(&mut self) -> Result<(), TreeError> {
        let leaves = self.leaves;
        self.builder.start_node(self.block.clone());
        self.bump(&leaves.lbrace)?;
        self.items(false)?;
        if self.pos < self.tokens.len() {
            self.empty(&leaves.anchor)?;
            self.bump(&leaves.rbrace)?;
        }
        self.empty(&leaves.end)?;
        self.builder.finish_node()
    }
}

fn failure(request: &ParseRequest<'_>, err: &TreeError) -> ParseFailure {
    ParseFailure::new(request.kind.debug_name(), err.to_string())
}

fn parse_file(
    request: &ParseRequest<'_>,
    leaves: &Leaves,
    block: &TypeHandle,
) -> Result<GreenNode, ParseFailure> {
    let mut parser = Parser {
        leaves,
        block,
        tokens: lex(request.text),
        pos: 0,
        builder: TreeBuilder::new(request.char_table, leaves.trivia.clone()),
    };
    parser.builder.start_node(request.kind.clone());
    parser
        .items(true)
        .and_then(|()| parser.builder.finish_node())
        .map_err(|err| failure(request, &err))?;
    parser.builder.finish().map_err(|err| failure(request, &err))
}

fn parse_block(request: &ParseRequest<'_>, leaves: &Leaves) -> Result<GreenNode, ParseFailure> {
    let tokens = lex(request.text);
    if tokens.first().map(|&(tok, _)| tok) != Some(Tok::LBrace) {
        return Err(ParseFailure::new(
            request.kind.debug_name(),
            "block must start with `{`",
        ));
    }
    let mut parser = Parser {
        leaves,
        block: request.kind,
        tokens,
        pos: 0,
        builder: TreeBuilder::new(request.char_table, leaves.trivia.clone()),
    };
    parser.block().map_err(|err| failure(request, &err))?;
    if parser.pos < parser.tokens.len() {
        return Err(ParseFailure::new(
            request.kind.debug_name(),
            "text after the closing `}`",
        ));
    }
    parser.builder.finish().map_err(|err| failure(request, &err))
}

/// Is `text` exactly one block whose closing brace is its last character?
fn is_self_delimited(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'{') || bytes.last() != Some(&b'}') {
        return false;
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            return i + 1 == bytes.len();
        }
    }
    false
}

struct BlockRules {
    rbrace: TypeHandle,
}

impl ReparseRules for BlockRules {
    fn is_reparseable(&self, request: &ReparseRequest<'_>) -> bool {
        is_self_delimited(request.new_text)
    }

    fn is_valid_reparse(&self, _old: NodeRef<'_>, new: &GreenNode) -> bool {
        new.children()
            .iter()
            .any(|child| child.kind() == &self.rbrace)
    }
}

impl Braces {
    fn new() -> Self {
        let registry = TypeRegistry::new(RegistryConfig::default());
        let leaf = |name: &'static str| registry.register(name, BRACES, Capabilities::LEAF);
        let ws = leaf("WS");
        let leaves = Leaves {
            ident: leaf("IDENT"),
            lbrace: leaf("LBRACE"),
            rbrace: leaf("RBRACE"),
            error: registry.register("ERROR", BRACES, Capabilities::COMPOSITE),
            mark: registry.register("MARK", BRACES, Capabilities::COMPOSITE),
            anchor: registry.register_spec(
                KindSpec::new("ANCHOR", BRACES)
                    .capabilities(Capabilities::COMPOSITE)
                    .left_bound(true),
            ),
            end: registry.register("END", BRACES, Capabilities::COMPOSITE),
            trivia: TokenSet::create(&[ws.clone()]),
            ws,
        };

        let block_parser = {
            let leaves = leaves.clone();
            move |request: &ParseRequest<'_>| parse_block(request, &leaves)
        };
        let block = registry.register_spec(
            KindSpec::new("BLOCK", BRACES)
                .capabilities(Capabilities::COMPOSITE | Capabilities::REPARSEABLE)
                .content_parser(Arc::new(block_parser))
                .reparse_rules(Arc::new(BlockRules {
                    rbrace: leaves.rbrace.clone(),
                })),
        );

        let end = leaves.end.clone();
        let file_parser = {
            let block = block.clone();
            move |request: &ParseRequest<'_>| parse_file(request, &leaves, &block)
        };
        let file = registry.register_spec(
            KindSpec::new("FILE", BRACES)
                .capabilities(Capabilities::FILE_ROOT)
                .content_parser(Arc::new(file_parser)),
        );

        Braces {
            file,
            block,
            end,
            table: CharTable::new(),
        }
    }

    pub fn parse(&self, text: &str) -> SyntaxTree {
        let request = ParseRequest {
            kind: &self.file,
            text,
            language: &BRACES,
            char_table: &self.table,
            cached_lexemes: None,
        };
        let green = self
            .file
            .content_parser()
            .unwrap()
            .parse_contents(&request)
            .unwrap();
        SyntaxTree::from_green(&green, BRACES)
    }

    pub fn ctx(&self) -> ReparseContext<'_> {
        ReparseContext::new(&self.table)
    }
}

/// The shared language instance, with tracing enabled from `RUST_LOG`.
pub fn braces() -> &'static Braces {
    static BRACES_LANG: OnceLock<Braces> = OnceLock::new();
    BRACES_LANG.get_or_init(|| {
        tessel_syntax::init_tracing();
        Braces::new()
    })
}
