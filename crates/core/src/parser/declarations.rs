//! Recursive-descent parser for TypeScript declaration files.
//!
//! Statements that carry no API surface (`import`, re-export lists,
//! `declare global` blocks) are skipped. A statement that fails to parse is
//! recorded as an error and skipped; the rest of the file is still parsed.

use super::jsdoc::JsDoc;
use super::lexer::{SpannedToken, Token, line_of, tokenize};
use super::syntax::{
    DeclKind, Declaration, EnumMember, Member, MemberKind, Param, SourceFile, TypeExpr, TypeParam,
};

/// Maximum nesting of type expressions before the parser gives up.
const MAX_NESTING: usize = 64;

const TYPE_KEYWORDS: &[&str] = &[
    "string",
    "number",
    "boolean",
    "void",
    "any",
    "unknown",
    "undefined",
    "null",
    "never",
    "object",
    "symbol",
    "bigint",
    "this",
];

const MEMBER_MODIFIERS: &[&str] = &[
    "private",
    "protected",
    "public",
    "static",
    "readonly",
    "abstract",
    "declare",
    "override",
    "accessor",
];

/// Parse one declaration file.
///
/// Only a file that cannot be tokenized is an error; statement-level
/// problems are collected on the returned [`SourceFile`].
pub fn parse_source(path: &str, source: &str) -> Result<SourceFile, String> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let tokens = tokenize(source, path)?;
    let mut parser = Parser::new(source, tokens);
    let declarations = parser.parse_statements(false);
    Ok(SourceFile {
        path: path.to_string(),
        declarations,
        errors: parser.errors,
    })
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<SpannedToken>,
    /// Doc comment immediately preceding each token.
    docs: Vec<Option<String>>,
    pos: usize,
    depth: usize,
    errors: Vec<(usize, String)>,
}

type PResult<T> = Result<T, String>;

impl<'a> Parser<'a> {
    fn new(source: &'a str, raw: Vec<SpannedToken>) -> Self {
        let mut tokens = Vec::with_capacity(raw.len());
        let mut docs = Vec::with_capacity(raw.len());
        let mut pending = None;
        for token in raw {
            if let Token::DocComment(text) = token.value {
                pending = Some(text);
            } else {
                docs.push(pending.take());
                tokens.push(token);
            }
        }
        Self {
            source,
            tokens,
            docs,
            pos: 0,
            depth: 0,
            errors: Vec::new(),
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> Option<&Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|t| &t.value)
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn nth_is_ident(&self, n: usize, text: &str) -> bool {
        matches!(self.peek_nth(n), Some(Token::Ident(s)) if s == text)
    }

    fn at_ident(&self, text: &str) -> bool {
        self.nth_is_ident(0, text)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, text: &str) -> bool {
        if self.at_ident(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> PResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(format!("expected {what}, found {}", self.describe()))
        }
    }

    fn describe(&self) -> String {
        match self.peek() {
            Some(Token::Ident(s)) => format!("'{s}'"),
            Some(Token::Str(s)) => format!("\"{s}\""),
            Some(token) => format!("{token:?}"),
            None => "end of file".to_string(),
        }
    }

    fn ident(&mut self) -> PResult<String> {
        match self.peek() {
            Some(Token::Ident(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(format!("expected identifier, found {}", self.describe())),
        }
    }

    /// Property names may be identifiers, string or numeric literals.
    fn property_name(&mut self) -> PResult<String> {
        match self.peek() {
            Some(Token::Ident(s) | Token::Str(s) | Token::Number(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(format!("expected property name, found {}", self.describe())),
        }
    }

    fn at_property_name(&self, n: usize) -> bool {
        matches!(
            self.peek_nth(n),
            Some(Token::Ident(_) | Token::Str(_) | Token::Number(_) | Token::LBracket)
        )
    }

    fn line(&self) -> usize {
        let offset = self
            .tokens
            .get(self.pos)
            .map_or(self.source.len(), |t| t.span.start);
        line_of(self.source, offset)
    }

    fn doc_here(&self) -> Option<JsDoc> {
        self.docs
            .get(self.pos)
            .and_then(Option::as_deref)
            .map(JsDoc::parse)
    }

    /// Source text of the tokens consumed since `start`.
    fn text_from(&self, start: usize) -> String {
        if start >= self.pos {
            return String::new();
        }
        let begin = self.tokens[start].span.start;
        let end = self.tokens[self.pos - 1].span.end;
        self.source.get(begin..end).unwrap_or_default().to_string()
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.depth += 1;
        let result = if self.depth > MAX_NESTING {
            Err("type nesting too deep".to_string())
        } else {
            f(self)
        };
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Skipping
    // =========================================================================

    /// Consume a balanced `(...)`, `[...]`, `{...}` or `<...>` group.
    fn skip_balanced(&mut self) {
        let (open, close) = match self.peek() {
            Some(Token::LParen) => (Token::LParen, Token::RParen),
            Some(Token::LBracket) => (Token::LBracket, Token::RBracket),
            Some(Token::LBrace) => (Token::LBrace, Token::RBrace),
            Some(Token::Lt) => (Token::Lt, Token::Gt),
            _ => {
                self.pos += 1;
                return;
            }
        };
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if *token == open {
                depth += 1;
            } else if *token == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    self.pos += 1;
                    return;
                }
            }
            self.pos += 1;
        }
    }

    /// Skip an initializer expression up to (not including) a depth-0
    /// `,`, `;`, `)` or `}`.
    fn skip_expression(&mut self) {
        while let Some(token) = self.peek() {
            match token {
                Token::Comma | Token::Semi | Token::RParen | Token::RBrace | Token::RBracket => {
                    return;
                }
                Token::LParen | Token::LBracket | Token::LBrace => self.skip_balanced(),
                _ => self.pos += 1,
            }
        }
    }

    /// Skip to the end of the current statement: a depth-0 `;`, the `}` of an
    /// enclosing block, or a new line opening another top-level statement.
    fn skip_statement(&mut self) {
        let start = self.pos;
        let mut braces = 0usize;
        while let Some(token) = self.peek() {
            if self.pos > start && braces == 0 && self.at_statement_start() {
                return;
            }
            match token {
                // Unclosed parentheses never hide a `;` in a declaration file
                Token::Semi if braces == 0 => {
                    self.pos += 1;
                    return;
                }
                Token::LBrace => braces += 1,
                Token::RBrace => {
                    if braces == 0 {
                        // Closing an enclosing block
                        if self.pos == start {
                            self.pos += 1;
                        }
                        return;
                    }
                    braces -= 1;
                    if braces == 0 {
                        self.pos += 1;
                        if self.eat(&Token::Semi) || !self.continues_after_block() {
                            return;
                        }
                        continue;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Whether the current token is the first on its line.
    fn starts_line(&self) -> bool {
        let (Some(prev), Some(current)) = (
            self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)),
            self.tokens.get(self.pos),
        ) else {
            return self.pos == 0;
        };
        self.source
            .get(prev.span.end..current.span.start)
            .is_some_and(|gap| gap.contains('\n'))
    }

    fn at_statement_start(&self) -> bool {
        ["export", "declare", "import"].iter().any(|w| self.at_ident(w)) && self.starts_line()
    }

    /// After a balanced `{...}`, whether the statement goes on, as in
    /// `import { a } from './a'` or `{ a: string } | null`.
    fn continues_after_block(&self) -> bool {
        match self.peek() {
            Some(Token::Pipe | Token::Amp | Token::LBracket | Token::Arrow) => true,
            Some(Token::Ident(word)) if word == "from" => true,
            Some(_) => !self.starts_line(),
            None => false,
        }
    }

    fn finish_statement(&mut self) {
        if self.at(&Token::LBrace) {
            self.skip_balanced();
        }
        self.eat(&Token::Semi);
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statements(&mut self, in_block: bool) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        while let Some(token) = self.peek() {
            if in_block && *token == Token::RBrace {
                break;
            }
            let start = self.pos;
            let line = self.line();
            match self.parse_statement() {
                Ok(mut found) => declarations.append(&mut found),
                Err(message) => {
                    self.errors.push((line, message));
                    self.pos = start;
                    self.skip_statement();
                    if self.pos == start {
                        self.pos += 1;
                    }
                }
            }
        }
        declarations
    }

    fn parse_statement(&mut self) -> PResult<Vec<Declaration>> {
        let doc = self.doc_here();
        let line = self.line();

        if self.eat(&Token::Semi) {
            return Ok(Vec::new());
        }
        if self.at_ident("import") {
            self.skip_statement();
            return Ok(Vec::new());
        }

        let mut exported = false;
        if self.at_ident("export") {
            let re_export = matches!(
                self.peek_nth(1),
                Some(Token::LBrace | Token::Star | Token::Eq)
            ) || self.nth_is_ident(1, "as")
                || self.nth_is_ident(1, "import");
            if re_export {
                self.skip_statement();
                return Ok(Vec::new());
            }
            self.pos += 1;
            exported = true;
            if self.eat_ident("default") {
                let declares = ["function", "class", "abstract", "interface", "async"]
                    .iter()
                    .any(|w| self.at_ident(w));
                if !declares {
                    self.skip_statement();
                    return Ok(Vec::new());
                }
            }
        }

        self.eat_ident("declare");

        if self.at_ident("global") && self.peek_nth(1) == Some(&Token::LBrace) {
            // Global augmentations describe the host environment, not APIs
            self.pos += 1;
            self.skip_balanced();
            return Ok(Vec::new());
        }

        if (self.at_ident("namespace") || self.at_ident("module"))
            && matches!(self.peek_nth(1), Some(Token::Ident(_) | Token::Str(_)))
        {
            self.pos += 2;
            while self.eat(&Token::Dot) {
                self.ident()?;
            }
            if !self.eat(&Token::LBrace) {
                self.eat(&Token::Semi);
                return Ok(Vec::new());
            }
            let inner = self.parse_statements(true);
            self.expect(&Token::RBrace, "'}' closing namespace")?;
            return Ok(inner);
        }

        self.parse_declaration(doc, line, exported)
    }

    fn parse_declaration(
        &mut self,
        doc: Option<JsDoc>,
        line: usize,
        exported: bool,
    ) -> PResult<Vec<Declaration>> {
        let word = match self.peek() {
            Some(Token::Ident(w)) => w.clone(),
            _ => return Err(format!("unexpected {}", self.describe())),
        };
        let decl = |name: String, doc: Option<JsDoc>, kind: DeclKind| Declaration {
            name,
            doc,
            line,
            exported,
            kind,
        };

        match word.as_str() {
            "async" => {
                self.pos += 1;
                self.parse_declaration(doc, line, exported)
            }
            "function" => {
                self.pos += 1;
                self.eat(&Token::Star);
                let name = self.ident()?;
                let type_params = self.parse_type_params()?;
                let params = self.parse_params()?;
                let returns = if self.eat(&Token::Colon) {
                    self.parse_return_type()?
                } else {
                    TypeExpr::Keyword("void".to_string())
                };
                self.finish_statement();
                Ok(vec![decl(
                    name,
                    doc,
                    DeclKind::Function {
                        type_params,
                        params,
                        returns,
                    },
                )])
            }
            "const" | "let" | "var" => {
                self.pos += 1;
                if self.at_ident("enum") {
                    return self.parse_declaration(doc, line, exported);
                }
                let mut found = Vec::new();
                loop {
                    let name = self.ident()?;
                    let ty = if self.eat(&Token::Colon) {
                        Some(self.parse_type()?)
                    } else {
                        None
                    };
                    if self.eat(&Token::Eq) {
                        self.skip_expression();
                    }
                    found.push(decl(name, doc.clone(), DeclKind::Variable { ty }));
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.eat(&Token::Semi);
                Ok(found)
            }
            "interface" => {
                self.pos += 1;
                let name = self.ident()?;
                let type_params = self.parse_type_params()?;
                let mut extends = Vec::new();
                if self.eat_ident("extends") {
                    loop {
                        extends.push(self.parse_type()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                let members = self.parse_object_members()?;
                Ok(vec![decl(
                    name,
                    doc,
                    DeclKind::Interface {
                        type_params,
                        extends,
                        members,
                    },
                )])
            }
            "type" => {
                self.pos += 1;
                let name = self.ident()?;
                let type_params = self.parse_type_params()?;
                self.expect(&Token::Eq, "'=' in type alias")?;
                let ty = self.parse_type()?;
                self.eat(&Token::Semi);
                Ok(vec![decl(name, doc, DeclKind::TypeAlias { type_params, ty })])
            }
            "enum" => {
                self.pos += 1;
                let name = self.ident()?;
                let members = self.parse_enum_members()?;
                Ok(vec![decl(name, doc, DeclKind::Enum { members })])
            }
            "abstract" => {
                self.pos += 1;
                if !self.at_ident("class") {
                    return Err(format!("expected 'class', found {}", self.describe()));
                }
                self.parse_declaration(doc, line, exported)
            }
            "class" => {
                self.pos += 1;
                let name = match self.peek() {
                    Some(Token::Ident(s)) if s != "extends" && s != "implements" => self.ident()?,
                    _ => "default".to_string(),
                };
                self.parse_type_params()?;
                let extends = if self.eat_ident("extends") {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                if self.eat_ident("implements") {
                    loop {
                        self.parse_type()?;
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                let members = self.parse_class_members()?;
                Ok(vec![decl(name, doc, DeclKind::Class { extends, members })])
            }
            other => Err(format!("unsupported statement starting with '{other}'")),
        }
    }

    fn parse_enum_members(&mut self) -> PResult<Vec<EnumMember>> {
        self.expect(&Token::LBrace, "'{' opening enum")?;
        let mut members = Vec::new();
        while !self.eat(&Token::RBrace) {
            if self.peek().is_none() {
                return Err("unterminated enum".to_string());
            }
            let name = self.property_name()?;
            let init = if self.eat(&Token::Eq) {
                let start = self.pos;
                self.skip_expression();
                Some(self.text_from(start))
            } else {
                None
            };
            members.push(EnumMember { name, init });
            self.eat(&Token::Comma);
        }
        Ok(members)
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn parse_object_members(&mut self) -> PResult<Vec<Member>> {
        self.expect(&Token::LBrace, "'{'")?;
        let mut members = Vec::new();
        loop {
            while self.eat(&Token::Semi) || self.eat(&Token::Comma) {}
            if self.eat(&Token::RBrace) {
                break;
            }
            if self.peek().is_none() {
                return Err("unterminated object type".to_string());
            }
            if let Some(member) = self.parse_member(false)? {
                members.push(member);
            }
        }
        Ok(members)
    }

    fn parse_class_members(&mut self) -> PResult<Vec<Member>> {
        self.expect(&Token::LBrace, "'{' opening class body")?;
        let mut members = Vec::new();
        loop {
            while self.eat(&Token::Semi) || self.eat(&Token::Comma) {}
            if self.eat(&Token::RBrace) {
                break;
            }
            if self.peek().is_none() {
                return Err("unterminated class body".to_string());
            }
            if let Some(member) = self.parse_member(true)? {
                members.push(member);
            }
        }
        Ok(members)
    }

    /// Parse one member of an object type, interface or class body.
    /// Returns `None` for members with no API meaning (constructors,
    /// private members, setters, computed keys).
    fn parse_member(&mut self, class_body: bool) -> PResult<Option<Member>> {
        let doc = self.doc_here();
        let mut hidden = false;

        // Modifiers only count as modifiers when a member name follows
        while let Some(Token::Ident(word)) = self.peek() {
            let is_modifier = MEMBER_MODIFIERS.contains(&word.as_str())
                && (class_body || word == "readonly")
                && self.at_property_name(1);
            if !is_modifier {
                break;
            }
            hidden |= word == "private" || word == "protected";
            self.pos += 1;
        }

        // Call and construct signatures
        if self.at(&Token::LParen) || self.at(&Token::Lt) {
            let type_params = self.parse_type_params()?;
            let params = self.parse_params()?;
            let returns = if self.eat(&Token::Colon) {
                self.parse_return_type()?
            } else {
                TypeExpr::Keyword("any".to_string())
            };
            return Ok(Some(Member {
                name: String::new(),
                doc,
                optional: false,
                kind: MemberKind::Call {
                    type_params,
                    params,
                    returns,
                },
            }));
        }
        if self.at_ident("new") && matches!(self.peek_nth(1), Some(Token::LParen | Token::Lt)) {
            self.pos += 1;
            self.parse_type_params()?;
            self.parse_params()?;
            if self.eat(&Token::Colon) {
                self.parse_type()?;
            }
            return Ok(None);
        }

        // Index signatures and computed keys
        if self.at(&Token::LBracket) {
            let is_index = matches!(self.peek_nth(1), Some(Token::Ident(_)))
                && self.peek_nth(2) == Some(&Token::Colon);
            if !is_index {
                self.skip_balanced();
                self.eat(&Token::Question);
                self.skip_member_tail()?;
                return Ok(None);
            }
            self.pos += 2;
            self.expect(&Token::Colon, "':' in index signature")?;
            let key = self.parse_type()?;
            self.expect(&Token::RBracket, "']'")?;
            self.expect(&Token::Colon, "':' after index signature")?;
            let value = self.parse_type()?;
            return Ok(Some(Member {
                name: String::new(),
                doc,
                optional: false,
                kind: MemberKind::Index { key, value },
            }));
        }

        // Accessors
        if (self.at_ident("get") || self.at_ident("set")) && self.at_property_name(1) {
            let getter = self.at_ident("get");
            self.pos += 1;
            let name = self.property_name()?;
            self.parse_params()?;
            let ty = if self.eat(&Token::Colon) {
                self.parse_type()?
            } else {
                TypeExpr::Keyword("any".to_string())
            };
            self.finish_statement();
            if !getter || hidden {
                return Ok(None);
            }
            return Ok(Some(Member {
                name,
                doc,
                optional: false,
                kind: MemberKind::Property(ty),
            }));
        }

        if class_body && self.at_ident("constructor") && self.peek_nth(1) == Some(&Token::LParen) {
            self.pos += 1;
            self.parse_params()?;
            self.finish_statement();
            return Ok(None);
        }

        let name = self.property_name()?;
        let optional = self.eat(&Token::Question);
        self.eat(&Token::Bang);
        hidden |= name.starts_with('#');

        let kind = if self.at(&Token::LParen) || self.at(&Token::Lt) {
            let type_params = self.parse_type_params()?;
            let params = self.parse_params()?;
            let returns = if self.eat(&Token::Colon) {
                self.parse_return_type()?
            } else {
                TypeExpr::Keyword("any".to_string())
            };
            if class_body {
                self.finish_statement();
            }
            MemberKind::Method {
                type_params,
                params,
                returns,
            }
        } else if self.eat(&Token::Colon) {
            let ty = self.parse_type()?;
            if self.eat(&Token::Eq) {
                self.skip_expression();
            }
            MemberKind::Property(ty)
        } else {
            if self.eat(&Token::Eq) {
                self.skip_expression();
            }
            MemberKind::Property(TypeExpr::Keyword("any".to_string()))
        };

        if hidden {
            return Ok(None);
        }
        Ok(Some(Member {
            name,
            doc,
            optional,
            kind,
        }))
    }

    fn skip_member_tail(&mut self) -> PResult<()> {
        if self.at(&Token::LParen) || self.at(&Token::Lt) {
            self.parse_type_params()?;
            self.parse_params()?;
        }
        if self.eat(&Token::Colon) {
            self.parse_type()?;
        }
        Ok(())
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    fn parse_type_params(&mut self) -> PResult<Vec<TypeParam>> {
        if !self.eat(&Token::Lt) {
            return Ok(Vec::new());
        }
        let mut params = Vec::new();
        while !self.eat(&Token::Gt) {
            while ["const", "in", "out"].iter().any(|m| self.at_ident(m))
                && matches!(self.peek_nth(1), Some(Token::Ident(_)))
            {
                self.pos += 1;
            }
            let name = self.ident()?;
            let constraint = if self.eat_ident("extends") {
                Some(self.parse_type()?)
            } else {
                None
            };
            let default = if self.eat(&Token::Eq) {
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(TypeParam {
                name,
                constraint,
                default,
            });
            if !self.eat(&Token::Comma) && !self.at(&Token::Gt) {
                return Err(format!(
                    "expected ',' or '>' in type parameters, found {}",
                    self.describe()
                ));
            }
        }
        Ok(params)
    }

    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        self.expect(&Token::LParen, "'('")?;
        let mut params = Vec::new();
        while !self.eat(&Token::RParen) {
            if self.peek().is_none() {
                return Err("unterminated parameter list".to_string());
            }
            while ["public", "private", "protected", "readonly", "override"]
                .iter()
                .any(|m| self.at_ident(m))
                && matches!(self.peek_nth(1), Some(Token::Ident(_) | Token::LBrace))
            {
                self.pos += 1;
            }
            let rest = self.eat(&Token::Ellipsis);
            let (name, destructured) = match self.peek() {
                Some(Token::LBrace | Token::LBracket) => {
                    self.skip_balanced();
                    (String::new(), true)
                }
                _ => (self.ident()?, false),
            };
            let optional = self.eat(&Token::Question);
            let ty = if self.eat(&Token::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            let has_default = self.eat(&Token::Eq);
            if has_default {
                self.skip_expression();
            }
            params.push(Param {
                name,
                ty,
                optional: optional || has_default,
                rest,
                destructured,
            });
            if !self.eat(&Token::Comma) && !self.at(&Token::RParen) {
                return Err(format!(
                    "expected ',' or ')' in parameters, found {}",
                    self.describe()
                ));
            }
        }
        Ok(params)
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Return position: also accepts type predicates (`x is T`, `asserts x`).
    fn parse_return_type(&mut self) -> PResult<TypeExpr> {
        if self.at_ident("asserts") && matches!(self.peek_nth(1), Some(Token::Ident(_))) {
            self.pos += 2;
            if self.eat_ident("is") {
                self.parse_type()?;
            }
            return Ok(TypeExpr::Keyword("void".to_string()));
        }
        if matches!(self.peek(), Some(Token::Ident(_))) && self.nth_is_ident(1, "is") {
            self.pos += 2;
            self.parse_type()?;
            return Ok(TypeExpr::Keyword("boolean".to_string()));
        }
        self.parse_type()
    }

    fn parse_type(&mut self) -> PResult<TypeExpr> {
        self.nested(|p| {
            let start = p.pos;
            let ty = p.parse_union()?;
            if p.at_ident("extends") {
                // Conditional type: keep as opaque text
                p.pos += 1;
                p.parse_union()?;
                p.expect(&Token::Question, "'?' in conditional type")?;
                p.parse_type()?;
                p.expect(&Token::Colon, "':' in conditional type")?;
                p.parse_type()?;
                return Ok(TypeExpr::Opaque(p.text_from(start)));
            }
            Ok(ty)
        })
    }

    fn parse_union(&mut self) -> PResult<TypeExpr> {
        self.eat(&Token::Pipe);
        let first = self.parse_intersection()?;
        if !self.at(&Token::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(&Token::Pipe) {
            members.push(self.parse_intersection()?);
        }
        Ok(TypeExpr::Union(members))
    }

    fn parse_intersection(&mut self) -> PResult<TypeExpr> {
        self.eat(&Token::Amp);
        let first = self.parse_type_operator()?;
        if !self.at(&Token::Amp) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(&Token::Amp) {
            members.push(self.parse_type_operator()?);
        }
        Ok(TypeExpr::Intersection(members))
    }

    fn parse_type_operator(&mut self) -> PResult<TypeExpr> {
        if self.at_ident("keyof") && self.peek_nth(1).is_some() {
            self.pos += 1;
            let inner = self.nested(Self::parse_type_operator)?;
            return Ok(TypeExpr::Keyof(Box::new(inner)));
        }
        if self.at_ident("readonly")
            && matches!(
                self.peek_nth(1),
                Some(Token::Ident(_) | Token::LBracket | Token::LParen)
            )
        {
            self.pos += 1;
            return self.nested(Self::parse_type_operator);
        }
        if self.at_ident("unique") && self.nth_is_ident(1, "symbol") {
            self.pos += 2;
            return Ok(TypeExpr::Keyword("symbol".to_string()));
        }
        if self.at_ident("infer") && matches!(self.peek_nth(1), Some(Token::Ident(_))) {
            let start = self.pos;
            self.pos += 2;
            return Ok(TypeExpr::Opaque(self.text_from(start)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<TypeExpr> {
        let mut ty = self.parse_primary()?;
        while self.at(&Token::LBracket) {
            if self.peek_nth(1) == Some(&Token::RBracket) {
                self.pos += 2;
                ty = TypeExpr::Array(Box::new(ty));
            } else {
                self.pos += 1;
                let index = self.parse_type()?;
                self.expect(&Token::RBracket, "']' in indexed access")?;
                ty = TypeExpr::IndexedAccess {
                    object: Box::new(ty),
                    index: Box::new(index),
                };
            }
        }
        Ok(ty)
    }

    fn parse_primary(&mut self) -> PResult<TypeExpr> {
        let Some(token) = self.peek().cloned() else {
            return Err("unexpected end of file in type".to_string());
        };
        match token {
            Token::LParen => {
                if self.is_function_type_start() {
                    self.parse_function_type(Vec::new())
                } else {
                    self.pos += 1;
                    let inner = self.parse_type()?;
                    self.expect(&Token::RParen, "')'")?;
                    Ok(inner)
                }
            }
            Token::Lt => {
                let type_params = self.parse_type_params()?;
                self.parse_function_type(type_params)
            }
            Token::LBrace => self.parse_object_type(),
            Token::LBracket => self.parse_tuple(),
            Token::Str(s) => {
                self.pos += 1;
                Ok(TypeExpr::StringLiteral(s))
            }
            Token::Template(t) => {
                self.pos += 1;
                Ok(TypeExpr::TemplateLiteral(t))
            }
            Token::Number(n) => {
                self.pos += 1;
                Ok(TypeExpr::NumberLiteral(n))
            }
            Token::Minus => {
                self.pos += 1;
                match self.peek() {
                    Some(Token::Number(n)) => {
                        let n = format!("-{n}");
                        self.pos += 1;
                        Ok(TypeExpr::NumberLiteral(n))
                    }
                    _ => Err(format!("expected number after '-', found {}", self.describe())),
                }
            }
            Token::Ident(word) => self.parse_named_type(&word),
            _ => Err(format!("unexpected {} in type", self.describe())),
        }
    }

    fn parse_named_type(&mut self, word: &str) -> PResult<TypeExpr> {
        match word {
            "typeof" => {
                self.pos += 1;
                let name = if self.at_ident("import") {
                    self.parse_import_path()?
                } else {
                    self.qualified_name()?
                };
                if self.at(&Token::Lt) {
                    self.parse_type_args()?;
                }
                Ok(TypeExpr::TypeQuery(name))
            }
            "new" | "abstract"
                if word == "new" || self.nth_is_ident(1, "new") =>
            {
                let start = self.pos;
                self.eat_ident("abstract");
                self.eat_ident("new");
                self.parse_type_params()?;
                self.parse_params()?;
                self.expect(&Token::Arrow, "'=>' in constructor type")?;
                self.parse_return_type()?;
                Ok(TypeExpr::Opaque(self.text_from(start)))
            }
            "true" | "false" => {
                self.pos += 1;
                Ok(TypeExpr::BooleanLiteral(word == "true"))
            }
            "import" if self.peek_nth(1) == Some(&Token::LParen) => {
                let name = self.parse_import_path()?;
                let args = if self.at(&Token::Lt) {
                    self.parse_type_args()?
                } else {
                    Vec::new()
                };
                Ok(TypeExpr::Reference { name, args })
            }
            w if TYPE_KEYWORDS.contains(&w) => {
                self.pos += 1;
                Ok(TypeExpr::Keyword(w.to_string()))
            }
            _ => {
                let name = self.qualified_name()?;
                let args = if self.at(&Token::Lt) {
                    self.parse_type_args()?
                } else {
                    Vec::new()
                };
                Ok(TypeExpr::Reference { name, args })
            }
        }
    }

    /// `import("module").A.B` -> `A.B`
    fn parse_import_path(&mut self) -> PResult<String> {
        self.pos += 1;
        self.expect(&Token::LParen, "'(' after import")?;
        match self.peek() {
            Some(Token::Str(_)) => self.pos += 1,
            _ => return Err(format!("expected module path, found {}", self.describe())),
        }
        self.expect(&Token::RParen, "')' after module path")?;
        let mut parts = Vec::new();
        while self.eat(&Token::Dot) {
            parts.push(self.ident()?);
        }
        if parts.is_empty() {
            return Err("expected member after import(...)".to_string());
        }
        Ok(parts.join("."))
    }

    fn qualified_name(&mut self) -> PResult<String> {
        let mut name = self.ident()?;
        while self.at(&Token::Dot) && matches!(self.peek_nth(1), Some(Token::Ident(_))) {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.ident()?);
        }
        Ok(name)
    }

    fn parse_type_args(&mut self) -> PResult<Vec<TypeExpr>> {
        self.expect(&Token::Lt, "'<'")?;
        let mut args = Vec::new();
        while !self.eat(&Token::Gt) {
            args.push(self.parse_type()?);
            if !self.eat(&Token::Comma) && !self.at(&Token::Gt) {
                return Err(format!(
                    "expected ',' or '>' in type arguments, found {}",
                    self.describe()
                ));
            }
        }
        Ok(args)
    }

    /// At `(`: is this the parameter list of a function type?
    fn is_function_type_start(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(token) = self.tokens.get(i).map(|t| &t.value) {
            match token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.tokens.get(i + 1).map(|t| &t.value) == Some(&Token::Arrow);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_function_type(&mut self, type_params: Vec<TypeParam>) -> PResult<TypeExpr> {
        let params = self.parse_params()?;
        self.expect(&Token::Arrow, "'=>' in function type")?;
        let returns = self.nested(Self::parse_return_type)?;
        Ok(TypeExpr::Function {
            type_params,
            params,
            returns: Box::new(returns),
        })
    }

    fn parse_object_type(&mut self) -> PResult<TypeExpr> {
        // Mapped types: `{ [K in X]: Y }`
        let mut i = 1;
        while matches!(self.peek_nth(i), Some(Token::Plus | Token::Minus))
            || self.nth_is_ident(i, "readonly")
        {
            i += 1;
        }
        if self.peek_nth(i) == Some(&Token::LBracket)
            && matches!(self.peek_nth(i + 1), Some(Token::Ident(_)))
            && self.nth_is_ident(i + 2, "in")
        {
            let start = self.pos;
            self.skip_balanced();
            return Ok(TypeExpr::Opaque(self.text_from(start)));
        }
        let members = self.parse_object_members()?;
        Ok(TypeExpr::Object(members))
    }

    fn parse_tuple(&mut self) -> PResult<TypeExpr> {
        self.expect(&Token::LBracket, "'['")?;
        let mut items = Vec::new();
        while !self.eat(&Token::RBracket) {
            self.eat(&Token::Ellipsis);
            // Labelled elements: `name: T` / `name?: T`
            let labelled = matches!(self.peek(), Some(Token::Ident(_)))
                && (self.peek_nth(1) == Some(&Token::Colon)
                    || (self.peek_nth(1) == Some(&Token::Question)
                        && self.peek_nth(2) == Some(&Token::Colon)));
            if labelled {
                self.pos += 1;
                self.eat(&Token::Question);
                self.pos += 1;
            }
            items.push(self.parse_type()?);
            self.eat(&Token::Question);
            if !self.eat(&Token::Comma) && !self.at(&Token::RBracket) {
                return Err(format!("expected ',' or ']' in tuple, found {}", self.describe()));
            }
        }
        Ok(TypeExpr::Tuple(items))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::parser::syntax::Emit;

    fn parse(source: &str) -> SourceFile {
        let file = parse_source("test.d.ts", source).unwrap();
        assert!(file.errors.is_empty(), "unexpected errors: {:?}", file.errors);
        file
    }

    fn type_of(source: &str) -> String {
        let file = parse(&format!("type T = {source};"));
        match &file.declarations[0].kind {
            DeclKind::TypeAlias { ty, .. } => ty.emit(),
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn test_function_with_doc() {
        let file = parse(
            "/**\n * Device id.\n * @returns the id\n */\nexport declare function getDeviceId(): string;",
        );
        let decl = &file.declarations[0];
        assert_eq!(decl.name, "getDeviceId");
        assert!(decl.exported);
        assert_eq!(decl.line, 5);
        assert_eq!(
            decl.doc.as_ref().unwrap().returns.as_deref(),
            Some("the id")
        );
        match &decl.kind {
            DeclKind::Function { params, returns, .. } => {
                assert!(params.is_empty());
                assert_eq!(returns.emit(), "string");
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_const_namespace_object() {
        let file = parse(
            "export declare const Storage: {\n  /** Reads */\n  getItem: typeof getItem;\n  setItem(key: string, value: string): Promise<void>;\n  readonly version: string;\n};",
        );
        let decl = &file.declarations[0];
        let DeclKind::Variable { ty: Some(TypeExpr::Object(members)) } = &decl.kind else {
            panic!("expected object variable, got {:?}", decl.kind);
        };
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["getItem", "setItem", "version"]);
        assert_eq!(
            members[0].doc.as_ref().unwrap().description.as_deref(),
            Some("Reads")
        );
        assert_eq!(
            members[1].value_type().unwrap().emit(),
            "(key: string, value: string) => Promise<void>"
        );
    }

    #[test]
    fn test_type_expressions() {
        assert_eq!(type_of("'a' | 'b'"), "\"a\" | \"b\"");
        assert_eq!(type_of("Array<{ x: number }>"), "Array<{ x: number; }>");
        assert_eq!(type_of("(() => void)[]"), "(() => void)[]");
        assert_eq!(type_of("string | null"), "string | null");
        assert_eq!(type_of("A & { b?: B }"), "A & { b?: B; }");
        assert_eq!(type_of("import(\"./x\").Foo<string>"), "Foo<string>");
        assert_eq!(type_of("Parameters<typeof f>[0]"), "Parameters<typeof f>[0]");
        assert_eq!(type_of("[string, number?]"), "[string, number]");
        assert_eq!(
            type_of("<K extends keyof E>(event: K, handler: E[K]) => () => void"),
            "<K extends keyof E>(event: K, handler: E[K]) => () => void"
        );
    }

    #[test]
    fn test_conditional_and_mapped_types_are_opaque() {
        assert_eq!(
            type_of("T extends string ? A : B"),
            "T extends string ? A : B"
        );
        assert_eq!(type_of("{ [K in Keys]: V }"), "{ [K in Keys]: V }");
    }

    #[test]
    fn test_destructured_param_and_defaults() {
        let file = parse(
            "export declare function contactsViral({ options, onEvent }: Params, retry?: number): () => void;",
        );
        let DeclKind::Function { params, .. } = &file.declarations[0].kind else {
            panic!("expected function");
        };
        assert!(params[0].destructured);
        assert!(params[1].optional);
        assert_eq!(params[1].name, "retry");
    }

    #[test]
    fn test_interface_enum_and_class() {
        let file = parse(
            "export interface A extends B<C> { a: string; b?: number; [key: string]: unknown }\n\
             export declare enum Level { Low = 0, High = 1 }\n\
             export declare class BackEvent extends GraniteEventDefinition<void, void> {\n  name: \"backEvent\";\n  private constructor();\n  remove(): void;\n  listener(_: void): void;\n}",
        );
        assert_eq!(file.declarations.len(), 3);
        let DeclKind::Interface { extends, members, .. } = &file.declarations[0].kind else {
            panic!("expected interface");
        };
        assert_eq!(extends[0].emit(), "B<C>");
        assert_eq!(members.len(), 3);
        let DeclKind::Enum { members } = &file.declarations[1].kind else {
            panic!("expected enum");
        };
        assert_eq!(members[1].init.as_deref(), Some("1"));
        let DeclKind::Class { extends, members } = &file.declarations[2].kind else {
            panic!("expected class");
        };
        assert_eq!(
            extends.as_ref().unwrap().emit(),
            "GraniteEventDefinition<void, void>"
        );
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["name", "remove", "listener"]);
    }

    #[test]
    fn test_skips_imports_reexports_and_globals() {
        let file = parse(
            "import { a } from './a';\nexport { b } from './b';\nexport * from './c';\n\
             declare global { interface Window { x: number } }\n\
             declare namespace Inner { function f(): void; }\nexport default foo;",
        );
        assert_eq!(file.declarations.len(), 1);
        assert_eq!(file.declarations[0].name, "f");
    }

    #[test]
    fn test_error_recovery_keeps_following_declarations() {
        let file = parse_source(
            "broken.d.ts",
            "export declare const a: ;\nexport declare function ok(): void;",
        )
        .unwrap();
        assert_eq!(file.errors.len(), 1);
        assert_eq!(file.errors[0].0, 1);
        assert_eq!(file.declarations.len(), 1);
        assert_eq!(file.declarations[0].name, "ok");
    }

    #[test]
    fn test_multiline_reexports() {
        let file = parse(
            "import {\n  a,\n  b,\n} from './a';\nexport {\n  c,\n} from './c'\nexport declare function f(): void;",
        );
        assert_eq!(file.declarations.len(), 1);
        assert_eq!(file.declarations[0].name, "f");
    }

    #[test]
    fn test_recovery_stops_at_next_statement() {
        let file = parse_source(
            "broken.d.ts",
            "export declare function broken(: void\nexport declare const VERSION: string;\n\
             declare namespace N {\n  function bad(: void;\n  function ok(): void;\n}",
        )
        .unwrap();
        assert_eq!(file.errors.len(), 2, "{:?}", file.errors);
        let names: Vec<&str> = file.declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["VERSION", "ok"]);
    }

    #[test]
    fn test_type_predicate_return() {
        let file = parse("export declare function isFoo(v: unknown): v is Foo;");
        let DeclKind::Function { returns, .. } = &file.declarations[0].kind else {
            panic!("expected function");
        };
        assert_eq!(returns.emit(), "boolean");
    }
}
