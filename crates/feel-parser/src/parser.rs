//! FEEL parser - hand-written recursive descent.
//!
//! Precedence, loosest first:
//! textual forms (`if`, `for`, `some`/`every`, `function`), `or`, `and`,
//! comparison (`= != < <= > >=`, `between`, `in`, `instance of`), `+ -`,
//! `* /`, `**`, unary minus, postfix (filter, path, invocation), primary.
//!
//! FEEL names may contain spaces and keywords (`date and time`). The parser
//! runs in optimistic mode first, where a run of words merges into one name
//! only when the joined text is a known name. If that fails it retries in
//! full mode, where any run of adjacent plain identifiers forms one name.

use std::collections::HashSet;

use feel_core::ast::InfixOp;
use feel_core::{FType, SourceSpan};

use crate::error::{ParseError, Result};
use crate::lexer::{self, SpannedToken, Token};
use crate::syntax::{Arguments, IterationSyntax, Syntax, SyntaxKind, TypeRef};

/// Longest multi-word name tried when merging words
const MAX_NAME_WORDS: usize = 6;

/// Multi-word members every range exposes
const RANGE_MEMBERS: &[&str] = &["start included", "end included"];

/// How multi-word names are recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMode {
    /// Merge words only into known names
    Optimistic,
    /// Also merge any run of adjacent plain identifiers
    Full,
}

/// Parse a FEEL expression.
///
/// `known_names` lists names visible to the expression (inputs, functions,
/// provider types) so that multi-word names can be recognized.
pub fn parse_expression(source: &str, known_names: &HashSet<String>) -> Result<Syntax> {
    parse_with_fallback(source, known_names, |p| p.parse_expression_root())
}

/// Parse a comma-separated list of FEEL unary tests, `-`, or `not(...)`.
pub fn parse_unary_tests(source: &str, known_names: &HashSet<String>) -> Result<Syntax> {
    parse_with_fallback(source, known_names, |p| p.parse_unary_tests_root())
}

fn parse_with_fallback(
    source: &str,
    known_names: &HashSet<String>,
    rule: fn(&mut Parser<'_>) -> Result<Syntax>,
) -> Result<Syntax> {
    let (tokens, comments) = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser::new(
        source,
        &tokens,
        comments.clone(),
        known_names,
        PredictionMode::Optimistic,
    );
    match rule(&mut parser) {
        Ok(tree) => Ok(tree),
        Err(first) => {
            log::debug!(
                "optimistic parse of '{}' failed ({}), retrying in full mode",
                source,
                first
            );
            let mut parser =
                Parser::new(source, &tokens, comments, known_names, PredictionMode::Full);
            rule(&mut parser)
        }
    }
}

/// Lex `source`, separating comments from the token stream.
///
/// `comments[i]` holds the comments that precede token `i`; the final slot
/// holds trailing comments.
fn tokenize(source: &str) -> Result<(Vec<SpannedToken>, Vec<Vec<String>>)> {
    let lexed =
        lexer::lex(source).map_err(|e| ParseError::at(source, e.span.start, e.message))?;

    let mut tokens = Vec::with_capacity(lexed.len());
    let mut comments = vec![Vec::new()];
    for (token, span) in lexed {
        match token {
            Token::Comment(text) => {
                if let Some(slot) = comments.last_mut() {
                    slot.push(text);
                }
            }
            other => {
                tokens.push((other, span));
                comments.push(Vec::new());
            }
        }
    }
    Ok((tokens, comments))
}

/// Recursive descent parser for FEEL.
pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: &'a [SpannedToken],
    comments: Vec<Vec<String>>,
    pos: usize,
    mode: PredictionMode,
    /// Known multi-word names, including context keys and binders seen so far
    known: HashSet<String>,
    /// Set while parsing the end of an interval, where `[` closes the interval
    interval_end: bool,
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        tokens: &'a [SpannedToken],
        comments: Vec<Vec<String>>,
        known_names: &HashSet<String>,
        mode: PredictionMode,
    ) -> Self {
        let known = known_names
            .iter()
            .filter(|name| name.contains(' '))
            .cloned()
            .chain(RANGE_MEMBERS.iter().map(|m| m.to_string()))
            .collect();
        Self {
            source,
            tokens,
            comments,
            pos: 0,
            mode,
            known,
            interval_end: false,
        }
    }

    // === Utility Methods ===

    /// Peek at the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(t, _)| t)
    }

    /// Byte offset where the current token starts.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| s.start)
            .unwrap_or(self.source.len())
    }

    /// Byte offset where the previous token ends.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, s)| s.end)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek().map_or(false, |t| t == token)
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.match_token(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found {}", token, self.found())))
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn found(&self) -> String {
        match self.peek() {
            Some(token) => format!("'{}'", token),
            None => "end of input".to_string(),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(self.source, self.offset(), message)
    }

    fn span_from(&self, start: usize) -> SourceSpan {
        SourceSpan::from_offsets(self.source, start, self.prev_end().max(start))
    }

    fn node(&self, kind: SyntaxKind, start: usize) -> Syntax {
        Syntax::new(kind, self.span_from(start))
    }

    fn take_comments(&mut self) -> Vec<String> {
        self.comments
            .get_mut(self.pos)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    fn word_at(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).and_then(|(t, _)| t.word())
    }

    fn remember(&mut self, name: &str) {
        if name.contains(' ') {
            self.known.insert(name.to_string());
        }
    }

    // === Roots ===

    fn parse_expression_root(&mut self) -> Result<Syntax> {
        let mut tree = self.parse_expression()?;
        if !self.at_end() {
            return Err(self.error(format!("unexpected {}", self.found())));
        }
        let trailing = self.take_comments();
        tree.comments.extend(trailing);
        Ok(tree)
    }

    fn parse_unary_tests_root(&mut self) -> Result<Syntax> {
        let start = self.offset();

        if self.tokens.len() == 1 && self.check(&Token::Minus) {
            self.advance();
            return Ok(self.node(SyntaxKind::Dash, start));
        }

        if matches!(self.peek(), Some(Token::Name(n)) if n == "not")
            && self.peek_at(1) == Some(&Token::LParen)
        {
            let saved = (self.pos, self.comments.clone());
            self.pos += 2;
            if let Ok(tests) = self.parse_positive_tests() {
                if self.match_token(&Token::RParen) && self.at_end() {
                    return Ok(self.node(
                        SyntaxKind::UnaryTests {
                            negated: true,
                            tests,
                        },
                        start,
                    ));
                }
            }
            self.pos = saved.0;
            self.comments = saved.1;
        }

        let tests = self.parse_positive_tests()?;
        if !self.at_end() {
            return Err(self.error(format!("unexpected {}", self.found())));
        }
        Ok(self.node(
            SyntaxKind::UnaryTests {
                negated: false,
                tests,
            },
            start,
        ))
    }

    fn parse_positive_tests(&mut self) -> Result<Vec<Syntax>> {
        let mut tests = vec![self.parse_positive_test()?];
        while self.match_token(&Token::Comma) {
            tests.push(self.parse_positive_test()?);
        }
        Ok(tests)
    }

    fn parse_positive_test(&mut self) -> Result<Syntax> {
        let start = self.offset();
        let op = match self.peek() {
            Some(Token::Lt) => Some(InfixOp::Lt),
            Some(Token::Le) => Some(InfixOp::Le),
            Some(Token::Gt) => Some(InfixOp::Gt),
            Some(Token::Ge) => Some(InfixOp::Ge),
            Some(Token::Eq) => Some(InfixOp::Eq),
            Some(Token::Ne) => Some(InfixOp::Ne),
            Some(Token::Minus)
                if matches!(self.peek_at(1), None | Some(Token::Comma | Token::RParen)) =>
            {
                self.advance();
                return Ok(self.node(SyntaxKind::Dash, start));
            }
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let value = self.parse_additive()?;
                Ok(self.node(
                    SyntaxKind::UnaryComparison {
                        op,
                        value: value.boxed(),
                    },
                    start,
                ))
            }
            None => self.parse_expression(),
        }
    }

    // === Textual Expressions ===

    fn parse_expression(&mut self) -> Result<Syntax> {
        match self.peek() {
            Some(Token::If) => self.parse_if(),
            Some(Token::For) => self.parse_for(),
            Some(Token::Some | Token::Every) => self.parse_quantified(),
            Some(Token::Function) => self.parse_function_definition(),
            _ => self.parse_disjunction(),
        }
    }

    fn parse_if(&mut self) -> Result<Syntax> {
        let start = self.offset();
        let comments = self.take_comments();
        self.expect(&Token::If)?;
        let condition = self.parse_expression()?;
        self.expect(&Token::Then)?;
        let then = self.parse_expression()?;
        self.expect(&Token::Else)?;
        let otherwise = self.parse_expression()?;
        let mut node = self.node(
            SyntaxKind::If {
                condition: condition.boxed(),
                then: then.boxed(),
                otherwise: otherwise.boxed(),
            },
            start,
        );
        node.comments = comments;
        Ok(node)
    }

    fn parse_for(&mut self) -> Result<Syntax> {
        let start = self.offset();
        let comments = self.take_comments();
        self.expect(&Token::For)?;
        let iterators = self.parse_iterations()?;
        self.expect(&Token::Return)?;
        let body = self.parse_expression()?;
        let mut node = self.node(
            SyntaxKind::For {
                iterators,
                body: body.boxed(),
            },
            start,
        );
        node.comments = comments;
        Ok(node)
    }

    fn parse_quantified(&mut self) -> Result<Syntax> {
        let start = self.offset();
        let comments = self.take_comments();
        let every = self.check(&Token::Every);
        self.advance();
        let iterators = self.parse_iterations()?;
        self.expect(&Token::Satisfies)?;
        let condition = self.parse_expression()?;
        let mut node = self.node(
            SyntaxKind::Quantified {
                every,
                iterators,
                condition: condition.boxed(),
            },
            start,
        );
        node.comments = comments;
        Ok(node)
    }

    fn parse_iterations(&mut self) -> Result<Vec<IterationSyntax>> {
        let mut iterators = Vec::new();
        loop {
            let name = self.parse_binder(&[Token::In])?;
            self.expect(&Token::In)?;
            let domain = self.parse_expression()?;
            let end = if self.match_token(&Token::DotDot) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            self.remember(&name);
            iterators.push(IterationSyntax { name, domain, end });
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        Ok(iterators)
    }

    fn parse_function_definition(&mut self) -> Result<Syntax> {
        let start = self.offset();
        let comments = self.take_comments();
        self.expect(&Token::Function)?;
        self.expect(&Token::LParen)?;

        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let name = self.parse_binder(&[Token::Colon, Token::Comma, Token::RParen])?;
                let annotation = if self.match_token(&Token::Colon) {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                self.remember(&name);
                params.push((name, annotation));
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;

        let body = self.parse_expression()?;
        let mut node = self.node(
            SyntaxKind::FunctionDefinition {
                params,
                body: body.boxed(),
            },
            start,
        );
        node.comments = comments;
        Ok(node)
    }

    /// A declared name: every word up to one of the `stops` tokens.
    fn parse_binder(&mut self, stops: &[Token]) -> Result<String> {
        let mut words: Vec<String> = Vec::new();
        while let Some(token) = self.peek() {
            if stops.contains(token) {
                break;
            }
            match token.word() {
                Some(word) => words.push(word.to_string()),
                None => break,
            }
            self.pos += 1;
        }
        if words.is_empty() {
            return Err(self.error(format!("expected a name, found {}", self.found())));
        }
        Ok(words.join(" "))
    }

    // === Binary Operators ===

    fn binary(op: InfixOp, left: Syntax, right: Syntax) -> Syntax {
        let span = left.span.merge(&right.span);
        Syntax::new(
            SyntaxKind::Binary {
                op,
                left: left.boxed(),
                right: right.boxed(),
            },
            span,
        )
    }

    fn parse_disjunction(&mut self) -> Result<Syntax> {
        let mut left = self.parse_conjunction()?;
        while self.match_token(&Token::Or) {
            let right = self.parse_conjunction()?;
            left = Self::binary(InfixOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_conjunction(&mut self) -> Result<Syntax> {
        let mut left = self.parse_comparison()?;
        while self.match_token(&Token::And) {
            let right = self.parse_comparison()?;
            left = Self::binary(InfixOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Syntax> {
        let start = self.offset();
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.peek() {
                Some(Token::Eq) => InfixOp::Eq,
                Some(Token::Ne) => InfixOp::Ne,
                Some(Token::Lt) => InfixOp::Lt,
                Some(Token::Le) => InfixOp::Le,
                Some(Token::Gt) => InfixOp::Gt,
                Some(Token::Ge) => InfixOp::Ge,
                Some(Token::Between) => {
                    self.advance();
                    let low = self.parse_additive()?;
                    self.expect(&Token::And)?;
                    let high = self.parse_additive()?;
                    left = self.node(
                        SyntaxKind::Between {
                            value: left.boxed(),
                            low: low.boxed(),
                            high: high.boxed(),
                        },
                        start,
                    );
                    continue;
                }
                Some(Token::In) => {
                    self.advance();
                    let tests = self.parse_in_tests()?;
                    left = self.node(
                        SyntaxKind::In {
                            value: left.boxed(),
                            tests,
                        },
                        start,
                    );
                    continue;
                }
                Some(Token::Instance) => {
                    self.advance();
                    self.expect(&Token::Of)?;
                    let target = self.parse_type()?;
                    left = self.node(
                        SyntaxKind::InstanceOf {
                            value: left.boxed(),
                            target,
                        },
                        start,
                    );
                    continue;
                }
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Self::binary(op, left, right);
        }

        Ok(left)
    }

    /// Right-hand side of `in`: one positive unary test, a parenthesized list
    /// of them, or an interval opened with `(`.
    fn parse_in_tests(&mut self) -> Result<Vec<Syntax>> {
        if !self.check(&Token::LParen) {
            return Ok(vec![self.parse_positive_test()?]);
        }

        let start = self.offset();
        self.advance();
        let first = self.parse_positive_test()?;
        if self.match_token(&Token::DotDot) {
            let end = self.parse_interval_end()?;
            let end_inclusive = self.parse_interval_close()?;
            let interval = self.node(
                SyntaxKind::Interval {
                    start: first.boxed(),
                    end: end.boxed(),
                    start_inclusive: false,
                    end_inclusive,
                },
                start,
            );
            return Ok(vec![interval]);
        }

        let mut tests = vec![first];
        while self.match_token(&Token::Comma) {
            tests.push(self.parse_positive_test()?);
        }
        self.expect(&Token::RParen)?;
        Ok(tests)
    }

    fn parse_additive(&mut self) -> Result<Syntax> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => InfixOp::Add,
                Some(Token::Minus) => InfixOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Syntax> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => InfixOp::Mul,
                Some(Token::Slash) => InfixOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<Syntax> {
        let mut left = self.parse_unary()?;
        while self.match_token(&Token::Pow) {
            let right = self.parse_unary()?;
            left = Self::binary(InfixOp::Pow, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Syntax> {
        if !self.check(&Token::Minus) {
            return self.parse_postfix();
        }

        let start = self.offset();
        let mut comments = self.take_comments();
        self.advance();
        if let Some(Token::Number(n)) = self.peek() {
            // Fold the sign into a literal so `-1` keeps its literal type
            let literal = format!("-{}", n);
            comments.extend(self.take_comments());
            self.advance();
            let mut node = self.node(SyntaxKind::Number(literal), start);
            node.comments = comments;
            return self.parse_postfix_tail(node);
        }
        let operand = self.parse_unary()?;
        let mut node = self.node(SyntaxKind::Negation(operand.boxed()), start);
        node.comments = comments;
        Ok(node)
    }

    // === Postfix ===

    fn parse_postfix(&mut self) -> Result<Syntax> {
        let primary = self.nested(Self::parse_primary)?;
        self.parse_postfix_tail(primary)
    }

    /// Run `rule` inside delimiters, where `[` starts a filter again
    fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let outer = std::mem::replace(&mut self.interval_end, false);
        let result = rule(self);
        self.interval_end = outer;
        result
    }

    /// Upper bound of an interval; a `[` after it closes the interval
    fn parse_interval_end(&mut self) -> Result<Syntax> {
        let outer = std::mem::replace(&mut self.interval_end, true);
        let result = self.parse_expression();
        self.interval_end = outer;
        result
    }

    fn parse_postfix_tail(&mut self, mut expr: Syntax) -> Result<Syntax> {
        let start = expr.span.start;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    let member = self.parse_name()?;
                    expr = self.node(
                        SyntaxKind::Path {
                            source: expr.boxed(),
                            member,
                        },
                        start,
                    );
                }
                Some(Token::LBracket) if !self.interval_end => {
                    self.advance();
                    let filter = self.parse_expression()?;
                    self.expect(&Token::RBracket)?;
                    expr = self.node(
                        SyntaxKind::Filter {
                            source: expr.boxed(),
                            filter: filter.boxed(),
                        },
                        start,
                    );
                }
                Some(Token::LParen) => {
                    let args = self.nested(Self::parse_arguments)?;
                    expr = self.node(
                        SyntaxKind::Invocation {
                            callee: expr.boxed(),
                            args,
                        },
                        start,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Arguments> {
        self.expect(&Token::LParen)?;
        if self.match_token(&Token::RParen) {
            return Ok(Arguments::Positional(Vec::new()));
        }

        if self.named_arguments_ahead() {
            let mut args = Vec::new();
            loop {
                let name = self.parse_binder(&[Token::Colon])?;
                self.expect(&Token::Colon)?;
                let value = self.parse_expression()?;
                args.push((name, value));
                if !self.match_token(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::RParen)?;
            return Ok(Arguments::Named(args));
        }

        let mut args = vec![self.parse_expression()?];
        while self.match_token(&Token::Comma) {
            args.push(self.parse_expression()?);
        }
        self.expect(&Token::RParen)?;
        Ok(Arguments::Positional(args))
    }

    /// True when the next tokens read `words :`.
    fn named_arguments_ahead(&self) -> bool {
        let mut index = self.pos;
        while self.word_at(index).is_some() {
            index += 1;
        }
        index > self.pos && matches!(self.tokens.get(index), Some((Token::Colon, _)))
    }

    // === Primary ===

    fn parse_primary(&mut self) -> Result<Syntax> {
        let start = self.offset();
        let comments = self.take_comments();

        let kind = match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.advance();
                SyntaxKind::Number(n)
            }
            Some(Token::String(s)) => {
                self.advance();
                SyntaxKind::String(s)
            }
            Some(Token::True) => {
                self.advance();
                SyntaxKind::Boolean(true)
            }
            Some(Token::False) => {
                self.advance();
                SyntaxKind::Boolean(false)
            }
            Some(Token::Null) => {
                self.advance();
                SyntaxKind::Null
            }
            Some(Token::Question) => {
                self.advance();
                SyntaxKind::TestInput
            }
            Some(Token::At) => {
                self.advance();
                match self.peek().cloned() {
                    Some(Token::String(s)) => {
                        self.advance();
                        SyntaxKind::Temporal(s)
                    }
                    _ => {
                        return Err(self.error(format!(
                            "expected a string after '@', found {}",
                            self.found()
                        )))
                    }
                }
            }
            Some(Token::Name(_)) => SyntaxKind::Name(self.parse_name()?),
            Some(Token::LParen) => return self.parse_parenthesized(start, comments),
            Some(Token::LBracket) => self.parse_list_or_interval()?,
            Some(Token::RBracket) => {
                self.advance();
                let low = self.parse_expression()?;
                self.expect(&Token::DotDot)?;
                let high = self.parse_interval_end()?;
                let end_inclusive = self.parse_interval_close()?;
                SyntaxKind::Interval {
                    start: low.boxed(),
                    end: high.boxed(),
                    start_inclusive: false,
                    end_inclusive,
                }
            }
            Some(Token::LBrace) => self.parse_context()?,
            Some(Token::If | Token::For | Token::Some | Token::Every | Token::Function) => {
                let node = self.parse_expression()?;
                return Ok(with_leading_comments(node, comments));
            }
            Some(_) => return Err(self.error(format!("unexpected {}", self.found()))),
            None => return Err(self.error("unexpected end of input")),
        };

        let mut node = self.node(kind, start);
        node.comments = comments;
        Ok(node)
    }

    /// A possibly multi-word name starting at the current token.
    fn parse_name(&mut self) -> Result<String> {
        let mut name = match self.peek().and_then(Token::word) {
            Some(word) => word.to_string(),
            None => return Err(self.error(format!("expected a name, found {}", self.found()))),
        };

        let mut consumed = 1;
        let mut candidate = name.clone();
        for k in 1..MAX_NAME_WORDS {
            let Some(word) = self.word_at(self.pos + k) else {
                break;
            };
            candidate.push(' ');
            candidate.push_str(word);
            if self.known.contains(&candidate) {
                name = candidate.clone();
                consumed = k + 1;
            }
        }
        self.pos += consumed;

        if self.mode == PredictionMode::Full {
            while let Some(Token::Name(word)) = self.peek() {
                name.push(' ');
                name.push_str(word);
                self.pos += 1;
            }
        }
        Ok(name)
    }

    /// `( expr )` or an interval opened with `(`
    fn parse_parenthesized(&mut self, start: usize, comments: Vec<String>) -> Result<Syntax> {
        self.expect(&Token::LParen)?;
        let inner = self.parse_expression()?;
        if self.match_token(&Token::DotDot) {
            let end = self.parse_interval_end()?;
            let end_inclusive = self.parse_interval_close()?;
            let kind = SyntaxKind::Interval {
                start: inner.boxed(),
                end: end.boxed(),
                start_inclusive: false,
                end_inclusive,
            };
            return Ok(with_leading_comments(self.node(kind, start), comments));
        }
        self.expect(&Token::RParen)?;
        Ok(with_leading_comments(inner, comments))
    }

    fn parse_list_or_interval(&mut self) -> Result<SyntaxKind> {
        self.expect(&Token::LBracket)?;
        if self.match_token(&Token::RBracket) {
            return Ok(SyntaxKind::List(Vec::new()));
        }

        let first = self.parse_expression()?;
        if self.match_token(&Token::DotDot) {
            let end = self.parse_interval_end()?;
            let end_inclusive = self.parse_interval_close()?;
            return Ok(SyntaxKind::Interval {
                start: first.boxed(),
                end: end.boxed(),
                start_inclusive: true,
                end_inclusive,
            });
        }

        let mut items = vec![first];
        while self.match_token(&Token::Comma) {
            items.push(self.parse_expression()?);
        }
        self.expect(&Token::RBracket)?;
        Ok(SyntaxKind::List(items))
    }

    /// Closing bracket of an interval; returns whether the end is inclusive.
    fn parse_interval_close(&mut self) -> Result<bool> {
        match self.peek() {
            Some(Token::RBracket) => {
                self.advance();
                Ok(true)
            }
            Some(Token::RParen | Token::LBracket) => {
                self.advance();
                Ok(false)
            }
            _ => Err(self.error(format!(
                "expected ']', ')' or '[' to close the interval, found {}",
                self.found()
            ))),
        }
    }

    fn parse_context(&mut self) -> Result<SyntaxKind> {
        self.expect(&Token::LBrace)?;
        let mut entries = Vec::new();
        if self.match_token(&Token::RBrace) {
            return Ok(SyntaxKind::Context(entries));
        }

        loop {
            let key = match self.peek().cloned() {
                Some(Token::String(s)) => {
                    self.advance();
                    s
                }
                _ => self.parse_binder(&[Token::Colon])?,
            };
            self.expect(&Token::Colon)?;
            self.remember(&key);
            let value = self.parse_expression()?;
            entries.push((key, value));
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(SyntaxKind::Context(entries))
    }

    // === Types ===

    fn parse_type(&mut self) -> Result<TypeRef> {
        if self.match_token(&Token::Function) {
            self.expect(&Token::Lt)?;
            let mut params = Vec::new();
            if !self.check(&Token::Gt) {
                loop {
                    params.push(self.parse_type()?);
                    if !self.match_token(&Token::Comma) {
                        break;
                    }
                }
            }
            self.expect(&Token::Gt)?;
            self.expect(&Token::Arrow)?;
            let ret = self.parse_type()?;
            return Ok(TypeRef::Function {
                params,
                ret: Box::new(ret),
            });
        }

        if self.match_token(&Token::Null) {
            return Ok(TypeRef::Named("null".to_string()));
        }

        let head = match self.peek().and_then(Token::word) {
            Some(word) => word.to_string(),
            None => return Err(self.error(format!("expected a type, found {}", self.found()))),
        };

        match head.as_str() {
            "list" if self.peek_at(1) == Some(&Token::Lt) => {
                self.pos += 2;
                let element = self.parse_type()?;
                self.expect(&Token::Gt)?;
                Ok(TypeRef::List(Box::new(element)))
            }
            "context" if self.peek_at(1) == Some(&Token::Lt) => {
                self.pos += 2;
                let mut fields = Vec::new();
                if !self.check(&Token::Gt) {
                    loop {
                        let name = self.parse_binder(&[Token::Colon])?;
                        self.expect(&Token::Colon)?;
                        fields.push((name, self.parse_type()?));
                        if !self.match_token(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::Gt)?;
                Ok(TypeRef::Context(fields))
            }
            "range" if self.range_type_ahead() => {
                self.pos += 1;
                let mut brackets = Vec::new();
                while let Some(
                    token @ (Token::LBracket | Token::RBracket | Token::LParen | Token::RParen),
                ) = self.peek()
                {
                    brackets.push(token.clone());
                    self.pos += 1;
                }
                let (start_inclusive, end_inclusive) = range_flags(&brackets);
                self.expect(&Token::Lt)?;
                let element = self.parse_type()?;
                self.expect(&Token::Gt)?;
                Ok(TypeRef::Range {
                    element: Box::new(element),
                    start_inclusive,
                    end_inclusive,
                })
            }
            _ => {
                // Longest run of words naming a type
                let mut name = head.clone();
                let mut consumed = 1;
                let mut candidate = head;
                for k in 1..MAX_NAME_WORDS {
                    let Some(word) = self.word_at(self.pos + k) else {
                        break;
                    };
                    candidate.push(' ');
                    candidate.push_str(word);
                    if FType::by_name(&candidate).is_some() || self.known.contains(&candidate) {
                        name = candidate.clone();
                        consumed = k + 1;
                    }
                }
                self.pos += consumed;
                Ok(TypeRef::Named(name))
            }
        }
    }

    /// `range` followed by up to two brackets and `<`
    fn range_type_ahead(&self) -> bool {
        let mut offset = 1;
        while offset <= 3 {
            match self.peek_at(offset) {
                Some(Token::Lt) => return true,
                Some(Token::LBracket | Token::RBracket | Token::LParen | Token::RParen) => {
                    offset += 1
                }
                _ => return false,
            }
        }
        false
    }
}

fn with_leading_comments(mut node: Syntax, mut comments: Vec<String>) -> Syntax {
    comments.append(&mut node.comments);
    node.comments = comments;
    node
}

/// Inclusivity flags of a `range[)<T>` style type reference.
///
/// A single bracket constrains one side only: `[` and `(` the start,
/// `]` and `)` the end.
fn range_flags(brackets: &[Token]) -> (Option<bool>, Option<bool>) {
    match brackets {
        [] => (None, None),
        [Token::LBracket] => (Some(true), None),
        [Token::LParen] => (Some(false), None),
        [Token::RBracket] => (None, Some(true)),
        [Token::RParen] => (None, Some(false)),
        [_] => (None, None),
        [first, second, ..] => (
            Some(*first == Token::LBracket),
            Some(*second == Token::RBracket),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn parse(source: &str) -> Syntax {
        parse_expression(source, &known(&["date and time"])).unwrap()
    }

    #[test]
    fn test_precedence() {
        let tree = parse("1 + 2 * 3");
        match tree.kind {
            SyntaxKind::Binary { op, right, .. } => {
                assert_eq!(op, InfixOp::Add);
                assert!(matches!(right.kind, SyntaxKind::Binary { op: InfixOp::Mul, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negative_literal_is_folded() {
        assert_eq!(parse("-1").kind, SyntaxKind::Number("-1".to_string()));
        assert!(matches!(parse("-a").kind, SyntaxKind::Negation(_)));
    }

    #[test]
    fn test_known_multi_word_name() {
        let tree = parse("date and time(\"2024-01-01T00:00:00\")");
        match tree.kind {
            SyntaxKind::Invocation { callee, args } => {
                assert_eq!(callee.kind, SyntaxKind::Name("date and time".to_string()));
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_words_merge_in_full_mode() {
        let tree = parse("first name + 1");
        match tree.kind {
            SyntaxKind::Binary { left, .. } => {
                assert_eq!(left.kind, SyntaxKind::Name("first name".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_and_is_not_merged_into_unknown_names() {
        let tree = parse("a and b");
        assert!(matches!(tree.kind, SyntaxKind::Binary { op: InfixOp::And, .. }));
    }

    #[test]
    fn test_context_keys_become_known() {
        let tree = parse("{first name: 1, b: first name + 1}");
        match tree.kind {
            SyntaxKind::Context(entries) => {
                assert_eq!(entries[0].0, "first name");
                match &entries[1].1.kind {
                    SyntaxKind::Binary { left, .. } => {
                        assert_eq!(left.kind, SyntaxKind::Name("first name".to_string()))
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_intervals() {
        for (source, start_inclusive, end_inclusive) in [
            ("[1..3]", true, true),
            ("[1..3)", true, false),
            ("(1..3]", false, true),
            ("]1..3[", false, false),
            ("[1..5[", true, false),
            ("]1..5]", false, true),
        ] {
            match parse(source).kind {
                SyntaxKind::Interval {
                    start_inclusive: s,
                    end_inclusive: e,
                    ..
                } => assert_eq!((s, e), (start_inclusive, end_inclusive), "{}", source),
                other => panic!("{}: unexpected {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_open_interval_end_is_not_a_filter() {
        match parse("3 in [1..5[").kind {
            SyntaxKind::In { tests, .. } => assert!(matches!(
                tests[0].kind,
                SyntaxKind::Interval {
                    start_inclusive: true,
                    end_inclusive: false,
                    ..
                }
            )),
            other => panic!("unexpected {:?}", other),
        }
        // Filters inside delimiters still work in the end expression
        match parse("]0..max(xs[1], 2)[").kind {
            SyntaxKind::Interval { end, .. } => {
                assert!(matches!(end.kind, SyntaxKind::Invocation { .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_filter_on_interval() {
        assert!(matches!(parse("[1..3)[-1]").kind, SyntaxKind::Filter { .. }));
    }

    #[test]
    fn test_in_with_parenthesized_tests() {
        match parse("x in (1, 2, < 0)").kind {
            SyntaxKind::In { tests, .. } => {
                assert_eq!(tests.len(), 3);
                assert!(matches!(tests[2].kind, SyntaxKind::UnaryComparison { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse("x in (1..5]").kind {
            SyntaxKind::In { tests, .. } => {
                assert!(matches!(
                    tests[0].kind,
                    SyntaxKind::Interval {
                        start_inclusive: false,
                        end_inclusive: true,
                        ..
                    }
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_textual_forms() {
        assert!(matches!(parse("if a then 1 else 2").kind, SyntaxKind::If { .. }));
        match parse("for x in [1,2], y in 1..3 return x + y").kind {
            SyntaxKind::For { iterators, .. } => {
                assert_eq!(iterators.len(), 2);
                assert!(iterators[0].end.is_none());
                assert!(iterators[1].end.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse("every x in [1] satisfies x > 0").kind {
            SyntaxKind::Quantified { every, .. } => assert!(every),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_function_definition_and_named_call() {
        match parse("function(a: number, b) a - b").kind {
            SyntaxKind::FunctionDefinition { params, .. } => {
                assert_eq!(params[0], ("a".to_string(), Some(TypeRef::Named("number".into()))));
                assert_eq!(params[1], ("b".to_string(), None));
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse("f(b: 1, a: 2)").kind {
            SyntaxKind::Invocation {
                args: Arguments::Named(args),
                ..
            } => assert_eq!(args[0].0, "b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_type_references() {
        let cases = [
            ("x instance of date and time", "date and time"),
            ("x instance of list<list<string>>", "list<list<string>>"),
            ("x instance of context<age: number>", "context<age: number>"),
            ("x instance of range[)<string>", "range[)<string>"),
            ("x instance of range(<string>", "range(<string>"),
            ("x instance of function<number, number>->number", "function<number, number>->number"),
            ("x instance of null", "null"),
        ];
        for (source, expected) in cases {
            match parse(source).kind {
                SyntaxKind::InstanceOf { target, .. } => {
                    assert_eq!(target.to_string(), expected, "{}", source)
                }
                other => panic!("{}: unexpected {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_unary_tests() {
        let names = known(&[]);
        assert_eq!(parse_unary_tests("-", &names).unwrap().kind, SyntaxKind::Dash);

        match parse_unary_tests("not(1, [2..3])", &names).unwrap().kind {
            SyntaxKind::UnaryTests { negated, tests } => {
                assert!(negated);
                assert_eq!(tests.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }

        match parse_unary_tests("< 10, ? > 20", &names).unwrap().kind {
            SyntaxKind::UnaryTests { negated, tests } => {
                assert!(!negated);
                assert!(matches!(tests[0].kind, SyntaxKind::UnaryComparison { .. }));
                assert!(matches!(tests[1].kind, SyntaxKind::Binary { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_comments_attach_to_next_node() {
        let tree = parse("/* base */ 1 + 2 // tail");
        match &tree.kind {
            SyntaxKind::Binary { left, .. } => assert_eq!(left.comments, vec!["base"]),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(tree.comments, vec!["tail"]);
    }

    #[test]
    fn test_syntax_errors() {
        let names = known(&[]);
        let err = parse_expression("1 +", &names).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }), "{:?}", err);

        let err = parse_expression("(1 + 2", &names).unwrap_err();
        assert!(err.to_string().contains("expected ')'"), "{}", err);

        assert_eq!(parse_expression("  ", &names).unwrap_err(), ParseError::Empty);
    }
}
