//! Recursive-descent parser producing [`arrows_logic`] rule ASTs.
//!
//! Precedence, loosest to tightest: `->` (implication, right-assoc) `v`
//! (or) `^` (and) `!` (not, prefix, no parentheses required — resolving
//! spec's open dialect question in favour of the paren-free form). A
//! quantifier's variable list may mix sorts (names starting with `p`, `q`,
//! `r`, `s`, `t` are POSITION, everything else NUMBER, per the frontend's
//! naming convention); mixed lists are split and nested, position outer.

use arrows_logic::{BacktrackRule, CompareOp, Conclusion, ConstantLit, Formula, FoRule, Sort, Term};

use crate::error::RuleError;
use crate::lexer::Token;

/// Either half of the rule surface accepted by a single DSL record.
#[derive(Clone, Debug)]
pub enum ParsedRule {
    Fo(FoRule),
    Backtrack(BacktrackRule),
}

fn infer_sort(name: &str) -> Sort {
    match name.chars().next() {
        Some('p') | Some('q') | Some('r') | Some('s') | Some('t') => Sort::Position,
        _ => Sort::Number,
    }
}

#[derive(Copy, Clone)]
enum RelOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

struct Parser<'t> {
    tokens: &'t [(Token, usize)],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [(Token, usize)]) -> Parser<'t> {
        Parser { tokens, pos: 0 }
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn line(&self) -> usize {
        self.tokens.get(self.pos).or_else(|| self.tokens.last()).map(|(_, l)| *l).unwrap_or(1)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Result<Token, RuleError> {
        let (t, _) = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| RuleError::Parse { line: self.line(), reason: "unexpected end of input".to_string() })?
            .clone();
        self.pos += 1;
        Ok(t)
    }

    fn eat(&mut self, t: &Token) -> bool {
        if self.peek() == Some(t) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(s)) if s == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, t: Token) -> Result<(), RuleError> {
        if self.eat(&t) {
            Ok(())
        } else {
            Err(RuleError::Parse { line: self.line(), reason: format!("expected {t:?}") })
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), RuleError> {
        if self.eat_ident(word) {
            Ok(())
        } else {
            Err(RuleError::Parse { line: self.line(), reason: format!("expected keyword {word:?}") })
        }
    }

    fn expect_name(&mut self) -> Result<String, RuleError> {
        match self.advance()? {
            Token::Ident(s) => Ok(s),
            other => Err(RuleError::Parse { line: self.line(), reason: format!("expected an identifier, found {other:?}") }),
        }
    }

    fn expect_int(&mut self) -> Result<i64, RuleError> {
        match self.advance()? {
            Token::Int(n) => Ok(n),
            other => Err(RuleError::Parse { line: self.line(), reason: format!("expected an integer, found {other:?}") }),
        }
    }

    fn peek_relop(&self) -> Option<RelOp> {
        match self.peek()? {
            Token::Eq => Some(RelOp::Eq),
            Token::Ne => Some(RelOp::Ne),
            Token::Lt => Some(RelOp::Lt),
            Token::Gt => Some(RelOp::Gt),
            Token::Le => Some(RelOp::Le),
            Token::Ge => Some(RelOp::Ge),
            _ => None,
        }
    }

    fn parse_ident_list(&mut self) -> Result<Vec<String>, RuleError> {
        let mut vars = vec![self.expect_name()?];
        while self.eat(&Token::Comma) {
            vars.push(self.expect_name()?);
        }
        Ok(vars)
    }

    // --- terms ---

    fn parse_term(&mut self) -> Result<Term, RuleError> {
        let mut left = self.parse_primary_term()?;
        loop {
            if self.eat(&Token::Plus) {
                let right = self.parse_primary_term()?;
                left = Term::call("+", vec![left, right]);
            } else if self.eat(&Token::Minus) {
                let right = self.parse_primary_term()?;
                left = Term::call("-", vec![left, right]);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_primary_term(&mut self) -> Result<Term, RuleError> {
        match self.advance()? {
            Token::LParen => {
                let t = self.parse_term()?;
                self.expect(Token::RParen)?;
                Ok(t)
            }
            Token::Minus => {
                let t = self.parse_primary_term()?;
                match t {
                    Term::Constant(ConstantLit::Int(n)) => Ok(Term::int(-n)),
                    other => Ok(Term::call("-", vec![Term::int(0), other])),
                }
            }
            Token::Int(n) => Ok(Term::int(n)),
            Token::Ident(name) if name == "nil" => Ok(Term::Constant(ConstantLit::Nil)),
            Token::Ident(name) if name == "oob" => Ok(Term::Constant(ConstantLit::Oob)),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        args.push(self.parse_term()?);
                        while self.eat(&Token::Comma) {
                            args.push(self.parse_term()?);
                        }
                    }
                    self.expect(Token::RParen)?;
                    Ok(Term::call(&name, args))
                } else {
                    Ok(Term::var(&name))
                }
            }
            other => Err(RuleError::Parse { line: self.line(), reason: format!("expected a term, found {other:?}") }),
        }
    }

    // --- formulas ---

    fn parse_formula(&mut self) -> Result<Formula, RuleError> {
        self.parse_implies()
    }

    fn parse_implies(&mut self) -> Result<Formula, RuleError> {
        let left = self.parse_or()?;
        if self.eat(&Token::Arrow) {
            let right = self.parse_implies()?;
            return Ok(Formula::Or(vec![Formula::Not(Box::new(left)), right]));
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Formula, RuleError> {
        let mut parts = vec![self.parse_and()?];
        while self.eat_ident("v") {
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 { parts.pop().unwrap() } else { Formula::Or(parts) })
    }

    fn parse_and(&mut self) -> Result<Formula, RuleError> {
        let mut parts = vec![self.parse_unary()?];
        while self.eat(&Token::Caret) {
            parts.push(self.parse_unary()?);
        }
        Ok(if parts.len() == 1 { parts.pop().unwrap() } else { Formula::And(parts) })
    }

    fn parse_unary(&mut self) -> Result<Formula, RuleError> {
        if self.eat(&Token::Bang) {
            return Ok(Formula::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Formula, RuleError> {
        if self.eat_ident("exists") {
            return self.parse_quantifier(true);
        }
        if self.eat_ident("forall") {
            return self.parse_quantifier(false);
        }
        if self.eat(&Token::LParen) {
            let f = self.parse_formula()?;
            self.expect(Token::RParen)?;
            return Ok(f);
        }

        let left = self.parse_term()?;
        if let Some(op) = self.peek_relop() {
            self.advance()?;
            let right = self.parse_term()?;
            return Ok(match op {
                RelOp::Eq => Formula::Equality(left, right),
                RelOp::Ne => Formula::Not(Box::new(Formula::Equality(left, right))),
                RelOp::Lt => Formula::Relation("<".to_string(), vec![left, right]),
                RelOp::Gt => Formula::Relation(">".to_string(), vec![left, right]),
                RelOp::Le => Formula::Relation("<=".to_string(), vec![left, right]),
                RelOp::Ge => Formula::Relation(">=".to_string(), vec![left, right]),
            });
        }
        match left {
            Term::FunctionCall(name, args) => Ok(Formula::Relation(name, args)),
            _ => Err(RuleError::Parse { line: self.line(), reason: "expected a relation or an equality".to_string() }),
        }
    }

    fn parse_quantifier(&mut self, existential: bool) -> Result<Formula, RuleError> {
        let vars = self.parse_ident_list()?;
        self.expect(Token::LParen)?;
        let body = self.parse_formula()?;
        self.expect(Token::RParen)?;
        Ok(nest_quantifier(existential, vars, body))
    }

    // --- conclusions ---

    fn parse_conclusion(&mut self) -> Result<Conclusion, RuleError> {
        let name = self.expect_name()?;
        self.expect(Token::LParen)?;
        let pos = self.parse_term()?;
        self.expect(Token::Comma)?;
        let conclusion = match name.as_str() {
            "set" => {
                let v = self.parse_term()?;
                Conclusion::Set(pos, v)
            }
            "exclude" => {
                let op = match self.peek_relop() {
                    Some(op) => {
                        self.advance()?;
                        match op {
                            RelOp::Eq => CompareOp::Eq,
                            RelOp::Ne => CompareOp::Ne,
                            RelOp::Lt => CompareOp::Lt,
                            RelOp::Gt => CompareOp::Gt,
                            RelOp::Le => CompareOp::Le,
                            RelOp::Ge => CompareOp::Ge,
                        }
                    }
                    None => CompareOp::Eq,
                };
                let v = self.parse_term()?;
                Conclusion::Exclude(pos, op, v)
            }
            "only" => {
                self.expect(Token::LBracket)?;
                let mut values = vec![self.parse_term()?];
                while self.eat(&Token::Comma) {
                    values.push(self.parse_term()?);
                }
                self.expect(Token::RBracket)?;
                Conclusion::Only(pos, values)
            }
            other => {
                return Err(RuleError::Parse {
                    line: self.line(),
                    reason: format!("unknown conclusion keyword {other:?}"),
                });
            }
        };
        self.expect(Token::RParen)?;
        Ok(conclusion)
    }

    // --- records ---

    fn parse_record(&mut self) -> Result<(String, ParsedRule), RuleError> {
        if self.eat_ident("rule") {
            let name = self.expect_name()?;
            self.expect_keyword("complexity")?;
            let complexity = self.expect_int()? as u32;
            self.expect(Token::Colon)?;
            let condition = self.parse_formula()?;
            self.expect(Token::FatArrow)?;
            let mut conclusions = vec![self.parse_conclusion()?];
            while self.eat(&Token::Semicolon) {
                conclusions.push(self.parse_conclusion()?);
            }
            return Ok((name.clone(), ParsedRule::Fo(FoRule { name, condition, conclusions, complexity })));
        }
        if self.eat_ident("backtrack") {
            let name = self.expect_name()?;
            self.expect_keyword("complexity")?;
            let complexity = self.expect_int()? as u32;
            self.expect_keyword("backtrack_depth")?;
            let backtrack_depth = self.expect_int()? as u32;
            self.expect_keyword("rule_depth")?;
            let rule_depth = self.expect_int()? as u32;
            self.expect_keyword("max_rule_complexity")?;
            let max_rule_complexity = self.expect_int()? as u32;
            return Ok((
                name,
                ParsedRule::Backtrack(BacktrackRule { complexity, backtrack_depth, rule_depth, max_rule_complexity }),
            ));
        }
        Err(RuleError::Parse { line: self.line(), reason: "expected 'rule' or 'backtrack'".to_string() })
    }
}

fn nest_quantifier(existential: bool, vars: Vec<String>, body: Formula) -> Formula {
    let (pos_vars, num_vars): (Vec<String>, Vec<String>) =
        vars.into_iter().partition(|v| infer_sort(v) == Sort::Position);

    let inner = if num_vars.is_empty() {
        body
    } else if existential {
        Formula::ExistsNumber(num_vars, Box::new(body))
    } else {
        Formula::ForAllNumber(num_vars, Box::new(body))
    };

    if pos_vars.is_empty() {
        inner
    } else if existential {
        Formula::ExistsPosition(pos_vars, Box::new(inner))
    } else {
        Formula::ForAllPosition(pos_vars, Box::new(inner))
    }
}

/// Parses every record in `tokens` in order, failing fast on the first
/// malformed record.
pub fn parse_rules(tokens: &[(Token, usize)]) -> Result<Vec<(String, ParsedRule)>, RuleError> {
    let mut parser = Parser::new(tokens);
    let mut out = Vec::new();
    while !parser.at_eof() {
        out.push(parser.parse_record()?);
    }
    Ok(out)
}
