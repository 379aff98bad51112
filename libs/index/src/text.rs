//! Free-text query parsing
//!
//! Grammar: terms and `"quoted phrases"`, combined with `AND`, `OR`, `NOT`
//! and parentheses; adjacent terms are implicitly ANDed. A `field:` prefix
//! restricts a term to one field (resolved through [`FieldAliases`]);
//! unprefixed terms search the default fields. Terms are lower-cased, and
//! keyword fields are searched through their tokenized `_text` shadow.

use crate::{Error, FieldAliases, IndexQuery, Result, Schema, FREE_TEXT_SUFFIX};

/// Turns user-entered search text into an index query.
pub trait TextParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<IndexQuery>;
}

#[derive(Debug, Clone)]
pub struct SimpleTextParser {
    aliases: FieldAliases,
    schema: Schema,
    default_fields: Vec<String>,
}

impl SimpleTextParser {
    pub fn new(aliases: FieldAliases, schema: Schema, default_fields: Vec<String>) -> Self {
        Self {
            aliases,
            schema,
            default_fields,
        }
    }

    fn searchable_field(&self, field: &str) -> String {
        let field = self.aliases.resolve_or_same(field);
        if self.schema.is_text_field(field) {
            field.to_string()
        } else {
            format!("{field}{FREE_TEXT_SUFFIX}")
        }
    }

    fn compile(&self, expr: &Expr) -> Result<IndexQuery> {
        match expr {
            Expr::Term { field, value } => {
                let value = value.to_lowercase();
                match field {
                    Some(field) => Ok(IndexQuery::term(self.searchable_field(field), value)),
                    None => {
                        if self.default_fields.is_empty() {
                            return Err(Error::TextQuery(
                                "no default fields configured for unqualified terms".to_string(),
                            ));
                        }
                        Ok(IndexQuery::or_all(
                            self.default_fields
                                .iter()
                                .map(|f| IndexQuery::term(self.searchable_field(f), value.clone()))
                                .collect(),
                        ))
                    }
                }
            }
            Expr::And(parts) => parts
                .iter()
                .try_fold(IndexQuery::Every, |acc, part| Ok(acc.and(self.compile(part)?))),
            Expr::Or(parts) => Ok(IndexQuery::or_all(
                parts
                    .iter()
                    .map(|part| self.compile(part))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Expr::Not(inner) => Ok(IndexQuery::Not(Box::new(self.compile(inner)?))),
        }
    }
}

impl TextParser for SimpleTextParser {
    fn parse(&self, text: &str) -> Result<IndexQuery> {
        if text.trim().is_empty() {
            return Ok(IndexQuery::Every);
        }
        let mut parser = Parser::new(text);
        let parsed = parser.parse_or();
        if parser.too_deep {
            return Err(Error::TextQuery("query nested too deeply".to_string()));
        }
        let expr = parsed.ok_or_else(|| Error::TextQuery(format!("cannot parse \"{text}\"")))?;
        if parser.peek().is_some() {
            return Err(Error::TextQuery(format!("unexpected trailing input in \"{text}\"")));
        }
        self.compile(&expr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Phrase(String),
    Word(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Term { field: Option<String>, value: String },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    fn and(mut parts: Vec<Expr>) -> Expr {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        Expr::And(parts)
    }

    fn or(mut parts: Vec<Expr>) -> Expr {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        Expr::Or(parts)
    }
}

/// Deepest allowed nesting of parentheses and `NOT`.
const MAX_NESTING: usize = 64;

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn next_tok(&mut self) -> Option<Tok> {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.consume_char();
        }
        match self.peek_char()? {
            '(' => {
                self.consume_char();
                Some(Tok::LParen)
            }
            ')' => {
                self.consume_char();
                Some(Tok::RParen)
            }
            '"' => self.lex_phrase(),
            _ => self.lex_word(),
        }
    }

    fn lex_phrase(&mut self) -> Option<Tok> {
        self.consume_char();
        let mut out = String::new();
        let mut escaped = false;
        while let Some(c) = self.consume_char() {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '"' => return Some(Tok::Phrase(out)),
                _ => out.push(c),
            }
        }
        None
    }

    fn lex_word(&mut self) -> Option<Tok> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                break;
            }
            self.consume_char();
        }
        let raw = &self.input[start..self.pos];
        if raw.is_empty() {
            return None;
        }
        match raw {
            "AND" => Some(Tok::And),
            "OR" => Some(Tok::Or),
            "NOT" => Some(Tok::Not),
            _ => Some(Tok::Word(raw.to_string())),
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Tok>,
    depth: usize,
    too_deep: bool,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            peeked: None,
            depth: 0,
            too_deep: false,
        }
    }

    fn enter(&mut self) -> Option<()> {
        if self.depth >= MAX_NESTING {
            self.too_deep = true;
            return None;
        }
        self.depth += 1;
        Some(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn peek(&mut self) -> Option<&Tok> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_tok();
        }
        self.peeked.as_ref()
    }

    fn next(&mut self) -> Option<Tok> {
        if let Some(tok) = self.peeked.take() {
            return Some(tok);
        }
        self.lexer.next_tok()
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut parts = vec![self.parse_and()?];
        while matches!(self.peek(), Some(Tok::Or)) {
            self.next();
            parts.push(self.parse_and()?);
        }
        Some(Expr::or(parts))
    }

    /// Explicit `AND` must be followed by an operand; juxtaposed operands
    /// are ANDed as well.
    fn parse_and(&mut self) -> Option<Expr> {
        let mut parts = vec![self.parse_unary()?];
        loop {
            match self.peek() {
                Some(Tok::And) => {
                    self.next();
                    parts.push(self.parse_unary()?);
                }
                Some(Tok::Or | Tok::RParen) | None => break,
                Some(Tok::Word(_) | Tok::Phrase(_) | Tok::LParen | Tok::Not) => {
                    parts.push(self.parse_unary()?);
                }
            }
        }
        Some(Expr::and(parts))
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        if matches!(self.peek(), Some(Tok::Not)) {
            self.next();
            self.enter()?;
            let inner = self.parse_unary();
            self.leave();
            return Some(Expr::Not(Box::new(inner?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        match self.next()? {
            Tok::LParen => {
                self.enter()?;
                let inner = self.parse_or();
                self.leave();
                let inner = inner?;
                if self.next() != Some(Tok::RParen) {
                    return None;
                }
                Some(inner)
            }
            Tok::Phrase(value) => Some(Expr::Term { field: None, value }),
            Tok::Word(word) => {
                // `field:"a phrase"` lexes as the word `field:` then a phrase.
                if let Some(field) = word.strip_suffix(':').filter(|f| !f.is_empty()) {
                    if let Some(Tok::Phrase(_)) = self.peek() {
                        if let Some(Tok::Phrase(value)) = self.next() {
                            return Some(Expr::Term {
                                field: Some(field.to_string()),
                                value,
                            });
                        }
                    }
                }
                if let Some((field, value)) = word
                    .split_once(':')
                    .filter(|(field, value)| !field.is_empty() && !value.is_empty())
                {
                    return Some(Expr::Term {
                        field: Some(field.to_string()),
                        value: value.to_string(),
                    });
                }
                Some(Expr::Term {
                    field: None,
                    value: word,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SimpleTextParser {
        let aliases: FieldAliases = [("country".to_string(), "currentcountry".to_string())]
            .into_iter()
            .collect();
        SimpleTextParser::new(
            aliases,
            Schema::new(["description"]),
            vec!["description".to_string(), "location".to_string()],
        )
    }

    #[test]
    fn empty_text_matches_everything() {
        assert_eq!(parser().parse("   ").unwrap(), IndexQuery::Every);
    }

    #[test]
    fn unqualified_terms_search_default_fields() {
        let q = parser().parse("Strike").unwrap();
        assert_eq!(
            q,
            IndexQuery::Or(vec![
                IndexQuery::term("description", "strike"),
                IndexQuery::term("location_text", "strike"),
            ])
        );
    }

    #[test]
    fn field_prefix_resolves_alias_and_shadow_field() {
        let q = parser().parse("country:France").unwrap();
        assert_eq!(q, IndexQuery::term("currentcountry_text", "france"));
    }

    #[test]
    fn prefixed_phrase_is_one_term() {
        let q = parser().parse("location:\"New York\"").unwrap();
        assert_eq!(q, IndexQuery::term("location_text", "new york"));
    }

    #[test]
    fn adjacent_terms_are_anded() {
        let q = parser().parse("description:strike description:factory").unwrap();
        assert_eq!(
            q,
            IndexQuery::And(vec![
                IndexQuery::term("description", "strike"),
                IndexQuery::term("description", "factory"),
            ])
        );
    }

    #[test]
    fn not_and_or_compile() {
        let q = parser()
            .parse("description:a OR NOT description:b")
            .unwrap();
        assert_eq!(
            q,
            IndexQuery::Or(vec![
                IndexQuery::term("description", "a"),
                IndexQuery::Not(Box::new(IndexQuery::term("description", "b"))),
            ])
        );
    }

    #[test]
    fn unbalanced_parentheses_fail() {
        assert!(matches!(
            parser().parse("(description:a"),
            Err(Error::TextQuery(_))
        ));
    }

    #[test]
    fn dangling_operators_fail() {
        for text in [
            "description:strike AND",
            "description:strike OR",
            "NOT",
            "description:strike AND )",
        ] {
            assert!(
                matches!(parser().parse(text), Err(Error::TextQuery(_))),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let err = parser().parse(&"(".repeat(100_000)).unwrap_err();
        assert!(matches!(err, Error::TextQuery(ref m) if m.contains("nested too deeply")));

        let balanced = format!("{}a{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(parser().parse(&balanced).is_err());

        let nots = format!("{}description:a", "NOT ".repeat(100_000));
        assert!(parser().parse(&nots).is_err());
    }

    #[test]
    fn moderate_nesting_parses() {
        let text = format!("{}description:a{}", "(".repeat(32), ")".repeat(32));
        assert_eq!(
            parser().parse(&text).unwrap(),
            IndexQuery::term("description", "a")
        );
    }

    #[test]
    fn long_term_lists_stay_flat() {
        let text = vec!["description:a"; 50_000].join(" ");
        match parser().parse(&text).unwrap() {
            IndexQuery::And(parts) => assert_eq!(parts.len(), 50_000),
            other => panic!("expected a flat conjunction, got {other:?}"),
        }
    }

    #[test]
    fn unqualified_terms_need_default_fields() {
        let parser = SimpleTextParser::new(FieldAliases::default(), Schema::default(), vec![]);
        assert!(parser.parse("strike").is_err());
        assert!(parser.parse("location:Paris").is_ok());
    }
}
