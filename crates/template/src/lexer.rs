use crate::error::{Result, TemplateError};

pub(crate) const LEFT_DELIM: &str = "{{";
pub(crate) const RIGHT_DELIM: &str = "}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// `.` on its own: the whole context
    Dot,
    Field(String),
    Str(String),
    Ident(String),
    LeftParen,
    RightParen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Item {
    Text(String),
    Action { tokens: Vec<Spanned>, offset: usize },
}

/// Split template source into literal text and tokenized actions.
///
/// Comments are dropped here; trim markers (`{{- ` / ` -}}`) are applied to
/// the neighbouring text before it is emitted.
pub(crate) fn lex(name: &str, src: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    while pos < src.len() {
        let Some(rel) = src[pos..].find(LEFT_DELIM) else {
            push_text(&mut items, &src[pos..], trim_next);
            break;
        };
        let open = pos + rel;
        let mut inner = open + LEFT_DELIM.len();

        let mut text = &src[pos..open];
        if has_left_trim_marker(src, inner) {
            text = text.trim_end();
            inner += 1;
            while src.as_bytes().get(inner).is_some_and(u8::is_ascii_whitespace) {
                inner += 1;
            }
        }
        push_text(&mut items, text, trim_next);

        let action = lex_action(name, src, inner, open)?;
        if let Some(tokens) = action.tokens {
            items.push(Item::Action {
                tokens,
                offset: open,
            });
        }
        trim_next = action.trim_right;
        pos = action.end;
    }

    Ok(items)
}

fn push_text(items: &mut Vec<Item>, text: &str, trim_start: bool) {
    let text = if trim_start { text.trim_start() } else { text };
    if !text.is_empty() {
        items.push(Item::Text(text.to_string()));
    }
}

fn has_left_trim_marker(src: &str, at: usize) -> bool {
    let bytes = src.as_bytes();
    bytes.get(at) == Some(&b'-') && bytes.get(at + 1).is_some_and(|b| b.is_ascii_whitespace())
}

fn right_trim_marker_at(src: &str, at: usize) -> bool {
    let bytes = src.as_bytes();
    bytes.get(at).is_some_and(|b| b.is_ascii_whitespace())
        && src[at + 1..].starts_with("-")
        && src[at + 2..].starts_with(RIGHT_DELIM)
}

struct LexedAction {
    tokens: Option<Vec<Spanned>>,
    end: usize,
    trim_right: bool,
}

fn lex_action(name: &str, src: &str, start: usize, open: usize) -> Result<LexedAction> {
    let bytes = src.as_bytes();
    let mut i = start;

    if src[i..].starts_with(LEFT_COMMENT) {
        let Some(close) = src[i + LEFT_COMMENT.len()..].find(RIGHT_COMMENT) else {
            return Err(TemplateError::parse(name, open, "unclosed comment"));
        };
        let after = i + LEFT_COMMENT.len() + close + RIGHT_COMMENT.len();
        if src[after..].starts_with(RIGHT_DELIM) {
            return Ok(LexedAction {
                tokens: None,
                end: after + RIGHT_DELIM.len(),
                trim_right: false,
            });
        }
        if right_trim_marker_at(src, after) {
            return Ok(LexedAction {
                tokens: None,
                end: after + 2 + RIGHT_DELIM.len(),
                trim_right: true,
            });
        }
        return Err(TemplateError::parse(
            name,
            after,
            "comment ends before closing delimiter",
        ));
    }

    let mut tokens = Vec::new();
    loop {
        let Some(&c) = bytes.get(i) else {
            return Err(TemplateError::parse(name, open, "unclosed action"));
        };
        match c {
            b'}' if src[i..].starts_with(RIGHT_DELIM) => {
                return Ok(LexedAction {
                    tokens: Some(tokens),
                    end: i + RIGHT_DELIM.len(),
                    trim_right: false,
                });
            }
            c if c.is_ascii_whitespace() => {
                if right_trim_marker_at(src, i) {
                    return Ok(LexedAction {
                        tokens: Some(tokens),
                        end: i + 2 + RIGHT_DELIM.len(),
                        trim_right: true,
                    });
                }
                i += 1;
            }
            b'.' => {
                let ident_start = i + 1;
                let ident_end = scan_ident(bytes, ident_start);
                let token = if ident_end == ident_start {
                    Token::Dot
                } else if bytes[ident_start].is_ascii_digit() {
                    return Err(TemplateError::parse(name, i, "bad field reference"));
                } else {
                    Token::Field(src[ident_start..ident_end].to_string())
                };
                tokens.push(Spanned { token, offset: i });
                i = ident_end;
                check_operand_end(name, src, i)?;
            }
            b'"' => {
                let (value, end) = lex_quoted(name, src, i)?;
                tokens.push(Spanned {
                    token: Token::Str(value),
                    offset: i,
                });
                i = end;
                check_operand_end(name, src, i)?;
            }
            b'`' => {
                let Some(close) = src[i + 1..].find('`') else {
                    return Err(TemplateError::parse(name, i, "unterminated raw quoted string"));
                };
                tokens.push(Spanned {
                    token: Token::Str(src[i + 1..i + 1 + close].to_string()),
                    offset: i,
                });
                i += close + 2;
                check_operand_end(name, src, i)?;
            }
            b'(' => {
                tokens.push(Spanned {
                    token: Token::LeftParen,
                    offset: i,
                });
                i += 1;
            }
            b')' => {
                tokens.push(Spanned {
                    token: Token::RightParen,
                    offset: i,
                });
                i += 1;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let end = scan_ident(bytes, i);
                tokens.push(Spanned {
                    token: Token::Ident(src[i..end].to_string()),
                    offset: i,
                });
                i = end;
                check_operand_end(name, src, i)?;
            }
            b'|' => {
                return Err(TemplateError::parse(name, i, "pipelines are not supported"));
            }
            b'$' => {
                return Err(TemplateError::parse(name, i, "variables are not supported"));
            }
            _ => {
                return Err(TemplateError::parse(
                    name,
                    i,
                    format!("unexpected {:?} in command", char_at(src, i)),
                ));
            }
        }
    }
}

fn scan_ident(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    end
}

/// An operand must be followed by a space, a paren or the closing delimiter.
fn check_operand_end(name: &str, src: &str, at: usize) -> Result<()> {
    let bytes = src.as_bytes();
    match bytes.get(at) {
        None => Ok(()),
        Some(b) if b.is_ascii_whitespace() => Ok(()),
        Some(b'(') | Some(b')') => Ok(()),
        Some(b'}') if src[at..].starts_with(RIGHT_DELIM) => Ok(()),
        Some(_) => Err(TemplateError::parse(
            name,
            at,
            format!("unexpected {:?} in operand", char_at(src, at)),
        )),
    }
}

fn lex_quoted(name: &str, src: &str, start: usize) -> Result<(String, usize)> {
    let mut value = String::new();
    let mut chars = src[start + 1..].char_indices();
    while let Some((rel, c)) = chars.next() {
        match c {
            '"' => return Ok((value, start + 1 + rel + 1)),
            '\n' => break,
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, '"')) => value.push('"'),
                Some((_, '\\')) => value.push('\\'),
                Some((at, other)) => {
                    return Err(TemplateError::parse(
                        name,
                        start + 1 + at,
                        format!("unknown escape sequence \\{other}"),
                    ));
                }
                None => break,
            },
            other => value.push(other),
        }
    }
    Err(TemplateError::parse(name, start, "unterminated quoted string"))
}

fn char_at(src: &str, at: usize) -> char {
    src[at..].chars().next().unwrap_or('\u{fffd}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(items: &[Item]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| match item {
                Item::Action { tokens, .. } => Some(tokens),
                Item::Text(_) => None,
            })
            .flatten()
            .filter_map(|spanned| match &spanned.token {
                Token::Field(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn lexes_text_and_field() {
        let items = lex("t", "{{.dvln}}/viper").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(fields(&items), vec!["dvln".to_string()]);
        assert_eq!(items[1], Item::Text("/viper".to_string()));
    }

    #[test]
    fn plain_text_is_single_item() {
        let items = lex("t", "http://github.com/dvln/viper").unwrap();
        assert_eq!(
            items,
            vec![Item::Text("http://github.com/dvln/viper".to_string())]
        );
    }

    #[test]
    fn single_brace_is_literal() {
        let items = lex("t", "a{b}c").unwrap();
        assert_eq!(items, vec![Item::Text("a{b}c".to_string())]);
    }

    #[test]
    fn stray_brace_after_field_is_rejected() {
        let err = lex("repoURI", "{{.dvln}/viper").unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("in operand"), "{err}");
    }

    #[test]
    fn unclosed_action_is_rejected() {
        let err = lex("t", "x {{.dvln").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Parse {
                name: "t".to_string(),
                offset: 2,
                message: "unclosed action".to_string(),
            }
        );
    }

    #[test]
    fn lone_dot_is_its_own_token() {
        let items = lex("t", "{{ . }}").unwrap();
        match &items[0] {
            Item::Action { tokens, .. } => assert_eq!(tokens[0].token, Token::Dot),
            other => panic!("expected action, got {other:?}"),
        }
        assert!(lex("t", "{{.x.y}}").is_err());
        assert!(lex("t", "{{.9}}").is_err());
    }

    #[test]
    fn comments_are_dropped() {
        let items = lex("t", "a{{/* note */}}b").unwrap();
        assert_eq!(
            items,
            vec![Item::Text("a".to_string()), Item::Text("b".to_string())]
        );
    }

    #[test]
    fn trim_markers_eat_whitespace() {
        let items = lex("t", "a  {{- .x -}}  b").unwrap();
        assert_eq!(items.first(), Some(&Item::Text("a".to_string())));
        assert_eq!(items.last(), Some(&Item::Text("b".to_string())));
    }

    #[test]
    fn trimmed_comment_is_dropped() {
        let items = lex("t", "x {{- /* c */ -}} {{.a}}").unwrap();
        assert_eq!(items[0], Item::Text("x".to_string()));
        assert_eq!(items.len(), 2);
        assert_eq!(fields(&items), vec!["a".to_string()]);
    }

    #[test]
    fn quoted_strings_keep_delimiters() {
        let items = lex("t", r#"{{"{{"}}"#).unwrap();
        match &items[0] {
            Item::Action { tokens, .. } => {
                assert_eq!(tokens[0].token, Token::Str("{{".to_string()));
            }
            other => panic!("expected action, got {other:?}"),
        }
    }
}
