use crate::error::{Result, TemplateError};
use crate::lexer::{Item, Spanned, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Output(Expr),
    If(IfNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IfNode {
    pub branches: Vec<Branch>,
    pub otherwise: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Branch {
    pub cond: Expr,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
    Dot,
    Field(String),
    Str(String),
    Bool(bool),
    Call(Func, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Func {
    Not,
    And,
    Or,
    Eq,
    Ne,
}

impl Func {
    fn lookup(ident: &str) -> Option<Self> {
        match ident {
            "not" => Some(Self::Not),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
            Self::Eq => "eq",
            Self::Ne => "ne",
        }
    }

    fn arity_ok(self, args: usize) -> bool {
        match self {
            Self::Not => args == 1,
            Self::And | Self::Or => args >= 1,
            Self::Eq | Self::Ne => args == 2,
        }
    }
}

const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "range", "with", "define", "template", "block", "break", "continue",
];

enum Stop {
    End,
    Else,
    ElseIf(Expr),
}

pub(crate) struct Parser<'a> {
    name: &'a str,
    items: Vec<Item>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(name: &'a str, items: Vec<Item>) -> Self {
        Self {
            name,
            items,
            pos: 0,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Vec<Node>> {
        let (nodes, stop) = self.parse_list()?;
        match stop {
            None => Ok(nodes),
            Some((Stop::End, offset)) => Err(self.error(offset, "unexpected {{end}}")),
            Some((_, offset)) => Err(self.error(offset, "unexpected {{else}}")),
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::parse(self.name, offset, message)
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, Option<(Stop, usize)>)> {
        let mut nodes = Vec::new();
        while self.pos < self.items.len() {
            let item = self.items[self.pos].clone();
            self.pos += 1;
            match item {
                Item::Text(text) => nodes.push(Node::Text(text)),
                Item::Action { tokens, offset } => {
                    if let Some(stop) = self.parse_action(&tokens, offset, &mut nodes)? {
                        return Ok((nodes, Some((stop, offset))));
                    }
                }
            }
        }
        Ok((nodes, None))
    }

    fn parse_action(
        &mut self,
        tokens: &[Spanned],
        offset: usize,
        nodes: &mut Vec<Node>,
    ) -> Result<Option<Stop>> {
        let keyword = match tokens.first().map(|t| &t.token) {
            Some(Token::Ident(ident)) => ident.as_str(),
            _ => {
                nodes.push(Node::Output(self.parse_command(tokens, offset)?));
                return Ok(None);
            }
        };

        match keyword {
            "if" => {
                let cond = self.parse_command(&tokens[1..], offset)?;
                nodes.push(Node::If(self.parse_if(cond, offset)?));
                Ok(None)
            }
            "else" => match tokens.get(1).map(|t| &t.token) {
                None => Ok(Some(Stop::Else)),
                Some(Token::Ident(ident)) if ident == "if" => {
                    let cond = self.parse_command(&tokens[2..], offset)?;
                    Ok(Some(Stop::ElseIf(cond)))
                }
                Some(_) => Err(self.error(tokens[1].offset, "unexpected argument to {{else}}")),
            },
            "end" => {
                if tokens.len() > 1 {
                    return Err(self.error(tokens[1].offset, "unexpected argument to {{end}}"));
                }
                Ok(Some(Stop::End))
            }
            kw if UNSUPPORTED_KEYWORDS.contains(&kw) => {
                Err(self.error(offset, format!("{{{{{kw}}}}} is not supported")))
            }
            _ => {
                nodes.push(Node::Output(self.parse_command(tokens, offset)?));
                Ok(None)
            }
        }
    }

    fn parse_if(&mut self, first: Expr, offset: usize) -> Result<IfNode> {
        let mut branches = Vec::new();
        let mut cond = first;
        loop {
            let (body, stop) = self.parse_list()?;
            match stop {
                None => return Err(self.error(offset, "unexpected EOF: missing {{end}} for {{if}}")),
                Some((Stop::End, _)) => {
                    branches.push(Branch { cond, body });
                    return Ok(IfNode {
                        branches,
                        otherwise: Vec::new(),
                    });
                }
                Some((Stop::ElseIf(next), _)) => {
                    branches.push(Branch { cond, body });
                    cond = next;
                }
                Some((Stop::Else, _)) => {
                    branches.push(Branch { cond, body });
                    let (otherwise, stop) = self.parse_list()?;
                    return match stop {
                        Some((Stop::End, _)) => Ok(IfNode {
                            branches,
                            otherwise,
                        }),
                        Some((_, at)) => Err(self.error(at, "expected {{end}} after {{else}}")),
                        None => {
                            Err(self.error(offset, "unexpected EOF: missing {{end}} for {{if}}"))
                        }
                    };
                }
            }
        }
    }

    fn parse_command(&self, tokens: &[Spanned], offset: usize) -> Result<Expr> {
        let Some(first) = tokens.first() else {
            return Err(self.error(offset, "missing value for command"));
        };
        if let Token::Ident(ident) = &first.token {
            if let Some(func) = Func::lookup(ident) {
                let args = self.parse_operands(&tokens[1..])?;
                if !func.arity_ok(args.len()) {
                    return Err(self.error(
                        first.offset,
                        format!("wrong number of args for {}: got {}", func.name(), args.len()),
                    ));
                }
                return Ok(Expr::Call(func, args));
            }
        }

        let mut operands = self.parse_operands(tokens)?;
        if operands.len() != 1 {
            return Err(self.error(
                tokens[1].offset,
                "can't give argument to non-function",
            ));
        }
        Ok(operands.remove(0))
    }

    fn parse_operands(&self, tokens: &[Spanned]) -> Result<Vec<Expr>> {
        let mut operands = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let spanned = &tokens[i];
            match &spanned.token {
                Token::Dot => operands.push(Expr::Dot),
                Token::Field(name) => operands.push(Expr::Field(name.clone())),
                Token::Str(value) => operands.push(Expr::Str(value.clone())),
                Token::Ident(ident) => match ident.as_str() {
                    "true" => operands.push(Expr::Bool(true)),
                    "false" => operands.push(Expr::Bool(false)),
                    other if Func::lookup(other).is_some() => {
                        return Err(self.error(
                            spanned.offset,
                            format!("function {other:?} must be parenthesized when used as an argument"),
                        ));
                    }
                    other => {
                        return Err(self.error(
                            spanned.offset,
                            format!("function {other:?} not defined"),
                        ));
                    }
                },
                Token::LeftParen => {
                    let close = matching_paren(tokens, i)
                        .ok_or_else(|| self.error(spanned.offset, "unclosed left paren"))?;
                    operands.push(self.parse_command(&tokens[i + 1..close], spanned.offset)?);
                    i = close;
                }
                Token::RightParen => {
                    return Err(self.error(spanned.offset, "unexpected right paren"));
                }
            }
            i += 1;
        }
        Ok(operands)
    }
}

fn matching_paren(tokens: &[Spanned], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, spanned) in tokens.iter().enumerate().skip(open) {
        match spanned.token {
            Token::LeftParen => depth += 1,
            Token::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
