use crate::error::{EkfGenError, Result};
use crate::expr::ast::{Expr, Function, ParseError, Token};

/// Parse a single expression such as `x + dt * sin(theta)`
pub fn parse(s: &str) -> Result<Expr> {
    let tokens = tokenize(s)?;
    let mut parser = Parser::new(tokens);
    parser.parse_complete()
}

/// Parse several expressions, keeping their order
pub fn parse_all<S: AsRef<str>>(items: &[S]) -> Result<Vec<Expr>> {
    items.iter().map(|s| parse(s.as_ref())).collect()
}

// Tokenizer + recursive-descent parser
pub fn tokenize(s: &str) -> std::result::Result<Vec<Token>, ParseError> {
    let mut toks = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c.is_ascii_digit() || c == '.' {
            let mut num = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit()
                    || d == '.'
                    || d == 'e'
                    || d == 'E'
                    || ((d == '+' || d == '-') && (num.ends_with('e') || num.ends_with('E')))
                {
                    num.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            match num.parse::<f64>() {
                Ok(v) => toks.push(Token::Num(v)),
                Err(_) => {
                    return Err(ParseError {
                        pos: toks.len(),
                        found: None,
                        expected: vec![format!("number (got '{}')", num)],
                    })
                }
            }
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let mut id = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_alphanumeric() || d == '_' {
                    id.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            toks.push(Token::Ident(id));
            continue;
        }
        chars.next();
        match c {
            '(' => toks.push(Token::LParen),
            ')' => toks.push(Token::RParen),
            ',' => toks.push(Token::Comma),
            '*' => {
                if let Some(&'*') = chars.peek() {
                    chars.next();
                    toks.push(Token::Op('^'));
                } else {
                    toks.push(Token::Op('*'));
                }
            }
            // unknown characters are kept so the parser can report them
            other => toks.push(Token::Op(other)),
        }
    }
    Ok(toks)
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let r = self.tokens.get(self.pos).cloned();
        if r.is_some() {
            self.pos += 1;
        }
        r
    }

    fn error(&self, expected: &[&str]) -> EkfGenError {
        EkfGenError::Parse(ParseError {
            pos: self.pos,
            found: self.peek().cloned(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Parse one expression and require that all input was consumed
    pub fn parse_complete(&mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        if self.peek().is_some() {
            return Err(self.error(&["operator", "<end>"]));
        }
        Ok(expr)
    }

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_add_sub()
    }

    fn parse_add_sub(&mut self) -> Result<Expr> {
        let mut node = self.parse_mul_div()?;
        loop {
            match self.peek() {
                Some(Token::Op('+')) => {
                    self.next();
                    let rhs = self.parse_mul_div()?;
                    node = Expr::Add(Box::new(node), Box::new(rhs));
                }
                Some(Token::Op('-')) => {
                    self.next();
                    let rhs = self.parse_mul_div()?;
                    node = Expr::Sub(Box::new(node), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_mul_div(&mut self) -> Result<Expr> {
        let mut node = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Op('*')) => {
                    self.next();
                    let rhs = self.parse_unary()?;
                    node = Expr::Mul(Box::new(node), Box::new(rhs));
                }
                Some(Token::Op('/')) => {
                    self.next();
                    let rhs = self.parse_unary()?;
                    node = Expr::Div(Box::new(node), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.next();
                let rhs = self.parse_unary()?;
                Ok(match rhs {
                    Expr::Literal(v) => Expr::Literal(-v),
                    other => Expr::Neg(Box::new(other)),
                })
            }
            Some(Token::Op('+')) => {
                self.next();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // `^` is right associative and binds tighter than a leading minus
    fn parse_power(&mut self) -> Result<Expr> {
        let node = self.parse_primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.next();
            let rhs = self.parse_unary()?;
            return Ok(Expr::Pow(Box::new(node), Box::new(rhs)));
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Num(v)) => Ok(Expr::Literal(v)),
            Some(Token::Ident(id)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.next();
                    let args = self.parse_args()?;
                    return build_call(&id, args);
                }
                Ok(Expr::symbol(id))
            }
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.next();
                        Ok(expr)
                    }
                    _ => Err(self.error(&[")"])),
                }
            }
            other => {
                if other.is_some() {
                    self.pos -= 1;
                }
                Err(self.error(&["number", "identifier", "'('"]))
            }
        }
    }

    // Called after the opening parenthesis
    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.next();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.next();
                }
                Some(Token::RParen) => {
                    self.next();
                    break;
                }
                _ => return Err(self.error(&[",", ")"])),
            }
        }
        Ok(args)
    }
}

fn build_call(name: &str, mut args: Vec<Expr>) -> Result<Expr> {
    let arity = |expected: usize, found: usize| EkfGenError::WrongArity {
        name: name.to_string(),
        expected,
        found,
    };
    match name {
        "pow" | "atan2" => {
            if args.len() != 2 {
                return Err(arity(2, args.len()));
            }
            let b = args.pop().map(Box::new);
            let a = args.pop().map(Box::new);
            match (a, b) {
                (Some(a), Some(b)) if name == "pow" => Ok(Expr::Pow(a, b)),
                (Some(a), Some(b)) => Ok(Expr::Atan2(a, b)),
                _ => Err(arity(2, 0)),
            }
        }
        _ => {
            let func = Function::from_name(name).ok_or_else(|| EkfGenError::UnknownFunction {
                name: name.to_string(),
            })?;
            if args.len() != 1 {
                return Err(arity(1, args.len()));
            }
            match args.pop() {
                Some(arg) => Ok(Expr::Call(func, Box::new(arg))),
                None => Err(arity(1, 0)),
            }
        }
    }
}
