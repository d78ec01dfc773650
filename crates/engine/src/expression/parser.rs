// Expression parser - converts expression strings into an AST
// Supports: numbers, 'strings', "column" references, functions, arithmetic (+ - * / % ^),
// comparisons (= <> != < > <= >=), AND / OR / NOT, string concatenation (||)

use super::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Attribute reference, quoted ("height") or bare (height)
    Column(String),
    Function {
        name: String,
        args: Vec<Expr>,
    },
    BinaryOp {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    // Comparison
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    // Logical
    And,
    Or,
    // String
    Concat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Parse an expression string into an AST.
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Parse("Empty expression".to_string()));
    }
    let (expr, pos) = parse_or(&tokens, 0, 0)?;
    if pos < tokens.len() {
        return Err(ExpressionError::Parse(format!(
            "Unexpected token at position {}",
            pos
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    StringLit(String),
    QuotedColumn(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Concat,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\n' => { chars.next(); }
            '+' => { tokens.push(Token::Plus); chars.next(); }
            '-' => { tokens.push(Token::Minus); chars.next(); }
            '*' => { tokens.push(Token::Star); chars.next(); }
            '/' => { tokens.push(Token::Slash); chars.next(); }
            '%' => { tokens.push(Token::Percent); chars.next(); }
            '^' => { tokens.push(Token::Caret); chars.next(); }
            '(' => { tokens.push(Token::LParen); chars.next(); }
            ')' => { tokens.push(Token::RParen); chars.next(); }
            ',' => { tokens.push(Token::Comma); chars.next(); }
            '=' => { tokens.push(Token::Eq); chars.next(); }
            '|' => {
                chars.next();
                if chars.next() != Some('|') {
                    return Err(ExpressionError::Parse("Expected || for concatenation".to_string()));
                }
                tokens.push(Token::Concat);
            }
            '!' => {
                chars.next();
                if chars.next() != Some('=') {
                    return Err(ExpressionError::Parse("Expected != after !".to_string()));
                }
                tokens.push(Token::NotEq);
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some('=') => { tokens.push(Token::LtEq); chars.next(); }
                    Some('>') => { tokens.push(Token::NotEq); chars.next(); }
                    _ => tokens.push(Token::Lt),
                }
            }
            '>' => {
                chars.next();
                if let Some(&'=') = chars.peek() {
                    tokens.push(Token::GtEq);
                    chars.next();
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '\'' | '"' => {
                // 'string literal' or "column name"; a doubled quote escapes itself
                let quote = c;
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == quote => {
                            if chars.peek() == Some(&quote) {
                                chars.next();
                                s.push(quote);
                            } else {
                                break;
                            }
                        }
                        Some(ch) => s.push(ch),
                        None => {
                            return Err(ExpressionError::Parse(if quote == '\'' {
                                "Unterminated string literal".to_string()
                            } else {
                                "Unterminated column reference".to_string()
                            }))
                        }
                    }
                }
                if quote == '\'' {
                    tokens.push(Token::StringLit(s));
                } else {
                    tokens.push(Token::QuotedColumn(s));
                }
            }
            '0'..='9' | '.' => {
                let mut num_str = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        num_str.push(d);
                        chars.next();
                    } else if (d == 'e' || d == 'E') && !num_str.contains(['e', 'E']) {
                        // Exponent, optionally signed
                        num_str.push(d);
                        chars.next();
                        if let Some(&sign) = chars.peek() {
                            if sign == '+' || sign == '-' {
                                num_str.push(sign);
                                chars.next();
                            }
                        }
                    } else {
                        break;
                    }
                }
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| ExpressionError::Parse(format!("Invalid number: {}", num_str)))?;
                tokens.push(Token::Number(num));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            _ => {
                return Err(ExpressionError::Parse(format!("Unexpected character: {}", c)))
            }
        }
    }

    Ok(tokens)
}

/// Deepest expression tree the parser will build.
const MAX_NESTING: usize = 256;

fn nest(depth: usize) -> Result<usize, ExpressionError> {
    if depth >= MAX_NESTING {
        return Err(ExpressionError::Parse(format!(
            "Expression nested deeper than {} levels",
            MAX_NESTING
        )));
    }
    Ok(depth + 1)
}

fn is_keyword(token: &Token, keyword: &str) -> bool {
    matches!(token, Token::Ident(name) if name.eq_ignore_ascii_case(keyword))
}

// Lowest precedence: OR
fn parse_or(tokens: &[Token], pos: usize, mut depth: usize) -> Result<(Expr, usize), ExpressionError> {
    let (mut left, mut pos) = parse_and(tokens, pos, depth)?;

    while pos < tokens.len() && is_keyword(&tokens[pos], "OR") {
        depth = nest(depth)?;
        let (right, new_pos) = parse_and(tokens, pos + 1, depth)?;
        left = Expr::BinaryOp {
            op: Op::Or,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_and(tokens: &[Token], pos: usize, mut depth: usize) -> Result<(Expr, usize), ExpressionError> {
    let (mut left, mut pos) = parse_not(tokens, pos, depth)?;

    while pos < tokens.len() && is_keyword(&tokens[pos], "AND") {
        depth = nest(depth)?;
        let (right, new_pos) = parse_not(tokens, pos + 1, depth)?;
        left = Expr::BinaryOp {
            op: Op::And,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_not(tokens: &[Token], pos: usize, depth: usize) -> Result<(Expr, usize), ExpressionError> {
    if pos < tokens.len() && is_keyword(&tokens[pos], "NOT") {
        let (operand, new_pos) = parse_not(tokens, pos + 1, nest(depth)?)?;
        return Ok((
            Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            },
            new_pos,
        ));
    }
    parse_comparison(tokens, pos, depth)
}

fn parse_comparison(tokens: &[Token], pos: usize, mut depth: usize) -> Result<(Expr, usize), ExpressionError> {
    let (mut left, mut pos) = parse_concat(tokens, pos, depth)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Eq => Op::Eq,
            Token::NotEq => Op::NotEq,
            Token::Lt => Op::Lt,
            Token::Gt => Op::Gt,
            Token::LtEq => Op::LtEq,
            Token::GtEq => Op::GtEq,
            _ => break,
        };
        depth = nest(depth)?;
        let (right, new_pos) = parse_concat(tokens, pos + 1, depth)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

// String concatenation (||)
fn parse_concat(tokens: &[Token], pos: usize, mut depth: usize) -> Result<(Expr, usize), ExpressionError> {
    let (mut left, mut pos) = parse_add_sub(tokens, pos, depth)?;

    while pos < tokens.len() && tokens[pos] == Token::Concat {
        depth = nest(depth)?;
        let (right, new_pos) = parse_add_sub(tokens, pos + 1, depth)?;
        left = Expr::BinaryOp {
            op: Op::Concat,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_add_sub(tokens: &[Token], pos: usize, mut depth: usize) -> Result<(Expr, usize), ExpressionError> {
    let (mut left, mut pos) = parse_mul_div(tokens, pos, depth)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Plus => Op::Add,
            Token::Minus => Op::Sub,
            _ => break,
        };
        depth = nest(depth)?;
        let (right, new_pos) = parse_mul_div(tokens, pos + 1, depth)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

fn parse_mul_div(tokens: &[Token], pos: usize, mut depth: usize) -> Result<(Expr, usize), ExpressionError> {
    let (mut left, mut pos) = parse_unary(tokens, pos, depth)?;

    while pos < tokens.len() {
        let op = match &tokens[pos] {
            Token::Star => Op::Mul,
            Token::Slash => Op::Div,
            Token::Percent => Op::Mod,
            _ => break,
        };
        depth = nest(depth)?;
        let (right, new_pos) = parse_unary(tokens, pos + 1, depth)?;
        left = Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        };
        pos = new_pos;
    }

    Ok((left, pos))
}

// Unary minus binds looser than ^, so -2^2 = -4
fn parse_unary(tokens: &[Token], pos: usize, depth: usize) -> Result<(Expr, usize), ExpressionError> {
    if pos < tokens.len() {
        match &tokens[pos] {
            Token::Minus => {
                let (operand, new_pos) = parse_unary(tokens, pos + 1, nest(depth)?)?;
                return Ok((
                    Expr::UnaryOp {
                        op: UnaryOp::Neg,
                        operand: Box::new(operand),
                    },
                    new_pos,
                ));
            }
            Token::Plus => return parse_unary(tokens, pos + 1, nest(depth)?),
            _ => {}
        }
    }
    parse_power(tokens, pos, depth)
}

// Exponentiation (^) - right-associative
fn parse_power(tokens: &[Token], pos: usize, depth: usize) -> Result<(Expr, usize), ExpressionError> {
    let (base, pos) = parse_primary(tokens, pos, depth)?;

    if pos < tokens.len() && tokens[pos] == Token::Caret {
        let (exponent, new_pos) = parse_unary(tokens, pos + 1, nest(depth)?)?;
        return Ok((
            Expr::BinaryOp {
                op: Op::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            },
            new_pos,
        ));
    }

    Ok((base, pos))
}

fn parse_primary(tokens: &[Token], pos: usize, depth: usize) -> Result<(Expr, usize), ExpressionError> {
    if pos >= tokens.len() {
        return Err(ExpressionError::Parse("Unexpected end of expression".to_string()));
    }

    match &tokens[pos] {
        Token::Number(n) => Ok((Expr::Number(*n), pos + 1)),
        Token::StringLit(s) => Ok((Expr::Text(s.clone()), pos + 1)),
        Token::QuotedColumn(name) => Ok((Expr::Column(name.clone()), pos + 1)),
        Token::Ident(name) => {
            // Function call
            if pos + 1 < tokens.len() && tokens[pos + 1] == Token::LParen {
                let (args, new_pos) = parse_function_args(tokens, pos + 2, nest(depth)?)?;
                return Ok((
                    Expr::Function {
                        name: name.to_lowercase(),
                        args,
                    },
                    new_pos,
                ));
            }
            match name.to_uppercase().as_str() {
                "NULL" => Ok((Expr::Null, pos + 1)),
                "TRUE" => Ok((Expr::Boolean(true), pos + 1)),
                "FALSE" => Ok((Expr::Boolean(false), pos + 1)),
                "AND" | "OR" | "NOT" => Err(ExpressionError::Parse(format!(
                    "Unexpected keyword {} at position {}",
                    name, pos
                ))),
                // Bare identifier is a column reference
                _ => Ok((Expr::Column(name.clone()), pos + 1)),
            }
        }
        Token::LParen => {
            let (expr, pos) = parse_or(tokens, pos + 1, nest(depth)?)?;
            if pos >= tokens.len() {
                return Err(ExpressionError::Parse("Missing closing parenthesis".to_string()));
            }
            match &tokens[pos] {
                Token::RParen => Ok((expr, pos + 1)),
                _ => Err(ExpressionError::Parse("Expected closing parenthesis".to_string())),
            }
        }
        _ => Err(ExpressionError::Parse(format!(
            "Unexpected token at position {}",
            pos
        ))),
    }
}

fn parse_function_args(tokens: &[Token], pos: usize, depth: usize) -> Result<(Vec<Expr>, usize), ExpressionError> {
    let mut args = Vec::new();
    let mut pos = pos;

    // Empty call: abs()
    if pos < tokens.len() && tokens[pos] == Token::RParen {
        return Ok((args, pos + 1));
    }

    loop {
        let (arg, new_pos) = parse_or(tokens, pos, depth)?;
        args.push(arg);
        pos = new_pos;

        if pos >= tokens.len() {
            return Err(ExpressionError::Parse(
                "Missing closing parenthesis in function call".to_string(),
            ));
        }

        match &tokens[pos] {
            Token::RParen => return Ok((args, pos + 1)),
            Token::Comma => pos += 1,
            _ => {
                return Err(ExpressionError::Parse(
                    "Expected comma or closing parenthesis".to_string(),
                ))
            }
        }
    }
}

/// Column names referenced anywhere in the expression, in first-seen order.
pub fn referenced_columns(expr: &Expr) -> Vec<String> {
    fn walk(expr: &Expr, out: &mut Vec<String>) {
        match expr {
            Expr::Column(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Function { args, .. } => args.iter().for_each(|a| walk(a, out)),
            Expr::BinaryOp { left, right, .. } => {
                walk(left, out);
                walk(right, out);
            }
            Expr::UnaryOp { operand, .. } => walk(operand, out),
            Expr::Null | Expr::Number(_) | Expr::Text(_) | Expr::Boolean(_) => {}
        }
    }

    let mut out = Vec::new();
    walk(expr, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn test_parse_product() {
        let expr = parse("1*5").unwrap();
        assert_eq!(
            expr,
            Expr::BinaryOp { op: Op::Mul, left: num(1.0), right: num(5.0) }
        );
    }

    #[test]
    fn test_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match parse("1 + 2 * 3").unwrap() {
            Expr::BinaryOp { op: Op::Add, left, right } => {
                assert_eq!(*left, Expr::Number(1.0));
                assert!(matches!(*right, Expr::BinaryOp { op: Op::Mul, .. }));
            }
            other => panic!("Expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        match parse("2^3^2").unwrap() {
            Expr::BinaryOp { op: Op::Pow, left, right } => {
                assert_eq!(*left, Expr::Number(2.0));
                assert!(matches!(*right, Expr::BinaryOp { op: Op::Pow, .. }));
            }
            other => panic!("Expected Pow, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        match parse("-2^2").unwrap() {
            Expr::UnaryOp { op: UnaryOp::Neg, operand } => {
                assert!(matches!(*operand, Expr::BinaryOp { op: Op::Pow, .. }));
            }
            other => panic!("Expected Neg, got {:?}", other),
        }
    }

    #[test]
    fn test_columns_and_strings() {
        let expr = parse("\"roof height\" > 3 AND kind = 'it''s'").unwrap();
        assert_eq!(referenced_columns(&expr), vec!["roof height", "kind"]);

        match expr {
            Expr::BinaryOp { op: Op::And, right, .. } => match *right {
                Expr::BinaryOp { op: Op::Eq, right, .. } => {
                    assert_eq!(*right, Expr::Text("it's".to_string()));
                }
                other => panic!("Expected Eq, got {:?}", other),
            },
            other => panic!("Expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(parse("null").unwrap(), Expr::Null);
        assert_eq!(parse("True").unwrap(), Expr::Boolean(true));
        assert!(matches!(
            parse("not false").unwrap(),
            Expr::UnaryOp { op: UnaryOp::Not, .. }
        ));
    }

    #[test]
    fn test_function_call() {
        let expr = parse("MAX(1, \"h\", 3)").unwrap();
        match expr {
            Expr::Function { name, args } => {
                assert_eq!(name, "max");
                assert_eq!(args.len(), 3);
            }
            other => panic!("Expected Function, got {:?}", other),
        }
    }

    #[test]
    fn test_scientific_number() {
        assert_eq!(parse("1.5e3").unwrap(), Expr::Number(1500.0));
        assert_eq!(parse("2E-1").unwrap(), Expr::Number(0.2));
    }

    #[test]
    fn test_errors() {
        assert!(parse("").is_err());
        assert!(parse("1 +").is_err());
        assert!(parse("(1 + 2").is_err());
        assert!(parse("'open").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("a | b").is_err());
        assert!(parse("1 # 2").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep_parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(parse(&deep_parens), Err(ExpressionError::Parse(_))));

        let deep_not = format!("{}TRUE", "NOT ".repeat(100_000));
        assert!(matches!(parse(&deep_not), Err(ExpressionError::Parse(_))));

        let deep_neg = format!("{}1", "-".repeat(100_000));
        assert!(matches!(parse(&deep_neg), Err(ExpressionError::Parse(_))));

        let long_chain = vec!["1"; 100_000].join(" + ");
        assert!(matches!(parse(&long_chain), Err(ExpressionError::Parse(_))));

        let reasonable = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse(&reasonable).unwrap(), Expr::Number(1.0));
        assert!(parse(&vec!["1"; 100].join(" + ")).is_ok());
    }
}
