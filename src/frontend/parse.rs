use crate::frontend::ast::{
    ArrayDecl, Assignment, BinaryOperator, ConstantKind, DataType, Declaration, DeclarationKind,
    Expression, ExpressionKind, ForLoop, Identifier, MainDecl, Program, Statement, TypeSpec,
    TypedefDecl, VariableDecl,
};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::lex::Lexer;
use crate::frontend::token::{Pos, Token, TokenKind, TokenValue};
use std::io::Read;

/// Number of pre-read tokens. The grammar needs two; the rest of the ring
/// carries `End` sentinels near EOF so `lookahead` never runs off the stream.
pub const LOOKAHEAD: usize = 8;

pub fn parse<R: Read>(lexer: Lexer<R>) -> Result<Program, Diagnostic> {
    Parser::new(lexer).parse_program()
}

pub struct Parser<R> {
    lexer: Lexer<R>,
    ring: [Token; LOOKAHEAD],
    position: usize,
    previous_end: Pos,
}

impl<R: Read> Parser<R> {
    pub fn new(mut lexer: Lexer<R>) -> Self {
        let ring = std::array::from_fn(|_| lexer.next_token());
        Parser {
            lexer,
            ring,
            position: 0,
            previous_end: Pos::start(),
        }
    }

    /* program ::= { <main-function> | <typedef> | <declaration> } END */
    pub fn parse_program(mut self) -> Result<Program, Diagnostic> {
        let mut declarations = Vec::new();

        while is_description_start(self.current()?) {
            if self.current()? == TokenKind::Int && self.peek(1) == TokenKind::Main {
                declarations.push(self.parse_main_function()?);
            } else if self.current()? == TokenKind::Typedef {
                declarations.push(self.parse_typedef()?);
            } else {
                declarations.extend(self.parse_declaration()?);
            }
        }

        self.expect(TokenKind::End, "unexpected token")?;

        Ok(Program { declarations })
    }

    /* main-function ::= "int" "main" "(" ")" "{" <compound> "}" */
    fn parse_main_function(&mut self) -> Result<Declaration, Diagnostic> {
        let int_token = self.expect(TokenKind::Int, "expected type specifier")?;
        self.expect(TokenKind::Main, "unexpected token")?;
        self.expect(TokenKind::LParen, "expected '('")?;
        self.expect(TokenKind::RParen, "expected ')'")?;
        self.expect(TokenKind::LBrace, "expected '{'")?;
        let body = self.parse_compound()?;
        self.expect(TokenKind::RBrace, "expected '}'")?;

        Ok(Declaration {
            pos: int_token.span.start,
            kind: DeclarationKind::Main(MainDecl { body }),
        })
    }

    /* compound ::= { <declaration> | <statement> } */
    fn parse_compound(&mut self) -> Result<Vec<Statement>, Diagnostic> {
        let mut statements = Vec::new();

        loop {
            match self.current()? {
                // An identifier starts a statement when an assignment follows,
                // otherwise it is a typedef-typed declaration.
                TokenKind::Ident => {
                    if matches!(self.peek(1), TokenKind::LBracket | TokenKind::Assign) {
                        statements.push(self.parse_statement()?);
                    } else {
                        let declarations = self.parse_declaration()?;
                        statements.extend(declarations.into_iter().map(Statement::Declaration));
                    }
                }
                TokenKind::Int | TokenKind::Short | TokenKind::Long | TokenKind::Char => {
                    let declarations = self.parse_declaration()?;
                    statements.extend(declarations.into_iter().map(Statement::Declaration));
                }
                TokenKind::For | TokenKind::LBrace | TokenKind::Semicolon => {
                    statements.push(self.parse_statement()?);
                }
                _ => break,
            }
        }

        Ok(statements)
    }

    /* typedef ::= "typedef" <type> IDENT [ "[" <expression> "]" ] ";" */
    fn parse_typedef(&mut self) -> Result<Declaration, Diagnostic> {
        let keyword = self.expect(TokenKind::Typedef, "unexpected token")?;
        let ty = self.parse_type_specifier()?;
        let name = self.parse_identifier()?;

        let mut array_size = None;
        if self.current()? == TokenKind::LBracket {
            self.consume();
            array_size = Some(self.parse_expression()?);
            self.expect(TokenKind::RBracket, "expected ']'")?;
        }

        self.expect(TokenKind::Semicolon, "expected ';'")?;

        Ok(Declaration {
            pos: keyword.span.start,
            kind: DeclarationKind::Typedef(TypedefDecl {
                ty,
                name,
                array_size,
            }),
        })
    }

    /* declaration ::= <type> <single-variable> { "," <single-variable> } ";" */
    fn parse_declaration(&mut self) -> Result<Vec<Declaration>, Diagnostic> {
        let ty = self.parse_type_specifier()?;
        let mut declarations = Vec::new();

        loop {
            declarations.push(self.parse_single_variable(&ty)?);
            if self.current()? != TokenKind::Comma {
                break;
            }
            self.consume();
        }

        self.expect(TokenKind::Semicolon, "expected ';'")?;

        Ok(declarations)
    }

    /* type ::= "int" | "short" | "long" | "char" | IDENT */
    fn parse_type_specifier(&mut self) -> Result<TypeSpec, Diagnostic> {
        let spec = match self.current()? {
            TokenKind::Int => TypeSpec::Primitive(DataType::Int),
            TokenKind::Short => TypeSpec::Primitive(DataType::Short),
            TokenKind::Long => TypeSpec::Primitive(DataType::Long),
            TokenKind::Char => TypeSpec::Primitive(DataType::Char),
            TokenKind::Ident => {
                let token = self.consume();
                return Ok(TypeSpec::Named(Identifier {
                    pos: token.span.start,
                    name: token.text().to_string(),
                }));
            }
            _ => return Err(self.syntax_error("expected type specifier")),
        };
        self.consume();
        Ok(spec)
    }

    /* single-variable ::= IDENT [ "[" [ <expression> ] "]" ] [ "=" <initializer> ] */
    fn parse_single_variable(&mut self, ty: &TypeSpec) -> Result<Declaration, Diagnostic> {
        let name = self.parse_identifier()?;
        let pos = name.pos;

        if self.current()? != TokenKind::LBracket {
            let mut init = None;
            if self.current()? == TokenKind::Assign {
                self.consume();
                init = Some(self.parse_expression()?);
            }

            return Ok(Declaration {
                pos,
                kind: DeclarationKind::Variable(VariableDecl {
                    ty: ty.clone(),
                    name,
                    init,
                }),
            });
        }

        self.consume();
        let mut size = None;
        if self.current()? != TokenKind::RBracket {
            size = Some(self.parse_expression()?);
        }
        self.expect(TokenKind::RBracket, "expected ']'")?;

        let mut brace_init = Vec::new();
        let mut string_init = None;

        if self.current()? == TokenKind::Assign {
            self.consume();

            if self.current()? == TokenKind::LBrace {
                self.consume();
                if self.current()? == TokenKind::RBrace {
                    self.consume();
                } else {
                    loop {
                        brace_init.push(self.parse_expression()?);
                        if self.current()? != TokenKind::Comma {
                            break;
                        }
                        self.consume();
                    }
                    self.expect(TokenKind::RBrace, "expected '}'")?;
                }
            } else {
                let literal = self.expect(TokenKind::ConstStr, "expected expression")?;
                string_init = Some(Expression::new(
                    literal.span.start,
                    ExpressionKind::Constant {
                        kind: ConstantKind::String,
                        value: literal.text().to_string(),
                    },
                ));
            }
        }

        Ok(Declaration {
            pos,
            kind: DeclarationKind::Array(ArrayDecl {
                ty: ty.clone(),
                name,
                size,
                brace_init,
                string_init,
            }),
        })
    }

    /* statement ::= <for> | "{" <compound> "}" | <assignment> ";" | ";" */
    fn parse_statement(&mut self) -> Result<Statement, Diagnostic> {
        match self.current()? {
            TokenKind::For => self.parse_for(),
            TokenKind::LBrace => {
                self.consume();
                let statements = self.parse_compound()?;
                self.expect(TokenKind::RBrace, "expected '}'")?;
                Ok(Statement::Compound(statements))
            }
            TokenKind::Ident => {
                let assignment = self.parse_assignment()?;
                self.expect(TokenKind::Semicolon, "expected ';'")?;
                Ok(Statement::Assign(assignment))
            }
            _ => {
                self.expect(TokenKind::Semicolon, "expected ';'")?;
                Ok(Statement::Empty)
            }
        }
    }

    /* for ::= "for" "(" [ <assignment> ] ";" [ <expression> ] ";"
     *         [ <assignment> ] ")" <statement> */
    fn parse_for(&mut self) -> Result<Statement, Diagnostic> {
        let keyword = self.expect(TokenKind::For, "unexpected token")?;
        self.expect(TokenKind::LParen, "expected '('")?;

        let mut init = None;
        if self.current()? == TokenKind::Ident {
            init = Some(self.parse_assignment()?);
        }
        self.expect(TokenKind::Semicolon, "expected ';'")?;

        let mut condition = None;
        if self.current()? != TokenKind::Semicolon {
            condition = Some(self.parse_expression()?);
        }
        self.expect(TokenKind::Semicolon, "expected ';'")?;

        let mut increment = None;
        if self.current()? == TokenKind::Ident {
            increment = Some(self.parse_assignment()?);
        }
        self.expect(TokenKind::RParen, "expected ')'")?;

        let body = self.parse_statement()?;

        Ok(Statement::For(Box::new(ForLoop {
            pos: keyword.span.start,
            init,
            condition,
            increment,
            body,
        })))
    }

    /* assignment ::= IDENT [ "[" <expression> "]" ] "=" <expression> */
    fn parse_assignment(&mut self) -> Result<Assignment, Diagnostic> {
        let target = if self.peek(1) == TokenKind::LBracket {
            let name = self.expect(TokenKind::Ident, "expected identifier")?;
            self.consume();
            let index = self.parse_expression()?;
            self.expect(TokenKind::RBracket, "expected ']'")?;
            Expression::new(
                name.span.start,
                ExpressionKind::Index {
                    name: name.text().to_string(),
                    index: Box::new(index),
                },
            )
        } else {
            let name = self.expect(TokenKind::Ident, "expected identifier")?;
            Expression::new(
                name.span.start,
                ExpressionKind::Identifier(name.text().to_string()),
            )
        };

        let pos = target.pos;
        self.expect(TokenKind::Assign, "expected '='")?;
        let value = self.parse_expression()?;

        Ok(Assignment { pos, target, value })
    }

    /* expression ::= <equality> */
    fn parse_expression(&mut self) -> Result<Expression, Diagnostic> {
        self.parse_equality()
    }

    /* equality ::= <comparison> { ( "==" | "!=" ) <comparison> } */
    fn parse_equality(&mut self) -> Result<Expression, Diagnostic> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.current()? {
                TokenKind::Eq => BinaryOperator::Eq,
                TokenKind::Neq => BinaryOperator::Neq,
                _ => break,
            };
            self.consume();
            let right = self.parse_comparison()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    /* comparison ::= <shift> { ( "<" | "<=" | ">" | ">=" ) <shift> } */
    fn parse_comparison(&mut self) -> Result<Expression, Diagnostic> {
        let mut left = self.parse_shift()?;

        loop {
            let op = match self.current()? {
                TokenKind::Lt => BinaryOperator::Lt,
                TokenKind::Le => BinaryOperator::Le,
                TokenKind::Gt => BinaryOperator::Gt,
                TokenKind::Ge => BinaryOperator::Ge,
                _ => break,
            };
            self.consume();
            let right = self.parse_shift()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    /* shift ::= <additive> { ( "<<" | ">>" ) <additive> } */
    fn parse_shift(&mut self) -> Result<Expression, Diagnostic> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current()? {
                TokenKind::Shl => BinaryOperator::Shl,
                TokenKind::Shr => BinaryOperator::Shr,
                _ => break,
            };
            self.consume();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    /* additive ::= <multiplicative> { ( "+" | "-" ) <multiplicative> } */
    fn parse_additive(&mut self) -> Result<Expression, Diagnostic> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current()? {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.consume();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    /* multiplicative ::= <unary> { ( "*" | "/" | "%" ) <unary> } */
    fn parse_multiplicative(&mut self) -> Result<Expression, Diagnostic> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current()? {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    /* unary ::= [ "+" | "-" ] <primary>
     * primary ::= "(" <expression> ")" | CONST_DEC | CONST_HEX | CONST_SYMB
     *           | IDENT [ "[" <expression> "]" ] */
    fn parse_unary(&mut self) -> Result<Expression, Diagnostic> {
        let mut negative = false;
        if matches!(self.current()?, TokenKind::Plus | TokenKind::Minus) {
            negative = self.current()? == TokenKind::Minus;
            self.consume();
        }

        match self.current()? {
            TokenKind::LParen => {
                self.consume();
                let expression = self.parse_expression()?;
                self.expect(TokenKind::RParen, "expected ')'")?;
                Ok(expression)
            }
            TokenKind::ConstDec | TokenKind::ConstHex | TokenKind::ConstChar => {
                let token = self.consume();
                let (kind, value) = match token.kind {
                    TokenKind::ConstDec => {
                        (ConstantKind::Decimal, signed(token.text(), negative))
                    }
                    TokenKind::ConstHex => {
                        (ConstantKind::Hexadecimal, signed(token.text(), negative))
                    }
                    _ => {
                        // A character constant stores its one character as text.
                        let value = match &token.value {
                            TokenValue::Char(c) => c.to_string(),
                            _ => String::new(),
                        };
                        (ConstantKind::Character, value)
                    }
                };
                Ok(Expression::new(
                    token.span.start,
                    ExpressionKind::Constant { kind, value },
                ))
            }
            _ => {
                if self.peek(1) == TokenKind::LBracket {
                    let name = self.expect(TokenKind::Ident, "expected expression")?;
                    self.consume();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket, "expected ']'")?;
                    Ok(Expression::new(
                        name.span.start,
                        ExpressionKind::Index {
                            name: name.text().to_string(),
                            index: Box::new(index),
                        },
                    ))
                } else {
                    let name = self.expect(TokenKind::Ident, "expected expression")?;
                    Ok(Expression::new(
                        name.span.start,
                        ExpressionKind::Identifier(name.text().to_string()),
                    ))
                }
            }
        }
    }

    fn parse_identifier(&mut self) -> Result<Identifier, Diagnostic> {
        let token = self.expect(TokenKind::Ident, "expected identifier")?;
        Ok(Identifier {
            pos: token.span.start,
            name: token.text().to_string(),
        })
    }

    /// The kind of `lookahead(0)`, surfacing a pending lexical failure.
    fn current(&mut self) -> Result<TokenKind, Diagnostic> {
        match self.ring[self.position].kind {
            TokenKind::Error => Err(self.lexical_failure()),
            kind => Ok(kind),
        }
    }

    fn peek(&self, distance: usize) -> TokenKind {
        self.ring[(self.position + distance) % LOOKAHEAD].kind
    }

    fn consume(&mut self) -> Token {
        let next = self.lexer.next_token();
        let token = std::mem::replace(&mut self.ring[self.position], next);
        self.position = (self.position + 1) % LOOKAHEAD;
        self.previous_end = token.span.end;
        token
    }

    fn expect(&mut self, expected: TokenKind, message: &str) -> Result<Token, Diagnostic> {
        if self.current()? == expected {
            Ok(self.consume())
        } else {
            Err(self.syntax_error(message))
        }
    }

    /// Builds a syntax diagnostic for the current token. When the lexer
    /// skipped a line feed, the error belongs to the end of the previously
    /// consumed token, not to the token that happens to come next.
    fn syntax_error(&mut self, message: &str) -> Diagnostic {
        let at = if self.lexer.newline_skipped() {
            self.previous_end
        } else {
            self.ring[self.position].span.start
        };
        Diagnostic::syntax(self.lexer.path(), at, message)
    }

    fn lexical_failure(&mut self) -> Diagnostic {
        let token = &self.ring[self.position];
        let at = token.span.start;
        let message = token.text().to_string();
        self.lexer
            .take_failure()
            .unwrap_or_else(|| Diagnostic::lexical(self.lexer.path(), at, message))
    }
}

fn is_description_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Typedef
            | TokenKind::Int
            | TokenKind::Short
            | TokenKind::Long
            | TokenKind::Char
            | TokenKind::Ident
    )
}

fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::new(
        left.pos,
        ExpressionKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    )
}

/// Unary sign is encoded by prefixing the constant's textual value.
fn signed(text: &str, negative: bool) -> String {
    if negative {
        format!("-{}", text)
    } else {
        text.to_string()
    }
}
