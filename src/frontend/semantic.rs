use crate::frontend::ast::{
    ArrayDecl, Assignment, BinaryOperator, ConstantKind, DataType, Declaration, DeclarationKind,
    Expression, ExpressionKind, Identifier, Program, Statement, TypeSpec, TypedefDecl,
    VariableDecl,
};
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::fold;
use crate::frontend::symbols::{Symbol, SymbolTable};
use crate::frontend::token::Pos;

/// Validates the parsed program, stamping a resolved type on every expression
/// node, and returns it. The first rule violation is returned as a semantic
/// diagnostic.
pub fn analyze(program: Program, path: &str) -> Result<Program, Diagnostic> {
    let mut analyzer = Analyzer {
        path: path.to_string(),
        symbols: SymbolTable::new(),
    };
    let mut program = program;
    analyzer.visit_program(&mut program)?;
    Ok(program)
}

struct Analyzer {
    path: String,
    symbols: SymbolTable,
}

impl Analyzer {
    fn visit_program(&mut self, program: &mut Program) -> Result<(), Diagnostic> {
        for declaration in &mut program.declarations {
            self.visit_declaration(declaration)?;
        }
        Ok(())
    }

    fn visit_declaration(&mut self, declaration: &mut Declaration) -> Result<(), Diagnostic> {
        let pos = declaration.pos;
        match &mut declaration.kind {
            DeclarationKind::Main(main) => {
                if self.symbols.lookup("main").is_some() {
                    return self.fail(pos, "main function is already declared");
                }

                self.symbols.declare(
                    "main",
                    Symbol {
                        ty: DataType::Int,
                        is_array: false,
                        array_size: -1,
                        is_typedef: false,
                        declared_at: pos,
                    },
                );

                self.symbols.enter_scope();
                for statement in &mut main.body {
                    self.visit_statement(statement)?;
                }
                self.symbols.leave_scope();
                Ok(())
            }
            DeclarationKind::Variable(variable) => self.visit_variable_decl(pos, variable),
            DeclarationKind::Array(array) => self.visit_array_decl(pos, array),
            DeclarationKind::Typedef(typedef) => self.visit_typedef_decl(pos, typedef),
        }
    }

    fn visit_variable_decl(
        &mut self,
        pos: Pos,
        variable: &mut VariableDecl,
    ) -> Result<(), Diagnostic> {
        let name = variable.name.name.clone();
        self.check_declarable(pos, &name)?;

        let (ty, is_array, array_size) = match &variable.ty {
            TypeSpec::Primitive(ty) => (*ty, false, -1),
            TypeSpec::Named(type_name) => {
                let symbol = self.resolve_typedef(type_name)?;
                (symbol.ty, symbol.is_array, symbol.array_size)
            }
        };

        if let Some(init) = &mut variable.init {
            self.visit_expression(init)?;
        }

        self.symbols.declare(
            name,
            Symbol {
                ty,
                is_array,
                array_size,
                is_typedef: false,
                declared_at: pos,
            },
        );
        Ok(())
    }

    fn visit_array_decl(&mut self, pos: Pos, array: &mut ArrayDecl) -> Result<(), Diagnostic> {
        let name = array.name.name.clone();
        self.check_declarable(pos, &name)?;

        let mut size: i32 = -1;
        let element = match &array.ty {
            TypeSpec::Primitive(ty) => *ty,
            TypeSpec::Named(type_name) => {
                let symbol = self.resolve_typedef(type_name)?;
                if symbol.is_array && array.size.is_some() {
                    return self.fail(pos, "underlying type is already an array");
                }
                size = symbol.array_size;
                symbol.ty
            }
        };

        if let Some(size_expr) = &mut array.size {
            self.visit_expression(size_expr)?;
            size = self.fold_size(size_expr)?;
            if size <= 0 {
                return self.fail(pos, "the array size must be greater than 0");
            }
        }

        if let Some(literal) = &mut array.string_init {
            self.visit_expression(literal)?;

            if element != DataType::Char {
                return self.fail(
                    pos,
                    "an array of type other than 'char' can't be initialized with a string",
                );
            }

            let required = match &literal.kind {
                ExpressionKind::Constant {
                    kind: ConstantKind::String,
                    value,
                } => value.len() as i32 + 1,
                _ => return self.fail(literal.pos, "expected a string literal initializer"),
            };

            if size == -1 {
                size = required;
            } else if size < required {
                return self.fail(
                    pos,
                    format!(
                        "an array of size {} is too small for initialization with a string of size {}",
                        size, required
                    ),
                );
            }
        } else if !array.brace_init.is_empty() {
            let count = array.brace_init.len() as i32;

            if size == -1 {
                size = count;
            } else if size < count {
                let at = array.brace_init[0].pos;
                return self.fail(
                    at,
                    format!("too many initializers for an array of size {}", size),
                );
            }

            for expression in &mut array.brace_init {
                self.visit_expression(expression)?;
            }
        }

        if size == -1 {
            return self.fail(pos, format!("failed to determine the size of the array '{}'", name));
        }

        self.symbols.declare(
            name,
            Symbol {
                ty: element,
                is_array: true,
                array_size: size,
                is_typedef: false,
                declared_at: pos,
            },
        );
        Ok(())
    }

    fn visit_typedef_decl(
        &mut self,
        pos: Pos,
        typedef: &mut TypedefDecl,
    ) -> Result<(), Diagnostic> {
        let name = typedef.name.name.clone();
        if !self.symbols.is_unique_in_current_scope(&name) {
            return self.fail(pos, format!("redeclaration of '{}'", name));
        }

        let symbol = match &typedef.ty {
            TypeSpec::Named(type_name) => {
                let underlying = match self.symbols.lookup(&type_name.name) {
                    Some(symbol) => *symbol,
                    None => {
                        return self.fail(type_name.pos, "identifier usage before a declaration");
                    }
                };

                if underlying.is_array && typedef.array_size.is_some() {
                    return self.fail(pos, "underlying type is already an array");
                }

                Symbol {
                    ty: underlying.ty,
                    is_array: underlying.is_array,
                    array_size: underlying.array_size,
                    is_typedef: true,
                    declared_at: pos,
                }
            }
            TypeSpec::Primitive(ty) => {
                let ty = *ty;
                let (is_array, array_size) = match &mut typedef.array_size {
                    Some(size_expr) => {
                        self.visit_expression(size_expr)?;
                        let size = self.fold_size(size_expr)?;
                        if size <= 0 {
                            return self.fail(pos, "the array size must be greater than 0");
                        }
                        (true, size)
                    }
                    None => (false, -1),
                };

                Symbol {
                    ty,
                    is_array,
                    array_size,
                    is_typedef: true,
                    declared_at: pos,
                }
            }
        };

        self.symbols.declare(name, symbol);
        Ok(())
    }

    fn visit_statement(&mut self, statement: &mut Statement) -> Result<(), Diagnostic> {
        match statement {
            Statement::Empty => Ok(()),
            Statement::Compound(statements) => {
                self.symbols.enter_scope();
                for statement in statements {
                    self.visit_statement(statement)?;
                }
                self.symbols.leave_scope();
                Ok(())
            }
            Statement::For(for_loop) => {
                self.symbols.enter_scope();

                if let Some(init) = &mut for_loop.init {
                    self.visit_assignment(init)?;
                }
                if let Some(condition) = &mut for_loop.condition {
                    self.visit_expression(condition)?;
                    if !condition.resolved_type.is_integer() {
                        return self.fail(
                            condition.pos,
                            "the loop condition must be resolvable to a boolean (integer) value",
                        );
                    }
                }
                if let Some(increment) = &mut for_loop.increment {
                    self.visit_assignment(increment)?;
                }
                self.visit_statement(&mut for_loop.body)?;

                self.symbols.leave_scope();
                Ok(())
            }
            Statement::Assign(assignment) => self.visit_assignment(assignment),
            Statement::Declaration(declaration) => self.visit_declaration(declaration),
        }
    }

    fn visit_assignment(&mut self, assignment: &mut Assignment) -> Result<(), Diagnostic> {
        self.visit_expression(&mut assignment.target)?;
        self.visit_expression(&mut assignment.value)?;

        let is_lvalue = match &assignment.target.kind {
            ExpressionKind::Identifier(name) => match self.symbols.lookup(name) {
                Some(symbol) => !symbol.is_array,
                None => false,
            },
            ExpressionKind::Index { .. } => true,
            _ => false,
        };

        if !is_lvalue {
            return self.fail(
                assignment.pos,
                "left operand of an assignment operator must be a l-value",
            );
        }
        Ok(())
    }

    fn visit_expression(&mut self, expression: &mut Expression) -> Result<(), Diagnostic> {
        let pos = expression.pos;
        let resolved = match &mut expression.kind {
            ExpressionKind::Identifier(name) => {
                let symbol = match self.symbols.lookup(name) {
                    Some(symbol) => *symbol,
                    None => return self.fail(pos, "identifier usage before a declaration"),
                };
                if symbol.is_typedef {
                    return self.fail(
                        pos,
                        format!("typename '{}' was used as a variable name", name),
                    );
                }
                if symbol.is_array {
                    DataType::Array
                } else {
                    symbol.ty
                }
            }
            ExpressionKind::Constant { kind, .. } => match kind {
                ConstantKind::Decimal | ConstantKind::Hexadecimal => DataType::Int,
                ConstantKind::Character => DataType::Char,
                ConstantKind::String => DataType::Array,
            },
            ExpressionKind::Binary { op, left, right } => {
                let op = *op;
                self.visit_expression(left)?;
                self.visit_expression(right)?;

                let left_type = left.resolved_type;
                let right_type = right.resolved_type;

                if left_type == DataType::Unknown || right_type == DataType::Unknown {
                    DataType::Unknown
                } else {
                    // Blame whichever operand is not an integer, left first.
                    let blamed = if left_type.is_integer() {
                        right.pos
                    } else {
                        left.pos
                    };

                    match op {
                        BinaryOperator::Add
                        | BinaryOperator::Sub
                        | BinaryOperator::Mul
                        | BinaryOperator::Div
                        | BinaryOperator::Mod
                        | BinaryOperator::Shl
                        | BinaryOperator::Shr => {
                            if !left_type.is_integer() || !right_type.is_integer() {
                                return self.fail(
                                    blamed,
                                    "operands for arithmetic/shift operations must be integers",
                                );
                            }
                            left_type.max(right_type)
                        }
                        BinaryOperator::Eq
                        | BinaryOperator::Neq
                        | BinaryOperator::Lt
                        | BinaryOperator::Le
                        | BinaryOperator::Gt
                        | BinaryOperator::Ge => {
                            if !left_type.is_integer() || !right_type.is_integer() {
                                return self.fail(
                                    blamed,
                                    "operands for a comparison operation must be integers",
                                );
                            }
                            DataType::Int
                        }
                    }
                }
            }
            ExpressionKind::Index { name, index } => {
                let symbol = match self.symbols.lookup(name) {
                    Some(symbol) => *symbol,
                    None => return self.fail(pos, "identifier usage before a declaration"),
                };
                if symbol.is_typedef {
                    return self.fail(
                        pos,
                        format!("typename '{}' was used as a variable name", name),
                    );
                }

                self.visit_expression(index)?;

                if !symbol.is_array {
                    return self.fail(pos, "attempt to index not an array");
                }
                symbol.ty
            }
        };

        expression.resolved_type = resolved;
        Ok(())
    }

    /// Redeclaration and typedef-shadowing checks shared by variable and
    /// array declarations.
    fn check_declarable(&self, pos: Pos, name: &str) -> Result<(), Diagnostic> {
        if !self.symbols.is_unique_in_current_scope(name) {
            return self.fail(pos, format!("redeclaration of '{}'", name));
        }
        if let Some(symbol) = self.symbols.lookup(name) {
            if symbol.is_typedef {
                return self.fail(
                    pos,
                    format!("typename '{}' was used as a variable name", name),
                );
            }
        }
        Ok(())
    }

    fn resolve_typedef(&self, type_name: &Identifier) -> Result<Symbol, Diagnostic> {
        match self.symbols.lookup(&type_name.name) {
            Some(symbol) if symbol.is_typedef => Ok(*symbol),
            _ => self.fail(
                type_name.pos,
                format!("usage of an undefined type '{}'", type_name.name),
            ),
        }
    }

    fn fold_size(&self, size_expr: &Expression) -> Result<i32, Diagnostic> {
        fold::evaluate(size_expr).or_else(|error| self.fail(size_expr.pos, error.to_string()))
    }

    fn fail<T>(&self, pos: Pos, message: impl Into<String>) -> Result<T, Diagnostic> {
        Err(Diagnostic::semantic(&self.path, pos, message))
    }
}
