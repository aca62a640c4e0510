use crate::frontend::ast::{
    ArrayDecl, Assignment, ConstantKind, Declaration, DeclarationKind, Expression, ExpressionKind,
    Program, Statement, TypeSpec, TypedefDecl, VariableDecl,
};

/// Renders the tree back to source text. Binary expressions come out fully
/// parenthesized and literals re-escaped, so the output re-lexes and
/// re-parses to a structurally identical tree.
pub fn render(program: &Program) -> String {
    let mut printer = Printer {
        out: String::new(),
        indent: 0,
    };
    for declaration in &program.declarations {
        printer.declaration(declaration);
    }
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn declaration(&mut self, declaration: &Declaration) {
        match &declaration.kind {
            DeclarationKind::Variable(variable) => self.variable(variable),
            DeclarationKind::Array(array) => self.array(array),
            DeclarationKind::Typedef(typedef) => self.typedef(typedef),
            DeclarationKind::Main(main) => {
                self.line("int main()");
                self.line("{");
                self.indent += 1;
                for statement in &main.body {
                    self.statement(statement);
                }
                self.indent -= 1;
                self.line("}");
            }
        }
    }

    fn variable(&mut self, variable: &VariableDecl) {
        let mut text = format!("{} {}", type_spec(&variable.ty), variable.name.name);
        if let Some(init) = &variable.init {
            text.push_str(" = ");
            text.push_str(&expression(init));
        }
        text.push(';');
        self.line(&text);
    }

    fn array(&mut self, array: &ArrayDecl) {
        let mut text = format!("{} {}[", type_spec(&array.ty), array.name.name);
        if let Some(size) = &array.size {
            text.push_str(&expression(size));
        }
        text.push(']');

        if let Some(literal) = &array.string_init {
            text.push_str(" = ");
            text.push_str(&expression(literal));
        } else if !array.brace_init.is_empty() {
            let values: Vec<String> = array.brace_init.iter().map(expression).collect();
            text.push_str(" = {");
            text.push_str(&values.join(", "));
            text.push('}');
        }

        text.push(';');
        self.line(&text);
    }

    fn typedef(&mut self, typedef: &TypedefDecl) {
        let mut text = format!("typedef {} {}", type_spec(&typedef.ty), typedef.name.name);
        if let Some(size) = &typedef.array_size {
            text.push('[');
            text.push_str(&expression(size));
            text.push(']');
        }
        text.push(';');
        self.line(&text);
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Empty => self.line(";"),
            Statement::Compound(statements) => {
                self.line("{");
                self.indent += 1;
                for statement in statements {
                    self.statement(statement);
                }
                self.indent -= 1;
                self.line("}");
            }
            Statement::Assign(assignment) => {
                let mut text = assignment_text(assignment);
                text.push(';');
                self.line(&text);
            }
            Statement::For(for_loop) => {
                let init = for_loop.init.as_ref().map(assignment_text).unwrap_or_default();
                let condition = for_loop
                    .condition
                    .as_ref()
                    .map(expression)
                    .unwrap_or_default();
                let increment = for_loop
                    .increment
                    .as_ref()
                    .map(assignment_text)
                    .unwrap_or_default();

                self.line(&format!("for ({}; {}; {})", init, condition, increment));
                self.indent += 1;
                self.statement(&for_loop.body);
                self.indent -= 1;
            }
            Statement::Declaration(declaration) => self.declaration(declaration),
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

fn type_spec(ty: &TypeSpec) -> String {
    match ty {
        TypeSpec::Primitive(ty) => ty.to_string(),
        TypeSpec::Named(name) => name.name.clone(),
    }
}

fn assignment_text(assignment: &Assignment) -> String {
    format!(
        "{} = {}",
        expression(&assignment.target),
        expression(&assignment.value)
    )
}

fn expression(expr: &Expression) -> String {
    match &expr.kind {
        ExpressionKind::Identifier(name) => name.clone(),
        ExpressionKind::Constant { kind, value } => match kind {
            ConstantKind::Decimal | ConstantKind::Hexadecimal => value.clone(),
            ConstantKind::Character => format!("'{}'", escape(value, '\'')),
            ConstantKind::String => format!("\"{}\"", escape(value, '"')),
        },
        ExpressionKind::Binary { op, left, right } => {
            format!("({} {} {})", expression(left), op, expression(right))
        }
        ExpressionKind::Index { name, index } => format!("{}[{}]", name, expression(index)),
    }
}

/// Re-escapes the payload of a character or string literal for source form.
fn escape(text: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\\' => escaped.push_str("\\\\"),
            c if c == quote => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}
