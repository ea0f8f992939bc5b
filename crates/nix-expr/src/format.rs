//! Printing nodes as Nix source.

use crate::config::FormatConfig;
use crate::identifier::{format_key, format_string};
use crate::node::{ArgSpec, AttrSet, Inherit, Node};

/// How tightly a node binds. A node placed in a position that only accepts
/// a tighter binding is wrapped in parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    /// Literals, sets, lists, selections.
    Atom,
    /// `a.b or c`; the fallback would swallow a trailing `.attr`.
    Fallback,
    /// `f x`, `import x`
    Application,
    /// `a // b`
    Operator,
    /// `let`, `if`, `with`, `assert` and functions extend as far right as
    /// possible.
    Lowest,
}

impl Node {
    /// Print this node as Nix source.
    ///
    /// `indent_level` is the nesting level of the line the expression starts
    /// on; nested bodies are printed one level deeper and closing tokens
    /// return to `indent_level`. The first line is not indented.
    pub fn to_expr(&self, indent_level: usize, config: &FormatConfig) -> String {
        let mut printer = Printer::new(config);
        printer.node(self, indent_level);
        printer.finish()
    }

    /// Print at the top level with the default layout.
    pub fn to_nix(&self) -> String {
        self.to_expr(0, &FormatConfig::default())
    }

    fn precedence(&self) -> Precedence {
        match self {
            Node::Null
            | Node::Bool(_)
            | Node::Int(_)
            | Node::Float(_)
            | Node::String(_)
            | Node::Url(_)
            | Node::Path(_)
            | Node::Expression(_)
            | Node::Inherit(_)
            | Node::AttrSet(_)
            | Node::RecAttrSet(_)
            | Node::List(_) => Precedence::Atom,
            Node::AttrReference(reference) if reference.or_default().is_some() => {
                Precedence::Fallback
            }
            Node::AttrReference(_) => Precedence::Atom,
            Node::FunInvocation(_) | Node::Import(_) => Precedence::Application,
            Node::MergeAttrs(_) => Precedence::Operator,
            Node::Let(_) | Node::Function(_) | Node::If(_) | Node::With(_) | Node::Assert(_) => {
                Precedence::Lowest
            }
        }
    }
}

struct Printer<'a> {
    config: &'a FormatConfig,
    output: String,
}

impl<'a> Printer<'a> {
    fn new(config: &'a FormatConfig) -> Self {
        Self {
            config,
            output: String::new(),
        }
    }

    fn finish(self) -> String {
        self.output
    }

    fn text(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn newline(&mut self) {
        self.output.push_str(self.config.newline.as_str());
    }

    fn indent(&mut self, level: usize) {
        let indent = self.config.indent_string(level);
        self.output.push_str(&indent);
    }

    fn node(&mut self, node: &Node, level: usize) {
        match node {
            Node::Null => self.text("null"),
            Node::Bool(b) => self.text(if *b { "true" } else { "false" }),
            // -9223372036854775808 is negation of an out-of-range literal in Nix
            Node::Int(i64::MIN) => self.text("(-9223372036854775807 - 1)"),
            Node::Int(i) => {
                if *i < 0 {
                    self.output.push_str(&format!("({i})"));
                } else {
                    self.output.push_str(&i.to_string());
                }
            }
            Node::Float(f) => self.text(&format_float(f.get())),
            Node::String(s) => self.text(&format_string(s)),
            Node::Url(url) => {
                if url.is_bare_literal() {
                    self.text(url.as_str());
                } else {
                    self.text(&format_string(url.as_str()));
                }
            }
            Node::Path(path) => self.text(path.as_str()),
            Node::Expression(source) => self.text(source),
            Node::Inherit(inherit) => self.inherit(inherit),
            Node::AttrSet(set) => self.attr_set(set, level),
            Node::RecAttrSet(set) => {
                self.text("rec ");
                self.attr_set(set, level);
            }
            Node::List(items) => self.list(items, level),
            Node::MergeAttrs(merge) => {
                self.operand(merge.left(), level, Precedence::Operator);
                self.text(" // ");
                self.operand(merge.right(), level, Precedence::Operator);
            }
            Node::FunInvocation(invocation) => {
                self.operand(invocation.fun_expr(), level, Precedence::Application);
                self.text(" ");
                self.operand(invocation.param_expr(), level, Precedence::Atom);
            }
            Node::Let(let_expr) => {
                self.text("let");
                self.newline();
                self.bindings(let_expr.value(), level + 1);
                self.indent(level);
                self.text("in");
                self.newline();
                self.indent(level);
                self.node(let_expr.body(), level);
            }
            Node::Function(function) => {
                match function.args() {
                    ArgSpec::Ident(name) => {
                        self.text(name);
                        self.text(": ");
                    }
                    ArgSpec::Formals { formals, ellipsis } => {
                        self.text("{");
                        let mut names: Vec<String> = formals
                            .iter()
                            .map(|formal| match &formal.default {
                                Some(default) => {
                                    let mut printer = Printer::new(self.config);
                                    printer.operand(default, level, Precedence::Operator);
                                    format!("{} ? {}", formal.name, printer.finish())
                                }
                                None => formal.name.clone(),
                            })
                            .collect();
                        if *ellipsis {
                            names.push("...".to_string());
                        }
                        if !names.is_empty() {
                            self.text(" ");
                            self.text(&names.join(", "));
                            self.text(" ");
                        }
                        self.text("}:");
                        self.newline();
                        self.newline();
                        self.indent(level);
                    }
                }
                self.node(function.body(), level);
            }
            Node::If(if_expr) => {
                self.text("if ");
                self.operand(if_expr.condition(), level, Precedence::Operator);
                self.text(" then ");
                self.operand(if_expr.then_expr(), level, Precedence::Operator);
                self.text(" else ");
                self.node(if_expr.else_expr(), level);
            }
            Node::With(with) => {
                self.text("with ");
                self.operand(with.scope(), level, Precedence::Operator);
                self.text(";");
                self.newline();
                self.newline();
                self.indent(level);
                self.node(with.body(), level);
            }
            Node::Assert(assert) => {
                self.text("assert ");
                self.operand(assert.condition(), level, Precedence::Operator);
                self.text(";");
                self.newline();
                self.newline();
                self.indent(level);
                self.node(assert.body(), level);
            }
            Node::Import(path) => {
                self.text("import ");
                self.operand(path, level, Precedence::Atom);
            }
            Node::AttrReference(reference) => {
                self.operand(reference.attr_set(), level, Precedence::Atom);
                for name in reference.path() {
                    self.text(".");
                    self.text(&format_key(name));
                }
                if let Some(default) = reference.or_default() {
                    self.text(" or ");
                    self.operand(default, level, Precedence::Atom);
                }
            }
        }
    }

    /// Print `node`, parenthesized if it binds looser than `max`.
    fn operand(&mut self, node: &Node, level: usize, max: Precedence) {
        if node.precedence() > max {
            self.text("(");
            self.node(node, level);
            self.text(")");
        } else {
            self.node(node, level);
        }
    }

    fn inherit(&mut self, inherit: &Inherit) {
        self.text("inherit");
        if let Some(scope) = inherit.scope() {
            self.text(" (");
            self.text(scope);
            self.text(")");
        }
    }

    fn attr_set(&mut self, set: &AttrSet, level: usize) {
        if set.is_empty() {
            self.text("{}");
            return;
        }
        self.text("{");
        self.newline();
        self.bindings(set, level + 1);
        self.indent(level);
        self.text("}");
    }

    /// One binding per line at `level`, each terminated by a newline.
    fn bindings(&mut self, set: &AttrSet, level: usize) {
        for (name, value) in set.iter() {
            self.indent(level);
            match value {
                Node::Inherit(inherit) => {
                    self.inherit(inherit);
                    self.text(" ");
                    self.text(&format_key(name));
                }
                _ => {
                    self.text(&format_key(name));
                    self.text(" = ");
                    self.node(value, level);
                }
            }
            self.text(";");
            self.newline();
        }
    }

    /// `[ a b c ]` when every element fits on one line, otherwise one
    /// element per line.
    fn list(&mut self, items: &[Node], level: usize) {
        if items.is_empty() {
            self.text("[]");
            return;
        }
        let rendered: Vec<String> = items
            .iter()
            .map(|item| {
                let mut printer = Printer::new(self.config);
                printer.operand(item, level + 1, Precedence::Atom);
                printer.finish()
            })
            .collect();

        if rendered.iter().all(|item| !item.contains('\n')) {
            self.text("[ ");
            self.text(&rendered.join(" "));
            self.text(" ]");
        } else {
            self.text("[");
            self.newline();
            for item in &rendered {
                self.indent(level + 1);
                self.text(item);
                self.newline();
            }
            self.indent(level);
            self.text("]");
        }
    }
}

/// Nix reads a number without a `.` as an integer, so one is always present.
/// Negative numbers are parenthesized to stay a single list element.
fn format_float(value: f64) -> String {
    let mut s = value.to_string();
    if !s.contains('.') {
        s.push_str(".0");
    }
    if value.is_sign_negative() {
        format!("({s})")
    } else {
        s
    }
}
