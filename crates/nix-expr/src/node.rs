//! The Nix expression node tree.
//!
//! Every node prints itself as a complete Nix expression (see
//! [`Node::to_expr`]). Wrapper nodes with constraints between their fields
//! are built through fallible constructors so a malformed tree is rejected
//! when it is assembled, not when it is printed.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use thisisplural::Plural;

use crate::Error;
use crate::identifier::is_bare_identifier;

static URL_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+\-.]*:[a-zA-Z0-9%/?:@&=+$,\-_.!~*']+$").unwrap()
});

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+\-.]*:").unwrap());

static PATH_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\.{1,2}|~)?(/[A-Za-z0-9._+\-]+)+$").unwrap());

static SEARCH_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<[A-Za-z0-9._+\-]+(/[A-Za-z0-9._+\-]+)*>$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Null,
    Bool(bool),
    Int(i64),
    Float(Float),
    String(String),
    Url(Url),
    Path(NixPath),
    /// Raw Nix source, printed verbatim. The caller guarantees it is valid.
    Expression(String),
    Inherit(Inherit),
    AttrSet(AttrSet),
    RecAttrSet(AttrSet),
    List(Vec<Node>),
    MergeAttrs(Box<MergeAttrs>),
    FunInvocation(Box<FunInvocation>),
    Let(Box<Let>),
    Function(Box<Function>),
    If(Box<If>),
    With(Box<With>),
    Assert(Box<Assert>),
    /// `import <path>`
    Import(Box<Node>),
    AttrReference(Box<AttrReference>),
}

impl Node {
    pub fn expression(source: impl Into<String>) -> Self {
        Node::Expression(source.into())
    }

    pub fn rec_attr_set(set: AttrSet) -> Self {
        Node::RecAttrSet(set)
    }

    pub fn import(path: impl Into<Node>) -> Self {
        Node::Import(Box::new(path.into()))
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Int(_) => "int",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::Url(_) => "url",
            Node::Path(_) => "path",
            Node::Expression(_) => "expression",
            Node::Inherit(_) => "inherit",
            Node::AttrSet(_) => "attribute set",
            Node::RecAttrSet(_) => "recursive attribute set",
            Node::List(_) => "list",
            Node::MergeAttrs(_) => "attribute set merge",
            Node::FunInvocation(_) => "function invocation",
            Node::Let(_) => "let expression",
            Node::Function(_) => "function",
            Node::If(_) => "if expression",
            Node::With(_) => "with expression",
            Node::Assert(_) => "assert expression",
            Node::Import(_) => "import",
            Node::AttrReference(_) => "attribute reference",
        }
    }

    /// Whether this node can evaluate to an attribute set at all.
    fn may_be_attr_set(&self) -> bool {
        !matches!(
            self,
            Node::Null
                | Node::Bool(_)
                | Node::Int(_)
                | Node::Float(_)
                | Node::String(_)
                | Node::Url(_)
                | Node::Path(_)
                | Node::Inherit(_)
                | Node::List(_)
                | Node::Function(_)
        )
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_nix())
    }
}

/// A finite floating point number. Nix has no literal for NaN or infinity.
#[derive(Debug, Clone, Copy)]
pub struct Float(f64);

impl Float {
    pub fn new(value: f64) -> Result<Self, Error> {
        if value.is_finite() {
            Ok(Float(value))
        } else {
            Err(Error::malformed(
                "float",
                format!("{value} has no Nix representation"),
            ))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

/// Bitwise, so `0.0` and `-0.0` differ just as their printed forms do.
impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Float {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url(String);

impl Url {
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let url = url.into();
        if URL_SCHEME.is_match(&url) {
            Ok(Url(url))
        } else {
            Err(Error::malformed(
                "url",
                format!("{url:?} does not start with a scheme"),
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the URL fits Nix's bare URI literal grammar. Other URLs (with
    /// a fragment, for example) are printed as strings.
    pub fn is_bare_literal(&self) -> bool {
        URL_LITERAL.is_match(&self.0)
    }
}

/// A path literal such as `./default.nix`, `/etc/nixos` or `<nixpkgs>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NixPath(String);

impl NixPath {
    /// A value without a leading `/`, `./`, `../` or `~/` is taken relative
    /// to the current directory.
    pub fn new(path: impl Into<String>) -> Result<Self, Error> {
        let path = path.into();
        if SEARCH_PATH.is_match(&path) {
            return Ok(NixPath(path));
        }
        let path = if path.starts_with('/')
            || path.starts_with("./")
            || path.starts_with("../")
            || path.starts_with("~/")
        {
            path
        } else {
            format!("./{path}")
        };
        if PATH_LITERAL.is_match(&path) {
            Ok(NixPath(path))
        } else {
            Err(Error::malformed(
                "path",
                format!("{path:?} is not a valid path literal"),
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `inherit` or `inherit (scope)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inherit {
    scope: Option<String>,
}

impl Inherit {
    /// Inherit from the enclosing lexical scope.
    pub fn new() -> Self {
        Self { scope: None }
    }

    /// Inherit from the attribute set named `scope`. The name is printed as
    /// given.
    pub fn from_scope(scope: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

/// Ordered attribute bindings. Printing follows insertion order; equality
/// does not depend on it.
#[derive(Debug, Clone, Plural)]
#[plural(len, is_empty, iter, into_iter, into_iter_ref, new)]
pub struct AttrSet(IndexMap<String, Node>);

impl Eq for AttrSet {}
impl PartialEq for AttrSet {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for AttrSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Default for AttrSet {
    fn default() -> Self {
        Self(IndexMap::new())
    }
}

impl AttrSet {
    /// Add a binding. A repeated name replaces the earlier value but keeps
    /// its position.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Node>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl TryFrom<Node> for AttrSet {
    type Error = Error;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        match node {
            Node::AttrSet(set) => Ok(set),
            other => Err(Error::malformed(
                "attribute set",
                format!("expected an attribute set, found {}", other.kind()),
            )),
        }
    }
}

/// `left // right`. Attributes of `right` win on collision when Nix
/// evaluates the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeAttrs {
    left: Node,
    right: Node,
}

impl MergeAttrs {
    pub fn new(left: impl Into<Node>, right: impl Into<Node>) -> Result<Self, Error> {
        let left = left.into();
        let right = right.into();
        for (side, operand) in [("left", &left), ("right", &right)] {
            if !operand.may_be_attr_set() {
                return Err(Error::malformed(
                    "attribute set merge",
                    format!("{side} operand ({}) cannot be an attribute set", operand.kind()),
                ));
            }
        }
        Ok(Self { left, right })
    }

    pub fn left(&self) -> &Node {
        &self.left
    }

    pub fn right(&self) -> &Node {
        &self.right
    }
}

/// Function application `fun param`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunInvocation {
    fun_expr: Node,
    param_expr: Node,
}

impl FunInvocation {
    pub fn new(fun_expr: impl Into<Node>, param_expr: impl Into<Node>) -> Self {
        Self {
            fun_expr: fun_expr.into(),
            param_expr: param_expr.into(),
        }
    }

    pub fn fun_expr(&self) -> &Node {
        &self.fun_expr
    }

    pub fn param_expr(&self) -> &Node {
        &self.param_expr
    }
}

/// `let <bindings> in <body>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Let {
    value: AttrSet,
    body: Node,
}

impl Let {
    pub fn new(value: AttrSet, body: impl Into<Node>) -> Self {
        Self {
            value,
            body: body.into(),
        }
    }

    pub fn value(&self) -> &AttrSet {
        &self.value
    }

    pub fn body(&self) -> &Node {
        &self.body
    }
}

/// Argument pattern of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSpec {
    /// `x: body`
    Ident(String),
    /// `{ a, b ? default, ... }: body`
    Formals { formals: Vec<Formal>, ellipsis: bool },
}

impl ArgSpec {
    /// Formals without defaults and without `...`.
    pub fn formals<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ArgSpec::Formals {
            formals: names.into_iter().map(Formal::new).collect(),
            ellipsis: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formal {
    pub name: String,
    pub default: Option<Node>,
}

impl Formal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<Node>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    args: ArgSpec,
    body: Node,
}

impl Function {
    pub fn new(args: ArgSpec, body: impl Into<Node>) -> Result<Self, Error> {
        match &args {
            ArgSpec::Ident(name) => check_arg_name(name)?,
            ArgSpec::Formals { formals, .. } => {
                for (i, formal) in formals.iter().enumerate() {
                    check_arg_name(&formal.name)?;
                    if formals[..i].iter().any(|f| f.name == formal.name) {
                        return Err(Error::malformed(
                            "function",
                            format!("argument {} is declared twice", formal.name),
                        ));
                    }
                }
            }
        }
        Ok(Self {
            args,
            body: body.into(),
        })
    }

    pub fn args(&self) -> &ArgSpec {
        &self.args
    }

    pub fn body(&self) -> &Node {
        &self.body
    }
}

fn check_arg_name(name: &str) -> Result<(), Error> {
    if is_bare_identifier(name) {
        Ok(())
    } else {
        Err(Error::malformed(
            "function",
            format!("{name:?} is not a valid argument name"),
        ))
    }
}

/// `if condition then then_expr else else_expr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    condition: Node,
    then_expr: Node,
    else_expr: Node,
}

impl If {
    pub fn new(
        condition: impl Into<Node>,
        then_expr: impl Into<Node>,
        else_expr: impl Into<Node>,
    ) -> Self {
        Self {
            condition: condition.into(),
            then_expr: then_expr.into(),
            else_expr: else_expr.into(),
        }
    }

    pub fn condition(&self) -> &Node {
        &self.condition
    }

    pub fn then_expr(&self) -> &Node {
        &self.then_expr
    }

    pub fn else_expr(&self) -> &Node {
        &self.else_expr
    }
}

/// `with scope; body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct With {
    scope: Node,
    body: Node,
}

impl With {
    pub fn new(scope: impl Into<Node>, body: impl Into<Node>) -> Self {
        Self {
            scope: scope.into(),
            body: body.into(),
        }
    }

    pub fn scope(&self) -> &Node {
        &self.scope
    }

    pub fn body(&self) -> &Node {
        &self.body
    }
}

/// `assert condition; body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assert {
    condition: Node,
    body: Node,
}

impl Assert {
    pub fn new(condition: impl Into<Node>, body: impl Into<Node>) -> Self {
        Self {
            condition: condition.into(),
            body: body.into(),
        }
    }

    pub fn condition(&self) -> &Node {
        &self.condition
    }

    pub fn body(&self) -> &Node {
        &self.body
    }
}

/// Attribute selection `set.a.b`, optionally with an `or` fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrReference {
    attr_set: Node,
    path: Vec<String>,
    or_default: Option<Node>,
}

impl AttrReference {
    pub fn new<I, S>(attr_set: impl Into<Node>, path: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path: Vec<String> = path.into_iter().map(Into::into).collect();
        if path.is_empty() {
            return Err(Error::malformed(
                "attribute reference",
                "the attribute path is empty",
            ));
        }
        Ok(Self {
            attr_set: attr_set.into(),
            path,
            or_default: None,
        })
    }

    /// Fall back to `default` when the attribute is missing.
    pub fn or(mut self, default: impl Into<Node>) -> Self {
        self.or_default = Some(default.into());
        self
    }

    pub fn attr_set(&self) -> &Node {
        &self.attr_set
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn or_default(&self) -> Option<&Node> {
        self.or_default.as_ref()
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Int(value)
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Int(i64::from(value))
    }
}

impl From<u32> for Node {
    fn from(value: u32) -> Self {
        Node::Int(i64::from(value))
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::String(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::String(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Node::List(value)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Null, Into::into)
    }
}

impl From<Float> for Node {
    fn from(value: Float) -> Self {
        Node::Float(value)
    }
}

impl From<Url> for Node {
    fn from(value: Url) -> Self {
        Node::Url(value)
    }
}

impl From<NixPath> for Node {
    fn from(value: NixPath) -> Self {
        Node::Path(value)
    }
}

impl From<Inherit> for Node {
    fn from(value: Inherit) -> Self {
        Node::Inherit(value)
    }
}

impl From<AttrSet> for Node {
    fn from(value: AttrSet) -> Self {
        Node::AttrSet(value)
    }
}

impl From<MergeAttrs> for Node {
    fn from(value: MergeAttrs) -> Self {
        Node::MergeAttrs(Box::new(value))
    }
}

impl From<FunInvocation> for Node {
    fn from(value: FunInvocation) -> Self {
        Node::FunInvocation(Box::new(value))
    }
}

impl From<Let> for Node {
    fn from(value: Let) -> Self {
        Node::Let(Box::new(value))
    }
}

impl From<Function> for Node {
    fn from(value: Function) -> Self {
        Node::Function(Box::new(value))
    }
}

impl From<If> for Node {
    fn from(value: If) -> Self {
        Node::If(Box::new(value))
    }
}

impl From<With> for Node {
    fn from(value: With) -> Self {
        Node::With(Box::new(value))
    }
}

impl From<Assert> for Node {
    fn from(value: Assert) -> Self {
        Node::Assert(Box::new(value))
    }
}

impl From<AttrReference> for Node {
    fn from(value: AttrReference) -> Self {
        Node::AttrReference(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherit_equality() {
        assert_eq!(Inherit::new(), Inherit::new());
        assert_eq!(Inherit::from_scope("a"), Inherit::from_scope("a"));
        assert_ne!(Inherit::from_scope("a"), Inherit::from_scope("b"));
        assert_ne!(Inherit::from_scope("a"), Inherit::new());
        assert_ne!(Inherit::new(), Inherit::from_scope("a"));
    }

    #[test]
    fn test_different_variants_are_not_equal() {
        assert_ne!(Node::from(Inherit::new()), Node::Null);
        assert_ne!(Node::expression("a"), Node::from("a"));
        assert_ne!(
            Node::AttrSet(AttrSet::new()),
            Node::RecAttrSet(AttrSet::new())
        );
        assert_ne!(Node::Int(1), Node::Float(Float::new(1.0).unwrap()));
    }

    #[test]
    fn test_composite_equality_is_recursive() {
        let build = |value: &str| {
            MergeAttrs::new(
                AttrSet::new().with("a", "a"),
                AttrSet::new().with("a", value),
            )
            .unwrap()
        };
        assert_eq!(build("a2"), build("a2"));
        assert_ne!(build("a2"), build("a3"));
    }

    #[test]
    fn test_attr_set_equality_ignores_order() {
        let ab = AttrSet::new().with("a", 1).with("b", 2);
        let ba = AttrSet::new().with("b", 2).with("a", 1);
        assert_eq!(ab, ba);
        assert_eq!(ab.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(ba.keys().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn test_attr_set_replace_keeps_position() {
        let set = AttrSet::new().with("a", 1).with("b", 2).with("a", 3);
        assert_eq!(set.len(), 2);
        assert_eq!(set.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(set.get("a"), Some(&Node::Int(3)));
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert!(Float::new(f64::NAN).is_err());
        assert!(Float::new(f64::INFINITY).is_err());
        assert!(Float::new(f64::NEG_INFINITY).is_err());
        assert_eq!(Float::new(1.5).unwrap().get(), 1.5);
    }

    #[test]
    fn test_float_equality_matches_printed_form() {
        assert_eq!(Float::new(0.5).unwrap(), Float::new(0.5).unwrap());
        assert_ne!(Float::new(0.0).unwrap(), Float::new(-0.0).unwrap());
        assert_ne!(
            Node::Float(Float::new(0.0).unwrap()),
            Node::Float(Float::new(-0.0).unwrap())
        );
    }

    #[test]
    fn test_merge_rejects_non_attr_set_operands() {
        let err = MergeAttrs::new(AttrSet::new(), Node::Int(1)).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedNode {
                node: "attribute set merge",
                reason: "right operand (int) cannot be an attribute set".to_string(),
            }
        );
        assert!(MergeAttrs::new(Node::List(vec![]), AttrSet::new()).is_err());
        assert!(MergeAttrs::new(Inherit::new(), AttrSet::new()).is_err());
    }

    #[test]
    fn test_merge_accepts_opaque_operands() {
        assert!(MergeAttrs::new(Node::expression("attrs"), AttrSet::new()).is_ok());
        assert!(
            MergeAttrs::new(
                FunInvocation::new(Node::expression("f"), AttrSet::new()),
                Node::RecAttrSet(AttrSet::new()),
            )
            .is_ok()
        );
    }

    #[test]
    fn test_function_validates_arguments() {
        assert!(Function::new(ArgSpec::Ident("x".into()), Node::expression("x")).is_ok());
        assert!(Function::new(ArgSpec::Ident("if".into()), Node::Null).is_err());
        assert!(Function::new(ArgSpec::formals(["a", "a"]), Node::Null).is_err());
        assert!(Function::new(ArgSpec::formals(["a b"]), Node::Null).is_err());
        assert!(Function::new(ArgSpec::formals(["stdenv", "fetchurl"]), Node::Null).is_ok());
    }

    #[test]
    fn test_attr_reference_requires_path() {
        let empty: [&str; 0] = [];
        assert!(AttrReference::new(Node::expression("pkgs"), empty).is_err());
        assert!(AttrReference::new(Node::expression("pkgs"), ["hello"]).is_ok());
    }

    #[test]
    fn test_url_requires_scheme() {
        assert!(Url::new("http://github.com").is_ok());
        assert!(Url::new("github.com").is_err());
        assert!(Url::new("").is_err());
    }

    #[test]
    fn test_url_bare_literal() {
        assert!(Url::new("http://github.com").unwrap().is_bare_literal());
        assert!(
            !Url::new("http://nixos.org/nix/manual/#chap-quick-start")
                .unwrap()
                .is_bare_literal()
        );
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(NixPath::new("default.nix").unwrap().as_str(), "./default.nix");
        assert_eq!(NixPath::new("./pkgs/hello").unwrap().as_str(), "./pkgs/hello");
        assert_eq!(NixPath::new("../lib").unwrap().as_str(), "../lib");
        assert_eq!(NixPath::new("/etc/nixos").unwrap().as_str(), "/etc/nixos");
        assert_eq!(NixPath::new("~/src").unwrap().as_str(), "~/src");
        assert_eq!(NixPath::new("<nixpkgs>").unwrap().as_str(), "<nixpkgs>");
    }

    #[test]
    fn test_path_rejects_invalid() {
        assert!(NixPath::new("").is_err());
        assert!(NixPath::new("with space.nix").is_err());
        assert!(NixPath::new("dir/").is_err());
    }

    #[test]
    fn test_attr_set_try_from_node() {
        let set = AttrSet::new().with("a", 1);
        assert_eq!(AttrSet::try_from(Node::from(set.clone())), Ok(set));
        assert!(AttrSet::try_from(Node::Null).is_err());
    }
}
