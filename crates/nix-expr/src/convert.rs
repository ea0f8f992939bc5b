use std::fmt;

use tracing::{debug, trace};

use crate::node::{AttrSet, Float, Node};
use crate::{Config, Error, Value};

/// Convert a native value into a node with default configuration
pub fn to_node(value: &Value) -> Result<Node, Error> {
    to_node_with_config(value, &Config::default())
}

/// Convert a native value into a node with custom configuration
pub fn to_node_with_config(value: &Value, config: &Config) -> Result<Node, Error> {
    let mut converter = Converter {
        config,
        path: Vec::new(),
    };
    match converter.convert(value) {
        Ok(Converted::Node(node)) => Ok(node),
        Ok(Converted::Omit) => Err(Error::UndefinedRoot),
        Err(error) => {
            debug!(%error, "value conversion failed");
            Err(error)
        }
    }
}

impl TryFrom<&Value> for Node {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        to_node(value)
    }
}

impl TryFrom<Value> for Node {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        to_node(&value)
    }
}

/// Outcome of converting one value. `Omit` tells the enclosing container to
/// drop the member.
enum Converted {
    Node(Node),
    Omit,
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

struct Converter<'a, 'v> {
    config: &'a Config,
    path: Vec<Segment<'v>>,
}

impl<'a, 'v> Converter<'a, 'v> {
    fn convert(&mut self, value: &'v Value) -> Result<Converted, Error> {
        let node = match value {
            Value::Undefined => return Ok(Converted::Omit),
            Value::Node(node) => node.clone(),
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Int(i) => Node::Int(*i),
            Value::UInt(u) => match i64::try_from(*u) {
                Ok(i) => Node::Int(i),
                Err(_) => {
                    return Err(self.unsupported(format!(
                        "unsigned integer {u} exceeds the Nix integer range"
                    )));
                }
            },
            Value::Float(f) => match Float::new(*f) {
                Ok(f) => Node::Float(f),
                Err(_) => {
                    return Err(self.unsupported(format!("float {f} has no Nix representation")));
                }
            },
            Value::String(s) => Node::String(s.clone()),
            Value::Array(items) => {
                self.check_depth()?;
                let mut nodes = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    self.path.push(Segment::Index(i));
                    match self.convert(item)? {
                        Converted::Node(node) => nodes.push(node),
                        Converted::Omit => trace!(path = %self.path_string(), "omitting undefined element"),
                    }
                    self.path.pop();
                }
                Node::List(nodes)
            }
            Value::Object(map) => {
                self.check_depth()?;
                let mut set = AttrSet::new();
                for (key, item) in map {
                    self.path.push(Segment::Key(key));
                    match self.convert(item)? {
                        Converted::Node(node) => set = set.with(key.clone(), node),
                        Converted::Omit => trace!(path = %self.path_string(), "omitting undefined member"),
                    }
                    self.path.pop();
                }
                Node::AttrSet(set)
            }
        };
        Ok(Converted::Node(node))
    }

    /// Owned values cannot form cycles, so a nesting limit is the only
    /// guard needed against runaway structures.
    fn check_depth(&self) -> Result<(), Error> {
        if self.path.len() >= self.config.max_depth {
            Err(Error::DepthLimitExceeded {
                path: self.path_string(),
                limit: self.config.max_depth,
            })
        } else {
            Ok(())
        }
    }

    fn unsupported(&self, kind: String) -> Error {
        Error::UnsupportedValue {
            path: self.path_string(),
            kind,
        }
    }

    fn path_string(&self) -> String {
        PathDisplay(&self.path).to_string()
    }
}

struct PathDisplay<'p, 'v>(&'p [Segment<'v>]);

impl fmt::Display for PathDisplay<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
