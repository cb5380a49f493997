//! Template parser module.
//!
//! Parses template strings into a list of nodes.

use super::{Result, TemplateError};

/// A node in the template AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Raw text content.
    Text(String),

    /// HTML-escaped variable reference: `{{name}}` or `{{folder.name}}`
    Variable(String),

    /// Unescaped variable reference: `{{{table}}}`
    RawVariable(String),

    /// Conditional block: `{{#if condition}}...{{else}}...{{/if}}`
    If {
        condition: String,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },

    /// Loop block: `{{#each items}}...{{/each}}`
    Each {
        variable: String,
        item_name: Option<String>,
        body: Vec<Node>,
    },

    /// Unless block (inverse of if): `{{#unless condition}}...{{/unless}}`
    Unless { condition: String, body: Vec<Node> },
}

/// A `{{...}}` tag, classified.
#[derive(Debug, PartialEq)]
enum Tag<'t> {
    Variable(&'t str),
    Raw(&'t str),
    Open { kind: &'t str, args: &'t str },
    Else,
    Close(&'t str),
}

/// An open block while its body is being collected.
#[derive(Debug)]
enum Block {
    Root,
    If(String),
    Unless(String),
    Each {
        variable: String,
        item_name: Option<String>,
    },
}

impl Block {
    fn name(&self) -> &'static str {
        match self {
            Block::Root => "",
            Block::If(_) => "if",
            Block::Unless(_) => "unless",
            Block::Each { .. } => "each",
        }
    }
}

#[derive(Debug)]
struct Frame {
    block: Block,
    body: Vec<Node>,
    else_body: Option<Vec<Node>>,
}

impl Frame {
    fn new(block: Block) -> Self {
        Self {
            block,
            body: Vec::new(),
            else_body: None,
        }
    }

    fn push(&mut self, node: Node) {
        match self.else_body.as_mut() {
            Some(nodes) => nodes.push(node),
            None => self.body.push(node),
        }
    }

    fn into_node(self) -> Node {
        match self.block {
            Block::If(condition) => Node::If {
                condition,
                then_branch: self.body,
                else_branch: self.else_body.unwrap_or_default(),
            },
            Block::Unless(condition) => Node::Unless {
                condition,
                body: self.body,
            },
            Block::Each {
                variable,
                item_name,
            } => Node::Each {
                variable,
                item_name,
                body: self.body,
            },
            Block::Root => Node::Text(String::new()),
        }
    }
}

/// Template parser.
///
/// Scans for tags and keeps a stack of open blocks; `\{{` emits a literal
/// `{{`.
pub struct Parser<'a> {
    input: &'a str,
    stack: Vec<Frame>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            stack: vec![Frame::new(Block::Root)],
        }
    }

    /// Parse the template into a list of nodes.
    pub fn parse(mut self) -> Result<Vec<Node>> {
        let mut rest = self.input;

        while !rest.is_empty() {
            let Some(start) = rest.find("{{") else {
                self.text(rest);
                break;
            };

            if rest[..start].ends_with('\\') {
                self.text(&rest[..start - 1]);
                self.current().push(Node::Text("{{".to_string()));
                rest = &rest[start + 2..];
                continue;
            }

            self.text(&rest[..start]);
            let (tag, after) = next_tag(&rest[start..])?;
            self.apply(tag)?;
            rest = after;
        }

        if self.stack.len() > 1 {
            let open = self.stack.last().map(|f| f.block.name()).unwrap_or_default();
            return Err(TemplateError::Parse(format!("Unclosed block: {open}")));
        }

        Ok(self.stack.pop().map(|root| root.body).unwrap_or_default())
    }

    fn current(&mut self) -> &mut Frame {
        // The root frame is only popped once parsing is done.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn text(&mut self, text: &str) {
        if !text.is_empty() {
            self.current().push(Node::Text(text.to_string()));
        }
    }

    fn apply(&mut self, tag: Tag<'_>) -> Result<()> {
        match tag {
            Tag::Variable(name) => self.current().push(Node::Variable(identifier(name)?)),
            Tag::Raw(name) => self.current().push(Node::RawVariable(identifier(name)?)),
            Tag::Open { kind, args } => {
                let block = open_block(kind, args)?;
                self.stack.push(Frame::new(block));
            }
            Tag::Else => {
                let frame = self.current();
                if !matches!(frame.block, Block::If(_)) || frame.else_body.is_some() {
                    return Err(TemplateError::Parse("Unexpected {{else}}".to_string()));
                }
                frame.else_body = Some(Vec::new());
            }
            Tag::Close(kind) => {
                if self.stack.len() == 1 || self.current().block.name() != kind {
                    return Err(TemplateError::Parse(format!("Unexpected {{{{/{kind}}}}}")));
                }
                if let Some(frame) = self.stack.pop() {
                    let node = frame.into_node();
                    self.current().push(node);
                }
            }
        }
        Ok(())
    }
}

/// Split the tag at the start of `input` from the text after it.
fn next_tag(input: &str) -> Result<(Tag<'_>, &str)> {
    if let Some(inner) = input.strip_prefix("{{{") {
        let end = inner
            .find("}}}")
            .ok_or_else(|| TemplateError::Parse("Unclosed tag '{{{'".to_string()))?;
        return Ok((Tag::Raw(inner[..end].trim()), &inner[end + 3..]));
    }

    let inner = &input[2..];
    let end = inner
        .find("}}")
        .ok_or_else(|| TemplateError::Parse("Unclosed tag '{{'".to_string()))?;
    let body = inner[..end].trim();
    let after = &inner[end + 2..];

    let tag = if body == "else" {
        Tag::Else
    } else if let Some(block) = body.strip_prefix('#') {
        let block = block.trim_start();
        let (kind, args) = block.split_once(char::is_whitespace).unwrap_or((block, ""));
        Tag::Open {
            kind,
            args: args.trim(),
        }
    } else if let Some(kind) = body.strip_prefix('/') {
        Tag::Close(kind.trim())
    } else {
        Tag::Variable(body)
    };

    Ok((tag, after))
}

fn open_block(kind: &str, args: &str) -> Result<Block> {
    match kind {
        "if" => Ok(Block::If(identifier(args)?)),
        "unless" => Ok(Block::Unless(identifier(args)?)),
        "each" => {
            let parts: Vec<&str> = args.split_whitespace().collect();
            match parts.as_slice() {
                [variable] => Ok(Block::Each {
                    variable: identifier(variable)?,
                    item_name: None,
                }),
                [variable, "as", item] => Ok(Block::Each {
                    variable: identifier(variable)?,
                    item_name: Some(identifier(item)?),
                }),
                _ => Err(TemplateError::Parse(format!("Malformed each: '{args}'"))),
            }
        }
        _ => Err(TemplateError::Parse(format!("Unknown block tag: {kind}"))),
    }
}

/// Variable path such as `name`, `folder.name` or `@index`.
fn identifier(name: &str) -> Result<String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '@'));

    if valid {
        Ok(name.to_string())
    } else {
        Err(TemplateError::Parse(format!("Invalid identifier '{name}'")))
    }
}
