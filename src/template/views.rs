//! Built-in views.

use super::{Result, TemplateContext, TemplateEngine};

/// Browse/upload view for a single folder.
pub const UPLOAD_INDEX: &str = "upload/index";
/// Table of files.
pub const UPLOAD_TABLE: &str = "upload/table";
/// List of folders a field may upload into.
pub const FOLDERS_INDEX: &str = "folders/index";
/// The field's form input.
pub const INPUT: &str = "input";

const BUILTIN: &[(&str, &str)] = &[
    (UPLOAD_INDEX, include_str!("../../templates/upload/index.html")),
    (UPLOAD_TABLE, include_str!("../../templates/upload/table.html")),
    (FOLDERS_INDEX, include_str!("../../templates/folders/index.html")),
    (INPUT, include_str!("../../templates/input.html")),
];

/// The set of views used by the field type and its controllers.
#[derive(Debug)]
pub struct Views {
    engine: TemplateEngine,
}

impl Views {
    /// Parse the built-in views.
    pub fn builtin() -> Result<Self> {
        let mut engine = TemplateEngine::new();
        for (name, content) in BUILTIN {
            engine.load(*name, content)?;
        }
        Ok(Self { engine })
    }

    /// Replace or add a view.
    pub fn with_view(mut self, name: &str, content: &str) -> Result<Self> {
        self.engine.load(name, content)?;
        Ok(self)
    }

    /// Render a view.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        self.engine.render(name, context)
    }
}
