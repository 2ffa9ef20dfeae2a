use colored::Colorize;
use dtsb_common::{Diagnostic, DiagnosticCategory, LineMap};
use rustc_hash::FxHashMap;

/// Renders diagnostics as `file:line:column - error TS1005: message`.
///
/// Locations are only available for files whose text was registered with
/// [`Reporter::add_source`]; bundler diagnostics refer to chunks and print the
/// chunk name alone.
pub struct Reporter {
    color: bool,
    line_maps: FxHashMap<String, LineMap>,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            line_maps: FxHashMap::default(),
        }
    }

    pub fn add_source(&mut self, file: &str, text: &str) {
        self.line_maps
            .entry(file.to_string())
            .or_insert_with(|| LineMap::build(text));
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
        }
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = match self.format_location(&diagnostic.file, diagnostic.start) {
            Some(location) => location,
            None if diagnostic.file.is_empty() => "<unknown>".to_string(),
            None => diagnostic.file.clone(),
        };
        output.push_str(" - ");
        output.push_str(&self.format_category(diagnostic.category));
        output.push(' ');
        output.push_str(&self.format_code(diagnostic.code));
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);
        output
    }

    fn format_location(&self, file: &str, start: u32) -> Option<String> {
        let position = self.line_maps.get(file)?.offset_to_position(start);
        let location = format!("{}:{}:{}", file, position.line + 1, position.character + 1);
        Some(if self.color {
            location.cyan().to_string()
        } else {
            location
        })
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.to_string();
        if !self.color {
            return label;
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        // Parser diagnostics reuse TypeScript's codes.
        let prefix = if code >= 9000 { "DTSB" } else { "TS" };
        let label = format!("{prefix}{code}");
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}
