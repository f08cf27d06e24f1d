//! Terminal markdown rendering with syntax-highlighted code blocks.
//!
//! `ChatRenderer` combines `termimad` for prose and `syntect` for fenced
//! code. While a reply streams its text is printed raw; finished messages
//! are rendered as markdown.

use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use termimad::MadSkin;
use termimad::crossterm::style::Color;

use aidash_types::chat::{ChatMessage, MessageRole};

const THEME: &str = "base16-ocean.dark";

/// Marker that replaces an opening `<think>` tag.
pub const THINK_MARKER: &str = "**🤔 Think:** ";

/// Rewrite reasoning tags for display: `<think>` becomes a bold marker and
/// `</think>` disappears.
pub fn preprocess_think(content: &str) -> String {
    content
        .replace("<think>", THINK_MARKER)
        .replace("</think>", "")
}

/// Terminal markdown renderer with syntax highlighting.
pub struct ChatRenderer {
    skin: MadSkin,
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl Default for ChatRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.bold.set_fg(Color::Cyan);
        skin.headers[0].set_fg(Color::Cyan);
        skin.headers[1].set_fg(Color::Cyan);
        skin.inline_code.set_fg(Color::Yellow);

        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes
            .remove(THEME)
            .or_else(|| themes.into_values().next())
            .unwrap_or_default();

        Self {
            skin,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Render a finished message body.
    ///
    /// Reasoning tags are rewritten first. Code fences are highlighted with
    /// syntect; everything else goes through termimad.
    pub fn render_final(&self, markdown: &str) -> String {
        let markdown = preprocess_think(markdown);
        let mut output = String::new();
        let mut in_code_block = false;
        let mut code_lang = String::new();
        let mut code_buf = String::new();

        for line in markdown.lines() {
            let fence = line.trim_start().starts_with("```");
            if fence && !in_code_block {
                in_code_block = true;
                code_lang = line.trim().trim_start_matches('`').trim().to_string();
                code_buf.clear();
            } else if fence {
                in_code_block = false;
                output.push_str(&self.highlight_code(&code_buf, &code_lang));
            } else if in_code_block {
                code_buf.push_str(line);
                code_buf.push('\n');
            } else {
                output.push_str(&self.skin.term_text(line).to_string());
            }
        }

        // Unclosed fence: the reply was cut off mid-block.
        if in_code_block && !code_buf.is_empty() {
            output.push_str(&self.highlight_code(&code_buf, &code_lang));
        }

        output
    }

    /// One history entry: a role label, the rendered body and attachments.
    pub fn render_message(&self, message: &ChatMessage) -> String {
        let label = match message.role {
            MessageRole::User => console::style("You").green().bold().to_string(),
            MessageRole::Assistant => console::style("AI").cyan().bold().to_string(),
        };
        let time = message.created_at.format("%Y-%m-%d %H:%M");

        let mut output = format!("  {label} {}\n", console::style(time).dim());
        for file in &message.files {
            output.push_str(&format!(
                "  {} {} {}\n",
                console::style("📎").dim(),
                file.name,
                console::style(format!("({} bytes)", file.size_bytes)).dim()
            ));
        }
        let body = match message.role {
            MessageRole::User => message.content.clone(),
            MessageRole::Assistant => self.render_final(&message.content),
        };
        for line in body.lines() {
            output.push_str(&format!("  {line}\n"));
        }
        if message.role == MessageRole::Assistant && !message.is_done() {
            output.push_str(&format!("  {}\n", console::style("(incomplete)").yellow().dim()));
        }
        output
    }

    /// Stats footer after a reply: "| {model} . {seconds}s . {chunks} chunks".
    pub fn stats_footer(&self, model: &str, elapsed_ms: u64, chunks: u64, dropped: u64) -> String {
        let seconds = elapsed_ms as f64 / 1000.0;
        let mut footer = format!(
            "  {} {} {} {:.1}s {} {} chunks",
            console::style("|").dim(),
            console::style(model).dim(),
            console::style("\u{00b7}").dim(),
            console::style(seconds).dim(),
            console::style("\u{00b7}").dim(),
            console::style(chunks).dim(),
        );
        if dropped > 0 {
            footer.push_str(&format!(
                " {} {}",
                console::style("\u{00b7}").dim(),
                console::style(format!("{dropped} unreadable")).yellow().dim()
            ));
        }
        footer
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = if lang.is_empty() {
            self.syntax_set.find_syntax_plain_text()
        } else {
            self.syntax_set
                .find_syntax_by_token(lang)
                .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
        };
        let mut h = HighlightLines::new(syntax, &self.theme);

        let mut output = String::new();
        output.push_str(&format!(
            "  {}\n",
            console::style(format!("--- {lang} ---")).dim()
        ));

        for line in code.lines() {
            let ranges: Vec<(Style, &str)> = h
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_default();
            let escaped = as_24_bit_terminal_escaped(&ranges[..], false);
            output.push_str(&format!("  {escaped}\x1b[0m\n"));
        }

        output
    }
}
