//! Welcome banner display for chat sessions.

use console::style;

use aidash_types::project::ProjectProfile;

/// Print the banner shown when a chat session starts: project, endpoint,
/// model and how much history was restored.
pub fn print_welcome_banner(project: &ProjectProfile, url: &str, model: &str, restored: usize) {
    println!();
    println!("  🤖 {}", style(&project.name).cyan().bold());
    println!("  {}", style(url).dim());
    println!();
    println!("  {}    {}", style("Model:").bold(), style(model).dim());
    println!(
        "  {}  {}",
        style("History:").bold(),
        style(match restored {
            0 => "new conversation".to_string(),
            1 => "1 message restored".to_string(),
            n => format!("{n} messages restored"),
        })
        .dim()
    );
    if project.file_upload_enabled {
        println!(
            "  {}  {}",
            style("Uploads:").bold(),
            style("enabled (/upload <path>)").dim()
        );
    }
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
