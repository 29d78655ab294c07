use colored::Colorize;

pub enum TagColor {
    Green,
    Red,
    Blue,
}

/// Prints a right-aligned colored tag followed by a message, e.g.
/// `[FETCHING] ffmpeg_linux_x86_64`.
pub fn print_message(tag: &str, message: &str, color: TagColor) {
    let tag = format!("[{tag}]");
    let tag = match color {
        TagColor::Green => tag.green(),
        TagColor::Red => tag.red(),
        TagColor::Blue => tag.blue(),
    }
    .bold();
    const PADDING: usize = 10;
    let padded = format!("{tag:>width$}", width = PADDING);
    println!("{padded} {message}");
}

/// Same shape as [`print_message`] but on stderr, for failure lines.
pub fn print_failure(tag: &str, message: &str) {
    let tag = format!("[{tag}]").red().bold();
    const PADDING: usize = 10;
    let padded = format!("{tag:>width$}", width = PADDING);
    eprintln!("{padded} {message}");
}
