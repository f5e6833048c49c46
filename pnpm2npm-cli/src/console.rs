use std::env;
use std::sync::OnceLock;

fn use_color() -> bool {
    static USE_COLOR: OnceLock<bool> = OnceLock::new();
    *USE_COLOR.get_or_init(|| env::var_os("NO_COLOR").is_none())
}

fn paint(code: &str, text: &str) -> String {
    if use_color() {
        format!("\u{1b}[{}m{}\u{1b}[0m", code, text)
    } else {
        text.to_string()
    }
}

fn dim(text: &str) -> String {
    paint("2", text)
}

fn green(text: &str) -> String {
    paint("32", text)
}

fn yellow(text: &str) -> String {
    paint("33", text)
}

pub fn header(command: &str) {
    eprintln!(
        "{}",
        dim(&format!("pnpm2npm {} v{}", command, env!("CARGO_PKG_VERSION")))
    );
    eprintln!();
}

pub fn step(message: &str) {
    eprintln!("{}", dim(message));
}

pub fn file_size(file_name: &str, bytes: usize) {
    eprintln!("\t{}: {} bytes", file_name, bytes);
}

pub fn success(file_name: &str, dir: &str) {
    eprintln!();
    eprintln!("{} {}", file_name, green("SUCCESS"));
    eprintln!("{}", dim(&format!("available in {}", dir)));
}

pub fn warn(message: &str) {
    let tag = yellow("warn");
    eprintln!("{} {}", tag, message);
}
