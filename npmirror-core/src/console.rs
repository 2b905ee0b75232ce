use std::env;
use std::path::Path;
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

fn red(text: &str) -> String {
    paint("31", text)
}

pub fn downloaded(name: &str, version: &str) {
    println!("{} {}@{}", green("Downloaded"), name, version);
}

pub fn already_downloaded(name: &str, version: &str) {
    println!("{} {}@{}", dim("Already downloaded"), name, version);
}

pub fn downloaded_binary(name: &str, version: &str, file: &str) {
    println!("{} {}@{} {}", green("Downloaded binary"), name, version, dim(file));
}

pub fn binary_present(name: &str, version: &str, file: &str) {
    println!(
        "{} {}@{} {}",
        dim("Binary already downloaded"),
        name,
        version,
        dim(file)
    );
}

pub fn binary_unavailable(name: &str, version: &str, url: &str) {
    println!(
        "{} {}@{} {}",
        yellow("Binary not available"),
        name,
        version,
        dim(url)
    );
}

pub fn metadata_written(name: &str) {
    println!("{} {}", dim("Wrote metadata for"), name);
}

pub fn pruned(path: &Path) {
    println!("{} {}", yellow("Pruned"), path.display());
}

pub fn warn(message: &str) {
    let tag = yellow("warn");
    eprintln!("{} {}", tag, message);
}

pub fn error(message: &str) {
    let tag = red("error");
    eprintln!("{} {}", tag, message);
}

pub fn summary(packages: usize, versions: usize, seconds: f32) {
    println!();
    let time_str = if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else {
        format!("{:.2}s", seconds)
    };
    let noun = if packages == 1 { "package" } else { "packages" };
    println!(
        "{} {} ({} versions) mirrored {}",
        packages,
        noun,
        versions,
        dim(&format!("[{}]", time_str))
    );
}
