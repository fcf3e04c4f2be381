use std::process::Command;

/// 运行命令并取去掉首尾空白的标准输出，失败时返回 "unknown"
fn capture(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let stamps = [
        ("TWINPRESS_GIT_COMMIT", capture("git", &["rev-parse", "--short", "HEAD"])),
        ("TWINPRESS_BUILD_TIME", capture("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"])),
        (
            "TWINPRESS_BUILD_TARGET",
            std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string()),
        ),
        (
            "TWINPRESS_BUILD_PROFILE",
            std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()),
        ),
    ];

    for (key, value) in stamps {
        println!("cargo:rustc-env={key}={value}");
    }

    // 仅在 git HEAD 或迁移文件变化时重新运行
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-changed=migrations");
}
