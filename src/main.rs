use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod admin;
mod config;
mod content;
mod error;
mod init;
mod listing;
mod media;
mod repository;
mod seed;
mod state;
mod web;

#[derive(Parser)]
#[command(name = "twinpress", about = "双端博客：前台阅读 + 后台管理", version = long_version())]
struct Cli {
    /// 项目根目录（默认当前目录）
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 同时启动前台与后台服务
    Serve {
        /// 监听地址
        #[arg(long)]
        host: Option<String>,

        /// 前台端口
        #[arg(long)]
        web_port: Option<u16>,

        /// 后台端口
        #[arg(long)]
        admin_port: Option<u16>,
    },

    /// 清空文章并写入示例数据
    Seed,

    /// 创建后台账号，用户名已存在时重置密码
    User { username: String, password: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let root = cli.root.canonicalize().unwrap_or_else(|_| cli.root.clone());

    if init::ensure_initialized(&root)? {
        eprintln!("已自动初始化项目：{}", root.display());
    }
    let site_config = config::SiteConfig::load(&root)?;
    init_tracing(&site_config.server.log_level, site_config.server.log_json);

    // None 等同于 Serve
    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        web_port: None,
        admin_port: None,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match command {
        Commands::Serve {
            host,
            web_port,
            admin_port,
        } => {
            let host = host.unwrap_or_else(|| site_config.server.host.clone());
            let web_port = web_port.unwrap_or(site_config.server.web_port);
            let admin_port = admin_port.unwrap_or(site_config.server.admin_port);
            runtime.block_on(run_server(&root, site_config, &host, web_port, admin_port))?;
        }
        Commands::Seed => {
            let count = runtime.block_on(async {
                let state = state::AppState::open(&root, site_config).await?;
                seed::reseed(&state.posts).await
            })?;
            tracing::info!("已写入 {} 篇示例文章", count);
        }
        Commands::User { username, password } => {
            runtime.block_on(async {
                let state = state::AppState::open(&root, site_config).await?;
                let hash = admin::auth::hash_password(&password)?;
                state.auth.upsert_user(&username, &hash).await?;
                tracing::info!("后台账号 {} 已保存", username);
                anyhow::Ok(())
            })?;
        }
    }

    Ok(())
}

/// 默认级别来自配置，`RUST_LOG` 优先
fn init_tracing(default_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = if json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };
    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

async fn run_server(
    root: &Path,
    site_config: config::SiteConfig,
    host: &str,
    web_port: u16,
    admin_port: u16,
) -> anyhow::Result<()> {
    let app_state = state::AppState::open(root, site_config).await?;

    if !app_state.auth.has_users().await {
        tracing::warn!("尚未创建后台账号，请运行 `twinpress user <用户名> <密码>`");
    }
    if !app_state.storage.config().is_configured() {
        tracing::warn!("对象存储未配置，图片上传不可用");
    }

    // 启动后台定时清理过期 token
    admin::cleanup::spawn_token_cleanup(app_state.auth.clone());

    let web_listener = bind(host, web_port).await?;
    let admin_listener = bind(host, admin_port).await?;
    tracing::info!("前台服务启动：http://{host}:{web_port}");
    tracing::info!("后台服务启动：http://{host}:{admin_port}");

    let web_app = web::router(app_state.clone());
    let admin_app = admin::router(app_state);

    tokio::try_join!(
        async {
            axum::serve(web_listener, web_app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        },
        async {
            axum::serve(admin_listener, admin_app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        },
    )?;

    tracing::info!("服务已停止");
    Ok(())
}

async fn bind(host: &str, port: u16) -> anyhow::Result<tokio::net::TcpListener> {
    let addr = format!("{host}:{port}");
    match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => Ok(l),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            if let Some(info) = detect_port_process(port) {
                tracing::error!("端口 {port} 已被占用：{info}");
            } else {
                tracing::error!("端口 {port} 已被占用");
            }
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("监听退出信号失败：{e}");
        std::future::pending::<()>().await;
    }
}

/// 通过 /proc 检测占用指定端口的进程信息（仅 Linux）
fn detect_port_process(port: u16) -> Option<String> {
    use std::fs;

    let port_hex = format!("{:04X}", port);

    for net_file in &["/proc/net/tcp", "/proc/net/tcp6"] {
        let Ok(content) = fs::read_to_string(net_file) else {
            continue;
        };
        for line in content.lines().skip(1) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            // fields[1] = local_address (hex_ip:hex_port), fields[3] = state (0A = LISTEN)
            if fields.len() < 10 || fields[3] != "0A" {
                continue;
            }
            if fields[1].rsplit(':').next() == Some(port_hex.as_str()) {
                return find_pid_by_inode(fields[9]);
            }
        }
    }
    None
}

fn find_pid_by_inode(target_inode: &str) -> Option<String> {
    use std::fs;

    let socket_pattern = format!("socket:[{target_inode}]");
    for entry in fs::read_dir("/proc").ok()?.flatten() {
        let pid_str = entry.file_name().to_string_lossy().to_string();
        if !pid_str.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(fds) = fs::read_dir(entry.path().join("fd")) else {
            continue;
        };
        for fd in fds.flatten() {
            if let Ok(link) = fs::read_link(fd.path())
                && link.to_string_lossy() == socket_pattern
            {
                let comm = fs::read_to_string(entry.path().join("comm"))
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                return Some(format!("PID {pid_str} ({comm})"));
            }
        }
    }
    None
}

const fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\ncommit:  ",
        env!("TWINPRESS_GIT_COMMIT"),
        "\nbuild:   ",
        env!("TWINPRESS_BUILD_TIME"),
        "\ntarget:  ",
        env!("TWINPRESS_BUILD_TARGET"),
        "\nprofile: ",
        env!("TWINPRESS_BUILD_PROFILE"),
    )
}
