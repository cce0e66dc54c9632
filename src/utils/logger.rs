//! 日志模块：env_logger 控制台彩色输出，同时镜像一份纯文本到 logs/evm-kit.log
//!
//! 环境变量：`LOG_LEVEL`（默认 INFO）、`LOG_DIR`（默认 logs）。
//! 启动时若日志文件超过 10MB 则轮转，最多保留 5 份历史。
use env_logger::{Builder, Target, WriteStyle};
use log::{Level, LevelFilter, Record};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

const LOG_FILE_NAME: &str = "evm-kit.log";
const LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;
const LOG_MAX_ROTATIONS: usize = 5;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 依赖库的噪声日志只保留 WARN 以上
const QUIET_MODULES: [&str; 3] = ["ethers_providers", "hyper", "reqwest"];

static INIT_LOGGER: Once = Once::new();
static FILE_SINK: Mutex<Option<File>> = Mutex::new(None);

struct LogSettings {
    dir: PathBuf,
    level_name: String,
    level: LevelFilter,
}

impl LogSettings {
    fn from_env() -> Self {
        let dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        let level_name = std::env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "INFO".to_string())
            .to_uppercase();
        let level = parse_level(&level_name).unwrap_or_else(|| {
            eprintln!("⚠️ 无效日志级别「{}」，使用默认 INFO", level_name);
            LevelFilter::Info
        });
        Self {
            dir: PathBuf::from(dir),
            level_name,
            level,
        }
    }

    fn file_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    match raw.to_uppercase().as_str() {
        "TRACE" => Some(LevelFilter::Trace),
        "DEBUG" => Some(LevelFilter::Debug),
        "INFO" => Some(LevelFilter::Info),
        "WARN" => Some(LevelFilter::Warn),
        "ERROR" => Some(LevelFilter::Error),
        "OFF" => Some(LevelFilter::Off),
        _ => None,
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[91m",
        Level::Warn => "\x1b[93m",
        Level::Info => "\x1b[92m",
        Level::Debug => "\x1b[96m",
        Level::Trace => "\x1b[95m",
    }
}

fn console_line(now: &str, record: &Record) -> String {
    const RESET: &str = "\x1b[0m";
    const MODULE: &str = "\x1b[31m";
    format!(
        "[{}] [{}{:>5}{}] [{}{}{}] - {}",
        now,
        level_color(record.level()),
        record.level(),
        RESET,
        MODULE,
        record.module_path().unwrap_or("unknown"),
        RESET,
        record.args()
    )
}

fn file_line(now: &str, record: &Record) -> String {
    format!(
        "[{}] [线程: {}] [模块: {}] [级别: {}] - {}\n",
        now,
        std::thread::current().name().unwrap_or("unknown"),
        record.module_path().unwrap_or("unknown"),
        record.level(),
        record.args()
    )
}

/// 文件写入失败不影响控制台输出
fn mirror_to_file(line: &str) {
    if let Ok(mut guard) = FILE_SINK.lock() {
        if let Some(file) = guard.as_mut() {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let settings = LogSettings::from_env();

        if let Err(e) = fs::create_dir_all(&settings.dir) {
            eprintln!("❌ 创建日志目录失败: {}", e);
        }
        if let Err(e) = rotate_logs(&settings.file_path()) {
            eprintln!("⚠️ 日志轮转失败: {}", e);
        }

        let file_enabled = match File::create(settings.file_path()) {
            Ok(f) => {
                if let Ok(mut guard) = FILE_SINK.lock() {
                    *guard = Some(f);
                }
                true
            }
            Err(e) => {
                eprintln!("❌ 创建日志文件失败: {}", e);
                false
            }
        };

        let mut builder = Builder::from_default_env();
        builder.filter(None, settings.level);
        for module in QUIET_MODULES {
            builder.filter(Some(module), LevelFilter::Warn);
        }
        builder
            .write_style(WriteStyle::Always)
            .format(move |f, record| {
                let now = chrono::Local::now().format(TIME_FORMAT).to_string();
                if file_enabled {
                    mirror_to_file(&file_line(&now, record));
                }
                writeln!(f, "{}", console_line(&now, record))
            })
            .target(Target::Stdout);

        match builder.try_init() {
            Ok(()) => log::info!(
                "✅ 日志系统初始化完成 | 级别: {} | 日志文件: {}",
                settings.level_name,
                settings.file_path().display()
            ),
            Err(e) => eprintln!("❌ 控制台日志初始化失败: {}", e),
        }
    });
}

/// evm-kit.log → evm-kit.log.1 → … → evm-kit.log.5，最旧的一份被覆盖
fn rotated_path(base: &Path, generation: usize) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{}", generation));
    PathBuf::from(name)
}

fn rotate_logs(path: &Path) -> io::Result<()> {
    if !path.exists() || fs::metadata(path)?.len() < LOG_MAX_BYTES {
        return Ok(());
    }

    for generation in (1..LOG_MAX_ROTATIONS).rev() {
        let src = rotated_path(path, generation);
        if src.exists() {
            fs::rename(&src, rotated_path(path, generation + 1))?;
        }
    }
    fs::rename(path, rotated_path(path, 1))
}

// ==================== 便捷日志宏 ====================
#[macro_export]
macro_rules! log_trace { ($($arg:tt)*) => { log::trace!($($arg)*) }; }
#[macro_export]
macro_rules! log_debug { ($($arg:tt)*) => { log::debug!($($arg)*) }; }
#[macro_export]
macro_rules! log_info  { ($($arg:tt)*) => { log::info!($($arg)*) }; }
#[macro_export]
macro_rules! log_warn  { ($($arg:tt)*) => { log::warn!($($arg)*) }; }
#[macro_export]
macro_rules! log_error { ($($arg:tt)*) => { log::error!($($arg)*) }; }
