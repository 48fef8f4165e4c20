//! # Host CLI
//!
//! 无窗口的演示 Host：加载配置与脚本，构造演示区域，以固定帧长驱动
//! [`GameLoop`]，按预设输入模拟玩家操作，并把事件进度写入日志。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-cli
//! cargo run -p host-cli -- --frames 1200 --log-level debug
//! cargo run -p host-cli -- --scripts my/scripts --save-dir saves
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rpg_runtime::{EngineConfig, FsSaveIo, GameLoop, Script, ScriptRegistry, analyze_script};
use tracing::{Level, debug, error, info, warn};
use walkdir::WalkDir;

mod demo;

#[derive(Parser)]
#[command(name = "rpg-cli")]
#[command(about = "RPG Runtime 无窗口演示")]
#[command(version)]
struct Cli {
    /// 配置文件（不存在时使用默认配置）
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 脚本目录（递归加载 .json）
    #[arg(short, long, default_value = "host-cli/scripts")]
    scripts: PathBuf,

    /// 模拟帧数
    #[arg(short, long, default_value = "900")]
    frames: u64,

    /// 每帧时长（毫秒）
    #[arg(long, default_value = "16")]
    frame_ms: u64,

    /// 日志级别 (trace/debug/info/warn/error)
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// 模拟结束后存档到该目录
    #[arg(long)]
    save_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = EngineConfig::load(&cli.config);
    config.validate().context("配置无效")?;

    let mut registry = ScriptRegistry::new();
    demo::register_builtin(&mut registry);
    load_scripts(&cli.scripts, &mut registry)?;
    info!(scripts = ?registry.names(), "脚本加载完成");

    let area = demo::village(&config);
    let mut game = GameLoop::new(area, registry, config);
    if let Some(dir) = &cli.save_dir {
        game = game.with_save_io(FsSaveIo::new(dir));
    }

    let mut wrapped = false;
    let mut active_npc: Option<String> = None;
    for frame in 0..cli.frames {
        let drawings = game.frame(cli.frame_ms, &demo::inputs_at(frame))?;
        let Some(scene) = game.scene() else {
            anyhow::bail!("第 {frame} 帧后场景丢失");
        };

        let root = scene.root();
        let started = root.started_npc().map(str::to_string);
        if started != active_npc {
            match &started {
                Some(npc) => info!(frame, npc = %npc, "事件开始"),
                None => info!(frame, npc = ?active_npc, "事件结束"),
            }
            active_npc = started;
        }
        if scene.is_wrapped() != wrapped {
            wrapped = scene.is_wrapped();
            debug!(frame, wrapped, drawings = drawings.len(), "包装场景切换");
        }
        if frame % 120 == 0 {
            let player = root.player().rect();
            debug!(
                frame,
                x = player.top_left.x,
                y = player.top_left.y,
                background_events = root.background_events().count(),
                "世界状态"
            );
        }
    }

    let state = game.state();
    info!(play_time = state.play_time, variables = ?state.variables, "模拟结束");

    if cli.save_dir.is_some() {
        game.save("autosave")?;
    }
    Ok(())
}

/// 递归加载脚本目录下的 JSON 脚本
///
/// 每个脚本先做静态检查，存在错误级诊断时拒绝加载。
fn load_scripts(dir: &Path, registry: &mut ScriptRegistry) -> anyhow::Result<()> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "脚本目录不存在，只使用内置脚本");
        return Ok(());
    }

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取脚本 {}", path.display()))?;
        let script = Script::from_json(&content)
            .with_context(|| format!("脚本 {} 解析失败", path.display()))?;

        let diagnostics = analyze_script(&script);
        for diag in &diagnostics.diagnostics {
            warn!("{diag}");
        }
        if diagnostics.has_errors() {
            anyhow::bail!(
                "脚本 {} 存在 {} 个错误",
                path.display(),
                diagnostics.error_count()
            );
        }

        registry
            .register_script(script)
            .with_context(|| format!("脚本 {} 注册失败", path.display()))?;
    }
    Ok(())
}
