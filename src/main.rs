//! Leadflow - 引导式获客对话控制台
//!
//! 入口：加载配置、初始化日志，逐行读取标准输入驱动单个会话；阶段事件经通道推送并打印。

use std::sync::Arc;

use anyhow::Context;
use leadflow::config::load_config;
use leadflow::intake::{ConversationStore, IntakeCommand};
use leadflow::observability;
use leadflow::phase::{ChannelSink, PhaseEvent};
use leadflow::tools::{ContactValidatorTool, GatedExecutor, ToolRegistry};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    let table = Arc::new(cfg.phase_table().context("Invalid phase table")?);

    // UI 侧订阅：有新工具解锁时提示
    let (sink, mut events) = ChannelSink::new();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let PhaseEvent::ToolsActivated { phase, tools, .. } = event {
                println!("  [tools enabled @ {}] {}", phase, tools.join(", "));
            }
        }
    });

    let mut tools = ToolRegistry::new();
    tools.register(ContactValidatorTool);
    let executor = GatedExecutor::from_config(&cfg, tools);

    let mut store = ConversationStore::with_parts(cfg.app.max_context_turns, table, Arc::new(sink));
    println!(
        "{} conversation {}",
        cfg.app.name.as_deref().unwrap_or("leadflow"),
        store.id()
    );
    println!("commands: country <x> | channels <a,b> | phone <n> | competitors <a,b> | demo | status | reset | prompt | tool <name> <json> | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let Some(cmd) = IntakeCommand::parse(&line) else {
            continue;
        };
        if cmd == IntakeCommand::Quit {
            break;
        }
        match cmd.apply(&mut store, &executor).await {
            Ok(out) => println!("{}", out),
            Err(e) => println!("! {}", e),
        }
    }

    Ok(())
}
