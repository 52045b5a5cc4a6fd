//! 单向可靠传输实验
//!
//! 在带丢包/损坏的仿真信道上运行 ABT / GBN / SR 之一，输出两端统计。

use clap::Parser;
use rdt_sim::channel::{RandomFaults, RdtWorld, schedule_messages};
use rdt_sim::proto::{Mode, ProtocolConfig};
use rdt_sim::sim::{SimTime, Simulator};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "rdt-sim", about = "单向可靠传输仿真：ABT / Go-Back-N / Selective Repeat")]
struct Args {
    /// 协议变体
    #[arg(long, value_enum, default_value = "sr")]
    mode: Mode,

    /// 窗口大小（ABT 下忽略）
    #[arg(long, default_value_t = 10)]
    window: u32,

    /// 要发送的消息条数
    #[arg(long, default_value_t = 1000)]
    messages: u64,

    /// 丢包概率（两个方向相同）
    #[arg(long, default_value_t = 0.1)]
    loss: f64,

    /// 损坏概率（两个方向相同）
    #[arg(long, default_value_t = 0.1)]
    corrupt: f64,

    #[arg(long, default_value_t = 1234)]
    seed: u64,

    /// 应用层提交消息的间隔（毫秒）
    #[arg(long, default_value_t = 50)]
    msg_interval_ms: u64,

    /// 单向传播时延（毫秒）
    #[arg(long, default_value_t = 5)]
    latency_ms: u64,

    /// 初始 RTO（毫秒）；不填则用各模式的默认值
    #[arg(long)]
    base_rto_ms: Option<u64>,

    /// 仿真运行到多少毫秒；不填则跑到事件耗尽
    #[arg(long)]
    until_ms: Option<u64>,

    /// 输出事件 JSON 文件；不填则不生成
    #[arg(long)]
    viz_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut cfg = ProtocolConfig::for_mode(args.mode, args.window);
    if let Some(ms) = args.base_rto_ms {
        cfg = cfg.with_base_rto(SimTime::from_millis(ms));
    }
    if let Err(e) = cfg.validate() {
        eprintln!("invalid configuration: {e}");
        return ExitCode::from(2);
    }
    // 丢包概率为 1 时永远传不完，跑到事件耗尽也就永不结束
    if !(0.0..1.0).contains(&args.loss) || !(0.0..1.0).contains(&args.corrupt) {
        eprintln!("invalid configuration: loss and corrupt must lie in [0, 1)");
        return ExitCode::from(2);
    }

    let mut sim = Simulator::default();
    let faults = RandomFaults::new(args.seed, args.loss, args.corrupt);
    let mut world = RdtWorld::new(&cfg, SimTime::from_millis(args.latency_ms), Box::new(faults));
    if args.viz_json.is_some() {
        world.enable_viz(&cfg);
    }

    schedule_messages(
        &mut sim,
        args.messages,
        SimTime::ZERO,
        SimTime::from_millis(args.msg_interval_ms),
    );

    match args.until_ms {
        Some(ms) => sim.run_until(SimTime::from_millis(ms), &mut world),
        None => sim.run(&mut world),
    }

    if let Some(path) = args.viz_json {
        if let Some(v) = world.channel.viz.take() {
            let json = v.to_json().expect("serialize viz events");
            fs::write(&path, json).expect("write viz json");
            eprintln!("wrote viz events to {}", path.display());
        }
    }

    let s = world.sender.stats();
    let r = world.receiver.stats();
    let c = &world.channel.stats;
    println!(
        "done @ {:?}\n  sender: mode={:?}, window={}, submitted={}, transmitted={}, retransmitted={}, timeouts={}, acks_accepted={}, acks_corrupt={}, final_rto_ms={:.3}\n  receiver: delivered={}, duplicates={}, corrupt={}, discarded={}, acks_sent={}\n  channel: data_sent={}, acks_sent={}, dropped={}, corrupted={}",
        sim.now(),
        world.sender.mode(),
        world.sender.window(),
        s.submitted,
        s.transmitted,
        s.retransmitted,
        s.timeouts,
        s.acks_accepted,
        s.acks_corrupt,
        world.sender.current_rto().as_millis_f64(),
        r.delivered,
        r.duplicates,
        r.corrupt,
        r.discarded,
        r.acks_sent,
        c.data_sent,
        c.acks_sent,
        c.dropped,
        c.corrupted,
    );

    ExitCode::SUCCESS
}
