use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use signscribe::classifier::{self, RULES};
use signscribe::config::{Config, DEFAULT_CONFIG_PATH};
use signscribe::features;
use signscribe::landmarks::FrameRecord;
use signscribe::language::{self, LANGUAGES};
use signscribe::session::{DetectionSession, SessionEvent};
use signscribe::translate::build_translator;

#[derive(Parser)]
#[command(name = "signscribe")]
struct Cli {
    /// Config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Stream landmark frames (JSON lines) and print the accumulated text
    Run {
        /// Frame file, stdin when omitted
        input: Option<PathBuf>,
        /// Output language code
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Classify every frame on its own, no stabilization
    Classify {
        input: Option<PathBuf>,
    },
    /// Print the rule table in evaluation order
    Rules,
    /// List output languages
    Languages,
}

/// How often the run loop checks for a stop without new frames
const STOP_POLL: Duration = Duration::from_millis(100);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signscribe=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(&cli.config);

    match cli.command {
        Some(Command::Rules) => {
            for (i, rule) in RULES.iter().enumerate() {
                println!("{:>2}  {:<12} {:.2}", i + 1, rule.label, rule.confidence);
            }
            Ok(())
        }
        Some(Command::Languages) => {
            for lang in LANGUAGES.iter() {
                println!("{}  {:<8} {}", lang.code, lang.name, lang.speech_tag);
            }
            Ok(())
        }
        Some(Command::Classify { input }) => run_classify(input.as_deref()),
        Some(Command::Run { input, language }) => {
            if let Some(code) = language {
                config.language = code;
            }
            run_detection(config, input.as_deref()).await
        }
        None => run_detection(config, None).await,
    }
}

/// Parse frames on a blocking thread so stdin never stalls the runtime
fn spawn_reader(input: Option<&Path>) -> anyhow::Result<flume::Receiver<FrameRecord>> {
    let reader: Box<dyn BufRead + Send> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let (tx, rx) = flume::unbounded();
    thread::spawn(move || {
        for (n, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Input read failed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match FrameRecord::parse(&line) {
                Ok(record) => {
                    if tx.send(record).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Skipping line {}: {}", n + 1, e),
            }
        }
    });
    Ok(rx)
}

fn run_classify(input: Option<&Path>) -> anyhow::Result<()> {
    let frames = spawn_reader(input)?;
    while let Ok(record) = frames.recv() {
        let Some(points) = record.landmarks() else {
            println!("-");
            continue;
        };
        if let Some(f) = features::extract(points) {
            debug!(
                "extended {} (T{} I{} M{} R{} P{}) spread {:.3}",
                f.extended_count,
                f.thumb_extended as u8,
                f.index_extended as u8,
                f.middle_extended as u8,
                f.ring_extended as u8,
                f.pinky_extended as u8,
                f.finger_spread
            );
        }
        match classifier::classify_frame(points) {
            Some(c) => println!("{} {:.2}", c.label, c.confidence),
            None => println!("-"),
        }
    }
    Ok(())
}

async fn run_detection(config: Config, input: Option<&Path>) -> anyhow::Result<()> {
    let frames = spawn_reader(input)?;
    let translator = build_translator(&config.translation);
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut session = DetectionSession::new(&config, translator, event_tx);

    match language::lookup(session.language()) {
        Some(lang) => info!("Output language: {}", lang.name),
        None => warn!("Unknown language '{}', tokens may stay untranslated", session.language()),
    }

    let handle = session.handle();
    ctrlc::set_handler(move || handle.stop()).context("installing Ctrl-C handler")?;

    session.start();
    let origin = Instant::now();
    let mut poll = tokio::time::interval(STOP_POLL);

    loop {
        tokio::select! {
            biased;

            Some(event) = event_rx.recv() => print_event(&event),

            record = frames.recv_async() => {
                let Ok(record) = record else {
                    info!("Input finished");
                    break;
                };
                let Some(points) = record.landmarks() else {
                    continue;
                };
                let at = record
                    .timestamp_ms()
                    .and_then(|ms| origin.checked_add(Duration::from_millis(ms)))
                    .unwrap_or_else(Instant::now);
                session.process_frame(points, at).await;
            }

            _ = poll.tick() => {
                if !session.is_live() {
                    break;
                }
            }
        }
    }

    session.stop();
    while let Ok(event) = event_rx.try_recv() {
        print_event(&event);
    }
    Ok(())
}

fn print_event(event: &SessionEvent) {
    let ts = chrono::Local::now().format("%H:%M:%S");
    match event {
        SessionEvent::Started => eprintln!("[{}] detecting", ts),
        SessionEvent::Stopped => eprintln!("[{}] stopped", ts),
        SessionEvent::Gesture {
            label,
            confidence,
            image,
        } => match image {
            Some(path) => eprintln!(
                "[{}] {} ({:.0}%) {}",
                ts,
                label,
                confidence * 100.0,
                path.display()
            ),
            None => eprintln!("[{}] {} ({:.0}%)", ts, label, confidence * 100.0),
        },
        SessionEvent::Text { token, text } => {
            eprintln!("[{}] + {}", ts, token);
            println!("{}", text);
        }
        SessionEvent::Cleared => eprintln!("[{}] cleared", ts),
    }
}
