//! Sway - sensor-driven synthesizer control

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use tokio::sync::broadcast::error::RecvError;

use sway::config::{self, InstrumentConfig, RuleSet};
use sway::engine::layout::{CategoryShape, LAYOUT};
use sway::engine::Engine;
use sway::input::{Adapter, ScriptSource, Source};
use sway::synth::ConsoleSynth;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!(
                        "  Synth definition: {}",
                        if cfg.synth.is_null() { "none" } else { "present" }
                    );
                    println!("  Input categories: {}", cfg.input.0.len());
                    for (category, rule_set) in &cfg.input.0 {
                        match rule_set {
                            RuleSet::Rules(rules) => {
                                println!("    - {} ({} rules)", category, rules.len());
                            }
                            RuleSet::Group(children) => {
                                println!("    - {}:", category);
                                for (signal, child) in children {
                                    if let RuleSet::Rules(rules) = child {
                                        println!("        {} ({} rules)", signal, rules.len());
                                    }
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    println!("Configuration is invalid: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            write_example("sway.yaml", include_str!("../sway.example.yaml"))?;
            write_example("sway.replay.yaml", include_str!("../sway.replay.example.yaml"))?;
        }

        Commands::Signals => {
            println!("Input signals (° marks rotational):\n");
            for category in LAYOUT {
                match category.shape {
                    CategoryShape::Scalar { rotational } => {
                        println!("  {}{}", category.id, if rotational { " °" } else { "" });
                    }
                    CategoryShape::Group(signals) => {
                        println!("  {}:", category.id);
                        for signal in signals {
                            println!(
                                "    {}{}",
                                signal.id,
                                if signal.rotational { " °" } else { "" }
                            );
                        }
                    }
                }
            }
        }

        Commands::Replay {
            config: config_path,
            script,
            timing,
            repeat,
        } => {
            println!("Loading configuration from {:?}...", config_path);
            let cfg = config::load_config(&config_path)?;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(replay(cfg, &script, timing, repeat))?;
        }
    }

    Ok(())
}

fn write_example(path: &str, contents: &str) -> Result<()> {
    if Path::new(path).exists() {
        println!("{path} already exists. Not overwriting.");
    } else {
        std::fs::write(path, contents)?;
        println!("Created {path}.");
    }
    Ok(())
}

async fn replay(cfg: InstrumentConfig, script: &Path, timing: bool, repeat: bool) -> Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))?;
    }

    let engine = Engine::new(cfg, ConsoleSynth::new());
    let mut adapter = Adapter::new(engine);

    println!("Replaying {:?}...", script);

    loop {
        let mut source = ScriptSource::from_file("script", script)?.with_timing(timing);
        let mut receiver = source.subscribe();
        source.start()?;

        loop {
            if interrupted.load(Ordering::SeqCst) {
                source.stop();
                break;
            }
            tokio::select! {
                // Drain queued events before concluding the source is done.
                biased;
                result = receiver.recv() => match result {
                    Ok(event) => adapter.handle(&event),
                    Err(RecvError::Lagged(missed)) => {
                        eprintln!("Replay lagged; {missed} events skipped");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::time::sleep(Duration::from_millis(20)) => {
                    if !source.is_running() {
                        break;
                    }
                }
            }
        }

        if !repeat || interrupted.load(Ordering::SeqCst) {
            break;
        }
    }

    println!(
        "\nDone. {} parameter writes.",
        adapter.engine().sink().writes()
    );
    Ok(())
}
