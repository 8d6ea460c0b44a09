//! voxkit CLI - voice registration, revocation, and synthesis
//!
//! Operator front-end over the identity registry and the synthesis engine.
//! The store root defaults to `voice_projects/` in the working directory.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use voxkit_engine::{FormantGenerator, SynthesisEngine, SynthesisRequest};
use voxkit_identity::VoiceStore;

/// voxkit - consent-scoped voice identities and parameterized synthesis
#[derive(Parser)]
#[command(name = "voxkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Store root directory
    #[arg(long, default_value = "voice_projects", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a voice identity from a WAV sample
    Register {
        /// Path to the WAV sample
        audio: PathBuf,

        /// Display name for the voice
        #[arg(short, long)]
        name: String,

        /// Confirm that the speaker gave explicit consent
        #[arg(long)]
        consent: bool,

        /// Project scope for grouping and bulk purge
        #[arg(short, long, default_value = "default")]
        project: String,

        /// Extra metadata as key=value pairs
        #[arg(short, long, value_parser = parse_key_value)]
        meta: Vec<(String, String)>,
    },

    /// List registered voices
    List {
        /// Filter by project scope
        #[arg(short, long)]
        project: Option<String>,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one voice identity
    Get {
        /// Voice id
        voice_id: String,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Irrevocably revoke a voice identity
    Revoke {
        /// Voice id
        voice_id: String,
    },

    /// Revoke every voice in a project scope
    Purge {
        /// Project scope to purge
        project: String,
    },

    /// Synthesize speech to a WAV file
    Synth {
        /// Text to speak
        text: String,

        /// Output WAV path
        #[arg(short, long, default_value = "out.wav")]
        output: PathBuf,

        /// Emotion preset (unknown names fall back to neutral)
        #[arg(short, long)]
        emotion: Option<String>,

        /// Voice id (registered, or male_default / female_default)
        #[arg(short, long)]
        voice: Option<String>,

        /// Speed ratio override
        #[arg(long)]
        speed: Option<f64>,

        /// Pitch ratio override
        #[arg(long)]
        pitch: Option<f64>,

        /// Energy ratio override
        #[arg(long)]
        energy: Option<f64>,

        /// Language tag passed to the generator
        #[arg(short, long)]
        language: Option<String>,

        /// Skip the provenance watermark
        #[arg(long)]
        no_watermark: bool,
    },

    /// List emotion presets
    Emotions {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the consent audit log
    Log {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let store = Arc::new(VoiceStore::open(&cli.root).context("failed to open voice store")?);

    match cli.command {
        Commands::Register {
            audio,
            name,
            consent,
            project,
            meta,
        } => {
            let metadata: BTreeMap<String, String> = meta.into_iter().collect();
            let id = store.register(&audio, &name, consent, &project, metadata)?;
            println!("{} {}", "Registered:".green().bold(), id);
        }

        Commands::List { project, json } => {
            let voices = store.list(project.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&voices)?);
            } else if voices.is_empty() {
                println!("no registered voices");
            } else {
                for v in voices {
                    println!(
                        "{}  {}  {} [{}]",
                        v.voice_id.cyan(),
                        v.display_name.bold(),
                        v.created_at,
                        v.project_scope
                    );
                }
            }
        }

        Commands::Get { voice_id, json } => match store.get(&voice_id) {
            Some(v) if json => println!("{}", serde_json::to_string_pretty(&v)?),
            Some(v) => {
                println!("{}       {}", "id:".bold(), v.voice_id);
                println!("{}     {}", "name:".bold(), v.display_name);
                println!("{}  {}", "project:".bold(), v.project_scope);
                println!("{}  {}", "created:".bold(), v.created_at);
                for (k, val) in &v.metadata {
                    println!("  {k} = {val}");
                }
            }
            None => {
                eprintln!("{} voice '{}' not found", "error:".red().bold(), voice_id);
                return Ok(ExitCode::FAILURE);
            }
        },

        Commands::Revoke { voice_id } => {
            store.revoke(&voice_id)?;
            println!("{} {}", "Revoked:".yellow().bold(), voice_id);
        }

        Commands::Purge { project } => {
            let report = store.purge_project(&project);
            for id in &report.revoked {
                println!("{} {}", "Revoked:".yellow().bold(), id);
            }
            for failure in &report.failed {
                eprintln!(
                    "{} {}: {}",
                    "failed:".red().bold(),
                    failure.voice_id,
                    failure.error
                );
            }
            if !report.is_complete() {
                eprintln!(
                    "{} purge of '{}' incomplete; retry is safe",
                    "warning:".yellow().bold(),
                    project
                );
                return Ok(ExitCode::FAILURE);
            }
            println!(
                "{} {} voice(s) from '{}'",
                "Purged".green().bold(),
                report.revoked.len(),
                project
            );
        }

        Commands::Synth {
            text,
            output,
            emotion,
            voice,
            speed,
            pitch,
            energy,
            language,
            no_watermark,
        } => {
            let engine = SynthesisEngine::new(store, Box::new(FormantGenerator::default()));
            let request = SynthesisRequest {
                text,
                emotion,
                voice_id: voice,
                speed,
                pitch,
                energy,
                language,
                watermark: !no_watermark,
            };
            let result = engine.synthesize(&request)?;
            std::fs::write(&output, &result.wav_data)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!(
                "{} {} ({:.2}s, speed {:.2} pitch {:.2} energy {:.2})",
                "Wrote:".green().bold(),
                output.display(),
                result.duration_seconds,
                result.params.speed_ratio,
                result.params.pitch_ratio,
                result.params.energy_ratio
            );
            println!("{}  {}", "audio hash:".bold(), &result.pcm_fingerprint[..16]);
        }

        Commands::Emotions { json } => {
            let presets = voxkit_engine::emotion::all();
            if json {
                let map: BTreeMap<&str, serde_json::Value> = presets
                    .iter()
                    .map(|p| {
                        (
                            p.name,
                            serde_json::json!({
                                "speed": p.speed_ratio,
                                "pitch": p.pitch_ratio,
                                "energy": p.energy_ratio,
                            }),
                        )
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for p in presets {
                    println!(
                        "{:<10} speed {:.2}  pitch {:.2}  energy {:.2}",
                        p.name.cyan(),
                        p.speed_ratio,
                        p.pitch_ratio,
                        p.energy_ratio
                    );
                }
            }
        }

        Commands::Log { json } => {
            let entries = store.consent_log()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for e in entries {
                    let action = match e.action {
                        voxkit_identity::ConsentAction::Register => "register".green(),
                        voxkit_identity::ConsentAction::Revoke => "revoke".yellow(),
                    };
                    println!("{}  {}  {}", e.timestamp, action, e.voice_id);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Parses a `key=value` CLI argument.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}
