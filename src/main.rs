//! MoodFi CLI - simulated capture and training surfaces
//!
//! Usage:
//!   moodfi --express happy --target happy    # Single simulated capture
//!   moodfi --interactive                     # Interactive capture mode
//!   moodfi --training                        # Timed training-mode game
//!   moodfi --serve                           # HTTP API server
//!   moodfi --express happy --json            # JSON output

use clap::Parser;
use colored::Colorize;
use parking_lot::Mutex;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use moodfi::core::{
    run_server, Detector, DetectorStack, FaceEngine, FaceVerifier, FrameScheduler, MockDetector,
    ModelAdapter, ModelSource, Scene, SimulatedEngine, SyntheticCamera, TrainingController,
    TrainingSession,
};
use moodfi::core::{reward_for, ControllerEvent};
use moodfi::types::{DetectionHistory, DetectionRecord, Emotion, Frame, VerificationResult};
use moodfi::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "moodfi",
    version = VERSION,
    about = "MoodFi - facial emotion vibe checks, token rewards, and training mode",
    long_about = "MoodFi verification core over a simulated camera.\n\n\
                  A capture stages an emotion in front of the synthetic webcam,\n\
                  runs the detection pipeline, and scores a vibe check against\n\
                  an optional target emotion.\n\n\
                  Modes:\n  \
                  --express     Single capture\n  \
                  --interactive Capture per input line\n  \
                  --training    10 matches in 30 seconds\n  \
                  --serve       HTTP API server mode\n\n\
                  Emotions: neutral, happy, sad, angry, fearful, disgusted, surprised"
)]
struct Args {
    /// Emotion to express in a single simulated capture
    #[arg(short, long)]
    express: Option<String>,

    /// Target emotion for the vibe check
    #[arg(short, long)]
    target: Option<String>,

    /// Interactive mode - one capture per input line
    #[arg(short, long)]
    interactive: bool,

    /// Training mode - match 10 random targets in 30 seconds
    #[arg(long)]
    training: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show score breakdown
    #[arg(long)]
    verbose: bool,

    /// Fixed RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Remote model asset URL (defaults to embedded assets)
    #[arg(long)]
    model_url: Option<String>,

    /// Skip the model path and use the degraded mock detector
    #[arg(long)]
    degraded: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.serve {
        run_serve(&args).await;
    } else if args.training {
        run_training(&args).await;
    } else if args.interactive {
        run_interactive(&args).await;
    } else if args.express.is_some() {
        run_single(&args).await;
    } else {
        // Default to interactive if no mode specified
        run_interactive(&args).await;
    }
}

/// Parse an emotion argument or exit with a usable message
fn parse_emotion(raw: &str) -> Emotion {
    match raw.parse() {
        Ok(emotion) => emotion,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("valid emotions: neutral, happy, sad, angry, fearful, disgusted, surprised");
            std::process::exit(2);
        }
    }
}

/// Build the ranked detector stack: model-backed verifier first, mock
/// fallback behind it
fn build_stack(args: &Args) -> Arc<DetectorStack> {
    let mock: Arc<dyn Detector> = match args.seed {
        Some(seed) => Arc::new(MockDetector::with_seed(seed.wrapping_add(1))),
        None => Arc::new(MockDetector::new()),
    };

    if args.degraded {
        return Arc::new(DetectorStack::new(vec![mock]));
    }

    let engine: Arc<dyn FaceEngine> = match args.seed {
        Some(seed) => Arc::new(SimulatedEngine::with_seed(seed)),
        None => Arc::new(SimulatedEngine::new()),
    };
    let source = match &args.model_url {
        Some(url) => ModelSource::Remote { url: url.clone() },
        None => ModelSource::Embedded,
    };
    let adapter = Arc::new(ModelAdapter::new(engine, source));

    Arc::new(DetectorStack::new(vec![
        Arc::new(FaceVerifier::new(adapter)) as Arc<dyn Detector>,
        mock,
    ]))
}

/// Run single capture
async fn run_single(args: &Args) {
    let expressed = args.express.as_deref().map(parse_emotion);
    let target = args.target.as_deref().map(parse_emotion);
    let stack = build_stack(args);

    let frame = match expressed {
        Some(emotion) => Frame::synthetic(emotion, 640, 480),
        None => Frame::synthetic_empty(640, 480),
    };
    let result = stack.verify(&frame, target).await;

    print_result(&result, args);
}

/// Run interactive capture mode
async fn run_interactive(args: &Args) {
    let target = args.target.as_deref().map(parse_emotion);
    let stack = build_stack(args);
    let mut history = DetectionHistory::new();

    print_header("Interactive Mode", args.no_color);
    println!("Type an emotion to show it to the camera ('none' for an empty frame).");
    match target {
        Some(t) => println!("Vibe check target: {} {}", t.emoji(), t),
        None => println!("No target set; captures report the dominant emotion."),
    }
    println!("Type 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut captures = 0u32;
    let mut earned = 0.0f64;

    loop {
        print!("{} > ", history_line(&history, args.no_color));
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let frame = if line.eq_ignore_ascii_case("none") {
            Frame::synthetic_empty(640, 480)
        } else {
            match line.parse::<Emotion>() {
                Ok(emotion) => Frame::synthetic(emotion, 640, 480),
                Err(e) => {
                    println!("  {}", e);
                    continue;
                }
            }
        };

        let result = stack.verify(&frame, target).await;
        if let Some(dominant) = result.dominant_emotion {
            history.push(DetectionRecord::new(
                dominant,
                result.emotion_scores.clone(),
                result.overall_confidence,
            ));
        }
        captures += 1;
        earned += reward_for(&result);

        print_result(&result, args);
    }

    println!();
    println!(
        "Session ended. Captures: {} | earned: {}",
        captures,
        format_tokens(earned, args.no_color)
    );
}

/// Run the timed training-mode game
async fn run_training(args: &Args) {
    let stack = build_stack(args);
    let session = match args.seed {
        Some(seed) => TrainingSession::with_seed(seed),
        None => TrainingSession::new(),
    };
    let controller = TrainingController::new(session, stack, Arc::new(FrameScheduler::new()));

    let scene = Scene::new();
    let camera = match SyntheticCamera::open(scene.clone()) {
        Ok(camera) => Arc::new(Mutex::new(camera)),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    print_header("Training Mode", args.no_color);
    println!(
        "Match {} targets in {} seconds. Type an emotion to show it to the",
        moodfi::TOTAL_CHALLENGES,
        moodfi::TRAINING_DURATION_SECS
    );
    println!("camera; it stays up until you type another. 'quit' stops early.");
    println!();

    // Blocking stdin reader feeding the select loop below
    let (line_tx, mut line_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            if line_tx.send(line.trim().to_string()).is_err() {
                break;
            }
        }
    });

    let mut updates = controller.subscribe();
    let cancel = controller.cancel_handle();

    let run = controller.run(Arc::clone(&camera));
    tokio::pin!(run);

    let final_status = loop {
        tokio::select! {
            status = &mut run => break status,
            update = updates.recv() => {
                match update {
                    Ok(ControllerEvent::Status(status)) => {
                        if args.json {
                            println!("{}", serde_json::to_string(&status).unwrap_or_default());
                        } else if args.no_color {
                            println!("{}", status.to_parseable_string());
                        } else {
                            println!("{}", status.to_terminal_string());
                        }
                    }
                    Ok(ControllerEvent::Detection { emotion, match_score_percent, .. }) => {
                        if args.verbose {
                            println!("  seeing {} {} ({}%)", emotion.emoji(), emotion, match_score_percent);
                        }
                    }
                    Err(_) => {}
                }
            }
            line = line_rx.recv() => {
                match line.as_deref() {
                    None => cancel.cancel(),
                    Some(l) if l.eq_ignore_ascii_case("quit") || l.eq_ignore_ascii_case("exit") => {
                        cancel.cancel();
                    }
                    Some("") => {}
                    Some(l) if l.eq_ignore_ascii_case("none") => scene.clear(),
                    Some(l) => match l.parse::<Emotion>() {
                        Ok(emotion) => scene.show(emotion),
                        Err(e) => println!("  {}", e),
                    },
                }
            }
        }
    };

    // Release the camera on the way out
    camera.lock().close();

    println!();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&final_status).unwrap_or_default());
        return;
    }
    let headline = format!(
        "TRAINING COMPLETE - {}/{} matched",
        final_status.correct, final_status.total_challenges
    );
    if args.no_color {
        println!("{}", headline);
    } else {
        println!("{}", headline.green().bold());
    }
    println!(
        "  score: {} | bonus: {} | time left: {}s",
        final_status.score, final_status.bonus_reward, final_status.time_remaining
    );
    println!(
        "  earned: {}",
        format_tokens(
            final_status.score as f64 + final_status.bonus_reward as f64,
            args.no_color
        )
    );
}

/// Run HTTP API server
async fn run_serve(args: &Args) {
    println!();
    println!("MoodFi API Server v{}", VERSION);
    println!();

    if let Err(e) = run_server(&args.addr).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Print one verification result plus its reward
fn print_result(result: &VerificationResult, args: &Args) {
    if args.json {
        #[derive(serde::Serialize)]
        struct CaptureOutput<'a> {
            result: &'a VerificationResult,
            reward: f64,
        }
        let out = CaptureOutput {
            result,
            reward: reward_for(result),
        };
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        return;
    }

    if args.no_color {
        println!("{}", result.to_parseable_string());
    } else {
        println!("{}", result.to_terminal_string());
    }

    if let Some(vibe) = &result.vibe_check {
        println!("  {}", vibe.message);
    } else if let Some(message) = &result.message {
        println!("  {}", message);
    }

    if args.verbose && result.is_face_detected {
        println!("  scores:");
        for (emotion, score) in result.emotion_scores.iter() {
            println!("    {:<10} {:.3}", emotion.as_str(), score);
        }
        let q = result.quality;
        if q.any() {
            println!(
                "  quality flags: low_confidence={} missing_features={} face_too_small={}",
                q.low_confidence, q.missing_features, q.face_too_small
            );
        }
    }

    println!("  reward: {}", format_tokens(reward_for(result), args.no_color));
}

/// Render a token amount
fn format_tokens(amount: f64, no_color: bool) -> String {
    let text = format!("{:.1} MOOD", amount);
    if no_color {
        text
    } else {
        text.yellow().bold().to_string()
    }
}

/// Render the recent-detection strip for the interactive prompt
fn history_line(history: &DetectionHistory, no_color: bool) -> String {
    if history.is_empty() {
        return "[ - ]".to_string();
    }
    let marks: Vec<String> = history
        .iter()
        .map(|r| {
            if no_color {
                r.dominant_emotion.as_str().to_string()
            } else {
                r.dominant_emotion.emoji().to_string()
            }
        })
        .collect();
    format!("[{}]", marks.join(" "))
}

/// Print header
fn print_header(mode: &str, no_color: bool) {
    if no_color {
        println!("========================================");
        println!("  MoodFi v{} - {}", VERSION, mode);
        println!("========================================");
    } else {
        println!("{}", "========================================".bold());
        println!("{}", format!("  MoodFi v{} - {}", VERSION, mode).bold());
        println!("{}", "========================================".bold());
    }
    println!();
}
