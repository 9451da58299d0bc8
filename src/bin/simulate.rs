use clap::Parser;
use puckman_sim::constants::{MAZE_COLS, MAZE_ROWS, TICK_MS, TILE_SIZE};
use puckman_sim::engine::{GameEngine, GameEngineOptions};
use puckman_sim::types::{RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

/// Runs headless autopilot sessions and prints one JSON result line per run.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3)]
    runs: u32,
    /// Stop a run after this many ticks even if lives remain.
    #[arg(long, default_value_t = 60_000)]
    max_ticks: u64,
    #[arg(long)]
    lives: Option<i32>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
    lives: Option<i32>,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    outcome: String,
    score: u32,
    level: u32,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(rename = "collectiblesEaten")]
    collectibles_eaten: u32,
    #[serde(rename = "powerEaten")]
    power_eaten: u32,
    #[serde(rename = "huntersCaptured")]
    hunters_captured: u32,
    #[serde(rename = "bestCaptureBonus")]
    best_capture_bonus: u32,
    #[serde(rename = "bonusItemsEaten")]
    bonus_items_eaten: u32,
    #[serde(rename = "roundsCleared")]
    rounds_cleared: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "extraLives")]
    extra_lives: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "bestScore")]
    best_score: u32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "maxTicks": scenario.max_ticks,
                "lives": scenario.lives,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "outcome": scenario_run.result.outcome,
                "score": scenario_run.result.score,
                "level": scenario_run.result.level,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => tracing::warn!(%error, "failed to encode scenario result"),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "bestScore": summary.best_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut engine = GameEngine::new(
        scenario.seed,
        GameEngineOptions {
            autopilot: true,
            starting_lives_override: scenario.lives,
        },
    );

    let mut best_capture_bonus = 0;
    let mut extra_lives = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;
    let mut last_score = 0u32;

    while !engine.is_ended() && last_tick < scenario.max_ticks {
        engine.step(TICK_MS);
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        for message in collect_snapshot_anomalies(&snapshot, last_score) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        last_score = snapshot.score;

        for event in &snapshot.events {
            match event {
                RuntimeEvent::HunterCaptured { bonus, .. } => {
                    best_capture_bonus = best_capture_bonus.max(*bonus);
                }
                RuntimeEvent::ExtraLife { .. } => extra_lives += 1,
                _ => {}
            }
        }
    }

    if extra_lives > 1 {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            last_tick,
            format!("extra life awarded {extra_lives} times"),
        );
    }

    let summary = engine.build_summary();
    let outcome = if summary.ended { "game_over" } else { "tick_limit" };

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            outcome: outcome.to_string(),
            score: summary.score,
            level: summary.level,
            duration_ms: summary.duration_ms,
            collectibles_eaten: summary.stats.collectibles_eaten,
            power_eaten: summary.stats.power_eaten,
            hunters_captured: summary.stats.hunters_captured,
            best_capture_bonus,
            bonus_items_eaten: summary.stats.bonus_items_eaten,
            rounds_cleared: summary.stats.rounds_cleared,
            lives_lost: summary.stats.lives_lost,
            extra_lives,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, previous_score: u32) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.score < previous_score {
        anomalies.push(format!(
            "score went backwards: {previous_score} -> {}",
            snapshot.score
        ));
    }
    if snapshot.lives < 0 {
        anomalies.push(format!("negative lives: {}", snapshot.lives));
    }
    if snapshot.hunters.len() != 4 {
        anomalies.push(format!("hunter count is {}", snapshot.hunters.len()));
    }

    let max_x = MAZE_COLS as i32 * TILE_SIZE;
    let max_y = MAZE_ROWS as i32 * TILE_SIZE;
    let out_of_bounds = |x: i32, y: i32| x < 0 || y < 0 || x > max_x || y > max_y;
    if out_of_bounds(snapshot.player.x, snapshot.player.y) {
        anomalies.push(format!(
            "player out of bounds: ({}, {})",
            snapshot.player.x, snapshot.player.y
        ));
    }
    for hunter in &snapshot.hunters {
        if out_of_bounds(hunter.x, hunter.y) {
            anomalies.push(format!(
                "hunter {:?} out of bounds: ({}, {})",
                hunter.role, hunter.x, hunter.y
            ));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    (0..cli.runs.max(1))
        .map(|idx| Scenario {
            name: format!("autopilot-{}", idx + 1),
            seed: seed.wrapping_add(idx),
            max_ticks: cli.max_ticks.max(1),
            lives: cli.lives.map(|lives| lives.max(1)),
        })
        .collect()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let total_score: u64 = scenarios.iter().map(|s| s.score as u64).sum();
    let average_score = if scenario_count == 0 {
        0
    } else {
        (total_score / scenario_count as u64) as u32
    };
    let best_score = scenarios.iter().map(|s| s.score).max().unwrap_or(0);
    let mut outcome_counts = BTreeMap::new();
    for scenario in &scenarios {
        *outcome_counts.entry(scenario.outcome.clone()).or_insert(0) += 1;
    }
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_score,
        best_score,
        outcome_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => tracing::warn!(%error, event, "failed to encode log line"),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}
