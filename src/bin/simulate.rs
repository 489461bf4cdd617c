use clap::Parser;
use dino_ladder_server::constants::{
    round_duration_ms, SUPPORTED_HEIGHTS, SUPPORTED_PLAYER_COUNTS, TICK_MS,
};
use dino_ladder_server::rng::Rng;
use dino_ladder_server::session::GameSession;
use dino_ladder_server::types::{
    LadderDimensions, Lattice, RoundSummary, SessionEvent, SessionPhase,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays ladder rounds headlessly and checks their outcomes")]
struct Cli {
    /// Run only one scenario (defaults to 4 players, height 10)
    #[arg(long)]
    single: bool,
    #[arg(long)]
    players: Option<usize>,
    #[arg(long)]
    height: Option<usize>,
    /// Rounds per scenario
    #[arg(long, default_value_t = 50)]
    rounds: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct Scenario {
    name: String,
    dimensions: LadderDimensions,
    rounds: usize,
    seed: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    #[serde(rename = "playerCount")]
    player_count: usize,
    height: usize,
    rounds: usize,
    #[serde(rename = "totalRungs")]
    total_rungs: usize,
    #[serde(rename = "averageRungs")]
    average_rungs: f64,
    fallbacks: usize,
    unverified: usize,
    #[serde(rename = "identityRounds")]
    identity_rounds: usize,
    #[serde(rename = "selfLandings")]
    self_landings: usize,
    #[serde(rename = "simulatedMs")]
    simulated_ms: u64,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    round: usize,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "roundCount")]
    round_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "fallbackCount")]
    fallback_count: usize,
    #[serde(rename = "averageRungs")]
    average_rungs: f64,
    #[serde(rename = "fallbacksByHeight")]
    fallbacks_by_height: BTreeMap<usize, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    round: Option<usize>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = match resolve_scenarios(&cli) {
        Ok(scenarios) => scenarios,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "playerCount": scenario.dimensions.player_count,
                "height": scenario.dimensions.height,
                "rounds": scenario.rounds,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.round),
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
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "rounds": scenario_run.result.rounds,
                "averageRungs": scenario_run.result.average_rungs,
                "fallbacks": scenario_run.result.fallbacks,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => {
                eprintln!("scenario result serialization failed: {error}");
                std::process::exit(2);
            }
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
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
                &run_id,
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
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "roundCount": summary.round_count,
            "anomalyCount": summary.anomaly_count,
            "fallbackCount": summary.fallback_count,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let dims = scenario.dimensions;
    let mut rng = Rng::new(scenario.seed);
    let mut session = GameSession::new(dims);
    let mut result = ScenarioResultLine {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        player_count: dims.player_count,
        height: dims.height,
        ..ScenarioResultLine::default()
    };
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let timing = session.timing();
    let tick_limit = round_duration_ms(dims.height, timing.pre_roll_ms, timing.step_ms) / TICK_MS + 2;

    for round in 1..=scenario.rounds {
        let ladder = match session.regenerate(&mut rng) {
            Ok(ladder) => ladder.clone(),
            Err(error) => {
                push_anomaly(
                    &mut result.anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    round,
                    error.to_string(),
                );
                continue;
            }
        };
        result.total_rungs += ladder.rungs.len();
        if ladder.origin.is_fallback() {
            result.fallbacks += 1;
        }
        if !ladder.origin.is_verified() {
            result.unverified += 1;
        }
        for message in collect_lattice_anomalies(&ladder.rungs, dims) {
            push_anomaly(
                &mut result.anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                round,
                message,
            );
        }

        if let Err(error) = session.start() {
            push_anomaly(
                &mut result.anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                round,
                error.to_string(),
            );
            continue;
        }

        let mut summary = None;
        let mut ticks = 0u64;
        while session.phase() != SessionPhase::Finished {
            ticks += 1;
            if ticks > tick_limit {
                push_anomaly(
                    &mut result.anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    round,
                    "tick safety limit exceeded".to_string(),
                );
                break;
            }
            for event in session.step(TICK_MS) {
                if let SessionEvent::Finished { summary: done } = event {
                    summary = Some(done);
                }
            }
        }
        result.simulated_ms += ticks * TICK_MS;

        match summary {
            Some(summary) => {
                for message in collect_summary_anomalies(&summary, dims) {
                    push_anomaly(
                        &mut result.anomalies,
                        &mut anomaly_records,
                        &mut anomaly_seen,
                        round,
                        message,
                    );
                }
                let self_landings = summary
                    .results
                    .iter()
                    .filter(|entry| entry.start_lane == entry.final_lane)
                    .count();
                result.self_landings += self_landings;
                if self_landings == dims.player_count {
                    result.identity_rounds += 1;
                }
            }
            None => push_anomaly(
                &mut result.anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                round,
                "round finished without summary".to_string(),
            ),
        }
        result.rounds += 1;
        session.reset();
    }

    result.average_rungs = average(result.total_rungs, result.rounds);
    ScenarioRunResult {
        result,
        anomaly_records,
    }
}

fn collect_lattice_anomalies(lattice: &Lattice, dims: LadderDimensions) -> Vec<String> {
    let mut anomalies = Vec::new();
    for rung in lattice.rungs() {
        if rung.right() >= dims.player_count {
            anomalies.push(format!("rung past last lane: {}-{}", rung.left(), rung.right()));
        }
        if !dims.rung_levels().contains(&rung.level()) {
            anomalies.push(format!("rung outside rung levels: {}", rung.level()));
        }
    }
    for level in dims.rung_levels() {
        let mut lefts: Vec<usize> = lattice.at_level(level).map(|rung| rung.left()).collect();
        lefts.sort_unstable();
        if lefts.windows(2).any(|pair| pair[1] - pair[0] < 2) {
            anomalies.push(format!("touching rungs on level {level}"));
        }
    }
    anomalies
}

fn collect_summary_anomalies(summary: &RoundSummary, dims: LadderDimensions) -> Vec<String> {
    let mut anomalies = Vec::new();
    if summary.results.len() != dims.player_count {
        anomalies.push(format!(
            "result count mismatch: {} for {} players",
            summary.results.len(),
            dims.player_count
        ));
    }
    let finals: HashSet<usize> = summary.results.iter().map(|entry| entry.final_lane).collect();
    if finals.len() != summary.results.len() {
        anomalies.push("players collided on a final lane".to_string());
    }
    if let Some(entry) = summary
        .results
        .iter()
        .find(|entry| entry.final_lane >= dims.player_count)
    {
        anomalies.push(format!("final lane out of range: {}", entry.final_lane));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Result<Vec<Scenario>, String> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));
    let rounds = cli.rounds.max(1);

    if cli.single || cli.players.is_some() || cli.height.is_some() {
        let players = cli.players.unwrap_or(4);
        let height = cli.height.unwrap_or(10);
        let dimensions =
            LadderDimensions::new(players, height).map_err(|error| error.to_string())?;
        return Ok(vec![Scenario {
            name: format!("custom-p{players}-h{height}"),
            dimensions,
            rounds,
            seed,
        }]);
    }

    let mut scenarios = Vec::new();
    for players in SUPPORTED_PLAYER_COUNTS {
        for height in SUPPORTED_HEIGHTS {
            let dimensions =
                LadderDimensions::new(players, height).map_err(|error| error.to_string())?;
            scenarios.push(Scenario {
                name: format!("p{players}-h{height}"),
                dimensions,
                rounds,
                seed: normalize_seed(seed as u64 + scenarios.len() as u64),
            });
        }
    }
    Ok(scenarios)
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn average(total: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    ((total as f64 / count as f64) * 100.0).round() / 100.0
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    round: usize,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        round,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("ladder-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let round_count = scenarios.iter().map(|scenario| scenario.rounds).sum();
    let total_rungs = scenarios.iter().map(|scenario| scenario.total_rungs).sum();
    let fallback_count = scenarios.iter().map(|scenario| scenario.fallbacks).sum();
    let mut fallbacks_by_height = BTreeMap::new();
    for scenario in &scenarios {
        *fallbacks_by_height.entry(scenario.height).or_insert(0) += scenario.fallbacks;
    }
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count: scenarios.len(),
        round_count,
        anomaly_count,
        fallback_count,
        average_rungs: average(total_rungs, round_count),
        fallbacks_by_height,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    round: Option<usize>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        round,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dino_ladder_server::types::Rung;

    fn make_scenario_result(
        height: usize,
        rounds: usize,
        rungs: usize,
        fallbacks: usize,
    ) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            player_count: 4,
            height,
            rounds,
            total_rungs: rungs,
            average_rungs: average(rungs, rounds),
            fallbacks,
            ..ScenarioResultLine::default()
        }
    }

    fn dims(players: usize, height: usize) -> LadderDimensions {
        LadderDimensions::new(players, height).expect("valid dimensions")
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "ladder-42-123456789");
    }

    #[test]
    fn seeded_scenario_runs_cleanly() {
        let scenario = Scenario {
            name: "p5-h15".to_string(),
            dimensions: dims(5, 15),
            rounds: 20,
            seed: 7,
        };
        let run = run_scenario(&scenario);
        assert_eq!(run.result.rounds, 20);
        assert!(run.result.anomalies.is_empty(), "{:?}", run.result.anomalies);
        assert_eq!(run.result.fallbacks, 0);
        assert!(run.result.total_rungs > 0);
    }

    #[test]
    fn build_run_summary_aggregates_scenarios() {
        let summary = build_run_summary(
            "ladder-1-1".to_string(),
            1,
            2,
            vec![
                make_scenario_result(8, 10, 30, 0),
                make_scenario_result(10, 10, 50, 1),
                make_scenario_result(10, 5, 0, 2),
            ],
            0,
        );
        assert_eq!(summary.round_count, 25);
        assert_eq!(summary.fallback_count, 3);
        assert_eq!(summary.average_rungs, 3.2);
        assert_eq!(summary.fallbacks_by_height.get(&10), Some(&3));
    }

    #[test]
    fn lattice_anomalies_catch_touching_rungs() {
        let lattice =
            Lattice::from_rungs(vec![Rung::new(0, 1), Rung::new(1, 1), Rung::new(3, 9)]);
        let anomalies = collect_lattice_anomalies(&lattice, dims(4, 8));
        assert!(anomalies.contains(&"touching rungs on level 1".to_string()));
        assert!(anomalies.contains(&"rung past last lane: 3-4".to_string()));
        assert!(anomalies.contains(&"rung outside rung levels: 9".to_string()));
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("dino-ladder-missing-{}", now_ms()))
            .join("summary.json");
        let summary = build_run_summary(
            "ladder-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result(10, 1, 3, 0)],
            0,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 3, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 4, "same".to_string());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].round, 4);
    }
}
