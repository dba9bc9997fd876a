//! Command-line simulator that plays a complete tournament with random
//! scores against an in-memory repository.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Error};
use log::{info, warn};
use pico_args::Arguments;
use podium::{
    EngineConfig, EngineError, MatchScores, MatchState, TournamentManager,
    competition::CompetitionKind,
    db::InMemoryRepository,
    tournament::{EventId, TeamId, TournamentId},
};
use rand::{Rng, rngs::ThreadRng};

const HELP: &str = "\
Simulate a multi-event tournament with random scores

USAGE:
  podium_sim [OPTIONS]

OPTIONS:
  --teams      N           Number of teams to register  [default: 6]
  --rounds     N           Round-robin rounds per team  [default: env PODIUM_DEFAULT_ROUNDS or 4]
  --seed       N           Seed for shuffles and coin flips  [default: env PODIUM_RNG_SEED or random]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  PODIUM_DEFAULT_ROUNDS         Default head-to-head rounds
  PODIUM_COMPETITIONS_PER_TEAM  Competitions per team in scored events
  PODIUM_RNG_SEED               Fixed randomizer seed
  RUST_LOG                      Log filter (e.g., debug)
";

const TEAM_NAMES: [&str; 12] = [
    "Aces", "Bombers", "Comets", "Dragons", "Eagles", "Falcons", "Giants", "Hornets", "Ibis",
    "Jaguars", "Knights", "Lynx",
];

struct Args {
    teams: usize,
    rounds: Option<u32>,
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        teams: pargs.opt_value_from_str("--teams")?.unwrap_or(6),
        rounds: pargs.opt_value_from_str("--rounds")?,
        seed: pargs.opt_value_from_str("--seed")?,
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let mut config = EngineConfig::from_env().context("Invalid engine configuration")?;
    if let Some(rounds) = args.rounds {
        config.default_rounds = rounds;
    }
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    config.validate()?;

    let manager = TournamentManager::new(Arc::new(InMemoryRepository::new()), config);
    let id = manager.create_tournament("Simulated Tournament").await?;

    let mut names = HashMap::new();
    for i in 0..args.teams {
        let name = match TEAM_NAMES.get(i) {
            Some(name) => name.to_string(),
            None => format!("Team {}", i + 1),
        };
        let team = manager.register_team(id, name.clone()).await?;
        names.insert(team, name);
    }
    info!("Registered {} teams", names.len());

    let events = [
        manager.add_head_to_head_event(id, "Cornhole").await?,
        manager
            .add_event(id, manager.config().individual_event("Darts"))
            .await?,
        manager
            .add_event(id, manager.config().team_event("Trivia"))
            .await?,
    ];

    manager.start_tournament(id).await?;

    let mut rng = rand::rng();
    for event in &events {
        match manager.start_event(id, *event).await {
            Ok(matches) => info!("Event {event} scheduled {} matches", matches.len()),
            Err(e) => {
                warn!("Skipping event {event}: {}", e.client_message());
                continue;
            }
        }
        play_event(&manager, id, *event, &mut rng).await?;
    }

    manager.end_tournament(id).await?;

    let snapshot = manager.snapshot(id).await?;
    for event in snapshot.events.values() {
        println!("\n{} ({:?})", event.config.name, event.status);
        for standing in event.ordered_standings() {
            println!(
                "  {:>2}. {:<10} {:>5.1} pts",
                standing.rank,
                team_name(&names, standing.team_id),
                standing.points
            );
        }
    }

    println!("\nOverall");
    for overall in manager.overall_rankings(id).await? {
        println!(
            "  {:>2}. {:<10} {:>5.1} pts  {}-{}-{}  event wins: {}  podiums: {}",
            overall.rank,
            team_name(&names, overall.team_id),
            overall.total_points,
            overall.wins,
            overall.losses,
            overall.ties,
            overall.event_wins,
            overall.event_podiums
        );
    }

    Ok(())
}

fn team_name(names: &HashMap<TeamId, String>, team: TeamId) -> &str {
    names.get(&team).map_or("?", String::as_str)
}

/// Start and end every playable match until the event completes or stalls
async fn play_event(
    manager: &TournamentManager,
    id: TournamentId,
    event_id: EventId,
    rng: &mut ThreadRng,
) -> Result<(), Error> {
    loop {
        let snapshot = manager.snapshot(id).await?;
        let event = snapshot.event(event_id)?;
        if event.is_complete() {
            info!("{} complete", event.config.name);
            return Ok(());
        }

        let playable: Vec<_> = snapshot
            .event_matches(event_id)
            .filter(|m| m.state == MatchState::Scheduled && m.team_1.is_some())
            .filter(|m| m.kind != CompetitionKind::HeadToHead || m.team_2.is_some())
            .map(|m| (m.id, m.kind, m.is_bracket()))
            .collect();

        let mut progressed = false;
        for (match_id, kind, is_bracket) in playable {
            match manager.start_match(id, match_id).await {
                Ok(()) => {}
                Err(e)
                    if matches!(
                        e.engine_error(),
                        Some(EngineError::BracketInactive(_) | EngineError::IncompleteSeed(_))
                    ) =>
                {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
            let scores = random_scores(kind, is_bracket, rng);
            manager.end_match(id, match_id, scores).await?;
            progressed = true;
        }

        if !progressed {
            warn!("Event {event_id} has no playable matches left");
            return Ok(());
        }
    }
}

fn random_scores(kind: CompetitionKind, decisive: bool, rng: &mut ThreadRng) -> MatchScores {
    match kind {
        CompetitionKind::HeadToHead => {
            let team_1 = rng.random_range(0..=21u32);
            let mut team_2 = rng.random_range(0..=21u32);
            while decisive && team_2 == team_1 {
                team_2 = rng.random_range(0..=21u32);
            }
            MatchScores::HeadToHead {
                team_1: f64::from(team_1),
                team_2: f64::from(team_2),
            }
        }
        CompetitionKind::Individual => MatchScores::Individual {
            player_1: f64::from(rng.random_range(0..=180u32)),
            player_2: f64::from(rng.random_range(0..=180u32)),
        },
        CompetitionKind::Team => MatchScores::Team {
            score: f64::from(rng.random_range(0..=100u32)),
        },
    }
}
