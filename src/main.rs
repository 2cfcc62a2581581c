//! Súmula referee console: claims a súmula from the backend and drives its live
//! scoring session from standard input.

use anyhow::{Context, anyhow, bail};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::watch,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sumula_referee::{
    config::RefereeConfig,
    dao::{
        api::{SumulaApi, http::HttpSumulaApi},
        local_store::{FileStore, LocalStore},
    },
    services::{
        loader::open_session,
        scoring::Medal,
        submission::submit_session,
        sumula_service::{
            claim_by_id, ensure_no_active_session, leave_session, list_active_sumulas,
        },
    },
    state::{
        SumulaSession,
        ledger::PointValue,
        sumula::{Pair, Player},
        timer::{TimerSnapshot, TimerStatus},
    },
};

const HELP: &str = "\
commands:
  list                     active súmulas of the event
  claim <id>               claim a súmula and open its session
  open <id>                reopen the súmula kept in the local slot
  status                   current round, timer and scores
  start | pause | reset    round timer
  score <pair> <1|3>       award points to a pair of the current round
  clear                    drop the current round's points and restart its timer
  next                     advance to the next round
  review                   open the final review (last round only)
  promote <player id>      mark a player as advancing
  demote <player id>       unmark a player
  confirm | unconfirm      confirm the final scores
  cancel                   close the review
  submit                   send the tally to the backend
  leave                    abandon the session
  quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Console<A, S> {
    api: A,
    store: S,
    event_id: i64,
    session: Option<SumulaSession>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = RefereeConfig::load();
    let api = HttpSumulaApi::new(config.api_config()).context("building backend client")?;
    let store = FileStore::open(&config.store_dir).context("opening local store")?;
    info!(
        api = %config.api_base_url,
        event_id = config.event_id,
        store = %store.root().display(),
        "referee console ready"
    );

    let mut console = Console {
        api,
        store,
        event_id: config.event_id,
        session: None,
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        let timer = console
            .session
            .as_ref()
            .map(|session| session.timer().subscribe());

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading standard input")? else {
                    break;
                };
                match console.handle(line.trim()).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(err) => eprintln!("error: {err:#}"),
                }
            }
            Some(snapshot) = next_tick(timer) => print_tick(&snapshot),
        }
    }

    // the claimed súmula stays in its slot and can be reopened with `open`
    Ok(())
}

impl<A: SumulaApi, S: LocalStore> Console<A, S> {
    async fn handle(&mut self, line: &str) -> anyhow::Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = words.collect();

        match command {
            "help" => println!("{HELP}"),
            "quit" | "exit" => return Ok(Flow::Quit),
            "list" => self.list().await?,
            "claim" => {
                let id = parse_arg(&args, 0, "súmula id")?;
                ensure_no_active_session(self.session.as_ref())?;
                let sumula = claim_by_id(&self.api, &self.store, self.event_id, id).await?;
                println!("claimed súmula {} ({})", sumula.id, sumula.name);
                self.open(id)?;
            }
            "open" => self.open(parse_arg(&args, 0, "súmula id")?)?,
            "status" => print_status(self.session()?),
            "start" => {
                if !self.session()?.start_timer()? {
                    println!("timer already running or finished");
                }
            }
            "pause" => {
                if !self.session()?.pause_timer()? {
                    println!("timer is not running");
                }
            }
            "reset" => self.session()?.reset_timer()?,
            "score" => {
                let pair: usize = parse_arg(&args, 0, "pair number")?;
                let pair_index = pair
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("pairs are numbered from 1"))?;
                let value = PointValue::try_from(parse_arg::<i64>(&args, 1, "point value")?)?;
                let session = self.session()?;
                let round = session.current_round();
                session.add_point(round, value, pair_index)?;
                println!(
                    "pair {pair}: {} point(s) this round",
                    session.pair_total(pair_index)
                );
            }
            "clear" => {
                let removed = self.session()?.clear_round()?;
                println!("{removed} award(s) removed");
            }
            "next" => {
                let session = self.session()?;
                session.advance_round()?;
                print_status(session);
            }
            "review" => {
                let session = self.session()?;
                session.open_review()?;
                print_review(session);
            }
            "promote" | "demote" => {
                let player = parse_arg(&args, 0, "player id")?;
                let session = self.session()?;
                session.set_promoted(player, command == "promote")?;
                print_review(session);
            }
            "confirm" => self.session()?.confirm(true)?,
            "unconfirm" => self.session()?.confirm(false)?,
            "cancel" => self.session()?.close_review()?,
            "submit" => {
                let Some(session) = self.session.as_mut() else {
                    bail!("no súmula is open");
                };
                submit_session(session, &self.api, &self.store, self.event_id).await?;
                println!("súmula submitted");
                self.session = None;
                // the tally is already stored; a stale list is not an error
                if let Err(err) = self.list().await {
                    warn!(error = %err, "failed to refresh súmula list after submission");
                    println!("súmula list unavailable; type `list` to retry");
                }
            }
            "leave" => {
                let Some(session) = self.session.as_mut() else {
                    bail!("no súmula is open");
                };
                leave_session(session, &self.store)?;
                self.session = None;
            }
            other => bail!("unknown command `{other}`; type `help`"),
        }

        Ok(Flow::Continue)
    }

    async fn list(&self) -> anyhow::Result<()> {
        let sumulas = list_active_sumulas(&self.api, self.event_id).await?;
        if sumulas.is_empty() {
            println!("no active súmulas");
        }
        for sumula in sumulas {
            let kind = if sumula.is_imortal {
                "imortal"
            } else {
                "classificatória"
            };
            println!(
                "{:>5}  {:<30} {:<16} {} players",
                sumula.id,
                sumula.name,
                kind,
                sumula.players_score.len()
            );
        }
        Ok(())
    }

    fn open(&mut self, id: i64) -> anyhow::Result<()> {
        ensure_no_active_session(self.session.as_ref())?;
        let session = open_session(&self.store, id)
            .map_err(|reason| anyhow!("cannot open súmula {id}: {reason:?}"))?;
        print_status(&session);
        self.session = Some(session);
        Ok(())
    }

    fn session(&mut self) -> anyhow::Result<&mut SumulaSession> {
        self.session
            .as_mut()
            .ok_or_else(|| anyhow!("no súmula is open; use `claim <id>`"))
    }
}

fn parse_arg<T: std::str::FromStr>(args: &[&str], index: usize, name: &str) -> anyhow::Result<T> {
    let raw = args
        .get(index)
        .ok_or_else(|| anyhow!("missing {name}"))?;
    raw.parse().map_err(|_| anyhow!("invalid {name} `{raw}`"))
}

async fn next_tick(timer: Option<watch::Receiver<TimerSnapshot>>) -> Option<TimerSnapshot> {
    match timer {
        Some(mut rx) => {
            rx.changed().await.ok()?;
            let snapshot = *rx.borrow();
            Some(snapshot)
        }
        None => std::future::pending().await,
    }
}

fn print_tick(snapshot: &TimerSnapshot) {
    match snapshot.status() {
        TimerStatus::Completed => println!("time is up: points may be assigned"),
        TimerStatus::Running if snapshot.remaining_secs % 10 == 0 => {
            println!("{}", snapshot.clock())
        }
        _ => {}
    }
}

fn print_status(session: &SumulaSession) {
    let sumula = session.sumula();
    let timer = session.timer().snapshot();
    println!(
        "{} | round {}/{} ({}%) | {} {:?} | {:?}",
        sumula.name,
        session.current_round() + 1,
        sumula.rounds.len(),
        session.round_progress(),
        timer.clock(),
        timer.status(),
        session.phase()
    );

    for (index, pair) in session.current_pairs().iter().enumerate() {
        println!(
            "  pair {}: {} [{} pt]",
            index + 1,
            pair_label(pair),
            session.pair_total(index)
        );
    }

    println!("  scores:");
    for score in session.scores() {
        println!(
            "    {:>5} {:<30} {}",
            score.player_id(),
            score.entry.player.display_name(),
            score.points
        );
    }
}

fn print_review(session: &SumulaSession) {
    let Some(review) = session.review() else {
        return;
    };
    let immortal = session.sumula().kind.is_immortal();

    for standing in review.standings() {
        let medal = match standing.medal() {
            Some(Medal::Gold) => "gold",
            Some(Medal::Silver) => "silver",
            Some(Medal::Bronze) => "bronze",
            None => "",
        };
        let mark = if immortal || !review.promotion().is_promoted(standing.score.player_id()) {
            " "
        } else {
            "x"
        };
        println!(
            "  [{mark}] {:>2}. {:<30} {:>4} {medal}",
            standing.position,
            standing.score.entry.player.display_name(),
            standing.score.points
        );
    }
    println!(
        "  confirmed: {}",
        if review.is_confirmed() { "yes" } else { "no" }
    );
}

fn pair_label(pair: &Pair) -> String {
    let name = |player: &Option<Player>| {
        player
            .as_ref()
            .map(Player::display_name)
            .unwrap_or_else(|| "-".into())
    };
    format!("{} & {}", name(&pair.player1), name(&pair.player2))
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
