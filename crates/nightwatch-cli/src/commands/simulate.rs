use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;

use clap::Args;
use nightwatch_core::timer::secs_to_ms;
use nightwatch_core::{Config, Event, GameSession, GameState, ItemId, SceneLayout, Services};
use tracing::debug;

#[derive(Args)]
pub struct SimulateArgs {
    /// Simulated seconds to run. Defaults to the whole night plus the win transition
    #[arg(long)]
    seconds: Option<f64>,
    /// Frames per simulated second
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,
    /// RNG seed, overriding game.seed
    #[arg(long)]
    seed: Option<u64>,
    /// Scene TOML file. Defaults to the built-in house
    #[arg(long)]
    scene: Option<PathBuf>,
    /// Scripted player action as SECONDS:VERB:TARGET (verbs: interact, pickup, drop, collect)
    #[arg(long = "action")]
    actions: Vec<ScriptedAction>,
    /// Ignore the saved config and use defaults
    #[arg(long)]
    defaults: bool,
    /// Print only the final report
    #[arg(long)]
    report_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Interact,
    Pickup,
    Drop,
    Collect,
}

#[derive(Debug, Clone)]
pub struct ScriptedAction {
    at_ms: u64,
    verb: Verb,
    target: String,
}

impl FromStr for ScriptedAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(at), Some(verb), Some(target)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("expected SECONDS:VERB:TARGET, got '{s}'"));
        };
        let secs: f64 = at.parse().map_err(|_| format!("invalid time '{at}'"))?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(format!("invalid time '{at}'"));
        }
        let verb = match verb {
            "interact" => Verb::Interact,
            "pickup" => Verb::Pickup,
            "drop" => Verb::Drop,
            "collect" => Verb::Collect,
            other => return Err(format!("unknown verb '{other}'")),
        };
        if target.is_empty() {
            return Err("missing target".into());
        }
        Ok(Self {
            at_ms: secs_to_ms(secs),
            verb,
            target: target.to_string(),
        })
    }
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = if args.defaults {
        Config::default()
    } else {
        Config::load()?
    };
    if args.seed.is_some() {
        config.game.seed = args.seed;
    }
    let layout = match &args.scene {
        Some(path) => SceneLayout::load(path)?,
        None => SceneLayout::haunted_house(),
    };

    let total_ms = match args.seconds {
        Some(secs) => secs_to_ms(secs),
        None => {
            let night = config.clock.seconds_per_hour * f64::from(config.clock.hours_per_night)
                + config.clock.trailing_delay_secs;
            secs_to_ms(night) + config.win_transition_delay_ms() + 1_000
        }
    };
    let frame_ms = (1_000 / u64::from(args.fps)).max(1);

    let mut session = GameSession::new(&config, &layout, Services::headless())?;
    let pending: Rc<RefCell<Vec<Event>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&pending);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let mut actions = args.actions;
    actions.sort_by_key(|a| a.at_ms);
    let mut actions = actions.into_iter().peekable();

    session.start();
    flush(&session, &pending, args.report_only)?;

    while session.elapsed_ms() < total_ms && session.state() != GameState::GameOver {
        while let Some(action) = actions.next_if(|a| a.at_ms <= session.elapsed_ms()) {
            apply(&mut session, &action)?;
            flush(&session, &pending, args.report_only)?;
        }
        session.step(frame_ms.min(total_ms - session.elapsed_ms()));
        flush(&session, &pending, args.report_only)?;
    }

    println!("{}", serde_json::to_string(&session.report())?);
    Ok(())
}

fn apply(session: &mut GameSession, action: &ScriptedAction) -> Result<(), Box<dyn std::error::Error>> {
    let accepted = match action.verb {
        Verb::Interact => {
            let entity = session
                .entity_id(&action.target)
                .ok_or_else(|| format!("unknown entity '{}'", action.target))?;
            session.interact(entity)
        }
        Verb::Pickup => session.pick_up(ItemId::new(action.target.as_str())),
        Verb::Drop => session.drop_item(&ItemId::new(action.target.as_str())),
        Verb::Collect => session.collect(&ItemId::new(action.target.as_str())),
    };
    debug!(verb = ?action.verb, target = %action.target, accepted, "scripted action");
    Ok(())
}

fn flush(
    session: &GameSession,
    pending: &Rc<RefCell<Vec<Event>>>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let events = std::mem::take(&mut *pending.borrow_mut());
    if quiet {
        return Ok(());
    }
    let t_ms = session.elapsed_ms();
    for event in &events {
        let mut line = serde_json::to_value(event)?;
        line["t_ms"] = t_ms.into();
        println!("{line}");
    }
    Ok(())
}
