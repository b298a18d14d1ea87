//! Explorador entry point
//!
//! Handles platform-specific initialization and drives the engine: a
//! `requestAnimationFrame` loop plus exported intents on the web, a
//! line-based terminal host on native.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use explorador::persistence::PersistentStore;
    use explorador::platform::{LocalStorage, PerformanceClock};
    use explorador::sim::{PlanetId, SessionEngine, TimerToken, UpgradeId};
    use explorador::tuning::Tuning;

    type Engine = SessionEngine<LocalStorage, PerformanceClock>;

    thread_local! {
        static GAME: RefCell<Option<Rc<RefCell<Engine>>>> = const { RefCell::new(None) };
        static SCHEDULED: Cell<Option<TimerToken>> = const { Cell::new(None) };
    }

    fn with_engine<T>(f: impl FnOnce(&mut Engine) -> T) -> Option<T> {
        let game = GAME.with(|g| g.borrow().clone())?;
        let result = f(&mut game.borrow_mut());
        ensure_frame_loop(game);
        Some(result)
    }

    /// Schedule the next frame if a fuel run is active.
    /// Each callback carries the token of the run it was scheduled for.
    fn ensure_frame_loop(game: Rc<RefCell<Engine>>) {
        let token = game.borrow().frame_token();
        if let Some(token) = token
            && SCHEDULED.with(|s| s.replace(Some(token))) != Some(token)
        {
            request_animation_frame(game, token);
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Engine>>, token: TimerToken) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            frame(game, token);
        });
        let callback = closure.as_ref().unchecked_ref();
        let _ = window.request_animation_frame(callback);
        closure.forget();
    }

    fn frame(game: Rc<RefCell<Engine>>, token: TimerToken) {
        let still_running = {
            let mut g = game.borrow_mut();
            g.on_frame_for(token);
            g.frame_token() == Some(token)
        };
        if still_running {
            request_animation_frame(game, token);
        } else {
            SCHEDULED.with(|s| {
                if s.get() == Some(token) {
                    s.set(None);
                }
            });
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Explorador starting...");
        let seed = js_sys::Date::now() as u64;
        let engine = SessionEngine::new(
            PersistentStore::new(LocalStorage),
            PerformanceClock,
            Tuning::default(),
            seed,
        );
        let game = Rc::new(RefCell::new(engine));
        GAME.with(|g| *g.borrow_mut() = Some(game));
        log::info!("Explorador running!");
    }

    fn to_json<T: serde::Serialize>(value: &T) -> String {
        match serde_json::to_string(value) {
            Ok(json) => json,
            Err(_) => "null".to_string(),
        }
    }

    /// JSON view of the engine, empty before startup
    fn snapshot(f: impl FnOnce(&mut Engine) -> String) -> String {
        with_engine(f).unwrap_or_default()
    }

    #[wasm_bindgen]
    pub fn start_planet(planet: &str, level: u8) -> bool {
        let Some(planet) = PlanetId::from_str(planet) else {
            return false;
        };
        with_engine(|e| e.start_planet(planet, level).is_ok()) == Some(true)
    }

    /// Returns the outcome name ("ignored", "correct", "incorrect", "completed")
    #[wasm_bindgen]
    pub fn submit_answer(raw: &str) -> String {
        match with_engine(|e| e.submit_answer(raw)) {
            Some(Ok(outcome)) => format!("{outcome:?}").to_lowercase(),
            _ => "invalid".to_string(),
        }
    }

    #[wasm_bindgen]
    pub fn purchase_upgrade(id: &str) -> bool {
        let Some(id) = UpgradeId::from_str(id) else {
            return false;
        };
        with_engine(|e| e.purchase_upgrade(id).is_ok()) == Some(true)
    }

    #[wasm_bindgen]
    pub fn give_up() -> bool {
        with_engine(|e| e.give_up().is_ok()) == Some(true)
    }

    #[wasm_bindgen]
    pub fn exit_to_menu() -> bool {
        with_engine(|e| e.exit_to_menu().is_ok()) == Some(true)
    }

    #[wasm_bindgen]
    pub fn retry() -> bool {
        with_engine(|e| e.retry().is_ok()) == Some(true)
    }

    /// Progress state as JSON
    #[wasm_bindgen]
    pub fn progress_snapshot() -> String {
        snapshot(|e| to_json(e.progress()))
    }

    /// HUD state as JSON
    #[wasm_bindgen]
    pub fn session_snapshot() -> String {
        snapshot(|e| to_json(&e.session_view()))
    }

    #[wasm_bindgen]
    pub fn shop_snapshot() -> String {
        snapshot(|e| to_json(&e.shop()))
    }

    #[wasm_bindgen]
    pub fn level_track(planet: &str) -> String {
        let Some(planet) = PlanetId::from_str(planet) else {
            return String::new();
        };
        snapshot(|e| to_json(&e.level_track(planet)))
    }

    /// Events since the previous call, as a JSON array
    #[wasm_bindgen]
    pub fn drain_events() -> String {
        let events = with_engine(|e| e.drain_events()).unwrap_or_default();
        to_json(&events)
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod terminal {
    use std::io::{self, BufRead, Write};

    use explorador::consts::LOW_FUEL_RATIO;
    use explorador::persistence::PersistentStore;
    use explorador::platform::{FileStorage, SystemClock};
    use explorador::sim::{
        FailureReason, GameEvent, PhaseKind, PlanetId, ResourceKind, SessionEngine, TierStatus,
        UnavailableReason, UpgradeId,
    };
    use explorador::tuning::Tuning;

    type Engine = SessionEngine<FileStorage, SystemClock>;

    const HELP: &str = "\
comandos:
  jogar <planeta> [nivel]   terra, marte, saturno, andromeda; nivel 1-3
  loja                      lista melhorias
  comprar <melhoria>        ex.: comprar fuelCapacity
  status                    recursos e planetas
  desistir | menu           volta ao menu
  repetir                   repete o ultimo planeta
  sair
durante o jogo, digite a resposta";

    fn load_tuning() -> Tuning {
        let Ok(path) = std::env::var("EXPLORADOR_TUNING") else {
            return Tuning::default();
        };
        match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning file {}: {}", path, e);
                Tuning::default()
            }
        }
    }

    fn resource_label(kind: ResourceKind) -> &'static str {
        match kind {
            ResourceKind::Agua => "Água",
            ResourceKind::Areia => "Areia Vermelha",
            ResourceKind::Aneis => "Anéis",
            ResourceKind::Poeira => "Poeira Estelar",
        }
    }

    fn narrate(engine: &mut Engine) {
        for event in engine.drain_events() {
            match event {
                GameEvent::QuestionPresented {
                    index,
                    total,
                    prompt,
                    ..
                } => println!("[{}/{}] {}", index + 1, total, prompt),
                GameEvent::AnswerAccepted { fuel_gained, .. } => {
                    println!("Correto! +{:.0} combustível", fuel_gained)
                }
                GameEvent::AnswerRejected { .. } => println!("Ops, tente novamente!"),
                GameEvent::FuelChanged { .. } => {}
                GameEvent::PlanetCompleted(report) => {
                    let bonus = if report.jackpot {
                        " Bônus estelar x2!"
                    } else {
                        ""
                    };
                    println!(
                        "Nível {} concluído! +{} {}{}",
                        report.level,
                        report.reward,
                        resource_label(report.resource),
                        bonus
                    );
                    if let Some(next) = report.unlocked {
                        println!("{} desbloqueado.", next.as_str());
                    }
                }
                GameEvent::PlanetFailed { reason, .. } => match reason {
                    FailureReason::OutOfFuel => println!("Fim de jogo: sem combustível!"),
                },
                GameEvent::UpgradePurchased { id, new_level, .. } => {
                    println!("{} agora no nível {}", id.as_str(), new_level)
                }
                GameEvent::UpgradeUnavailable { id, reason } => match reason {
                    UnavailableReason::MaxLevel => println!("{}: máximo alcançado", id.as_str()),
                    UnavailableReason::InsufficientResources => {
                        println!("{}: recursos insuficientes", id.as_str())
                    }
                },
            }
        }
    }

    fn print_status(engine: &Engine) {
        let progress = engine.progress();
        for kind in ResourceKind::ALL {
            println!("  {:<15} {}", resource_label(kind), progress.resource(kind));
        }
        for planet in PlanetId::ALL {
            if !progress.is_unlocked(planet) {
                println!("  {:<10} bloqueado", planet.as_str());
                continue;
            }
            let track: String = engine
                .level_track(planet)
                .iter()
                .map(|s| match s {
                    TierStatus::Completed => '*',
                    TierStatus::Available => 'o',
                    TierStatus::Locked => '-',
                })
                .collect();
            println!("  {:<10} [{}]", planet.as_str(), track);
        }
        println!(
            "  combustível {:.0}/{:.0}",
            engine.fuel().current(),
            engine.fuel().max()
        );
    }

    fn print_shop(engine: &Engine) {
        for offer in engine.shop() {
            let cost = match &offer.next_cost {
                Some(cost) => cost
                    .0
                    .iter()
                    .map(|(k, v)| format!("{} {}", v, k.as_str()))
                    .collect::<Vec<_>>()
                    .join(", "),
                None => "máximo".to_string(),
            };
            let note = if offer.affordable {
                ""
            } else {
                " (indisponível)"
            };
            println!(
                "  {:<16} {}/{}  {}{}",
                offer.id.as_str(),
                offer.level,
                offer.max_level,
                cost,
                note
            );
        }
    }

    fn handle_command(engine: &mut Engine, line: &str) -> bool {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return true;
        };
        match cmd {
            "sair" | "quit" => return false,
            "ajuda" | "help" => println!("{HELP}"),
            "jogar" | "play" => {
                let planet = words.next().and_then(PlanetId::from_str);
                let level = words.next().and_then(|w| w.parse().ok()).unwrap_or(1);
                match planet {
                    Some(planet) => {
                        if let Err(e) = engine.start_planet(planet, level) {
                            println!("Não é possível: {e}");
                        }
                    }
                    None => println!("Planeta desconhecido"),
                }
            }
            "loja" | "shop" => print_shop(engine),
            "comprar" | "buy" => match words.next().and_then(UpgradeId::from_str) {
                Some(id) => {
                    let _ = engine.purchase_upgrade(id);
                }
                None => println!("Melhoria desconhecida"),
            },
            "status" => print_status(engine),
            "desistir" | "menu" => {
                let _ = engine.give_up();
            }
            "repetir" | "retry" => {
                if let Err(e) = engine.retry() {
                    println!("Não é possível: {e}");
                }
            }
            _ => println!("Comando desconhecido, digite 'ajuda'"),
        }
        true
    }

    pub fn run() -> io::Result<()> {
        let dir = match std::env::var("EXPLORADOR_SAVE_DIR") {
            Ok(dir) => dir,
            Err(_) => ".".to_string(),
        };
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let mut engine = SessionEngine::new(
            PersistentStore::new(FileStorage::new(dir)),
            SystemClock::new(),
            load_tuning(),
            seed,
        );

        println!("Explorador da Matemática");
        println!("{HELP}");
        narrate(&mut engine);

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        loop {
            let fuel = engine.fuel();
            if engine.phase().kind() == PhaseKind::Active {
                if fuel.ratio() < LOW_FUEL_RATIO {
                    println!("Combustível baixo!");
                }
                print!("[combustível {:.0}/{:.0}] > ", fuel.current(), fuel.max());
            } else {
                print!("> ");
            }
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            // Fuel drained while the player was typing
            engine.on_frame();
            narrate(&mut engine);

            let line = line.trim();
            let in_session = engine.phase().kind() == PhaseKind::Active;
            let numeric = line
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit() || c == '-');
            if in_session && numeric {
                let _ = engine.submit_answer(line);
            } else if !handle_command(&mut engine, line) {
                break;
            }
            narrate(&mut engine);
        }

        let _ = engine.exit_to_menu();
        log::info!("Explorador exiting");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Explorador (native) starting...");
    if let Err(e) = terminal::run() {
        log::error!("Terminal error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
