//! Geo Tokens entry point
//!
//! Handles platform-specific initialization and wires UI events to the
//! game controller.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use geo_tokens::platform::{
        self, GeolocationWatch, KeyValueStore, LocalStorage, MemoryStorage,
    };
    use geo_tokens::sim::{CellAddress, CellBounds, Direction, GameEvent, LatLng};
    use geo_tokens::ui::{CellView, MapUpdate};
    use geo_tokens::{GameController, GameRules, MovementMode, Settings};

    // Leaflet bindings (Leaflet itself is loaded by index.html as `L`)
    #[wasm_bindgen(inline_js = "
        let map = null;
        let playerMarker = null;
        const cells = new Map();
        let cellClickHandler = null;

        export function init_map(lat, lng, zoom) {
            map = L.map('map', { center: [lat, lng], zoom: zoom, maxZoom: 19 });
            L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
                maxZoom: 19,
                attribution: '&copy; <a href=\"http://www.openstreetmap.org/copyright\">OpenStreetMap</a>',
            }).addTo(map);
            playerMarker = L.marker([lat, lng]);
            playerMarker.bindTooltip(\"That's you!\");
            playerMarker.addTo(map);
        }

        export function set_player(lat, lng, pan) {
            playerMarker.setLatLng([lat, lng]);
            if (pan) {
                map.panTo([lat, lng]);
            }
        }

        export function view_bounds() {
            const b = map.getBounds();
            return [b.getSouth(), b.getWest(), b.getNorth(), b.getEast()];
        }

        export function on_view_change(cb) {
            map.on('moveend', () => cb());
        }

        export function on_cell_click(cb) {
            cellClickHandler = cb;
        }

        export function draw_cell(key, i, j, south, west, north, east, color, fillOpacity, weight, tooltip) {
            let rect = cells.get(key);
            if (!rect) {
                rect = L.rectangle([[south, west], [north, east]]);
                rect.on('click', () => {
                    if (cellClickHandler) {
                        cellClickHandler(i, j);
                    }
                });
                rect.addTo(map);
                cells.set(key, rect);
            }
            rect.setStyle({ color: color, fillOpacity: fillOpacity, weight: weight });
            rect.unbindTooltip();
            if (tooltip) {
                rect.bindTooltip(tooltip);
            }
        }

        export function prune_cells(keep) {
            const wanted = new Set(keep);
            for (const [key, rect] of cells) {
                if (!wanted.has(key)) {
                    rect.remove();
                    cells.delete(key);
                }
            }
        }
    ")]
    extern "C" {
        fn init_map(lat: f64, lng: f64, zoom: u8);
        fn set_player(lat: f64, lng: f64, pan: bool);
        fn view_bounds() -> js_sys::Array;
        fn on_view_change(cb: &Closure<dyn FnMut()>);
        fn on_cell_click(cb: &Closure<dyn FnMut(i32, i32)>);
        #[allow(clippy::too_many_arguments)]
        fn draw_cell(
            key: &str,
            i: i32,
            j: i32,
            south: f64,
            west: f64,
            north: f64,
            east: f64,
            color: &str,
            fill_opacity: f64,
            weight: f64,
            tooltip: Option<String>,
        );
        fn prune_cells(keep: &js_sys::Array);
    }

    /// Everything the browser callbacks share
    struct App {
        game: GameController<Box<dyn KeyValueStore>>,
        settings: Settings,
        watch: Option<GeolocationWatch>,
    }

    impl App {
        fn current_bounds() -> Option<CellBounds> {
            let values = view_bounds();
            let get = |idx: u32| values.get(idx).as_f64();
            Some(CellBounds::new(get(0)?, get(1)?, get(2)?, get(3)?))
        }

        /// Redraw every cell in the viewport and drop the ones that left it
        fn refresh_view(&self) {
            let Some(bounds) = Self::current_bounds() else {
                log::warn!("Map bounds unavailable");
                return;
            };
            let views = self.game.views_in(&bounds);
            let keep = js_sys::Array::new();
            for view in &views {
                draw_view(view);
                keep.push(&JsValue::from_str(&view.key));
            }
            prune_cells(&keep);
        }

        fn update_status(&self) {
            set_text("statusPanel", &self.game.status_text());
        }

        fn save_settings(&mut self) {
            self.settings.movement = self.game.mode();
            self.settings.save(self.game.store_mut());
        }

        /// Drain controller events into the map work they call for
        fn take_update(&mut self, moved: bool) -> MapUpdate {
            let events = self.game.drain_events();
            for event in &events {
                if let GameEvent::EnteredCell { address } = event {
                    log::debug!("Entered cell {}", address);
                }
            }
            MapUpdate::from_events(&events, self.game.player(), moved, self.settings.auto_pan)
        }
    }

    /// Run map work with no borrow of `app` held; Leaflet may call back into
    /// the view-change handler synchronously from `set_player`
    fn apply_update(app: &Rc<RefCell<App>>, update: MapUpdate) {
        if update.is_empty() {
            return;
        }
        if let Some((pos, pan)) = update.marker {
            set_player(pos.lat, pos.lng, pan);
        }
        {
            let a = app.borrow();
            if update.redraw {
                a.refresh_view();
            }
            a.update_status();
        }
        for message in &update.messages {
            alert(message);
        }
    }

    fn draw_view(view: &CellView) {
        draw_cell(
            &view.key,
            view.address.i,
            view.address.j,
            view.bounds.south,
            view.bounds.west,
            view.bounds.north,
            view.bounds.east,
            view.style.color,
            view.style.fill_opacity,
            view.style.weight,
            view.tooltip.clone(),
        );
    }

    fn document() -> Option<web_sys::Document> {
        web_sys::window()?.document()
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            el.set_text_content(Some(text));
        }
    }

    fn alert(message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn confirm(message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }

    fn gps_label(mode: MovementMode) -> &'static str {
        match mode {
            MovementMode::Buttons => "GPS: off",
            MovementMode::Geolocation => "GPS: on",
        }
    }

    /// Open LocalStorage, or keep the game in memory when it is unavailable
    fn open_store() -> Box<dyn KeyValueStore> {
        match LocalStorage::open() {
            Ok(store) => Box::new(store),
            Err(err) => {
                log::error!("{}; progress will not be saved", err);
                Box::new(MemoryStorage::new())
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Geo Tokens starting...");

        let document = document().expect("no document");
        let body = document.body().expect("no body");

        let control_panel = document.create_element("div").expect("create div");
        control_panel.set_id("controlPanel");
        let mut buttons = String::new();
        for dir in Direction::ALL {
            buttons.push_str(&format!(
                "<button id=\"move-{0}\">{0}</button>",
                dir.label()
            ));
        }
        buttons.push_str("<button id=\"gps-btn\"></button>");
        buttons.push_str("<button id=\"new-game-btn\">New Game</button>");
        control_panel.set_inner_html(&buttons);
        let _ = body.append_child(&control_panel);

        let map_div = document.create_element("div").expect("create div");
        map_div.set_id("map");
        let _ = body.append_child(&map_div);

        let status_panel = document.create_element("div").expect("create div");
        status_panel.set_id("statusPanel");
        let _ = body.append_child(&status_panel);

        let store = open_store();
        let settings = Settings::load(&store);
        let query_mode = platform::movement_mode_from_query(&platform::location_query());
        let mode = settings.startup_mode(query_mode);
        let game = GameController::new(store, GameRules::default(), mode);

        let start = game.player();
        init_map(start.lat, start.lng, settings.zoom);

        let app = Rc::new(RefCell::new(App {
            game,
            settings,
            watch: None,
        }));

        setup_map_handlers(app.clone());
        setup_movement_buttons(app.clone());
        setup_gps_button(app.clone());
        setup_new_game_button(app.clone());

        {
            let a = app.borrow();
            a.refresh_view();
            a.update_status();
            set_text("gps-btn", gps_label(a.game.mode()));
        }
        if mode == MovementMode::Geolocation {
            start_geolocation(&app);
        }

        log::info!("Geo Tokens running!");
    }

    fn setup_map_handlers(app: Rc<RefCell<App>>) {
        // Viewport moved: regenerate visible cells
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut()>::new(move || {
                if let Ok(a) = app.try_borrow() {
                    a.refresh_view();
                    return;
                }
                // Fired from inside another handler; redraw once it returns
                let app = app.clone();
                let later = Closure::once_into_js(move || app.borrow().refresh_view());
                if let Some(window) = web_sys::window() {
                    let _ = window.set_timeout_with_callback(later.unchecked_ref());
                }
            });
            on_view_change(&closure);
            closure.forget();
        }

        // Cell clicked: run the interaction
        {
            let closure = Closure::<dyn FnMut(i32, i32)>::new(move |i: i32, j: i32| {
                let update = {
                    let mut a = app.borrow_mut();
                    let target = CellAddress::new(i, j);
                    let outcome = a.game.interact(target);
                    if outcome.is_transition() {
                        draw_view(&a.game.view_of(target));
                        a.update_status();
                    } else {
                        log::debug!("Interaction at {} had no effect: {:?}", target, outcome);
                    }
                    a.take_update(false)
                };
                apply_update(&app, update);
            });
            on_cell_click(&closure);
            closure.forget();
        }
    }

    fn setup_movement_buttons(app: Rc<RefCell<App>>) {
        let Some(document) = document() else { return };
        for dir in Direction::ALL {
            let Some(btn) = document.get_element_by_id(&format!("move-{}", dir.label())) else {
                continue;
            };
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let update = {
                    let mut a = app.borrow_mut();
                    let moved = a.game.move_player(dir).is_some();
                    a.take_update(moved)
                };
                apply_update(&app, update);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_gps_button(app: Rc<RefCell<App>>) {
        let Some(btn) = document().and_then(|d| d.get_element_by_id("gps-btn")) else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let mode = {
                let mut a = app.borrow_mut();
                let mode = a.game.toggle_mode();
                a.save_settings();
                if mode == MovementMode::Buttons {
                    a.watch = None;
                }
                set_text("gps-btn", gps_label(mode));
                mode
            };
            if mode == MovementMode::Geolocation {
                start_geolocation(&app);
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_new_game_button(app: Rc<RefCell<App>>) {
        let Some(btn) = document().and_then(|d| d.get_element_by_id("new-game-btn")) else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            if !confirm("Start a new game? Your progress will be lost.") {
                return;
            }
            let update = {
                let mut a = app.borrow_mut();
                a.game.new_game();
                a.take_update(false)
            };
            apply_update(&app, update);
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn start_geolocation(app: &Rc<RefCell<App>>) {
        let on_position = {
            let app = app.clone();
            move |pos: LatLng| {
                let update = {
                    let mut a = app.borrow_mut();
                    let moved = a.game.update_position(pos).is_some();
                    a.take_update(moved)
                };
                apply_update(&app, update);
            }
        };
        let on_error = {
            let app = app.clone();
            move |message: String| {
                alert(&format!("Geolocation error: {}. Switching to buttons.", message));
                // The watch owns this callback, so drop it on the next tick
                let app = app.clone();
                let stop = Closure::once_into_js(move || {
                    let mut a = app.borrow_mut();
                    a.watch = None;
                    a.game.geolocation_failed(&message);
                    a.save_settings();
                    set_text("gps-btn", gps_label(a.game.mode()));
                });
                if let Some(window) = web_sys::window() {
                    let _ = window.set_timeout_with_callback(stop.unchecked_ref());
                }
            }
        };

        match GeolocationWatch::start(on_position, on_error) {
            Ok(watch) => app.borrow_mut().watch = Some(watch),
            Err(message) => {
                alert(&format!("Geolocation unavailable: {}", message));
                let mut a = app.borrow_mut();
                a.game.geolocation_failed(&message);
                a.save_settings();
                set_text("gps-btn", gps_label(a.game.mode()));
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::io::{self, BufRead, Write};
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};

    use geo_tokens::platform::{FileStorage, movement_mode_from_query};
    use geo_tokens::sim::{CellAddress, Direction, GameEvent, InteractionOutcome, LatLng};
    use geo_tokens::{GameController, GameRules, MovementMode, Settings, ui};

    /// Cells shown around the player in each direction
    const VIEW_RADIUS: i32 = 5;

    const HELP: &str = "\
commands:
  n | s | e | w        move one cell (button mode)
  click <i> <j>        interact with cell (i, j)
  take <di> <dj>       interact with the cell offset from yours
  gps <lat> <lng>      feed a device position (geolocation mode)
  mode                 toggle buttons / geolocation
  look                 redraw the map
  new                  start a new game
  quit";

    fn load_rules() -> Result<GameRules> {
        match std::env::var_os("GEO_TOKENS_RULES") {
            Some(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading rules from {:?}", path))?;
                GameRules::from_json(&json).with_context(|| format!("parsing rules in {:?}", path))
            }
            None => Ok(GameRules::default()),
        }
    }

    fn parse_pair<T: std::str::FromStr>(args: &[&str]) -> Result<(T, T)> {
        let [a, b] = args else {
            bail!("expected two arguments");
        };
        match (a.parse(), b.parse()) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            _ => bail!("could not parse {:?} {:?}", a, b),
        }
    }

    fn render(game: &GameController<FileStorage>) -> String {
        let here = game.player_cell();
        let mut out = String::new();
        for di in (-VIEW_RADIUS..=VIEW_RADIUS).rev() {
            for dj in -VIEW_RADIUS..=VIEW_RADIUS {
                let cell = game.cell(here.offset(di, dj));
                let content = match &cell.token {
                    Some(token) => token.value().to_string(),
                    None => ".".to_string(),
                };
                if di == 0 && dj == 0 {
                    out.push_str(&format!("[{:>2}]", content));
                } else {
                    out.push_str(&format!(" {:>2} ", content));
                }
            }
            out.push('\n');
        }
        out.push_str(&format!(
            "cell {}  mode {}  {}",
            here,
            game.mode().as_str(),
            game.status_text()
        ));
        out
    }

    fn describe(outcome: &InteractionOutcome) -> String {
        match outcome {
            InteractionOutcome::PickedUp { value } => format!("picked up {}", value),
            InteractionOutcome::Merged { value, .. } => format!("merged into {}", value),
            InteractionOutcome::Placed { value } => format!("placed {}", value),
            InteractionOutcome::Unchanged(reason) => format!("nothing happened ({:?})", reason),
            InteractionOutcome::OutOfRange { distance } => {
                format!("too far away ({} cells)", distance)
            }
        }
    }

    fn interact(game: &mut GameController<FileStorage>, target: CellAddress) {
        let outcome = game.interact(target);
        println!("{}", describe(&outcome));
        for event in game.drain_events() {
            if let GameEvent::Won { value } = event {
                println!("*** {} ***", ui::win_message(value));
            }
        }
    }

    /// Apply one command line; `Ok(false)` means quit
    fn dispatch(game: &mut GameController<FileStorage>, line: &str) -> Result<bool> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            return Ok(true);
        };
        match command {
            "quit" | "q" | "exit" => return Ok(false),
            "help" | "?" => println!("{}", HELP),
            "look" | "l" => println!("{}", render(game)),
            "mode" => {
                let mode = game.toggle_mode();
                let mut settings = Settings::load(game.store());
                settings.movement = mode;
                settings.save(game.store_mut());
                println!("movement: {}", mode.as_str());
            }
            "new" => {
                game.new_game();
                game.drain_events();
                println!("{}", render(game));
            }
            "click" | "c" => {
                let (i, j) = parse_pair::<i32>(args)?;
                interact(game, CellAddress::new(i, j));
            }
            "take" | "t" => {
                let (di, dj) = parse_pair::<i32>(args)?;
                let target = game.player_cell().offset(di, dj);
                interact(game, target);
            }
            "gps" => {
                let (lat, lng) = parse_pair::<f64>(args)?;
                match game.update_position(LatLng::new(lat, lng)) {
                    Some(_) => println!("{}", render(game)),
                    None => println!("position ignored (switch with `mode`)"),
                }
            }
            other => match Direction::from_str(other) {
                Some(dir) => match game.move_player(dir) {
                    Some(_) => println!("{}", render(game)),
                    None => println!("buttons are off in geolocation mode"),
                },
                None => println!("unknown command {:?}, try `help`", other),
            },
        }
        Ok(true)
    }

    pub fn run() -> Result<()> {
        let dir = std::env::var_os("GEO_TOKENS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".geo-tokens"));
        let store = FileStorage::open(&dir)
            .with_context(|| format!("opening save directory {}", dir.display()))?;
        let rules = load_rules()?;

        // Startup parameters use the web query syntax: `movement=geolocation`
        let query = std::env::args().skip(1).collect::<Vec<_>>().join("&");
        let settings = Settings::load(&store);
        let mode = settings.startup_mode(movement_mode_from_query(&query));
        if mode == MovementMode::Geolocation {
            log::info!("Geolocation mode: feed positions with `gps <lat> <lng>`");
        }

        let mut game = GameController::new(store, rules, mode);
        println!("{}", render(&game));
        println!("type `help` for commands");

        let stdin = io::stdin();
        loop {
            print!("> ");
            io::stdout().flush()?;
            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            match dispatch(&mut game, line.trim()) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => println!("error: {:#}", err),
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Geo Tokens (native) starting...");
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
