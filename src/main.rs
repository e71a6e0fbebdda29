//! Slide Jigsaw entry point
//!
//! Web: mounts the puzzle overlay next to the host element and wires pointer
//! input into a `PuzzleSession`. Native: decodes an image from disk, dumps the
//! rendered fragments and runs a scripted solve.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_puzzle {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::{Clamped, JsCast};
    use web_sys::{
        AddEventListenerOptions, CanvasRenderingContext2d, Document, EventTarget,
        HtmlCanvasElement, HtmlElement, HtmlImageElement, ImageData, MouseEvent, TouchEvent,
    };

    use slide_jigsaw::PuzzleConfig;
    use slide_jigsaw::platform::web::{mouse_sample, surface_frame, touch_samples};
    use slide_jigsaw::platform::{PointerSample, SurfaceFrame};
    use slide_jigsaw::renderer::ImageAsset;
    use slide_jigsaw::renderer::fragment::surface_dimensions;
    use slide_jigsaw::sim::{PuzzleEvent, PuzzleSession};

    /// Host element attribute carrying the puzzle config string
    const CONFIG_ATTRIBUTE: &str = "jigsaw-puzzle";
    const HOST_SELECTOR: &str = "[jigsaw-puzzle]";
    const CONGRATULATIONS: &str = "Congratulations! You solved the puzzle!";

    thread_local! {
        static OVERLAY: RefCell<Option<Rc<RefCell<Overlay>>>> = const { RefCell::new(None) };
    }

    type Handler = Closure<dyn FnMut(web_sys::Event)>;

    /// Listeners owned by the overlay, removed together on teardown
    struct Listeners {
        installed: Vec<(EventTarget, &'static str, Handler)>,
    }

    impl Listeners {
        fn new() -> Self {
            Self {
                installed: Vec::new(),
            }
        }

        fn add(&mut self, target: &EventTarget, kind: &'static str, passive: bool, handler: Handler) {
            let options = AddEventListenerOptions::new();
            options.set_passive(passive);
            if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                handler.as_ref().unchecked_ref(),
                &options,
            ) {
                log::error!("Failed to add {} listener: {:?}", kind, e);
                return;
            }
            self.installed.push((target.clone(), kind, handler));
        }

        fn clear(&mut self) {
            for (target, kind, handler) in self.installed.drain(..) {
                if let Err(e) = target
                    .remove_event_listener_with_callback(kind, handler.as_ref().unchecked_ref())
                {
                    log::error!("Failed to remove {} listener: {:?}", kind, e);
                }
            }
        }
    }

    /// The overlay: chrome, one canvas per piece, and the running session
    struct Overlay {
        config: PuzzleConfig,
        document: Document,
        container: HtmlElement,
        board: HtmlElement,
        canvases: Vec<HtmlCanvasElement>,
        session: Option<PuzzleSession>,
        listeners: Listeners,
    }

    impl Overlay {
        fn mount(document: &Document, config: PuzzleConfig) -> Result<Rc<RefCell<Self>>, JsValue> {
            let body = document.body().ok_or("no body")?;

            let container = create_div(document)?;
            set_styles(
                &container,
                &[
                    ("position", "fixed"),
                    ("top", "0"),
                    ("left", "0"),
                    ("width", "100vw"),
                    ("height", "100vh"),
                    ("display", "none"),
                    ("justify-content", "center"),
                    ("align-items", "center"),
                    ("background-color", "rgba(0, 0, 0, 0.8)"),
                    ("z-index", "10000"),
                ],
            );

            let board = create_div(document)?;
            let width = format!("{}px", config.surface_width);
            let height = format!("{}px", config.surface_height);
            set_styles(
                &board,
                &[
                    ("position", "relative"),
                    ("width", width.as_str()),
                    ("height", height.as_str()),
                    ("touch-action", "none"),
                ],
            );
            container.append_child(&board)?;
            body.append_child(&container)?;

            Ok(Rc::new(RefCell::new(Self {
                config,
                document: document.clone(),
                container,
                board,
                canvases: Vec::new(),
                session: None,
                listeners: Listeners::new(),
            })))
        }

        fn activate(&self) {
            let _ = self.container.style().set_property("display", "flex");
        }

        fn frame(&self) -> SurfaceFrame {
            surface_frame(&self.board, self.config.surface_size())
        }

        /// Image decoded: cut it up and lay out one canvas per piece
        fn start_session(&mut self, asset: ImageAsset) {
            let seed = self.config.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
            let session = match PuzzleSession::new(&self.config, &asset, seed) {
                Ok(session) => session,
                Err(e) => {
                    log::error!("Cannot start puzzle: {}", e);
                    return;
                }
            };

            for canvas in self.canvases.drain(..) {
                canvas.remove();
            }
            for piece in session.pieces() {
                match self.create_piece_canvas(&piece.surface, piece.size) {
                    Ok(canvas) => self.canvases.push(canvas),
                    Err(e) => {
                        log::error!("Failed to create canvas for piece {}: {:?}", piece.id, e);
                        return;
                    }
                }
            }
            self.session = Some(session);
            self.sync_all();
        }

        fn create_piece_canvas(
            &self,
            fragment: &image::RgbaImage,
            size: glam::Vec2,
        ) -> Result<HtmlCanvasElement, JsValue> {
            let canvas: HtmlCanvasElement = self.document.create_element("canvas")?.dyn_into()?;
            let (w, h) = surface_dimensions(size);
            canvas.set_width(w);
            canvas.set_height(h);
            let width = format!("{}px", size.x);
            let height = format!("{}px", size.y);
            set_styles(
                &canvas,
                &[
                    ("position", "absolute"),
                    ("cursor", "move"),
                    ("width", width.as_str()),
                    ("height", height.as_str()),
                ],
            );

            let ctx = context_2d(&canvas)?;
            let data = ImageData::new_with_u8_clamped_array_and_sh(
                Clamped(fragment.as_raw().as_slice()),
                fragment.width(),
                fragment.height(),
            )?;
            ctx.put_image_data(&data, 0.0, 0.0)?;
            self.board.append_child(&canvas)?;
            Ok(canvas)
        }

        fn sync_piece(&self, id: usize) {
            let (Some(session), Some(canvas)) = (self.session.as_ref(), self.canvases.get(id)) else {
                return;
            };
            let Some(piece) = session.piece(id) else {
                return;
            };
            let style = canvas.style();
            let _ = style.set_property("left", &format!("{}px", piece.pos.x));
            let _ = style.set_property("top", &format!("{}px", piece.pos.y));
            match session.z_index(id) {
                0 => {
                    let _ = style.remove_property("z-index");
                }
                z => {
                    let _ = style.set_property("z-index", &z.to_string());
                }
            }
        }

        fn sync_all(&self) {
            for id in 0..self.canvases.len() {
                self.sync_piece(id);
            }
        }

        /// Returns true if any sample grabbed a piece
        fn on_down(&mut self, samples: &[PointerSample]) -> bool {
            let frame = self.frame();
            let Some(session) = self.session.as_mut() else {
                return false;
            };
            let mut grabbed = false;
            for s in samples {
                grabbed |= session.pointer_down(s.pointer, frame.to_surface(s.client)).is_some();
            }
            self.flush();
            grabbed
        }

        /// Returns true if any held piece moved
        fn on_move(&mut self, samples: &[PointerSample]) -> bool {
            let frame = self.frame();
            let Some(session) = self.session.as_mut() else {
                return false;
            };
            let moved: Vec<usize> = samples
                .iter()
                .filter_map(|s| session.pointer_move(s.pointer, frame.to_surface(s.client)))
                .map(|(id, _)| id)
                .collect();
            for &id in &moved {
                self.sync_piece(id);
            }
            !moved.is_empty()
        }

        fn on_up(&mut self, samples: &[PointerSample]) {
            let Some(session) = self.session.as_mut() else {
                return;
            };
            for s in samples {
                session.pointer_up(s.pointer);
            }
            self.flush();
        }

        /// Lost focus or tracking: end every drag so nothing stays stuck
        fn on_cancel(&mut self, reason: &str) {
            let Some(session) = self.session.as_mut() else {
                return;
            };
            let released = session.release_all();
            if released > 0 {
                log::info!("Released {} stuck drag(s) ({})", released, reason);
            }
            self.flush();
        }

        fn flush(&mut self) {
            let Some(events) = self.session.as_mut().map(|s| s.drain_events()) else {
                return;
            };
            for event in events {
                match event {
                    PuzzleEvent::PieceLifted { piece } | PuzzleEvent::PieceDropped { piece, .. } => {
                        self.sync_piece(piece)
                    }
                    PuzzleEvent::Completed => self.celebrate(),
                }
            }
        }

        fn celebrate(&self) {
            if let Some(window) = web_sys::window() {
                let _ = window.alert_with_message(CONGRATULATIONS);
            }
            if let Err(e) = self.show_reward() {
                log::error!("Failed to show reward: {:?}", e);
            }
        }

        /// Reward image centred on screen, removed after `reward_display_ms`
        fn show_reward(&self) -> Result<(), JsValue> {
            if self.config.reward.is_empty() {
                return Ok(());
            }
            let window = web_sys::window().ok_or("no window")?;
            let body = self.document.body().ok_or("no body")?;
            let reward = HtmlImageElement::new()?;
            reward.set_src(&self.config.reward);
            set_styles(
                &reward,
                &[
                    ("position", "fixed"),
                    ("top", "50%"),
                    ("left", "50%"),
                    ("transform", "translate(-50%, -50%)"),
                    ("max-width", "90vw"),
                    ("max-height", "90vh"),
                    ("z-index", "10001"),
                ],
            );
            body.append_child(&reward)?;

            let remove = Closure::once_into_js(move || reward.remove());
            window.set_timeout_with_callback_and_timeout_and_arguments_0(
                remove.unchecked_ref(),
                self.config.reward_display_ms as i32,
            )?;
            Ok(())
        }

        fn teardown(&mut self) {
            self.listeners.clear();
            self.session = None;
            self.canvases.clear();
            self.container.remove();
            log::info!("Puzzle overlay torn down");
        }
    }

    fn create_div(document: &Document) -> Result<HtmlElement, JsValue> {
        Ok(document.create_element("div")?.dyn_into::<HtmlElement>()?)
    }

    fn set_styles(el: &HtmlElement, styles: &[(&str, &str)]) {
        let style = el.style();
        for (name, value) in styles {
            let _ = style.set_property(name, value);
        }
    }

    fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
        Ok(canvas
            .get_context("2d")?
            .ok_or("2d context unavailable")?
            .dyn_into::<CanvasRenderingContext2d>()?)
    }

    /// Decoded `<img>` -> RGBA pixels via an offscreen canvas
    fn rasterize(img: &HtmlImageElement, document: &Document) -> Result<ImageAsset, JsValue> {
        let (w, h) = (img.natural_width(), img.natural_height());
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        canvas.set_width(w);
        canvas.set_height(h);
        let ctx = context_2d(&canvas)?;
        ctx.draw_image_with_html_image_element(img, 0.0, 0.0)?;
        let data = ctx.get_image_data(0.0, 0.0, w as f64, h as f64)?;
        ImageAsset::from_rgba(w, h, data.data().0).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    fn load_image(overlay: &Rc<RefCell<Overlay>>) -> Result<(), JsValue> {
        let (src, document) = {
            let o = overlay.borrow();
            (o.config.image.clone(), o.document.clone())
        };
        let img = HtmlImageElement::new()?;
        img.set_cross_origin(Some("anonymous"));

        let onload = {
            let overlay = overlay.clone();
            let img = img.clone();
            Closure::once_into_js(move || match rasterize(&img, &document) {
                Ok(asset) => overlay.borrow_mut().start_session(asset),
                Err(e) => log::error!("Failed to read puzzle image pixels: {:?}", e),
            })
        };
        let onerror = {
            let src = src.clone();
            Closure::once_into_js(move || log::error!("Failed to load puzzle image {}", src))
        };
        img.set_onload(Some(onload.unchecked_ref()));
        img.set_onerror(Some(onerror.unchecked_ref()));
        img.set_src(&src);
        Ok(())
    }

    /// Wrap an overlay method as an event handler. Events that arrive while the
    /// overlay is already borrowed (e.g. during the completion alert) are dropped.
    fn handler(
        overlay: &Rc<RefCell<Overlay>>,
        f: impl Fn(&mut Overlay, &web_sys::Event) + 'static,
    ) -> Handler {
        let overlay = overlay.clone();
        Closure::new(move |event: web_sys::Event| {
            if let Ok(mut o) = overlay.try_borrow_mut() {
                f(&mut o, &event);
            }
        })
    }

    /// One set of listeners for the whole overlay: press on the board, then
    /// move/release anywhere in the document
    fn install_listeners(overlay: &Rc<RefCell<Overlay>>, host: &EventTarget) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let (board, document) = {
            let o = overlay.borrow();
            (o.board.clone(), o.document.clone())
        };
        let mut listeners = Listeners::new();

        listeners.add(host, "click", true, handler(overlay, |o, _| o.activate()));

        listeners.add(
            &board,
            "mousedown",
            true,
            handler(overlay, |o, event| {
                if let Some(e) = event.dyn_ref::<MouseEvent>() {
                    if e.button() == 0 {
                        o.on_down(&[mouse_sample(e)]);
                    }
                }
            }),
        );
        listeners.add(
            &board,
            "touchstart",
            false,
            handler(overlay, |o, event| {
                if let Some(e) = event.dyn_ref::<TouchEvent>() {
                    if o.on_down(&touch_samples(&e.changed_touches())) {
                        e.prevent_default();
                    }
                }
            }),
        );
        listeners.add(
            &document,
            "mousemove",
            true,
            handler(overlay, |o, event| {
                if let Some(e) = event.dyn_ref::<MouseEvent>() {
                    o.on_move(&[mouse_sample(e)]);
                }
            }),
        );
        listeners.add(
            &document,
            "touchmove",
            false,
            handler(overlay, |o, event| {
                if let Some(e) = event.dyn_ref::<TouchEvent>() {
                    if o.on_move(&touch_samples(&e.changed_touches())) {
                        e.prevent_default();
                    }
                }
            }),
        );
        listeners.add(
            &document,
            "mouseup",
            true,
            handler(overlay, |o, event| {
                if let Some(e) = event.dyn_ref::<MouseEvent>() {
                    if e.button() == 0 {
                        o.on_up(&[mouse_sample(e)]);
                    }
                }
            }),
        );
        listeners.add(
            &document,
            "touchend",
            true,
            handler(overlay, |o, event| {
                if let Some(e) = event.dyn_ref::<TouchEvent>() {
                    o.on_up(&touch_samples(&e.changed_touches()));
                }
            }),
        );
        listeners.add(
            &document,
            "touchcancel",
            true,
            handler(overlay, |o, _| o.on_cancel("touch cancelled")),
        );
        listeners.add(
            &window,
            "blur",
            true,
            handler(overlay, |o, _| o.on_cancel("window blur")),
        );
        listeners.add(
            &document,
            "visibilitychange",
            true,
            handler(overlay, |o, _| {
                if o.document.visibility_state() == web_sys::VisibilityState::Hidden {
                    o.on_cancel("tab hidden");
                }
            }),
        );

        overlay.borrow_mut().listeners = listeners;
        Ok(())
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Slide Jigsaw starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let Some(host) = document.query_selector(HOST_SELECTOR).ok().flatten() else {
            log::error!("No element with a `{}` attribute found", CONFIG_ATTRIBUTE);
            return;
        };
        let attr = host.get_attribute(CONFIG_ATTRIBUTE).unwrap_or_default();
        let config = match PuzzleConfig::from_attribute(&attr) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                return;
            }
        };
        log::info!("Puzzle config: {} pieces from {}", config.pieces, config.image);

        let overlay = match Overlay::mount(&document, config) {
            Ok(overlay) => overlay,
            Err(e) => {
                log::error!("Failed to build overlay: {:?}", e);
                return;
            }
        };
        if let Err(e) = install_listeners(&overlay, &host).and_then(|_| load_image(&overlay)) {
            log::error!("Failed to start puzzle: {:?}", e);
            overlay.borrow_mut().teardown();
            return;
        }
        OVERLAY.with(|slot| *slot.borrow_mut() = Some(overlay));
    }

    /// Scatter the pieces again with a fresh seed
    pub fn restart() {
        OVERLAY.with(|slot| {
            let slot = slot.borrow();
            let Some(overlay) = slot.as_ref() else {
                return;
            };
            let mut o = overlay.borrow_mut();
            if let Some(session) = o.session.as_mut() {
                session.scatter(js_sys::Date::now() as u64);
            }
            o.sync_all();
        });
    }

    /// Remove the overlay and all of its listeners
    pub fn close() {
        if let Some(overlay) = OVERLAY.with(|slot| slot.borrow_mut().take()) {
            overlay.borrow_mut().teardown();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_puzzle::run();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn restart_puzzle() {
    wasm_puzzle::restart();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn close_puzzle() {
    wasm_puzzle::close();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::Path;

    use glam::Vec2;
    use slide_jigsaw::renderer::ImageAsset;
    use slide_jigsaw::sim::{PointerId, PuzzleEvent, PuzzleSession};
    use slide_jigsaw::{PuzzleConfig, PuzzleError, PuzzleResult};

    /// `<image | config.json> [pieces] [out-dir]`
    pub fn run(args: &[String]) -> PuzzleResult<()> {
        let config = load_config(args)?;
        let image = ImageAsset::open(&config.image)?;
        let seed = config.seed.unwrap_or_else(clock_seed);
        let mut session = PuzzleSession::new(&config, &image, seed)?;

        if let Some(out_dir) = args.get(2) {
            write_fragments(&session, Path::new(out_dir))?;
        }

        let signals = solve(&mut session);
        println!(
            "Solved {}x{} puzzle (seed {}): completion signalled {} time(s)",
            session.grid(),
            session.grid(),
            seed,
            signals
        );
        Ok(())
    }

    fn load_config(args: &[String]) -> PuzzleResult<PuzzleConfig> {
        let source = &args[0];
        let mut config = if source.ends_with(".json") {
            PuzzleConfig::from_json(&std::fs::read_to_string(source)?)?
        } else {
            PuzzleConfig::new(source.as_str(), "", slide_jigsaw::consts::DEFAULT_PIECES)
        };
        if let Some(pieces) = args.get(1) {
            config.pieces = pieces
                .parse()
                .map_err(|_| PuzzleError::InvalidConfiguration(format!("bad piece count `{pieces}`")))?;
        }
        config.validate()?;
        Ok(config)
    }

    fn write_fragments(session: &PuzzleSession, dir: &Path) -> PuzzleResult<()> {
        std::fs::create_dir_all(dir)?;
        for piece in session.pieces() {
            let path = dir.join(format!("piece_r{}_c{}.png", piece.row, piece.col));
            piece.surface.save(&path)?;
        }
        log::info!("Wrote {} fragments to {}", session.pieces().len(), dir.display());
        Ok(())
    }

    /// Drag every piece to just off its target, grabbing it by the centre
    fn solve(session: &mut PuzzleSession) -> usize {
        let mut signals = 0;
        for id in 0..session.pieces().len() {
            let piece = &session.pieces()[id];
            let grab = piece.pos + piece.size / 2.0;
            let drop = piece.target() + piece.size / 2.0 + Vec2::new(3.0, -2.0);

            if !session.begin_drag(id, PointerId::MOUSE, grab) {
                continue;
            }
            for step in 1..=4 {
                session.pointer_move(PointerId::MOUSE, grab.lerp(drop, step as f32 / 4.0));
            }
            if let Some((_, outcome)) = session.pointer_up(PointerId::MOUSE) {
                log::info!("Piece {} dropped: {:?}", id, outcome);
            }
            signals += session
                .drain_events()
                .iter()
                .filter(|e| matches!(e, PuzzleEvent::Completed))
                .count();
        }
        signals
    }

    fn clock_seed() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Slide Jigsaw (native) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: slide-jigsaw <image | config.json> [pieces] [out-dir]");
        std::process::exit(2);
    }
    if let Err(e) = native::run(&args) {
        log::error!("{}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
