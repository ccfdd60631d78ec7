use std::cell::{Ref, RefCell};
use std::sync::Arc;
use std::time::Duration;

use gtk::{
    gdk::{self, Key},
    glib::{self, clone, once_cell::sync::Lazy, subclass::Signal},
    prelude::{EventControllerExt, GestureDragExt, ObjectExt, WidgetExt},
    subclass::{
        prelude::{
            ObjectImpl, ObjectImplExt, ObjectSubclass, ObjectSubclassExt, ObjectSubclassIsExt,
        },
        widget::{WidgetImpl, WidgetImplExt},
    },
    EventControllerKey, EventControllerScroll, EventControllerScrollFlags, GestureDrag, Inhibit,
    PropagationPhase,
};
use mapserver::{Bitmap, Client, Extent, MapSource, ZoomDirection};
use nalgebra::vector;

use crate::core::{Command, MapController, Surface, ViewportEvents};
use crate::ui::canvas::CanvasWidget;
use crate::utils::debounce::Debouncer;

/// Fraction of the viewport moved by one arrow key press.
const PAN_STEP: f64 = 0.1;

#[derive(Debug)]
struct Fetched {
    generation: u64,
    result: mapserver::Result<Bitmap>,
}

pub struct ViewportWidget {
    canvas: CanvasWidget,
    controller: RefCell<MapController>,
    debounce: Debouncer,
    source: RefCell<Option<Arc<dyn MapSource>>>,
    results: RefCell<Option<glib::Sender<Fetched>>>,
}

impl ViewportWidget {
    pub fn new() -> Self {
        Self {
            canvas: CanvasWidget::new(),
            controller: RefCell::new(MapController::default()),
            debounce: Debouncer::default(),
            source: RefCell::new(None),
            results: RefCell::new(None),
        }
    }

    pub fn controller(&self) -> Ref<'_, MapController> {
        self.controller.borrow()
    }

    pub fn set_source(&self, source: Arc<dyn MapSource>) {
        self.source.replace(Some(source));
        self.schedule_redraw();
    }

    pub fn set_redraw_delay(&self, delay: Duration) {
        self.debounce.set_delay(delay);
    }

    pub fn set_zoom_step(&self, step: f64) {
        self.controller.borrow_mut().set_zoom_step(step);
    }

    pub fn set_home(&self, url: &str, extent: Option<Extent>) -> mapserver::Result<()> {
        let result = self.controller.borrow_mut().set_home(url, extent);

        // whatever was shown belongs to the previous map
        self.canvas.clear();

        match &result {
            Ok(()) => {
                tracing::info!(url, "showing map");
                self.extent_changed();
                self.schedule_redraw();
            }
            Err(err) => tracing::warn!(url, "cannot show map: {err}"),
        }

        result
    }

    pub fn zoom(&self, direction: ZoomDirection) {
        let changed = self.controller.borrow_mut().zoom(direction, &self.canvas);

        if changed {
            self.extent_changed();
            self.schedule_redraw();
        }
    }

    pub fn reset(&self) {
        let changed = self.controller.borrow_mut().reset(&self.canvas);

        if changed {
            self.extent_changed();
            self.schedule_redraw();
        }
    }

    /// Pan by a fraction of the viewport size and move the extent along.
    fn pan_by(&self, fraction: nalgebra::Vector2<f64>) {
        let size = self.canvas.pixel_size();
        let delta = vector![fraction.x * size.x as f64, fraction.y * size.y as f64];

        let changed = {
            let mut ctrl = self.controller.borrow_mut();
            ctrl.pan(delta, &self.canvas);
            ctrl.commit_pan(delta)
        };

        if changed {
            self.extent_changed();
            self.schedule_redraw();
        }
    }

    fn extent_changed(&self) {
        self.obj().emit_by_name::<()>("extent-changed", &[]);
    }

    fn schedule_redraw(&self) {
        let obj = self.obj();

        self.debounce.arm(clone!(@weak obj => move || {
            obj.imp().redraw();
        }));
    }

    /// Request a new map image for the current extent and size.
    ///
    /// The request runs on a worker thread, its result is applied once it
    /// arrives back on the main loop.
    fn redraw(&self) {
        if !self.obj().is_drawable() {
            tracing::trace!("viewport not drawable, skipping redraw");
            return;
        }

        let Some(request) = self.controller.borrow().request() else {
            return;
        };

        let Some(source) = self.source.borrow().clone() else {
            tracing::warn!("no map source set, cannot redraw");
            return;
        };

        let Some(sender) = self.results.borrow().clone() else {
            return;
        };

        tracing::debug!(
            url = %request.url,
            size = ?request.size,
            generation = request.generation,
            "redraw"
        );

        let spawned = std::thread::Builder::new()
            .name("map-fetch".into())
            .spawn(move || {
                let result = source.fetch_map(&request.url);
                let fetched = Fetched {
                    generation: request.generation,
                    result,
                };

                // the receiver is gone if the widget has been destroyed
                let _ = sender.send(fetched);
            });

        if let Err(err) = spawned {
            tracing::warn!("failed to spawn fetch thread: {err}");
        }
    }

    fn apply(&self, fetched: Fetched) {
        self.controller
            .borrow_mut()
            .finish(fetched.generation, fetched.result, &self.canvas);
    }
}

impl ViewportEvents for ViewportWidget {
    fn on_resize(&self, width: i32, height: i32) {
        let changed = self.controller.borrow_mut().resize(width, height);

        if changed {
            self.schedule_redraw();
        }
    }

    fn on_pointer_down(&self, x: f64, y: f64) {
        self.obj().grab_focus();
        self.controller.borrow_mut().drag_begin(vector![x, y]);
    }

    fn on_pointer_move(&self, x: f64, y: f64) {
        self.controller
            .borrow_mut()
            .drag_update(vector![x, y], &self.canvas);
    }

    fn on_pointer_up(&self, x: f64, y: f64) {
        let changed = self
            .controller
            .borrow_mut()
            .drag_end(vector![x, y], &self.canvas);

        if changed {
            self.extent_changed();
            self.schedule_redraw();
        }
    }

    fn on_key_release(&self, command: Command) {
        match command {
            Command::ZoomIn => self.zoom(ZoomDirection::In),
            Command::ZoomOut => self.zoom(ZoomDirection::Out),
            Command::Reset => self.reset(),
            Command::Pan(fraction) => self.pan_by(fraction),
        }
    }
}

fn command_for_key(key: Key) -> Option<Command> {
    match key {
        Key::plus | Key::equal | Key::KP_Add => Some(Command::ZoomIn),
        Key::minus | Key::KP_Subtract => Some(Command::ZoomOut),
        Key::Home | Key::KP_Home | Key::_0 | Key::KP_0 => Some(Command::Reset),
        Key::Left => Some(Command::Pan(vector![PAN_STEP, 0.0])),
        Key::Right => Some(Command::Pan(vector![-PAN_STEP, 0.0])),
        Key::Up => Some(Command::Pan(vector![0.0, PAN_STEP])),
        Key::Down => Some(Command::Pan(vector![0.0, -PAN_STEP])),
        _ => None,
    }
}

impl Default for ViewportWidget {
    fn default() -> Self {
        Self::new()
    }
}

#[glib::object_subclass]
impl ObjectSubclass for ViewportWidget {
    const NAME: &'static str = "MapViewport";
    type Type = super::ViewportWidget;
    type ParentType = gtk::Widget;
}

impl ObjectImpl for ViewportWidget {
    fn constructed(&self) {
        self.parent_constructed();

        let obj = self.obj();
        obj.set_focusable(true);
        self.canvas.set_parent(&*obj);

        match Client::new() {
            Ok(client) => {
                self.source.replace(Some(Arc::new(client)));
            }
            Err(err) => tracing::warn!("failed to set up HTTP client: {err}"),
        }

        // results of map requests
        {
            let (sender, receiver) = glib::MainContext::channel(glib::PRIORITY_DEFAULT);

            receiver.attach(
                None,
                clone!(@weak obj => @default-return glib::Continue(false),
                    move |fetched: Fetched| {
                        obj.imp().apply(fetched);
                        glib::Continue(true)
                    }
                ),
            );

            self.results.replace(Some(sender));
        }

        // pan with primary mouse button + drag
        {
            let ctrl = GestureDrag::builder()
                .name("map_drag_controller")
                .button(gdk::BUTTON_PRIMARY)
                .propagation_phase(PropagationPhase::Bubble)
                .build();

            ctrl.connect_drag_begin(clone!(@weak obj => move |_, x, y| {
                obj.imp().on_pointer_down(x, y);
            }));

            ctrl.connect_drag_update(clone!(@weak obj => move |ctrl, dx, dy| {
                if let Some((x, y)) = ctrl.start_point() {
                    obj.imp().on_pointer_move(x + dx, y + dy);
                }
            }));

            ctrl.connect_drag_end(clone!(@weak obj => move |ctrl, dx, dy| {
                if let Some((x, y)) = ctrl.start_point() {
                    obj.imp().on_pointer_up(x + dx, y + dy);
                }
            }));

            obj.add_controller(ctrl);
        }

        // zoom with scroll-wheel
        {
            let ctrl = EventControllerScroll::builder()
                .name("map_zoom_scroll_controller")
                .propagation_phase(PropagationPhase::Bubble)
                .flags(EventControllerScrollFlags::VERTICAL | EventControllerScrollFlags::DISCRETE)
                .build();

            ctrl.connect_scroll(clone!(@weak obj => @default-return Inhibit(false),
                move |_, _, dy| {
                    match ZoomDirection::from_sign(-dy) {
                        Some(direction) => {
                            obj.imp().zoom(direction);
                            Inhibit(true)
                        }
                        None => Inhibit(false),
                    }
                }
            ));

            obj.add_controller(ctrl);
        }

        // keyboard zoom, reset, and pan
        {
            let ctrl = EventControllerKey::new();
            ctrl.set_name(Some("map_key_controller"));

            ctrl.connect_key_released(clone!(@weak obj => move |_, key, _, _| {
                if let Some(command) = command_for_key(key) {
                    obj.imp().on_key_release(command);
                }
            }));

            obj.add_controller(ctrl);
        }
    }

    fn dispose(&self) {
        self.debounce.cancel();
        self.results.replace(None);
        self.canvas.unparent();
    }

    fn signals() -> &'static [glib::subclass::Signal] {
        static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
            vec![Signal::builder("extent-changed").run_last().build()]
        });
        SIGNALS.as_ref()
    }
}

impl WidgetImpl for ViewportWidget {
    fn measure(&self, orientation: gtk::Orientation, for_size: i32) -> (i32, i32, i32, i32) {
        self.canvas.measure(orientation, for_size)
    }

    fn size_allocate(&self, width: i32, height: i32, baseline: i32) {
        self.canvas.allocate(width, height, baseline, None);
        self.on_resize(width, height);
    }

    fn map(&self) {
        self.parent_map();

        // a redraw requested while unmapped has been skipped
        self.schedule_redraw();
    }
}
