use std::sync::Arc;
use std::time::Duration;

use gtk::glib;
use gtk::prelude::ObjectExt;
use gtk::subclass::prelude::ObjectSubclassIsExt;

use mapserver::{Extent, MapSource, ZoomDirection};

mod imp;

glib::wrapper! {
    pub struct ViewportWidget(ObjectSubclass<imp::ViewportWidget>)
        @extends gtk::Widget,
        @implements gtk::Buildable;
}

impl Default for ViewportWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportWidget {
    pub fn new() -> Self {
        glib::Object::new()
    }

    /// Show the map served at `url`.
    ///
    /// Without an explicit extent, the URL's `mapext` parameter defines the
    /// home extent. If neither is available a warning is logged and the map
    /// stays empty.
    pub fn set_home(&self, url: &str, extent: Option<Extent>) -> mapserver::Result<()> {
        self.imp().set_home(url, extent)
    }

    pub fn set_source(&self, source: Arc<dyn MapSource>) {
        self.imp().set_source(source)
    }

    pub fn zoom(&self, direction: ZoomDirection) {
        self.imp().zoom(direction)
    }

    pub fn reset(&self) {
        self.imp().reset()
    }

    pub fn extent(&self) -> Option<Extent> {
        self.imp().controller().extent()
    }

    pub fn set_redraw_delay(&self, delay: Duration) {
        self.imp().set_redraw_delay(delay)
    }

    pub fn set_zoom_step(&self, step: f64) {
        self.imp().set_zoom_step(step)
    }

    pub fn connect_extent_changed<F>(&self, f: F) -> glib::SignalHandlerId
    where
        F: Fn(&Self) + 'static,
    {
        self.connect_local("extent-changed", false, move |values| {
            if let Ok(vp) = values[0].get::<Self>() {
                f(&vp);
            }
            None
        })
    }
}
