use std::sync::Arc;

use gtk::subclass::prelude::ObjectSubclassIsExt;
use gtk::{gio, glib};
use mapserver::{Client, MapSource};

use crate::config::Config;

use super::app::App;
use super::viewport::ViewportWidget;

mod imp;

glib::wrapper! {
    pub struct AppWindow(ObjectSubclass<imp::AppWindow>)
        @extends adw::ApplicationWindow, gtk::ApplicationWindow, gtk::Window, gtk::Widget,
        @implements gio::ActionGroup, gio::ActionMap, gtk::Accessible, gtk::Buildable,
                gtk::ConstraintTarget, gtk::Native, gtk::Root, gtk::ShortcutManager;
}

impl AppWindow {
    pub fn new(app: &App, config: &Config) -> Self {
        let win: Self = glib::Object::builder().property("application", app).build();
        win.configure(config);
        win
    }

    fn viewport(&self) -> &ViewportWidget {
        self.imp().viewport()
    }

    fn configure(&self, config: &Config) {
        let viewport = self.viewport();
        viewport.set_redraw_delay(config.redraw_delay);
        viewport.set_zoom_step(config.zoom_step);

        let client = match Client::with_config(&config.client) {
            Ok(client) => client,
            Err(err) => {
                tracing::error!("failed to set up HTTP client: {err}");
                return;
            }
        };

        let Some(url) = config.url.as_deref() else {
            tracing::info!("no map URL given");
            return;
        };

        // an explicit extent wins over the companion extent query
        let extent = config.extent.or_else(|| {
            let extent_url = config.extent_url.as_deref()?;

            match client.fetch_extent(extent_url) {
                Ok(extent) => Some(extent),
                Err(err) => {
                    tracing::warn!(url = extent_url, "failed to query map extent: {err}");
                    None
                }
            }
        });

        viewport.set_source(Arc::new(client));

        if let Err(err) = viewport.set_home(url, extent) {
            tracing::debug!("window opened without a map: {err}");
        }
    }
}
