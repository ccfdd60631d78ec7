use gtk::subclass::prelude::ObjectSubclassIsExt;
use gtk::{gio, glib};

use crate::config::Config;

mod imp;

glib::wrapper! {
    pub struct App(ObjectSubclass<imp::App>)
        @extends gio::Application, gtk::Application, adw::Application,
        @implements gio::ActionGroup, gio::ActionMap;
}

impl App {
    pub fn new(config: Config) -> Self {
        // non-unique: every instance shows the map it was started with
        let app: Self = glib::Object::builder()
            .property("application-id", "io.mxnluz.MapView")
            .property("flags", gio::ApplicationFlags::NON_UNIQUE)
            .build();

        app.imp().config.replace(config);
        app
    }
}
