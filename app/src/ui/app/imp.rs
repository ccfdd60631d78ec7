use std::cell::RefCell;

use adw::subclass::prelude::AdwApplicationImpl;
use gtk::{
    gio, glib,
    prelude::{GtkApplicationExt, GtkWindowExt, StaticType},
    subclass::prelude::{
        ApplicationImpl, ApplicationImplExt, GtkApplicationImpl, ObjectImpl, ObjectSubclass,
        ObjectSubclassExt,
    },
};

use crate::config::Config;
use crate::ui::{appwindow::AppWindow, canvas::CanvasWidget, viewport::ViewportWidget};

#[derive(Debug, Default)]
pub struct App {
    pub(super) config: RefCell<Config>,
}

#[glib::object_subclass]
impl ObjectSubclass for App {
    const NAME: &'static str = "MapApp";
    type Type = super::App;
    type ParentType = adw::Application;
}

impl ObjectImpl for App {}

impl ApplicationImpl for App {
    fn startup(&self) {
        self.parent_startup();

        gio::resources_register_include!("mapview.gresource").expect("Failed to register resources.");

        // register custom widgets
        AppWindow::static_type();
        CanvasWidget::static_type();
        ViewportWidget::static_type();

        let obj = self.obj();
        obj.set_accels_for_action("win.zoom-in", &["<Primary>plus", "<Primary>equal"]);
        obj.set_accels_for_action("win.zoom-out", &["<Primary>minus"]);
        obj.set_accels_for_action("win.zoom-reset", &["<Primary>0"]);
    }

    fn activate(&self) {
        self.parent_activate();

        let window = AppWindow::new(&self.obj(), &self.config.borrow());
        window.present();
    }
}

impl GtkApplicationImpl for App {}
impl AdwApplicationImpl for App {}
